use std::path::Path;

use tempfile::TempDir;
use wiremock::MockServer;

use confab::config::Config;
use confab::context::Manager;
use confab::storage::ContextStorage;

/// Builds a config pointing at a mock chat completions server
#[allow(dead_code)]
pub fn test_config(server: &MockServer) -> Config {
    Config {
        api_key: "test-key".to_string(),
        model: "gpt-4o".to_string(),
        os: "Linux".to_string(),
        api_url: format!("{}/v1/chat/completions", server.uri()),
    }
}

/// Creates a manager whose storage lives under the given tempdir
#[allow(dead_code)]
pub fn manager_for(server: &MockServer, tmp: &TempDir) -> Manager {
    Manager::with_storage(
        test_config(server),
        tmp.path().to_path_buf(),
        storage_for(tmp),
    )
    .expect("failed to create manager")
}

/// Storage rooted under the tempdir, for seeding and reloading stores
#[allow(dead_code)]
pub fn storage_for(tmp: &TempDir) -> ContextStorage {
    ContextStorage::with_root(tmp.path().join("contexts"))
}

/// Reloads the persisted store for a directory
#[allow(dead_code)]
pub fn reload_store(tmp: &TempDir, directory: &Path) -> confab::context::ContextStore {
    storage_for(tmp).load(directory).expect("failed to reload store")
}

/// Chat completion response body with the given assistant content
#[allow(dead_code)]
pub fn completion_json(content: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    })
}
