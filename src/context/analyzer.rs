//! Directory analysis for project context
//!
//! Builds the cached directory summary: an indented file-tree rendering, an
//! optional README excerpt, and the set of detected well-known config
//! files. The walk respects .gitignore via `ignore::WalkBuilder` and is
//! aggressively bounded (depth, per-file size, total tree size) so that the
//! cache stays a small fraction of the context budget.

use std::fs;
use std::path::PathBuf;

use ignore::WalkBuilder;

use crate::context::store::AnalysisCache;
use crate::error::Result;

/// Levels below the root that the tree walk descends into
pub const MAX_TREE_DEPTH: usize = 2;

/// Maximum size of the rendered file tree, in bytes
pub const MAX_TREE_SIZE: usize = 10_000;

/// Maximum length of the cached README excerpt, in bytes
pub const MAX_README_LENGTH: usize = 5_000;

/// Files at or above this size are left out of the tree rendering
const MAX_TREE_FILE_SIZE: u64 = 50 * 1024;

/// Well-known configuration files to detect
const CONFIG_FILES: [&str; 10] = [
    "go.mod",
    "package.json",
    "Cargo.toml",
    "pyproject.toml",
    "requirements.txt",
    "pom.xml",
    "build.gradle",
    "Makefile",
    "docker-compose.yml",
    "Dockerfile",
];

/// README filenames, in lookup order
const README_FILES: [&str; 5] = ["README.md", "README.txt", "README", "readme.md", "Readme.md"];

/// Directory names skipped regardless of gitignore contents
const ALWAYS_IGNORED: [&str; 9] = [
    "node_modules",
    ".git",
    "vendor",
    "target",
    "dist",
    "build",
    "__pycache__",
    ".pytest_cache",
    ".mypy_cache",
];

/// Directory analyzer
///
/// # Examples
///
/// ```no_run
/// use confab::context::analyzer::Analyzer;
///
/// let analyzer = Analyzer::new("/some/project");
/// let cache = analyzer.analyze().unwrap();
/// println!("{}", cache.file_tree);
/// ```
pub struct Analyzer {
    root: PathBuf,
}

impl Analyzer {
    /// Creates an analyzer rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Performs the analysis and returns the cache to store
    pub fn analyze(&self) -> Result<AnalysisCache> {
        let file_tree = self.generate_file_tree();
        let readme_content = self.find_readme();
        let primary_configs = self.detect_config_files();

        tracing::debug!(
            tree_bytes = file_tree.len(),
            has_readme = readme_content.is_some(),
            configs = primary_configs.len(),
            "Directory analysis complete"
        );

        Ok(AnalysisCache {
            file_tree,
            readme_content,
            primary_configs,
        })
    }

    /// Renders the bounded, gitignore-aware directory tree
    fn generate_file_tree(&self) -> String {
        let root_name = self
            .root
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.root.display().to_string());

        let mut tree = format!("{}/\n", root_name);

        let walker = WalkBuilder::new(&self.root)
            .max_depth(Some(MAX_TREE_DEPTH + 1))
            .hidden(false)
            .git_ignore(true)
            .git_exclude(true)
            .require_git(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(|entry| {
                if entry.depth() == 0 {
                    return true;
                }
                let name = entry.file_name().to_string_lossy();
                if name.starts_with('.') && name != ".env.example" {
                    return false;
                }
                !ALWAYS_IGNORED.contains(&name.as_ref())
            })
            .build();

        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!("Skipping unreadable entry: {}", err);
                    continue;
                }
            };

            if entry.depth() == 0 {
                continue;
            }

            let indent = "  ".repeat(entry.depth());
            let name = entry.file_name().to_string_lossy();

            if entry.file_type().is_some_and(|t| t.is_dir()) {
                tree.push_str(&format!("{}{}/\n", indent, name));
            } else if entry
                .metadata()
                .map(|meta| meta.len() < MAX_TREE_FILE_SIZE)
                .unwrap_or(false)
            {
                tree.push_str(&format!("{}{}\n", indent, name));
            }
        }

        if tree.len() > MAX_TREE_SIZE {
            let mut end = MAX_TREE_SIZE;
            while !tree.is_char_boundary(end) {
                end -= 1;
            }
            tree.truncate(end);
            tree.push_str("\n\n[File tree truncated - project too large]\n");
        }

        tree
    }

    /// Reads the first README found, capped at the excerpt limit
    fn find_readme(&self) -> Option<String> {
        for filename in README_FILES {
            let path = self.root.join(filename);
            if let Ok(mut content) = fs::read_to_string(&path) {
                if content.len() > MAX_README_LENGTH {
                    let mut end = MAX_README_LENGTH;
                    while !content.is_char_boundary(end) {
                        end -= 1;
                    }
                    content.truncate(end);
                    content.push_str("\n\n[README truncated - too large]");
                }
                return Some(content);
            }
        }
        None
    }

    /// Detects well-known config files present at the root
    fn detect_config_files(&self) -> Vec<String> {
        CONFIG_FILES
            .iter()
            .filter(|filename| self.root.join(filename).exists())
            .map(|filename| filename.to_string())
            .collect()
    }
}

/// Analyzes a directory and installs the result into the store
pub fn analyze_into(store: &mut crate::context::store::ContextStore) -> Result<()> {
    let analyzer = Analyzer::new(store.directory());
    let cache = analyzer.analyze()?;
    store.set_analysis_cache(cache);
    Ok(())
}
