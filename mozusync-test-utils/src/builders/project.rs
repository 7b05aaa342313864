//! Throwaway project directories with a `mozusync.toml`

use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Builds a temporary project tree
///
/// ```rust,no_run
/// use mozusync_test_utils::TestProjectBuilder;
///
/// let project = TestProjectBuilder::new()
///     .with_file("scripts/app.js", "console.log(1);")
///     .with_config("[options]\napplication_key = \"APPKEY\"\n")
///     .build();
/// ```
#[derive(Default)]
pub struct TestProjectBuilder {
    files: Vec<(String, Vec<u8>)>,
    dirs: Vec<String>,
    config: Option<String>,
}

impl TestProjectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, contents: impl AsRef<[u8]>) -> Self {
        self.files.push((path.to_string(), contents.as_ref().to_vec()));
        self
    }

    /// A file of `size` bytes
    pub fn with_sized_file(self, path: &str, size: usize) -> Self {
        self.with_file(path, vec![b'x'; size])
    }

    pub fn with_dir(mut self, path: &str) -> Self {
        self.dirs.push(path.to_string());
        self
    }

    /// Contents of `mozusync.toml`
    pub fn with_config(mut self, toml: &str) -> Self {
        self.config = Some(toml.to_string());
        self
    }

    pub fn build(self) -> TempDir {
        let temp = TempDir::new().expect("create temp project");
        let root = temp.path();

        for dir in &self.dirs {
            fs::create_dir_all(root.join(dir)).expect("create fixture dir");
        }
        for (path, contents) in &self.files {
            write_file(root, path, contents);
        }
        if let Some(config) = &self.config {
            write_file(root, "mozusync.toml", config.as_bytes());
        }
        temp
    }
}

fn write_file(root: &Path, path: &str, contents: &[u8]) {
    let target = root.join(path);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).expect("create fixture parent");
    }
    fs::write(target, contents).expect("write fixture file");
}
