#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Copies the named fixtures into `<workspace>/source` and returns that
    /// directory.
    pub fn source_dir_with(&self, fixtures: &[&str]) -> PathBuf {
        let dir = self.path().join("source");
        fs::create_dir_all(&dir).expect("create source dir");
        for name in fixtures {
            fs::copy(fixture_path(name), dir.join(name)).expect("copy fixture");
        }
        dir
    }

    /// Path of the sink directory used by pipeline tests.
    pub fn sink_dir(&self) -> PathBuf {
        self.path().join("store")
    }

    /// Writes a pipeline configuration pointing at `source_dir` and the
    /// workspace sink directory. `datasets` pairs table names with codes.
    pub fn write_config(&self, source_dir: &Path, datasets: &[(&str, &str)]) -> PathBuf {
        let mut yaml = format!(
            "source_dir: {}\nsink_dir: {}\ndatasets:\n",
            source_dir.display(),
            self.sink_dir().display()
        );
        for (name, code) in datasets {
            yaml.push_str(&format!("  - name: {name}\n    code: {code}\n"));
        }
        self.write("pipeline.yml", &yaml)
    }

    /// Reads a file under the workspace into a string.
    pub fn read(&self, relative: impl AsRef<Path>) -> String {
        fs::read_to_string(self.path().join(relative)).expect("read workspace file")
    }
}
