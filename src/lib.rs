//! Shared fixtures for the wordforge end-to-end tests

use std::fs;
use std::io;
use std::path::PathBuf;

use tempfile::TempDir;

/// Scratch directory holding a config file and word lists
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    /// Write `wordforge.toml` and return its path
    pub fn write_config(&self, contents: &str) -> io::Result<PathBuf> {
        let path = self.dir.path().join("wordforge.toml");
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Write a word list, one word per line, and return its path
    pub fn write_word_list(&self, name: &str, words: &[&str]) -> io::Result<PathBuf> {
        let path = self.dir.path().join(name);
        let mut contents = words.join("\n");
        contents.push('\n');
        fs::write(&path, contents)?;
        Ok(path)
    }
}
