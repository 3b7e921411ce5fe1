//! Download sinks
//!
//! Where finished export files end up.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::Result;

/// Receives each finished file once
pub trait DownloadSink {
    fn save(&mut self, data: &[u8], filename: &str) -> Result<()>;
}

/// Writes files into a directory, creating it if needed
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths written so far, in save order
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl DownloadSink for DirectorySink {
    fn save(&mut self, data: &[u8], filename: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(filename);
        fs::write(&path, data)?;
        info!("Saved {} ({} bytes)", path.display(), data.len());
        self.written.push(path);
        Ok(())
    }
}

/// Keeps files in memory
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub files: Vec<(String, Vec<u8>)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(&self) -> Vec<&str> {
        self.files.iter().map(|(name, _)| name.as_str()).collect()
    }
}

impl DownloadSink for MemorySink {
    fn save(&mut self, data: &[u8], filename: &str) -> Result<()> {
        self.files.push((filename.to_string(), data.to_vec()));
        Ok(())
    }
}
