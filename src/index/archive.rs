//! Lazily opened library source archive
//!
//! The archive is located and indexed on first use. A failed attempt is remembered
//! for the rest of the session so lookups never probe the toolchain twice.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use zip::ZipArchive;

use super::locator::NameQuery;
use super::toolchain;
use crate::config::ArchiveConfig;
use crate::error::{CompletionError, Result};

/// An opened archive and the flat list of source entries inside it
pub struct ArchiveIndex {
    path: PathBuf,
    archive: ZipArchive<BufReader<File>>,
    entries: Vec<String>,
}

impl fmt::Debug for ArchiveIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveIndex")
            .field("path", &self.path)
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl ArchiveIndex {
    pub fn open(path: &Path, extension: &str) -> Result<Self> {
        let file = File::open(path).map_err(|e| CompletionError::io(path, e))?;
        let archive = ZipArchive::new(BufReader::new(file)).map_err(|source| CompletionError::Archive {
            path: path.to_path_buf(),
            source,
        })?;
        let suffix = format!(".{}", extension);
        let entries: Vec<String> = archive
            .file_names()
            .filter(|name| name.ends_with(&suffix))
            .map(str::to_string)
            .collect();
        debug!("Indexed {} source entries in {}", entries.len(), path.display());

        Ok(Self {
            path: path.to_path_buf(),
            archive,
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn find(&self, query: &NameQuery, extension: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| query.matches(entry, extension))
            .cloned()
            .collect()
    }

    /// Reads an entry as text, replacing invalid UTF-8
    pub fn read_entry(&mut self, entry: &str) -> Result<String> {
        let archive_path = self.path.clone();
        let mut file = self.archive.by_name(entry).map_err(|source| CompletionError::Archive {
            path: archive_path.clone(),
            source,
        })?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)
            .map_err(|e| CompletionError::io(archive_path.join(entry), e))?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[derive(Debug, Default)]
pub enum ArchiveState {
    #[default]
    Uninitialized,
    /// Discovery or opening failed; never retried
    Failed,
    Ready(ArchiveIndex),
}

/// The archive backend of the class repository
#[derive(Debug)]
pub struct SourceArchive {
    config: ArchiveConfig,
    extension: String,
    state: ArchiveState,
}

impl SourceArchive {
    pub fn new(config: ArchiveConfig, extension: impl Into<String>) -> Self {
        Self {
            config,
            extension: extension.into(),
            state: ArchiveState::Uninitialized,
        }
    }

    pub fn state(&self) -> &ArchiveState {
        &self.state
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, ArchiveState::Failed)
    }

    /// Opens the archive on first call; later calls reuse the outcome
    pub fn index(&mut self) -> Result<&mut ArchiveIndex> {
        if matches!(self.state, ArchiveState::Uninitialized) {
            self.state = match self.initialize() {
                Ok(index) => ArchiveState::Ready(index),
                Err(e) => {
                    warn!("Library source archive disabled for this session: {}", e);
                    ArchiveState::Failed
                }
            };
        }
        match &mut self.state {
            ArchiveState::Ready(index) => Ok(index),
            _ => Err(CompletionError::BackendUnavailable(
                "archive lookup previously failed".to_string(),
            )),
        }
    }

    fn initialize(&self) -> Result<ArchiveIndex> {
        if !self.config.enabled {
            return Err(CompletionError::BackendUnavailable("disabled by configuration".to_string()));
        }
        let path = toolchain::discover_source_archive(self.config.path.as_deref())
            .ok_or_else(|| CompletionError::BackendUnavailable("no toolchain archive found".to_string()))?;
        ArchiveIndex::open(&path, &self.extension)
    }

    /// First entry matching `query`
    pub fn find_entry(&mut self, query: &NameQuery) -> Option<String> {
        self.find_entries(query).into_iter().next()
    }

    /// Every entry matching `query`; empty when the archive is unavailable
    pub fn find_entries(&mut self, query: &NameQuery) -> Vec<String> {
        let extension = self.extension.clone();
        match self.index() {
            Ok(index) => index.find(query, &extension),
            Err(_) => Vec::new(),
        }
    }

    /// Reads `entry`, returning the archive path alongside the text
    pub fn read_entry(&mut self, entry: &str) -> Result<(PathBuf, String)> {
        let index = self.index()?;
        let text = index.read_entry(entry)?;
        Ok((index.path().to_path_buf(), text))
    }
}
