//! Engine configuration
//!
//! Settings are plain serde structs with every field defaulted, so a JSON settings file
//! only needs to mention what it changes. The file is located through an environment
//! variable; explicit values passed by the host (or CLI flags) take precedence.

use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CompletionError, Result};
use crate::text::TextSource;

/// Environment variable naming a JSON settings file
pub const CONFIG_ENV_VAR: &str = "MEMBER_COMPLETION_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Directories searched, in order, for `<ClassName>.<ext>` files
    pub project_roots: Vec<PathBuf>,

    /// Extension of source files, without the dot
    pub source_extension: String,

    pub archive: ArchiveConfig,

    /// Maximum number of top-level class models kept in memory
    pub cache_capacity: usize,

    pub visibility: MemberVisibility,

    /// Ambiguous simple name -> preferred (possibly qualified) name
    pub class_overrides: FxHashMap<String, String>,

    pub scan_limits: ScanLimits,

    /// Display labels longer than this are shortened with an ellipsis
    pub label_width: usize,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        let mut class_overrides = FxHashMap::default();
        // java.awt.List vs java.util.List; java.util.Map's interface methods carry no
        // access modifier, so the concrete classes give better completions.
        class_overrides.insert("List".to_string(), "ArrayList".to_string());
        class_overrides.insert("Map".to_string(), "HashMap".to_string());

        Self {
            project_roots: Vec::new(),
            source_extension: "java".to_string(),
            archive: ArchiveConfig::default(),
            cache_capacity: 64,
            visibility: MemberVisibility::default(),
            class_overrides,
            scan_limits: ScanLimits::default(),
            label_width: 48,
        }
    }
}

impl CompletionConfig {
    /// Loads settings from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| CompletionError::io(path, e))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| CompletionError::Config(format!("{}: {}", path.display(), e)))?;
        debug!("Loaded completion settings from {}", path.display());
        Ok(config.normalized())
    }

    /// Loads the file named by `MEMBER_COMPLETION_CONFIG`, falling back to defaults
    pub fn from_env_or_default() -> Self {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => {
                let path = PathBuf::from(path);
                Self::from_json_file(&path).unwrap_or_else(|e| {
                    warn!("Ignoring settings file: {}", e);
                    Self::default()
                })
            }
            None => Self::default(),
        }
    }

    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_roots.push(root.into());
        self
    }

    pub fn with_archive_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.archive.enabled = true;
        self.archive.path = Some(path.into());
        self
    }

    pub fn without_archive(mut self) -> Self {
        self.archive.enabled = false;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self.normalized()
    }

    fn normalized(mut self) -> Self {
        self.cache_capacity = self.cache_capacity.max(1);
        self.label_width = self.label_width.max(4);
        let trimmed = self.source_extension.trim_start_matches('.').to_string();
        self.source_extension = trimmed;
        self
    }
}

/// Location of the bundled library source archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub enabled: bool,

    /// Explicit archive path; discovered from the toolchain when absent
    pub path: Option<PathBuf>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

/// Which member categories are offered. Instance methods are always offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberVisibility {
    pub static_methods: bool,
    pub instance_fields: bool,
    pub static_fields: bool,
}

impl Default for MemberVisibility {
    fn default() -> Self {
        Self {
            static_methods: true,
            instance_fields: true,
            static_fields: true,
        }
    }
}

/// Scan-distance ceilings, in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanLimits {
    /// Ceiling for delimiter scans over a live editor buffer
    pub live_buffer: usize,

    /// Ceiling for delimiter scans over detached text
    pub detached: usize,

    /// How far back from the cursor local declarations are searched
    pub declaration_lookback: usize,
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self {
            live_buffer: 2048,
            detached: 16384,
            declaration_lookback: 65536,
        }
    }
}

impl ScanLimits {
    pub fn ceiling_for<S: TextSource + ?Sized>(&self, source: &S) -> usize {
        if source.is_live() { self.live_buffer } else { self.detached }
    }
}
