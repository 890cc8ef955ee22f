//! Class lookup: cache first, then the project tree, then the library archive

pub mod archive;
pub mod class_cache;
pub mod locator;
pub mod toolchain;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

pub use archive::{ArchiveIndex, ArchiveState, SourceArchive};
pub use class_cache::{file_fingerprint, CacheStats, ClassCache, Freshness};
pub use locator::{MatchMode, NameQuery, SourceLocator};

use crate::config::CompletionConfig;
use crate::error::{CompletionError, Result};
use crate::models::{ClassModel, Fingerprint, SourceOrigin};
use crate::parsers::ClassExtractor;

/// Where a partial-search hit was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceHit {
    /// Path relative to the project root it was found under
    File { root: PathBuf, relative: String },
    Archive { entry: String },
}

impl SourceHit {
    /// `/`-separated path used to derive a qualified name
    pub fn relative_path(&self) -> &str {
        match self {
            Self::File { relative, .. } => relative,
            Self::Archive { entry } => entry,
        }
    }
}

/// Resolves class names to models, owning the cache and both source backends
#[derive(Debug)]
pub struct ClassRepository {
    cache: ClassCache,
    locator: SourceLocator,
    archive: SourceArchive,
    extractor: ClassExtractor,
    overrides: FxHashMap<String, String>,
}

impl ClassRepository {
    pub fn new(config: &CompletionConfig) -> Self {
        Self {
            cache: ClassCache::with_capacity(config.cache_capacity),
            locator: SourceLocator::new(config.project_roots.clone(), config.source_extension.clone()),
            archive: SourceArchive::new(config.archive.clone(), config.source_extension.clone()),
            extractor: ClassExtractor::new(config.scan_limits),
            overrides: config.class_overrides.clone(),
        }
    }

    pub fn extractor(&self) -> &ClassExtractor {
        &self.extractor
    }

    pub fn cache(&self) -> &ClassCache {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn archive_state(&self) -> &ArchiveState {
        self.archive.state()
    }

    /// Resolves `name` (`Foo`, `Outer$Inner`, or a dotted qualified name) to a model
    ///
    /// `editing` is the live model of the file being edited. It answers for its own
    /// name, and a simple name that resolves nowhere else is retried as one of its
    /// nested classes.
    pub fn resolve_class(&mut self, name: &str, editing: Option<&ClassModel>) -> Result<Arc<ClassModel>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CompletionError::not_found("class", name));
        }

        let mut segments = name.split('$');
        let outer = segments.next().unwrap_or(name);
        let inner: Vec<&str> = segments.filter(|s| !s.is_empty()).collect();

        let resolved = self
            .resolve_top_level(outer, !inner.is_empty(), editing)
            .and_then(|model| descend(model, &inner, name));

        match (resolved, editing) {
            (Ok(model), _) => Ok(model),
            (Err(e), Some(editing)) if inner.is_empty() && outer != editing.simple_name => {
                trace!("{} not found ({}); trying {}${}", name, e, editing.name, outer);
                editing
                    .nested_class(outer)
                    .cloned()
                    .ok_or_else(|| CompletionError::not_found("class", name))
            }
            (Err(e), _) => Err(e),
        }
    }

    fn resolve_top_level(
        &mut self,
        name: &str,
        nested_query: bool,
        editing: Option<&ClassModel>,
    ) -> Result<Arc<ClassModel>> {
        if let Some(editing) = editing.filter(|model| model.simple_name == name) {
            return Ok(Arc::new(editing.clone()));
        }

        let target = self.overrides.get(name).cloned().unwrap_or_else(|| name.to_string());
        let key = target.rsplit('.').next().unwrap_or(&target);

        let freshness = if nested_query { Freshness::Trusted } else { Freshness::Verify };
        if let Some(model) = self.cache.get(key, freshness) {
            return Ok(model);
        }

        let model = match self.locator.find_class(&target) {
            Some(path) => self.extract_file(&path)?,
            None => self.extract_from_archive(&target)?,
        };
        let model = Arc::new(model);
        self.cache.insert(model.clone());
        Ok(model)
    }

    fn extract_file(&self, path: &Path) -> Result<ClassModel> {
        let fingerprint = file_fingerprint(path)?;
        let bytes = fs::read(path).map_err(|e| CompletionError::io(path, e))?;
        let text = String::from_utf8_lossy(&bytes);
        let name = class_name_from_path(path);
        debug!("Extracting {} from {}", name, path.display());
        Ok(self
            .extractor
            .extract(&name, SourceOrigin::File(path.to_path_buf()), fingerprint, &text))
    }

    fn extract_from_archive(&mut self, target: &str) -> Result<ClassModel> {
        let query = NameQuery::new(target, MatchMode::Exact);
        let entry = self
            .archive
            .find_entry(&query)
            .ok_or_else(|| CompletionError::not_found("class", target))?;
        let (archive, text) = self.archive.read_entry(&entry)?;
        let name = class_name_from_path(Path::new(&entry));
        debug!("Extracting {} from {}!{}", name, archive.display(), entry);
        Ok(self.extractor.extract(
            &name,
            SourceOrigin::Archive { archive, entry },
            Fingerprint::Unversioned,
            &text,
        ))
    }

    /// Partial search across the project tree and the archive, project hits first
    pub fn search(&mut self, partial: &str) -> Vec<SourceHit> {
        let query = NameQuery::new(partial, MatchMode::Partial);
        if query.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<SourceHit> = self
            .locator
            .find_all(&query)
            .into_iter()
            .filter_map(|path| {
                let root = self.locator.roots().iter().find(|root| path.starts_with(root))?;
                let relative = path.strip_prefix(root).ok()?.to_str()?.replace('\\', "/");
                Some(SourceHit::File {
                    root: root.clone(),
                    relative,
                })
            })
            .collect();
        hits.extend(
            self.archive
                .find_entries(&query)
                .into_iter()
                .map(|entry| SourceHit::Archive { entry }),
        );
        debug!("Partial search for {:?} found {} sources", partial, hits.len());
        hits
    }
}

/// Follows `$`-separated nested names down from a top-level model
fn descend(model: Arc<ClassModel>, inner: &[&str], full_name: &str) -> Result<Arc<ClassModel>> {
    inner.iter().try_fold(model, |current, segment| {
        current
            .nested_class(segment)
            .cloned()
            .ok_or_else(|| CompletionError::not_found("nested class", full_name))
    })
}

/// Class name of a source file: the file stem, ignoring any `$` prefix
pub fn class_name_from_path(path: &Path) -> String {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    stem.rsplit('$').next().unwrap_or(stem).to_string()
}
