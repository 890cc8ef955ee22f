//! The editing-session entry points
//!
//! A [`CompletionSession`] owns everything that outlives a single request: the
//! configuration, the class cache and the lazily opened library archive. Every entry
//! point absorbs its errors, logs them, and answers with an empty list.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::completion::{
    constructor_target, import_query, qualified_names, AccessChain, ChainResolver, CompletionAssembler,
    CompletionItem, ImportCandidate,
};
use crate::config::CompletionConfig;
use crate::error::{CompletionError, Result};
use crate::index::{class_name_from_path, ArchiveState, CacheStats, ClassRepository};
use crate::models::{ClassModel, Fingerprint, SourceOrigin};
use crate::text::{line_prefix, TextSource};

/// A session shared between threads of a host that may call in concurrently
pub type SharedSession = Arc<Mutex<CompletionSession>>;

pub struct CompletionSession {
    config: CompletionConfig,
    repository: ClassRepository,
}

impl CompletionSession {
    pub fn new(config: CompletionConfig) -> Self {
        info!(
            "Completion session: {} project roots, archive {}",
            config.project_roots.len(),
            if config.archive.enabled { "enabled" } else { "disabled" }
        );
        let repository = ClassRepository::new(&config);
        Self { config, repository }
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.repository.cache_stats()
    }

    pub fn archive_state(&self) -> &ArchiveState {
        self.repository.archive_state()
    }

    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    /// Member completions for the access expression ending at `cursor`
    ///
    /// `source` is the full text of `file`, saved or not; `file` names the class
    /// being edited.
    pub fn on_access_trigger<S: TextSource + ?Sized>(
        &mut self,
        source: &S,
        cursor: usize,
        file: &Path,
    ) -> Vec<CompletionItem> {
        let limits = self.config.scan_limits;
        let cursor = cursor.min(source.len_bytes());
        let line = line_prefix(source, cursor);
        let Some(chain) = AccessChain::parse(&line, &limits) else {
            trace!("No access chain before offset {}", cursor);
            return Vec::new();
        };
        debug!("Access trigger: root {:?}, hops {:?}, prefix {:?}", chain.root, chain.hops, chain.prefix);

        let editing = self.editing_model(source, file);
        let preceding = source.read_text(cursor.saturating_sub(limits.declaration_lookback), cursor);

        let resolved = ChainResolver::new(&mut self.repository, Some(&editing), limits).resolve(&chain, &preceding);
        if !resolved.is_resolved() {
            debug!("Chain rooted at {:?} did not resolve", chain.root);
            return Vec::new();
        }

        CompletionAssembler::new(
            &mut self.repository,
            Some(&editing),
            self.config.visibility,
            self.config.label_width,
        )
        .assemble(&resolved, &chain.prefix)
    }

    /// Member completions at byte `offset` of the saved file `file`
    pub fn complete_at(&mut self, file: &Path, offset: usize) -> Result<Vec<CompletionItem>> {
        let text = read_source(file)?;
        Ok(self.on_access_trigger(text.as_str(), offset, file))
    }

    /// Fully qualified names of every class whose path contains `partial`
    pub fn on_import_like_trigger(&mut self, partial: &str) -> Vec<String> {
        let hits = self.repository.search(partial);
        qualified_names(&hits, &self.config.source_extension)
    }

    /// Candidates for an `import` line, or nothing when `line` is not one
    pub fn on_import_line(&mut self, line: &str) -> Vec<ImportCandidate> {
        let Some(query) = import_query(line) else {
            return Vec::new();
        };
        self.on_import_like_trigger(query)
            .iter()
            .map(|name| ImportCandidate::from_qualified_name(name))
            .collect()
    }

    /// Constructor completions right after `new Type(`
    pub fn on_constructor_trigger<S: TextSource + ?Sized>(
        &mut self,
        source: &S,
        cursor: usize,
        file: &Path,
    ) -> Vec<CompletionItem> {
        let cursor = cursor.min(source.len_bytes());
        let line = line_prefix(source, cursor);
        let Some(target) = constructor_target(&line, &self.config.scan_limits) else {
            return Vec::new();
        };

        let editing = self.editing_model(source, file);
        let model = match self.repository.resolve_class(&target, Some(&editing)) {
            Ok(model) => model,
            Err(e) => {
                log_absorbed(&e);
                return Vec::new();
            }
        };

        let mut items: Vec<CompletionItem> = model
            .constructors
            .iter()
            .map(|(signature, params)| CompletionItem::constructor(signature, params, self.config.label_width))
            .collect();
        items.sort_by(|a, b| a.label.cmp(&b.label));
        debug!("{} constructors for {}", items.len(), model.name);
        items
    }

    /// Model of `file` as it stands on disk, without touching the cache
    pub fn extract_file(&self, file: &Path) -> Result<ClassModel> {
        let text = read_source(file)?;
        let name = class_name_from_path(file);
        Ok(self.repository.extractor().extract(
            &name,
            SourceOrigin::File(file.to_path_buf()),
            Fingerprint::Unversioned,
            &text,
        ))
    }

    fn editing_model<S: TextSource + ?Sized>(&self, source: &S, file: &Path) -> ClassModel {
        let text = source.read_text(0, source.len_bytes());
        self.repository.extractor().extract(
            &class_name_from_path(file),
            SourceOrigin::Buffer(file.to_path_buf()),
            Fingerprint::Unversioned,
            &text,
        )
    }
}

impl Default for CompletionSession {
    fn default() -> Self {
        Self::new(CompletionConfig::from_env_or_default())
    }
}

fn read_source(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| CompletionError::io(path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn log_absorbed(error: &CompletionError) {
    if error.is_benign() {
        debug!("{}", error);
    } else {
        warn!("{}", error);
    }
}
