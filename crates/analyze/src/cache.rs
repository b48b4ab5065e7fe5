//! The import cache: memoizes one [`CacheEntry`] per logical file key so
//! that every imported file is read, parsed and analyzed exactly once,
//! even under concurrent and cyclic `@include` graphs (spec §4.6).
//!
//! The cache key is the literal text written after `@include`, not the
//! resolved path — two different relative strings that happen to resolve
//! to the same file on disk get two separate entries. This matches the
//! author's intent rather than the filesystem's (spec §4.6, "Key").
//!
//! Each entry exposes two futures with different lifetimes:
//!
//! - `parsed()` resolves as soon as the file has been tokenized and
//!   parsed, before any semantic validation runs. `@use` lookups await
//!   only this, so a cyclic import graph can still read another file's
//!   machine list without deadlocking on that file's own analysis (which
//!   may itself be waiting on this one).
//! - `analyzed()` resolves once the file is fully validated, with every
//!   transition target resolved. This is what the driver ultimately
//!   collects.
//!
//! Registering an entry spawns its analysis task immediately (`tokio::
//! spawn`), rather than leaving it as an inert, unpolled future: spec
//! §4.4 requires a scope's sibling imports to run "concurrently... to
//! overlap I/O", and a `Future` that nobody polls never makes progress.

use std::future::Future;
use std::sync::{Arc, OnceLock};

use diag::Diagnostic;
use futures::future::{BoxFuture, FutureExt, Shared};
use indexmap::IndexMap;
use tokio::sync::{oneshot, Mutex};

use crate::reader::SourceReader;

type AnalyzeResult = Result<Arc<syntax::ast::Scope>, Arc<Diagnostic>>;

pub struct CacheEntry {
  parsed_tx: std::sync::Mutex<Option<oneshot::Sender<Arc<syntax::ast::Scope>>>>,
  parsed: Shared<BoxFuture<'static, Arc<syntax::ast::Scope>>>,
  analyzed: OnceLock<Shared<BoxFuture<'static, AnalyzeResult>>>,
  resolved_file: OnceLock<std::path::PathBuf>,
}

impl CacheEntry {
  fn new() -> Self {
    let (tx, rx) = oneshot::channel();
    let parsed = async move { rx.await.expect("parsed scope was never published") }
      .boxed()
      .shared();
    Self {
      parsed_tx: std::sync::Mutex::new(Some(tx)),
      parsed,
      analyzed: OnceLock::new(),
      resolved_file: OnceLock::new(),
    }
  }

  /// Publishes the tokenized/parsed (but not yet validated) scope. Called
  /// once, by the in-flight analysis task, before semantic validation
  /// begins.
  pub fn publish_parsed(&self, scope: Arc<syntax::ast::Scope>) {
    if let Some(tx) = self.parsed_tx.lock().unwrap().take() {
      let _ = tx.send(scope);
    }
  }

  pub fn set_resolved_file(&self, path: std::path::PathBuf) {
    let _ = self.resolved_file.set(path);
  }

  pub fn resolved_file(&self) -> Option<&std::path::PathBuf> {
    self.resolved_file.get()
  }

  pub async fn parsed(&self) -> Arc<syntax::ast::Scope> {
    self.parsed.clone().await
  }

  pub async fn analyzed(&self) -> AnalyzeResult {
    self
      .analyzed
      .get()
      .expect("analyzed future registered at entry creation")
      .clone()
      .await
  }
}

pub struct ImportCache {
  reader: SourceReader,
  entries: Mutex<IndexMap<String, Arc<CacheEntry>>>,
}

impl ImportCache {
  pub fn new(reader: SourceReader) -> Arc<Self> {
    Arc::new(Self {
      reader,
      entries: Mutex::new(IndexMap::new()),
    })
  }

  pub fn reader(&self) -> &SourceReader {
    &self.reader
  }

  /// Returns the entry for `key`, registering and spawning a fresh one via
  /// `start` if this is the first time `key` has been seen. `start` is
  /// called while the registration lock is still held, so a second
  /// concurrent caller for the same `key` always observes either no entry
  /// or a fully-registered one, never one half-built.
  pub async fn get_or_start<F, Fut>(self: &Arc<Self>, key: &str, start: F) -> Arc<CacheEntry>
  where
    F: FnOnce(Arc<CacheEntry>) -> Fut,
    Fut: Future<Output = AnalyzeResult> + Send + 'static,
  {
    let mut entries = self.entries.lock().await;
    if let Some(entry) = entries.get(key) {
      tracing::debug!(key, "cache hit");
      return entry.clone();
    }
    tracing::debug!(key, "cache miss, spawning analysis task");
    let entry = Arc::new(CacheEntry::new());
    entries.insert(key.to_string(), entry.clone());

    let task = tokio::spawn(start(entry.clone()));
    let shared = async move { task.await.expect("analysis task panicked") }
      .boxed()
      .shared();
    entry
      .analyzed
      .set(shared)
      .unwrap_or_else(|_| unreachable!("freshly created entry's `analyzed` is always empty"));

    entry
  }

  pub async fn entry(&self, key: &str) -> Option<Arc<CacheEntry>> {
    self.entries.lock().await.get(key).cloned()
  }
}
