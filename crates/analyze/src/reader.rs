//! Maps a logical `@include` path to file bytes (spec §4.1).
//!
//! Resolution and reading are split on purpose: `resolve` is a handful of
//! synchronous `Path::exists` checks and runs eagerly, before a file's
//! deep analysis is even dispatched, so `ast::Import::resolved_file` can be
//! populated without waiting on the (possibly slow, possibly cyclic)
//! analysis of the file it points at. `read` does the actual I/O and is
//! the only part that needs `spawn_blocking`.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct SourceReader {
  search_dirs: Vec<PathBuf>,
}

impl SourceReader {
  pub fn new(search_dirs: Vec<PathBuf>) -> Self {
    Self { search_dirs }
  }

  /// `./`- and `.\`-prefixed paths are resolved relative to `importer`'s
  /// directory; everything else is tried against each search directory in
  /// order. Returns the first candidate that exists on disk.
  pub fn resolve(&self, logical_path: &str, importer: Option<&Path>) -> Option<PathBuf> {
    let resolved = self
      .candidates(logical_path, importer)
      .into_iter()
      .find(|candidate| candidate.exists());
    tracing::debug!(logical_path, resolved = ?resolved, "resolved import path");
    resolved
  }

  /// Reads `path`'s contents off a blocking thread.
  pub async fn read_at(&self, path: PathBuf) -> std::io::Result<String> {
    tracing::debug!(path = %path.display(), "reading source file");
    tokio::task::spawn_blocking(move || std::fs::read_to_string(&path))
      .await
      .expect("reader task panicked")
  }

  fn candidates(&self, logical_path: &str, importer: Option<&Path>) -> Vec<PathBuf> {
    if is_relative_reference(logical_path) {
      let base = importer
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_default();
      vec![base.join(logical_path)]
    } else {
      self
        .search_dirs
        .iter()
        .map(|dir| dir.join(logical_path))
        .collect()
    }
  }
}

fn is_relative_reference(path: &str) -> bool {
  path.starts_with("./") || path.starts_with(".\\")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn relative_reference_resolves_against_importer_dir() {
    let reader = SourceReader::new(vec![]);
    let candidates = reader.candidates("./button.ws", Some(Path::new("widgets/light.ws")));
    assert_eq!(candidates, vec![Path::new("widgets").join("button.ws")]);
  }

  #[test]
  fn bare_reference_tries_each_search_dir_in_order() {
    let reader = SourceReader::new(vec![PathBuf::from("a"), PathBuf::from("b")]);
    let candidates = reader.candidates("shared.ws", None);
    assert_eq!(
      candidates,
      vec![PathBuf::from("a/shared.ws"), PathBuf::from("b/shared.ws")]
    );
  }
}
