//! Per-scope semantic validation and the compile driver (spec §4.4).
//!
//! A scope is analyzed in three steps: parse, register its imports with
//! the cache (eagerly resolving each one's path so `Import::resolved_file`
//! is available without waiting on that import's own analysis — see
//! `reader`), then validate every machine recursively. `@use` resolution
//! is the one step that reaches outside the current file, awaiting
//! another scope's *parsed* (not analyzed) snapshot so that import cycles
//! can't deadlock (spec §4.6, §9).

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use diag::{Diagnostic, Location};
use futures::future::BoxFuture;
use futures::FutureExt;
use span::{LineIndex, Position, Span};
use syntax::ast;

use crate::cache::{CacheEntry, ImportCache};
use crate::reader::SourceReader;
use crate::resolve;

type AnalyzeResult = Result<Arc<ast::Scope>, Arc<Diagnostic>>;

/// Every scope reached from the entry file, in import-graph document
/// order (a breadth-first walk of `imports`, starting at the root), each
/// keyed by its logical file path. This is the order the JSON generator
/// emits its top-level object in (spec §6, invariant 4).
#[derive(Debug)]
pub struct AnalyzedProgram {
  pub root_key: String,
  pub scopes: Vec<(String, Arc<ast::Scope>)>,
}

pub async fn analyze_root(
  input_file: PathBuf,
  search_dirs: Vec<PathBuf>,
) -> Result<AnalyzedProgram, Arc<Diagnostic>> {
  let cache = ImportCache::new(SourceReader::new(search_dirs));
  let key = input_file.to_string_lossy().into_owned();

  let entry = {
    let cache_for_task = cache.clone();
    let key_for_task = key.clone();
    let file_for_task = input_file.clone();
    cache
      .get_or_start(&key, move |entry| {
        analyze_root_source(cache_for_task, key_for_task, file_for_task, entry)
      })
      .await
  };

  let root_scope = entry.analyzed().await?;
  let scopes = collect_ordered(&cache, &key, root_scope).await?;
  Ok(AnalyzedProgram {
    root_key: key,
    scopes,
  })
}

async fn analyze_root_source(
  cache: Arc<ImportCache>,
  key: String,
  file: PathBuf,
  entry: Arc<CacheEntry>,
) -> AnalyzeResult {
  tracing::debug!(file = %file.display(), "reading entry file");
  let src = tokio::fs::read_to_string(&file).await.map_err(|source| {
    Arc::new(Diagnostic::Io {
      file: file.clone(),
      location: None,
      source,
    })
  })?;
  analyze_source(cache, key, file, src, entry).await
}

fn analyze_import_source(
  cache: Arc<ImportCache>,
  key: String,
  file: PathBuf,
  entry: Arc<CacheEntry>,
) -> BoxFuture<'static, AnalyzeResult> {
  async move {
    let src = cache.reader().read_at(file.clone()).await.map_err(|source| {
      Arc::new(Diagnostic::Io {
        file: file.clone(),
        location: None,
        source,
      })
    })?;
    analyze_source(cache, key, file, src, entry).await
  }
  .boxed()
}

/// Shared by the entry file and every `@include`: tokenize, parse,
/// register imports, validate.
async fn analyze_source(
  cache: Arc<ImportCache>,
  key: String,
  file: PathBuf,
  src: String,
  entry: Arc<CacheEntry>,
) -> AnalyzeResult {
  let mut scope = syntax::parser::parse(&file, &src).map_err(Arc::new)?;

  for imp in scope.imports.iter_mut() {
    let import_key = imp.file.to_string();
    let requested_at = Some(Location::new(
      file.clone(),
      line_position(&src, imp.file.span),
      imp.file.span,
    ));
    match cache.reader().resolve(&import_key, Some(file.as_path())) {
      Some(path) => {
        imp.resolved_file = Some(path.clone());
        let entry = dispatch_import(&cache, &import_key, path.clone()).await;
        entry.set_resolved_file(path);
      }
      None => {
        return Err(Arc::new(Diagnostic::NotFound {
          file: import_key,
          location: requested_at,
        }))
      }
    }
  }

  entry.publish_parsed(Arc::new(scope.clone()));

  let scope_machines = scope.machines.clone();
  let scope_imports = scope.imports.clone();

  let mut seen_machines = HashSet::new();
  for m in &scope.machines {
    if !seen_machines.insert(m.id.to_string()) {
      return Err(semantic_err(
        &file,
        &src,
        m.id.span,
        format!("duplicate machine `{}`", &*m.id),
      ));
    }
  }

  for machine in scope.machines.iter_mut() {
    let snapshot = machine.clone();
    validate_body(
      &file,
      &src,
      &cache,
      &snapshot,
      &scope_machines,
      &scope_imports,
      &mut machine.states,
      &mut machine.transitions,
      &mut machine.event_protocols,
      None,
      Vec::new(),
    )
    .await?;
  }

  Ok(Arc::new(scope))
}

async fn dispatch_import(
  cache: &Arc<ImportCache>,
  key: &str,
  resolved_path: PathBuf,
) -> Arc<CacheEntry> {
  tracing::debug!(key, resolved_path = %resolved_path.display(), "dispatching import analysis");
  let cache_for_task = cache.clone();
  let key_for_task = key.to_string();
  cache
    .get_or_start(key, move |entry| {
      analyze_import_source(cache_for_task, key_for_task, resolved_path, entry)
    })
    .await
}

#[allow(clippy::too_many_arguments)]
fn validate_body<'a>(
  file: &'a Path,
  src: &'a str,
  cache: &'a Arc<ImportCache>,
  machine: &'a ast::Machine,
  scope_machines: &'a [ast::Machine],
  scope_imports: &'a [ast::Import],
  states: &'a mut Vec<ast::State>,
  transitions: &'a mut Vec<ast::Transition>,
  protocols: &'a mut Vec<ast::EventProtocol>,
  use_directive: Option<ast::UseDirective>,
  owner_path: Vec<usize>,
) -> BoxFuture<'a, Result<(), Arc<Diagnostic>>> {
  async move {
    let mut seen_ids = HashSet::new();
    for s in states.iter() {
      if !seen_ids.insert(s.id.to_string()) {
        return Err(semantic_err(
          file,
          src,
          s.id.span,
          format!("duplicate state id `{}`", &*s.id),
        ));
      }
    }

    let mut seen_events = HashSet::new();
    for t in transitions.iter() {
      let norm = ast::normalize_event(&t.event);
      if !seen_events.insert(norm.clone()) {
        return Err(semantic_err(
          file,
          src,
          t.span,
          format!("duplicate transition for event `{norm}`"),
        ));
      }
    }

    let mut seen_protocols = HashSet::new();
    for p in protocols.iter() {
      let norm = ast::normalize_event(&p.event_name);
      if !seen_protocols.insert(norm.clone()) {
        return Err(semantic_err(
          file,
          src,
          p.span,
          format!("duplicate event protocol `{norm}`"),
        ));
      }
    }

    for t in transitions.iter_mut() {
      match resolve::resolve_target(machine, &owner_path, &t.target) {
        Some(path) => t.resolved_target = Some(path),
        None => {
          return Err(semantic_err(
            file,
            src,
            t.span,
            format!("transition target `{}` does not resolve", &*t.target),
          ))
        }
      }
    }

    if !states.is_empty() {
      let mut initial_idx = None;
      for (i, s) in states.iter().enumerate() {
        if s.initial {
          if initial_idx.is_some() {
            return Err(semantic_err(
              file,
              src,
              s.id.span,
              "more than one initial child".to_string(),
            ));
          }
          initial_idx = Some(i);
        }
      }
      if initial_idx.is_none() {
        states[0].initial = true;
      }
    }

    for (i, state) in states.iter_mut().enumerate() {
      if state.kind == ast::StateKind::Transient && !state.states.is_empty() {
        return Err(semantic_err(
          file,
          src,
          state.span,
          format!("transient state `{}` may not have children", &*state.id),
        ));
      }
      if state.kind == ast::StateKind::Atomic && !state.states.is_empty() {
        state.kind = ast::StateKind::Compound;
      }

      let mut child_path = owner_path.clone();
      child_path.push(i);
      let child_use = state.use_directive.clone();
      validate_body(
        file,
        src,
        cache,
        machine,
        scope_machines,
        scope_imports,
        &mut state.states,
        &mut state.transitions,
        &mut state.event_protocols,
        child_use,
        child_path,
      )
      .await?;
    }

    if let Some(use_dir) = use_directive {
      let found = resolve_use(scope_machines, scope_imports, cache, use_dir.machine_id.as_str()).await;
      if !found {
        return Err(semantic_err(
          file,
          src,
          use_dir.span,
          format!(
            "`@use {}` does not resolve to a machine in this file or any import",
            &*use_dir.machine_id
          ),
        ));
      }
    }

    Ok(())
  }
  .boxed()
}

async fn resolve_use(
  machines: &[ast::Machine],
  imports: &[ast::Import],
  cache: &Arc<ImportCache>,
  target_id: &str,
) -> bool {
  let mut visited = HashSet::new();
  resolve_use_inner(machines, imports, cache, target_id, &mut visited).await
}

fn resolve_use_inner<'a>(
  machines: &'a [ast::Machine],
  imports: &'a [ast::Import],
  cache: &'a Arc<ImportCache>,
  target_id: &'a str,
  visited: &'a mut HashSet<String>,
) -> BoxFuture<'a, bool> {
  async move {
    if machines.iter().any(|m| m.id.as_str() == target_id) {
      return true;
    }
    for imp in imports {
      let key = imp.file.to_string();
      if !visited.insert(key.clone()) {
        continue;
      }
      if let Some(entry) = cache.entry(&key).await {
        let imported = entry.parsed().await;
        if resolve_use_inner(&imported.machines, &imported.imports, cache, target_id, visited).await {
          return true;
        }
      }
    }
    false
  }
  .boxed()
}

/// Walks the import graph from `root` in document order (breadth-first
/// over each scope's own `imports`), deduplicating by key, collecting
/// every scope's fully-analyzed result. This — not cache insertion order
/// — is what makes output ordering independent of scheduling (spec §9,
/// invariant 4).
async fn collect_ordered(
  cache: &Arc<ImportCache>,
  root_key: &str,
  root_scope: Arc<ast::Scope>,
) -> Result<Vec<(String, Arc<ast::Scope>)>, Arc<Diagnostic>> {
  let mut seen = HashSet::new();
  seen.insert(root_key.to_string());
  let mut queue = vec![(root_key.to_string(), root_scope)];
  let mut i = 0;
  while i < queue.len() {
    let (_, scope) = queue[i].clone();
    for imp in &scope.imports {
      let child_key = imp.file.to_string();
      if seen.insert(child_key.clone()) {
        if let Some(entry) = cache.entry(&child_key).await {
          let child_scope = entry.analyzed().await?;
          queue.push((child_key, child_scope));
        }
      }
    }
    i += 1;
  }
  Ok(queue)
}

fn semantic_err(file: &Path, src: &str, span: Span, message: String) -> Arc<Diagnostic> {
  Arc::new(Diagnostic::Semantic {
    message,
    location: Location::new(file.to_path_buf(), line_position(src, span), span),
  })
}

fn line_position(src: &str, span: Span) -> Position {
  LineIndex::new(src).position(src, span.start)
}

#[cfg(test)]
mod tests;
