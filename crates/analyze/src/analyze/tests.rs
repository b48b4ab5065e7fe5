use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

static COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A scratch directory under the system temp dir, torn down on drop.
struct Scratch {
  dir: PathBuf,
}

impl Scratch {
  fn new() -> Self {
    let id = COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!("wirestate-analyze-test-{id}"));
    std::fs::create_dir_all(&dir).unwrap();
    Self { dir }
  }

  fn write(&self, name: &str, contents: &str) -> PathBuf {
    let path = self.dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
  }
}

impl Drop for Scratch {
  fn drop(&mut self) {
    let _ = std::fs::remove_dir_all(&self.dir);
  }
}

#[tokio::test]
async fn resolves_sibling_transition_target() {
  let scratch = Scratch::new();
  let entry = scratch.write("light.ws", "On*\n  on -> Off\nOff\n  off -> On\n");

  let program = analyze_root(entry, vec![scratch.dir.clone()]).await.unwrap();
  assert_eq!(program.scopes.len(), 1);
  let machine = &program.scopes[0].1.machines[0];
  let t = &machine.states[0].transitions[0];
  assert_eq!(t.resolved_target.as_ref().unwrap().path, vec![1]);
}

#[tokio::test]
async fn cross_file_use_resolves_against_imported_machine() {
  let scratch = Scratch::new();
  scratch.write("shared.ws", "@machine Shared\n  Idle*\n");
  let entry = scratch.write(
    "light.ws",
    "@include \"shared.ws\"\n@machine Light\n  On*\n    @use Shared\n",
  );

  let program = analyze_root(entry, vec![scratch.dir.clone()]).await.unwrap();
  assert_eq!(program.scopes.len(), 2);
  assert_eq!(program.scopes[0].0, program.root_key);
}

#[tokio::test]
async fn missing_import_is_not_found() {
  let scratch = Scratch::new();
  let entry = scratch.write("light.ws", "@include \"./missing.ws\"\nOn\n");

  let err = analyze_root(entry, vec![scratch.dir.clone()]).await.unwrap_err();
  assert!(matches!(&*err, Diagnostic::NotFound { .. }));
}

#[tokio::test]
async fn import_cycle_terminates_and_each_scope_analyzed_once() {
  let scratch = Scratch::new();
  let entry = scratch.dir.join("a.ws");
  // `b.ws` includes `a.ws` by the exact string `analyze_root` will be
  // called with below, so the cache key a cyclic lookup produces matches
  // the root's own key and the in-flight entry is reused instead of
  // re-registering (and re-analyzing) the root from scratch.
  scratch.write(
    "b.ws",
    &format!(
      "@include {:?}\n@machine B\n  Idle*\n    @use A\n",
      entry.to_string_lossy()
    ),
  );
  std::fs::write(&entry, "@include \"./b.ws\"\n@machine A\n  Idle*\n    @use B\n").unwrap();

  let program = analyze_root(entry, vec![scratch.dir.clone()]).await.unwrap();
  assert_eq!(program.scopes.len(), 2);
  let keys: Vec<&str> = program.scopes.iter().map(|(k, _)| k.as_str()).collect();
  assert_eq!(keys.iter().filter(|k| k.ends_with("b.ws")).count(), 1);
}

#[tokio::test]
async fn duplicate_sibling_state_ids_are_rejected() {
  let scratch = Scratch::new();
  let entry = scratch.write("x.ws", "A\nA\n");
  let err = analyze_root(entry, vec![scratch.dir.clone()]).await.unwrap_err();
  assert!(matches!(&*err, Diagnostic::Semantic { .. }));
}

#[tokio::test]
async fn unresolved_transition_target_is_rejected() {
  let scratch = Scratch::new();
  let entry = scratch.write("x.ws", "A\n  a -> Nowhere\n");
  let err = analyze_root(entry, vec![scratch.dir.clone()]).await.unwrap_err();
  assert!(matches!(&*err, Diagnostic::Semantic { .. }));
}
