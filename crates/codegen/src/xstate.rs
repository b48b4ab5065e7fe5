//! XState v4-style machine config generator (spec §6, "xstate").
//!
//! Resolved transition targets are rendered using XState's absolute
//! target syntax (`#machineId.path.to.state`), since every target this
//! compiler produces has already been fully resolved to a path from the
//! machine root (spec §4.5) — there is never a reason to emit a relative
//! target. Guard/action text is carried through verbatim as a `cond`
//! name: this generator does not interpret it (spec's guard/action
//! expressions are opaque), it only decides whether to mention it at all,
//! which is exactly what `--disableCallbacks` controls.

use analyze::AnalyzedProgram;
use serde_json::{Map, Value};
use syntax::ast;

use crate::GenerateOptions;

pub fn generate(program: &AnalyzedProgram, options: &GenerateOptions) -> String {
  let mut root = Map::new();
  for (key, scope) in &program.scopes {
    let machines: Vec<Value> = scope
      .machines
      .iter()
      .map(|m| machine_config(m, options))
      .collect();
    root.insert(key.clone(), Value::Array(machines));
  }
  serde_json::to_string(&Value::Object(root)).expect("a validated AST always serializes")
}

fn machine_config(machine: &ast::Machine, options: &GenerateOptions) -> Value {
  let mut obj = Map::new();
  obj.insert("id".into(), Value::String(machine.id.to_string()));
  if let Some(initial) = machine.states.iter().find(|s| s.initial) {
    obj.insert("initial".into(), Value::String(initial.id.to_string()));
  }
  if !machine.states.is_empty() {
    obj.insert("states".into(), states_map(&machine.states, machine, options));
  }
  let on = transitions_map(&machine.transitions, machine, options);
  if !on.is_empty() {
    obj.insert("on".into(), Value::Object(on));
  }
  Value::Object(obj)
}

fn states_map(states: &[ast::State], machine: &ast::Machine, options: &GenerateOptions) -> Value {
  let mut map = Map::new();
  for state in states {
    map.insert(state.id.to_string(), state_config(state, machine, options));
  }
  Value::Object(map)
}

fn state_config(state: &ast::State, machine: &ast::Machine, options: &GenerateOptions) -> Value {
  let mut obj = Map::new();
  if let Some(ty) = xstate_type(state.kind) {
    obj.insert("type".into(), Value::String(ty.to_string()));
  }
  if let Some(initial) = state.states.iter().find(|s| s.initial) {
    obj.insert("initial".into(), Value::String(initial.id.to_string()));
  }
  if !state.states.is_empty() {
    obj.insert("states".into(), states_map(&state.states, machine, options));
  }
  let on = transitions_map(&state.transitions, machine, options);
  if !on.is_empty() {
    obj.insert("on".into(), Value::Object(on));
  }
  Value::Object(obj)
}

fn transitions_map(
  transitions: &[ast::Transition],
  machine: &ast::Machine,
  options: &GenerateOptions,
) -> Map<String, Value> {
  let mut map = Map::new();
  for t in transitions {
    let target = t
      .resolved_target
      .as_ref()
      .map(|p| target_name(machine, p))
      .unwrap_or_default();
    let value = match (&t.guard, options.disable_callbacks) {
      (Some(guard), false) => {
        let mut obj = Map::new();
        obj.insert("target".into(), Value::String(target));
        obj.insert("cond".into(), Value::String(guard.to_string()));
        Value::Object(obj)
      }
      _ => Value::String(target),
    };
    map.insert(ast::normalize_event(&t.event), value);
  }
  map
}

fn target_name(machine: &ast::Machine, path: &ast::StatePath) -> String {
  let mut segments = vec![format!("#{}", machine.id)];
  let mut states = machine.states.as_slice();
  for &i in &path.path {
    segments.push(states[i].id.to_string());
    states = states[i].states.as_slice();
  }
  segments.join(".")
}

fn xstate_type(kind: ast::StateKind) -> Option<&'static str> {
  match kind {
    ast::StateKind::Parallel => Some("parallel"),
    ast::StateKind::Final => Some("final"),
    ast::StateKind::Atomic | ast::StateKind::Compound | ast::StateKind::Transient => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  async fn analyzed(src: &str, file: &str) -> AnalyzedProgram {
    let scratch_dir = std::env::temp_dir().join(format!("wirestate-xstate-test-{file}"));
    std::fs::create_dir_all(&scratch_dir).unwrap();
    let path = scratch_dir.join(file);
    std::fs::write(&path, src).unwrap();
    let program = analyze::analyze_root(path, vec![scratch_dir.clone()])
      .await
      .unwrap();
    let _ = std::fs::remove_dir_all(&scratch_dir);
    program
  }

  #[tokio::test]
  async fn resolved_target_becomes_absolute_xstate_path() {
    let program = analyzed("On*\n  on -> Off\nOff\n", "light.ws").await;
    let out = generate(&program, &GenerateOptions::default());
    assert!(out.contains("#light.Off"));
  }

  #[tokio::test]
  async fn disable_callbacks_omits_guard_condition() {
    let program = analyzed("On*\n  on -> Off : isReady\nOff\n", "light.ws").await;
    let with = generate(&program, &GenerateOptions::default());
    let without = generate(
      &program,
      &GenerateOptions {
        disable_callbacks: true,
      },
    );
    assert!(with.contains("isReady"));
    assert!(!without.contains("isReady"));
  }
}
