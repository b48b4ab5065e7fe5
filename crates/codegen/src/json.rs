//! Canonical JSON generator (spec §6, "json"): a direct, lossless
//! serialization of every analyzed scope's AST, keyed by logical file
//! path in the order [`analyze::AnalyzedProgram::scopes`] already walks
//! them — which is itself import-graph document order, not cache
//! scheduling order, so this output is byte-identical across runs
//! (invariant 4).

use analyze::AnalyzedProgram;
use serde_json::{Map, Value};
use syntax::ast;

use crate::GenerateOptions;

pub fn generate(program: &AnalyzedProgram, _options: &GenerateOptions) -> String {
  let mut root = Map::new();
  for (key, scope) in &program.scopes {
    root.insert(key.clone(), scope_json(scope));
  }
  serde_json::to_string(&Value::Object(root)).expect("a validated AST always serializes")
}

fn scope_json(scope: &ast::Scope) -> Value {
  serde_json::json!({
    "imports": scope.imports.iter().map(import_json).collect::<Vec<_>>(),
    "machines": scope.machines.iter().map(machine_json).collect::<Vec<_>>(),
  })
}

fn import_json(import: &ast::Import) -> Value {
  serde_json::json!({
    "file": &*import.file,
    "resolvedFile": import
      .resolved_file
      .as_ref()
      .map(|p| p.to_string_lossy().into_owned()),
  })
}

fn machine_json(machine: &ast::Machine) -> Value {
  serde_json::json!({
    "id": &*machine.id,
    "states": machine.states.iter().map(state_json).collect::<Vec<_>>(),
    "transitions": machine.transitions.iter().map(transition_json).collect::<Vec<_>>(),
    "eventProtocols": machine.event_protocols.iter().map(protocol_json).collect::<Vec<_>>(),
  })
}

fn state_json(state: &ast::State) -> Value {
  serde_json::json!({
    "id": &*state.id,
    "kind": state_kind_str(state.kind),
    "initial": state.initial,
    "states": state.states.iter().map(state_json).collect::<Vec<_>>(),
    "transitions": state.transitions.iter().map(transition_json).collect::<Vec<_>>(),
    "eventProtocols": state.event_protocols.iter().map(protocol_json).collect::<Vec<_>>(),
    "use": state.use_directive.as_ref().map(|u| u.machine_id.to_string()),
  })
}

fn transition_json(t: &ast::Transition) -> Value {
  serde_json::json!({
    "event": &*t.event,
    "target": &*t.target,
    "guard": t.guard.as_deref(),
    "resolvedTarget": t.resolved_target.as_ref().map(state_path_json),
  })
}

fn state_path_json(path: &ast::StatePath) -> Value {
  serde_json::json!({
    "machine": path.machine,
    "path": path.path,
  })
}

fn protocol_json(p: &ast::EventProtocol) -> Value {
  serde_json::json!({
    "eventName": &*p.event_name,
    "payload": p.payload.as_deref(),
  })
}

fn state_kind_str(kind: ast::StateKind) -> &'static str {
  match kind {
    ast::StateKind::Atomic => "atomic",
    ast::StateKind::Compound => "compound",
    ast::StateKind::Parallel => "parallel",
    ast::StateKind::Transient => "transient",
    ast::StateKind::Final => "final",
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;

  fn program_from(src: &str, file: &str) -> AnalyzedProgram {
    let scope = syntax::parser::parse(std::path::Path::new(file), src).unwrap();
    AnalyzedProgram {
      root_key: file.to_string(),
      scopes: vec![(file.to_string(), Arc::new(scope))],
    }
  }

  #[test]
  fn emits_one_top_level_key_per_scope() {
    let program = program_from("On*\nOff\n", "light.ws");
    let out = generate(&program, &GenerateOptions::default());
    let value: Value = serde_json::from_str(&out).unwrap();
    assert!(value.get("light.ws").is_some());
  }

  #[test]
  fn state_kind_round_trips_as_lowercase_string() {
    let program = program_from("A&\n  X\n  Y\n", "m.ws");
    let out = generate(&program, &GenerateOptions::default());
    assert!(out.contains("\"parallel\""));
  }
}
