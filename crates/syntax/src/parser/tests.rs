use super::*;
use std::path::Path;

fn parse_ok(src: &str) -> ast::Scope {
  parse(Path::new("light.ws"), src).expect("should parse")
}

#[test]
fn implicit_machine_from_file_stem() {
  let scope = parse_ok("On*\nOff\n\non -> Off\noff -> On\n");
  assert_eq!(scope.machines.len(), 1);
  let machine = &scope.machines[0];
  assert_eq!(&*machine.id, "light");
  assert_eq!(machine.states.len(), 2);
  assert_eq!(machine.transitions.len(), 2);
  assert!(machine.states[0].initial);
}

#[test]
fn explicit_machine_header() {
  let scope = parse_ok("@machine Light\n  On*\n  Off\n");
  assert_eq!(scope.machines.len(), 1);
  assert_eq!(&*scope.machines[0].id, "Light");
  assert_eq!(scope.machines[0].states.len(), 2);
}

#[test]
fn nested_state_becomes_compound() {
  let scope = parse_ok("Home*\n  One*\n  Two\nAway\n");
  let home = &scope.machines[0].states[0];
  assert_eq!(home.kind, ast::StateKind::Compound);
  assert_eq!(home.states.len(), 2);
  assert!(home.states[0].initial);
}

#[test]
fn markers_set_state_kind() {
  let scope = parse_ok("A?\nB!\nC&\n  X\n  Y\n");
  assert_eq!(scope.machines[0].states[0].kind, ast::StateKind::Transient);
  assert_eq!(scope.machines[0].states[1].kind, ast::StateKind::Final);
  assert_eq!(scope.machines[0].states[2].kind, ast::StateKind::Parallel);
}

#[test]
fn transition_with_guard_and_multiple_events() {
  let scope = parse_ok("A\nB\n\na, b -> B : isReady\n");
  let t = &scope.machines[0].transitions[0];
  assert_eq!(&*t.event, "a,b");
  assert_eq!(&*t.target, "B");
  assert_eq!(t.guard.as_deref().map(String::as_str), Some("isReady"));
}

#[test]
fn event_protocol_with_payload() {
  let scope = parse_ok("A\n\n%click: { x: number }\n");
  let p = &scope.machines[0].event_protocols[0];
  assert_eq!(&*p.event_name, "click");
  assert_eq!(p.payload.as_deref().map(String::as_str), Some("{ x: number }"));
}

#[test]
fn use_directive_inside_state() {
  let scope = parse_ok("A\n  @use Shared\n");
  let state = &scope.machines[0].states[0];
  assert!(state.use_directive.is_some());
  assert_eq!(&*state.use_directive.as_ref().unwrap().machine_id, "Shared");
}

#[test]
fn import_lines_precede_machines() {
  let scope = parse_ok("@include \"shared.ws\"\n@machine Light\n  On\n");
  assert_eq!(scope.imports.len(), 1);
  assert_eq!(&*scope.imports[0].file, "shared.ws");
  assert_eq!(scope.machines.len(), 1);
}

#[test]
fn duplicate_use_directive_is_a_syntax_error() {
  let err = parse(Path::new("x.ws"), "A\n  @use One\n  @use Two\n").unwrap_err();
  assert!(matches!(err, Diagnostic::Syntax { .. }));
}

#[test]
fn mixing_implicit_body_with_machine_header_is_an_error() {
  let err = parse(Path::new("x.ws"), "On\n@machine Light\n  Off\n").unwrap_err();
  assert!(matches!(err, Diagnostic::Syntax { .. }));
}
