//! Transition-target resolution (spec §4.5): a pure function over an
//! already-parsed machine tree. No I/O, no async — this is run against a
//! snapshot taken before the enclosing machine is mutated by the rest of
//! analysis, so it never has to contend with it for borrows.
//!
//! Resolution tries, in order:
//!
//! 1. absolute-from-machine: the target's first dotted segment names the
//!    enclosing machine, and the rest is a descendant chain from its root.
//! 2. sibling-and-ancestor walk: starting at the transition owner's own
//!    parent and working up to the machine root, try the whole target as
//!    a descendant chain from that level. The owner's immediate parent
//!    *is* "siblings" — rule 2 and rule 3 from the spec text are the same
//!    loop, just at different depths.
//!
//! A bare `*` segment matches any single state name at that level, in
//! document order.

use syntax::ast::{Machine, State, StatePath};

pub fn resolve_target(machine: &Machine, owner_path: &[usize], target: &str) -> Option<StatePath> {
  let segments: Vec<&str> = target.split('.').filter(|s| !s.is_empty()).collect();
  let (first, rest) = segments.split_first()?;

  if *first == machine.id.as_str() {
    if rest.is_empty() {
      return Some(StatePath {
        machine: machine.id.to_string(),
        path: Vec::new(),
      });
    }
    if let Some(path) = descend(&machine.states, rest) {
      return Some(StatePath {
        machine: machine.id.to_string(),
        path,
      });
    }
  }

  for cut in (0..=owner_path.len()).rev() {
    let ancestor_children = children_at(machine, &owner_path[..cut]);
    if let Some(mut path) = descend(ancestor_children, &segments) {
      let mut full = owner_path[..cut].to_vec();
      full.append(&mut path);
      return Some(StatePath {
        machine: machine.id.to_string(),
        path: full,
      });
    }
  }

  None
}

fn children_at<'m>(machine: &'m Machine, path: &[usize]) -> &'m [State] {
  let mut states = machine.states.as_slice();
  for &i in path {
    states = states[i].states.as_slice();
  }
  states
}

/// Resolves `segments` as a descendant chain starting from `states`,
/// returning the index path relative to `states` if found. The first
/// document-order match at each level wins.
fn descend(states: &[State], segments: &[&str]) -> Option<Vec<usize>> {
  let (first, rest) = segments.split_first()?;
  for (i, state) in states.iter().enumerate() {
    if *first == "*" || state.id.as_str() == *first {
      if rest.is_empty() {
        return Some(vec![i]);
      }
      if let Some(mut tail) = descend(&state.states, rest) {
        let mut path = vec![i];
        path.append(&mut tail);
        return Some(path);
      }
    }
  }
  None
}

#[cfg(test)]
mod tests {
  use super::*;
  use span::Spanned;
  use syntax::ast::StateKind;

  fn leaf(name: &str) -> State {
    State::new(Spanned::new(0..0, name.to_string()), StateKind::Atomic, false, (0, 0).into())
  }

  fn with_children(name: &str, children: Vec<State>) -> State {
    let mut s = leaf(name);
    s.kind = StateKind::Compound;
    s.states = children;
    s
  }

  fn machine() -> Machine {
    let mut m = Machine::new(Spanned::new(0..0, "Light".to_string()), (0, 0).into());
    m.states = vec![
      with_children(
        "On",
        vec![leaf("Bright"), leaf("Dim")],
      ),
      leaf("Off"),
    ];
    m
  }

  #[test]
  fn resolves_absolute_from_machine() {
    let m = machine();
    let path = resolve_target(&m, &[0, 0], "Light.Off").unwrap();
    assert_eq!(path.path, vec![1]);
  }

  #[test]
  fn resolves_sibling() {
    let m = machine();
    // owner is On.Bright ([0, 0]); sibling of Bright is Dim.
    let path = resolve_target(&m, &[0, 0], "Dim").unwrap();
    assert_eq!(path.path, vec![0, 1]);
  }

  #[test]
  fn resolves_ancestor_walk() {
    let m = machine();
    // owner is On.Bright ([0, 0]); Off lives two levels up, at the root.
    let path = resolve_target(&m, &[0, 0], "Off").unwrap();
    assert_eq!(path.path, vec![1]);
  }

  #[test]
  fn resolves_wildcard_segment() {
    let m = machine();
    let path = resolve_target(&m, &[1], "On.*").unwrap();
    assert_eq!(path.path, vec![0, 0]);
  }

  #[test]
  fn unresolved_target_is_none() {
    let m = machine();
    assert!(resolve_target(&m, &[0, 0], "Nowhere").is_none());
  }

  #[test]
  fn resolves_root_sibling_for_machine_owned_transition() {
    let m = machine();
    // owner_path is empty for a transition declared directly on the
    // machine, not inside any state. `On` is a root-level sibling.
    let path = resolve_target(&m, &[], "On").unwrap();
    assert_eq!(path.path, vec![0]);
  }
}
