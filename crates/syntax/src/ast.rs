//! The WireState abstract syntax tree.
//!
//! Every node owns its data outright (no `'src`-borrowed strings): a
//! `Scope` is produced once per file by the parser and then handed to the
//! analyzer, which may keep it alive inside the import cache for the
//! whole compile, concurrently, across `await` points (see
//! `wirestate_analyze::cache`). Borrowing from the source buffer would tie
//! every cached scope's lifetime to a source string that has to outlive
//! the whole compile; owning `String`s avoids that entirely, at the cost
//! of one allocation per identifier.
//!
//! Parent links are logical, not owned: a child `State` does not point
//! back at its parent or enclosing `Scope`. Everything that needs to
//! "reach up" (transition-target resolution, `@use` lookups) is
//! implemented as a function over the tree rather than a pointer on the
//! node (see spec §9, "cyclic AST back-references").

use span::Spanned;

/// An identifier together with the span it was parsed from.
pub type Ident = Spanned<String>;

#[derive(Debug, Clone)]
pub struct Scope {
  pub imports: Vec<Import>,
  pub machines: Vec<Machine>,
}

impl Scope {
  pub fn new() -> Self {
    Self {
      imports: Vec::new(),
      machines: Vec::new(),
    }
  }
}

impl Default for Scope {
  fn default() -> Self {
    Self::new()
  }
}

#[derive(Debug, Clone)]
pub struct Import {
  /// The path exactly as written in the `@include` directive.
  pub file: Spanned<String>,
  /// Filled in by the analyzer once the file has actually been found.
  pub resolved_file: Option<std::path::PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Machine {
  pub id: Ident,
  pub states: Vec<State>,
  pub transitions: Vec<Transition>,
  pub event_protocols: Vec<EventProtocol>,
  pub span: span::Span,
}

impl Machine {
  pub fn new(id: Ident, span: span::Span) -> Self {
    Self {
      id,
      states: Vec::new(),
      transitions: Vec::new(),
      event_protocols: Vec::new(),
      span,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
  Atomic,
  Compound,
  Parallel,
  Transient,
  Final,
}

#[derive(Debug, Clone)]
pub struct State {
  pub id: Ident,
  pub kind: StateKind,
  /// Set by the parser when the state carries the `*` marker; the
  /// analyzer may additionally set this to `true` on the first child of
  /// a parent with no explicit initial child (spec §4.4).
  pub initial: bool,
  pub states: Vec<State>,
  pub transitions: Vec<Transition>,
  pub event_protocols: Vec<EventProtocol>,
  pub use_directive: Option<UseDirective>,
  pub span: span::Span,
}

impl State {
  pub fn new(id: Ident, kind: StateKind, initial: bool, span: span::Span) -> Self {
    Self {
      id,
      kind,
      initial,
      states: Vec::new(),
      transitions: Vec::new(),
      event_protocols: Vec::new(),
      use_directive: None,
      span,
    }
  }
}

#[derive(Debug, Clone)]
pub struct Transition {
  /// The raw, comma-separated event list as written.
  pub event: Spanned<String>,
  /// The raw dotted target path as written.
  pub target: Spanned<String>,
  pub guard: Option<Spanned<String>>,
  /// Filled in by the analyzer (spec §4.5); absent until then.
  pub resolved_target: Option<StatePath>,
  pub span: span::Span,
}

#[derive(Debug, Clone)]
pub struct EventProtocol {
  pub event_name: Spanned<String>,
  pub payload: Option<Spanned<String>>,
  pub span: span::Span,
}

#[derive(Debug, Clone)]
pub struct UseDirective {
  pub machine_id: Ident,
  pub span: span::Span,
}

/// A resolved transition target, expressed as a path of child indices
/// from a machine root rather than a pointer (spec §9): `machine` names
/// the owning machine, and `path` is empty when the target *is* the
/// machine root, or else a sequence of `states[i]` indices to descend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePath {
  pub machine: String,
  pub path: Vec<usize>,
}

/// Canonical form of a comma-separated event list: split on `,`, trim
/// each part, sort lexicographically, rejoin with `,`. This is the
/// *only* equality rule for transitions and event protocols (spec §4.4,
/// §9 "normalization as canonicalization"), so both the analyzer's
/// uniqueness checks and the JSON generator call this one routine.
pub fn normalize_event(raw: &str) -> String {
  let mut parts: Vec<&str> = raw.split(',').map(|p| p.trim()).collect();
  parts.sort_unstable();
  parts.join(",")
}
