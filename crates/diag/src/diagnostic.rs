//! The structured compile-error type shared by every stage of the
//! pipeline (tokenizer, parser, analyzer, generator dispatch).
//!
//! Every error kind from spec §7 is a variant here. Variants carry a
//! [`Location`] when one is meaningful; `NotFound`/`Io` carry the
//! requesting import's location when it is known.

use std::fmt;
use std::path::PathBuf;

use span::{Position, Span};
use thiserror::Error;

use crate::report::{Level, Report};
use crate::source::Source;

/// `(file, line, column)`, as required by spec §3 for every diagnostic,
/// plus the byte span `report` highlights when rendering a snippet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
  pub file: PathBuf,
  pub position: Position,
  pub span: Span,
}

impl Location {
  pub fn new(file: impl Into<PathBuf>, position: Position, span: Span) -> Self {
    Self {
      file: file.into(),
      position,
      span,
    }
  }
}

impl fmt::Display for Location {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.file.display(), self.position)
  }
}

#[derive(Debug, Error)]
pub enum Diagnostic {
  #[error("{location}: lexical error: {message}")]
  Lexical { message: String, location: Location },

  #[error("{location}: syntax error: {message}")]
  Syntax { message: String, location: Location },

  #[error("{location}: semantic error: {message}")]
  Semantic { message: String, location: Location },

  #[error("{file}: not found in any search directory")]
  NotFound {
    file: String,
    location: Option<Location>,
  },

  #[error("{file}: {source}")]
  Io {
    file: PathBuf,
    location: Option<Location>,
    #[source]
    source: std::io::Error,
  },

  #[error("unknown generator `{name}`")]
  UnknownGenerator { name: String },
}

impl Diagnostic {
  pub fn location(&self) -> Option<&Location> {
    match self {
      Diagnostic::Lexical { location, .. }
      | Diagnostic::Syntax { location, .. }
      | Diagnostic::Semantic { location, .. } => Some(location),
      Diagnostic::NotFound { location, .. } | Diagnostic::Io { location, .. } => {
        location.as_ref()
      }
      Diagnostic::UnknownGenerator { .. } => None,
    }
  }

  /// Render a rich, colored snippet for this diagnostic against `src`, the
  /// full text of the file named by its location. Falls back to the plain
  /// [`Display`][fmt::Display] form when there is no location to highlight
  /// (e.g. `NotFound`, `UnknownGenerator`) or the span doesn't fit `src`.
  pub fn report(&self, src: &str, color: bool) -> String {
    let Some(location) = self.location() else {
      return self.to_string();
    };
    Report::error()
      .source(Source::file(location.file.display().to_string(), src))
      .message(self.to_string())
      .span(location.span)
      .color(color)
      .build()
      .emit_to_string()
      .unwrap_or_else(|_| self.to_string())
  }

  pub fn level(&self) -> Level {
    Level::Error
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn report_renders_snippet_at_location_span() {
    let src = "On*\n  tick -> Nowhere\nOff\n";
    let diagnostic = Diagnostic::Semantic {
      message: "transition target `Nowhere` does not resolve".into(),
      location: Location::new("light.ws", Position { line: 2, column: 3 }, (14, 21).into()),
    };
    let rendered = diagnostic.report(src, false);
    assert!(rendered.contains("light.ws:2"));
    assert!(rendered.contains("Nowhere"));
  }

  #[test]
  fn report_falls_back_to_display_without_a_location() {
    let diagnostic = Diagnostic::UnknownGenerator {
      name: "yaml".into(),
    };
    assert_eq!(diagnostic.report("", true), diagnostic.to_string());
  }
}
