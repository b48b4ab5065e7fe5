//! Output generators: turn an [`analyze::AnalyzedProgram`] into the text
//! a `--generator` name on the CLI asks for (spec §6).
//!
//! Generators are looked up by name in a small static dispatch table,
//! the way a plugin registry would be, rather than via a trait object —
//! there are exactly two of them and neither takes configuration beyond
//! [`GenerateOptions`].

mod json;
mod xstate;

use std::collections::HashMap;

use diag::Diagnostic;

/// Generator-specific knobs threaded in from CLI flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateOptions {
  /// `--disableCallbacks`: omit guard/action annotations from generated
  /// output rather than carrying them through as opaque callback names.
  pub disable_callbacks: bool,
}

type Backend = fn(&analyze::AnalyzedProgram, &GenerateOptions) -> String;

fn backends() -> HashMap<&'static str, Backend> {
  let mut map: HashMap<&'static str, Backend> = HashMap::new();
  map.insert("json", json::generate);
  map.insert("xstate", xstate::generate);
  map
}

pub fn generate(
  name: &str,
  program: &analyze::AnalyzedProgram,
  options: &GenerateOptions,
) -> Result<String, Diagnostic> {
  match backends().get(name) {
    Some(backend) => Ok(backend(program, options)),
    None => Err(Diagnostic::UnknownGenerator {
      name: name.to_string(),
    }),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unknown_generator_is_an_error() {
    let program = analyze::AnalyzedProgram {
      root_key: "x.ws".into(),
      scopes: Vec::new(),
    };
    let err = generate("yaml", &program, &GenerateOptions::default()).unwrap_err();
    assert!(matches!(err, Diagnostic::UnknownGenerator { .. }));
  }
}
