use super::*;
use std::path::Path;

fn lex(src: &str) -> Vec<Token> {
  tokenize(Path::new("test.ws"), src).expect("should tokenize")
}

fn kinds(src: &str) -> Vec<TokenKind> {
  lex(src).into_iter().map(|t| t.kind).collect()
}

#[test]
fn lexes_flat_machine() {
  let src = "@machine Light\nOn\nOff\n";
  let got = kinds(src);
  assert_eq!(
    got,
    vec![
      TokenKind::AtDirective("machine".into()),
      TokenKind::Identifier("Light".into()),
      TokenKind::Newline,
      TokenKind::Identifier("On".into()),
      TokenKind::Newline,
      TokenKind::Identifier("Off".into()),
      TokenKind::Newline,
      TokenKind::Eof,
    ]
  );
}

#[test]
fn lexes_nested_states_with_indent_and_dedent() {
  let src = "Home*\n  One\n  Two\nThree\n";
  let got = kinds(src);
  assert_eq!(
    got,
    vec![
      TokenKind::Identifier("Home".into()),
      TokenKind::StateMarker(Marker::Initial),
      TokenKind::Newline,
      TokenKind::Indent,
      TokenKind::Identifier("One".into()),
      TokenKind::Newline,
      TokenKind::Identifier("Two".into()),
      TokenKind::Newline,
      TokenKind::Dedent,
      TokenKind::Identifier("Three".into()),
      TokenKind::Newline,
      TokenKind::Eof,
    ]
  );
}

#[test]
fn lexes_transition_with_event_list_and_guard() {
  let src = "a, b -> Target : someGuard\n";
  let got = kinds(src);
  assert_eq!(
    got,
    vec![
      TokenKind::Identifier("a".into()),
      TokenKind::Comma,
      TokenKind::Identifier("b".into()),
      TokenKind::Arrow,
      TokenKind::Identifier("Target".into()),
      TokenKind::Colon,
      TokenKind::Text("someGuard".into()),
      TokenKind::Newline,
      TokenKind::Eof,
    ]
  );
}

#[test]
fn lexes_event_protocol_sigil() {
  let src = "%click: { x: number }\n";
  let got = kinds(src);
  assert_eq!(
    got,
    vec![
      TokenKind::Protocol,
      TokenKind::Identifier("click".into()),
      TokenKind::Colon,
      TokenKind::Text("{ x: number }".into()),
      TokenKind::Newline,
      TokenKind::Eof,
    ]
  );
}

#[test]
fn lexes_state_name_with_spaces_and_trailing_marker() {
  let src = "Wait For Input?\n";
  let got = kinds(src);
  assert_eq!(
    got,
    vec![
      TokenKind::Identifier("Wait For Input".into()),
      TokenKind::StateMarker(Marker::Transient),
      TokenKind::Newline,
      TokenKind::Eof,
    ]
  );
}

#[test]
fn lexes_include_string_literal() {
  let src = "@include \"shared/button.ws\"\n";
  let got = kinds(src);
  assert_eq!(
    got,
    vec![
      TokenKind::AtDirective("include".into()),
      TokenKind::StringLiteral("shared/button.ws".into()),
      TokenKind::Newline,
      TokenKind::Eof,
    ]
  );
}

#[test]
fn skips_blank_and_comment_only_lines() {
  let src = "Home\n\n  # a comment\nAway\n";
  let got = kinds(src);
  assert_eq!(
    got,
    vec![
      TokenKind::Identifier("Home".into()),
      TokenKind::Newline,
      TokenKind::Identifier("Away".into()),
      TokenKind::Newline,
      TokenKind::Eof,
    ]
  );
}

#[test]
fn rejects_tab_after_space_in_indentation() {
  let src = "Home\n \tOne\n";
  assert!(tokenize(Path::new("test.ws"), src).is_err());
}

#[test]
fn rejects_dedent_that_matches_no_outer_level() {
  let src = "Home\n    One\n  Two\n";
  assert!(tokenize(Path::new("test.ws"), src).is_err());
}

#[test]
fn rejects_unknown_directive() {
  let src = "@frobnicate Thing\n";
  assert!(tokenize(Path::new("test.ws"), src).is_err());
}
