//! Recursive-descent parser over the token stream produced by
//! [`crate::lexer`].
//!
//! The grammar (spec §4.3):
//!
//! ```text
//! Scope       := Import* (Machine+ | StateBody)
//! Import      := '@include' StringLiteral Newline
//! Machine     := '@machine' Identifier Newline [Indent StateBody Dedent]
//! StateBody   := (State | Transition | EventProtocol | UseDirective)*
//! State       := Identifier [Marker] Newline [Indent StateBody Dedent]
//! Transition  := Event ('->' ) Target [':' GuardText] Newline
//! EventProtocol := '%' Event [':' PayloadText] Newline
//! UseDirective  := '@use' Identifier Newline
//! ```
//!
//! Because the lexer already turns indentation into `Indent`/`Dedent`
//! tokens, this parser consumes them the way a brace-delimited grammar
//! would consume `{`/`}` — there is no `IndentStack` here, unlike the
//! teacher's `parser2::indent::IndentStack`, which tracked raw whitespace
//! widths token-by-token because its lexer never materialized block
//! boundaries as tokens.
//!
//! A file with no `@machine` header at all is treated as a single
//! implicit machine named after the file's stem (spec §4.3, "a file may
//! omit the `@machine` header").

use std::path::Path;

use diag::{Diagnostic, Location};
use span::{Span, Spanned};

use crate::ast;
use crate::lexer::{self, Marker, Token, TokenKind};
use crate::Result;

pub fn parse(file: &Path, src: &str) -> Result<ast::Scope> {
  let tokens = lexer::tokenize(file, src)?;
  Parser::new(file, tokens).scope()
}

// Mirrors the teacher's `MINIMUM_STACK_REQUIRED` budget in
// `parser.rs`: ~50 recursive `body()` calls at a few hundred bytes each.
const MINIMUM_STACK_REQUIRED: usize = 64_000;

struct Parser<'a> {
  file: &'a Path,
  tokens: Vec<Token>,
  pos: usize,
}

#[derive(Default)]
struct Body {
  states: Vec<ast::State>,
  transitions: Vec<ast::Transition>,
  event_protocols: Vec<ast::EventProtocol>,
  use_directive: Option<ast::UseDirective>,
}

impl<'a> Parser<'a> {
  fn new(file: &'a Path, tokens: Vec<Token>) -> Self {
    Self {
      file,
      tokens,
      pos: 0,
    }
  }

  fn current(&self) -> &Token {
    &self.tokens[self.pos]
  }

  fn kind(&self) -> &TokenKind {
    &self.current().kind
  }

  fn is_eof(&self) -> bool {
    matches!(self.kind(), TokenKind::Eof)
  }

  fn bump(&mut self) -> Token {
    let token = self.tokens[self.pos].clone();
    if self.pos + 1 < self.tokens.len() {
      self.pos += 1;
    }
    token
  }

  fn bump_if(&mut self, matches_kind: impl Fn(&TokenKind) -> bool) -> bool {
    if matches_kind(self.kind()) {
      self.bump();
      true
    } else {
      false
    }
  }

  fn error(&self, message: impl Into<String>) -> Diagnostic {
    let current = self.current();
    Diagnostic::Syntax {
      message: message.into(),
      location: Location::new(self.file.to_path_buf(), current.position, current.span),
    }
  }

  #[cfg(feature = "check-recursion-limit")]
  fn check_recursion(&self) -> Result<()> {
    let available = stacker::remaining_stack();
    if available.map(|n| n > MINIMUM_STACK_REQUIRED).unwrap_or(true) {
      Ok(())
    } else {
      Err(self.error("nesting limit reached"))
    }
  }

  #[cfg(not(feature = "check-recursion-limit"))]
  fn check_recursion(&self) -> Result<()> {
    Ok(())
  }

  fn expect_newline(&mut self) -> Result<()> {
    if self.bump_if(|k| matches!(k, TokenKind::Newline)) {
      Ok(())
    } else {
      Err(self.error("expected end of line"))
    }
  }

  fn expect_indent(&mut self) -> bool {
    self.bump_if(|k| matches!(k, TokenKind::Indent))
  }

  fn expect_dedent(&mut self) -> Result<()> {
    if self.bump_if(|k| matches!(k, TokenKind::Dedent)) {
      Ok(())
    } else {
      Err(self.error("expected dedent"))
    }
  }

  fn expect_identifier(&mut self, what: &str) -> Result<ast::Ident> {
    match self.kind().clone() {
      TokenKind::Identifier(name) => {
        let span = self.current().span;
        self.bump();
        Ok(Spanned::new(span, name))
      }
      _ => Err(self.error(format!("expected {what}"))),
    }
  }

  fn expect_string_literal(&mut self, what: &str) -> Result<Spanned<String>> {
    match self.kind().clone() {
      TokenKind::StringLiteral(value) => {
        let span = self.current().span;
        self.bump();
        Ok(Spanned::new(span, value))
      }
      _ => Err(self.error(format!("expected {what}"))),
    }
  }

  fn expect_text(&mut self, what: &str) -> Result<Spanned<String>> {
    match self.kind().clone() {
      TokenKind::Text(value) => {
        let span = self.current().span;
        self.bump();
        Ok(Spanned::new(span, value))
      }
      _ => Err(self.error(format!("expected {what}"))),
    }
  }

  /// Consumes a comma-separated list of bare names, as used by both
  /// `Event` and `EventProtocol`'s name field, returning the joined raw
  /// text and the span covering the whole list.
  fn name_list(&mut self) -> Result<(Span, String)> {
    let first = self.expect_identifier("an event name")?;
    let mut span = first.span;
    let mut parts = vec![first.into_inner()];
    while self.bump_if(|k| matches!(k, TokenKind::Comma)) {
      let next = self.expect_identifier("an event name")?;
      span = span.join(next.span);
      parts.push(next.into_inner());
    }
    Ok((span, parts.join(",")))
  }

  fn scope(mut self) -> Result<ast::Scope> {
    let mut scope = ast::Scope::new();
    while matches!(self.kind(), TokenKind::AtDirective(name) if name == "include") {
      scope.imports.push(self.import()?);
    }

    if matches!(self.kind(), TokenKind::AtDirective(name) if name == "machine") {
      while matches!(self.kind(), TokenKind::AtDirective(name) if name == "machine") {
        scope.machines.push(self.machine()?);
      }
      if !self.is_eof() {
        return Err(self.error("expected `@machine` or end of file"));
      }
      return Ok(scope);
    }

    if !self.is_eof() {
      let stem = self
        .file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("main")
        .to_string();
      let start = self.current().span;
      let body = self.body()?;
      let mut machine = ast::Machine::new(Spanned::new(start, stem), start);
      machine.states = body.states;
      machine.transitions = body.transitions;
      machine.event_protocols = body.event_protocols;
      scope.machines.push(machine);
    }

    if !self.is_eof() {
      return Err(self.error("unexpected content after top-level statechart body"));
    }
    Ok(scope)
  }

  fn import(&mut self) -> Result<ast::Import> {
    self.bump(); // '@include'
    let file = self.expect_string_literal("an import path")?;
    self.expect_newline()?;
    Ok(ast::Import {
      file,
      resolved_file: None,
    })
  }

  fn machine(&mut self) -> Result<ast::Machine> {
    let start = self.current().span;
    self.bump(); // '@machine'
    let id = self.expect_identifier("a machine name")?;
    self.expect_newline()?;

    let mut machine = ast::Machine::new(id, start);
    if self.expect_indent() {
      let body = self.body()?;
      machine.states = body.states;
      machine.transitions = body.transitions;
      machine.event_protocols = body.event_protocols;
      self.expect_dedent()?;
    }
    machine.span = start.join(self.tokens[self.pos.saturating_sub(1)].span);
    Ok(machine)
  }

  fn body(&mut self) -> Result<Body> {
    self.check_recursion()?;
    let mut body = Body::default();
    loop {
      match self.kind().clone() {
        TokenKind::Identifier(_) => {
          if matches!(self.peek_next(), TokenKind::Comma | TokenKind::Arrow) {
            body.transitions.push(self.transition()?);
          } else {
            body.states.push(self.state()?);
          }
        }
        TokenKind::Protocol => body.event_protocols.push(self.event_protocol()?),
        TokenKind::AtDirective(name) if name == "use" => {
          if body.use_directive.is_some() {
            return Err(self.error("a state may only have one `@use` directive"));
          }
          body.use_directive = Some(self.use_directive()?);
        }
        TokenKind::Dedent | TokenKind::Eof => break,
        _ => return Err(self.error("expected a state, transition or directive")),
      }
    }
    Ok(body)
  }

  fn peek_next(&self) -> &TokenKind {
    self
      .tokens
      .get(self.pos + 1)
      .map(|t| &t.kind)
      .unwrap_or(&TokenKind::Eof)
  }

  fn state(&mut self) -> Result<ast::State> {
    let start = self.current().span;
    let id = self.expect_identifier("a state name")?;

    let mut kind = ast::StateKind::Atomic;
    let mut initial = false;
    if let TokenKind::StateMarker(marker) = self.kind().clone() {
      self.bump();
      match marker {
        Marker::Initial => initial = true,
        Marker::Transient => kind = ast::StateKind::Transient,
        Marker::Final => kind = ast::StateKind::Final,
        Marker::Parallel => kind = ast::StateKind::Parallel,
      }
    }
    self.expect_newline()?;

    let mut state = ast::State::new(id, kind, initial, start);
    if self.expect_indent() {
      let body = self.body()?;
      state.states = body.states;
      state.transitions = body.transitions;
      state.event_protocols = body.event_protocols;
      state.use_directive = body.use_directive;
      self.expect_dedent()?;
      if state.kind == ast::StateKind::Atomic {
        state.kind = ast::StateKind::Compound;
      }
    }
    state.span = start.join(self.tokens[self.pos.saturating_sub(1)].span);
    Ok(state)
  }

  fn transition(&mut self) -> Result<ast::Transition> {
    let start = self.current().span;
    let (event_span, event_text) = self.name_list()?;
    self
      .bump_if(|k| matches!(k, TokenKind::Arrow))
      .then_some(())
      .ok_or_else(|| self.error("expected `->`"))?;
    let target = self.expect_identifier("a transition target")?;
    let guard = if self.bump_if(|k| matches!(k, TokenKind::Colon)) {
      Some(self.expect_text("guard text")?)
    } else {
      None
    };
    self.expect_newline()?;
    let end = guard.as_ref().map(|g| g.span).unwrap_or(target.span);
    Ok(ast::Transition {
      event: Spanned::new(event_span, event_text),
      target: Spanned::new(target.span, target.into_inner()),
      guard,
      resolved_target: None,
      span: start.join(end),
    })
  }

  fn event_protocol(&mut self) -> Result<ast::EventProtocol> {
    let start = self.current().span;
    self.bump(); // '%'
    let (event_span, event_text) = self.name_list()?;
    let payload = if self.bump_if(|k| matches!(k, TokenKind::Colon)) {
      Some(self.expect_text("a payload descriptor")?)
    } else {
      None
    };
    self.expect_newline()?;
    let end = payload.as_ref().map(|p| p.span).unwrap_or(event_span);
    Ok(ast::EventProtocol {
      event_name: Spanned::new(event_span, event_text),
      payload,
      span: start.join(end),
    })
  }

  fn use_directive(&mut self) -> Result<ast::UseDirective> {
    let start = self.current().span;
    self.bump(); // '@use'
    let machine_id = self.expect_identifier("a machine name")?;
    self.expect_newline()?;
    Ok(ast::UseDirective {
      span: start.join(machine_id.span),
      machine_id,
    })
  }
}

#[cfg(test)]
mod tests;
