//! Tokenizer, parser and AST for the WireState statechart DSL.

pub mod ast;
pub mod lexer;
pub mod parser;

pub type Result<T> = std::result::Result<T, diag::Diagnostic>;
