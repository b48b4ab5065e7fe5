//! Cross-file semantic analysis for the WireState statechart DSL.
//!
//! This crate turns a parsed [`syntax::ast::Scope`] (one per file) into a
//! validated, fully cross-referenced compile result: imports are followed
//! and cached (`reader`, `cache`), transition targets are resolved against
//! the enclosing machine tree (`resolve`), and every structural invariant
//! from spec §4.4/§4.5 is checked (`analyze`). A compile starts at one
//! entry file and fans out across its `@include` graph, memoizing each
//! file so that diamond and cyclic imports are each analyzed exactly once.

pub mod analyze;
pub mod cache;
pub mod reader;
pub mod resolve;

pub use analyze::{analyze_root, AnalyzedProgram};
