//! sailc-util - Shared infrastructure for the Sailfin bootstrap compiler.
//!
//! This crate carries everything the pipeline crates have in common:
//!
//! - [`span`] - source locations ([`Span`], [`FileId`]) and the
//!   [`SourceMap`] that resolves them back to lines for rendering
//! - [`symbol`] - the global string interner ([`Symbol`]) used for every
//!   identifier in tokens and the AST
//! - [`diagnostic`] - stable diagnostic codes and the renderable
//!   [`Diagnostic`] with its caret source line
//! - [`error`] - the fail-fast [`CompileError`] taxonomy every stage
//!   returns
//!
//! Nothing here depends on the compiler phases; all phase crates depend on
//! this one.

pub mod diagnostic;
pub mod error;
pub mod span;
pub mod symbol;

pub use diagnostic::{Diagnostic, DiagnosticCode, SourceLine};
pub use error::{CompileError, CompileResult};
pub use span::{FileId, SourceFile, SourceMap, Span};
pub use symbol::{sym, Symbol};
