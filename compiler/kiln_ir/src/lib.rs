//! Kiln IR - Targets and Lowered Modules
//!
//! This crate holds the values every output backend consumes:
//! - [`Target`]: architecture, OS, pointer width and feature flags
//! - [`Module`]: a named, target-bound unit of lowered [`Function`]s
//! - [`Expr`] / [`Stmt`]: the fully-lowered function bodies
//!
//! Modules are plain data. They are built once per compilation, borrowed by
//! backends, and serializable (serde) so a module can round-trip through the
//! bitcode container.
//!
//! `Display` on [`Module`] renders the human-readable `.stmt` dump.

mod expr;
mod module;
mod printer;
pub mod target;

pub use expr::{BinaryOp, Expr, ScalarType, Stmt};
pub use module::{ArgKind, Argument, Function, Linkage, Module, NAMESPACE_SEPARATOR};
pub use target::{
    Arch, CodeForm, Features, Os, RuntimeLinkage, Target, TargetParseError, TARGET_ENV_VAR,
};
