//! Kiln Codegen - Artifact Backends
//!
//! Each module turns a finalized [`kiln_ir::Module`] into one on-disk artifact:
//!
//! | Module | Artifact | Extension |
//! |--------|----------|-----------|
//! | [`native`] | relocatable object / assembly | `.o` `.obj` / `.s` |
//! | [`bitcode`] | portable bitcode | `.bc` |
//! | [`portable`] | portable assembly text | `.ll` |
//! | [`c`] | C / C++ header and implementation | `.h` / `.c` |
//! | [`html`] | HTML debug dump | `.html` |
//! | [`text`] | plain text dump | `.stmt` |
//!
//! Backends are stateless: every call renders the module, validates the
//! output path and writes the file in one scoped operation. Choosing which
//! backend serves a request, and what the file is called, is the job of
//! `kiln_output`.
//!
//! # Debugging
//!
//! - `RUST_LOG=kiln_codegen=debug` - one span per emitted artifact
//! - `RUST_LOG=kiln_codegen=trace` - also logs byte counts of written files

#![allow(
    // f64 immediates are narrowed to f32 for float literals
    clippy::cast_possible_truncation,
)]

pub mod bitcode;
pub mod c;
mod error;
pub mod html;
pub mod native;
pub mod portable;
pub mod runtime;
pub mod text;
mod traits;

pub use c::{CMode, CodegenC, Mangling};
pub use error::EmitError;
pub use traits::{CodeGenerator, NativeBackend};
