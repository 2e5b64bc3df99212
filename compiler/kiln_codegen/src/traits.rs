//! Backend Trait for the Native/Bitcode Family
//!
//! The artifact coordinator talks to backends through [`CodeGenerator`] so a
//! different code generator (or a recording test double) can be dropped in
//! without touching the routing logic.
//!
//! [`NativeBackend`] is the in-tree implementation:
//! - `emit_object` / `emit_assembly`: [`native`](crate::native)
//! - `emit_bitcode`: [`bitcode`](crate::bitcode)
//! - `emit_portable_assembly`: [`portable`](crate::portable)

use std::path::Path;

use kiln_ir::Module;

use crate::error::EmitError;

/// Emitters for the four native/bitcode artifact kinds.
///
/// Each call writes exactly one file at `path`. Implementations never pick
/// filenames and never reroute: the caller has already decided which emitter
/// matches the target.
pub trait CodeGenerator {
    /// Emit a native relocatable object.
    fn emit_object(&self, module: &Module, path: &Path) -> Result<(), EmitError>;

    /// Emit native assembly text.
    fn emit_assembly(&self, module: &Module, path: &Path) -> Result<(), EmitError>;

    /// Emit portable bitcode.
    fn emit_bitcode(&self, module: &Module, path: &Path) -> Result<(), EmitError>;

    /// Emit portable assembly text.
    fn emit_portable_assembly(&self, module: &Module, path: &Path) -> Result<(), EmitError>;
}

/// The in-tree backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeBackend;

impl CodeGenerator for NativeBackend {
    fn emit_object(&self, module: &Module, path: &Path) -> Result<(), EmitError> {
        crate::native::emit_object(module, path)
    }

    fn emit_assembly(&self, module: &Module, path: &Path) -> Result<(), EmitError> {
        crate::native::emit_assembly(module, path)
    }

    fn emit_bitcode(&self, module: &Module, path: &Path) -> Result<(), EmitError> {
        crate::bitcode::emit_bitcode(module, path)
    }

    fn emit_portable_assembly(&self, module: &Module, path: &Path) -> Result<(), EmitError> {
        crate::portable::emit_portable_assembly(module, path)
    }
}
