//! Backend Routing
//!
//! One table decides which emitter serves each native/bitcode slot. Every
//! entry point goes through [`route`], so the portable-ISA substitution lives
//! in exactly one place:
//!
//! | Slot | `CodeForm::Native` | `CodeForm::BitcodeOnly` |
//! |------|--------------------|-------------------------|
//! | object | native object | bitcode |
//! | assembly | native assembly | portable assembly text |
//! | bitcode | bitcode | bitcode |
//! | portable assembly | portable assembly text | portable assembly text |

use std::fmt;
use std::path::Path;

use kiln_codegen::{CodeGenerator, EmitError};
use kiln_ir::{Arch, CodeForm, Module};

/// A native/bitcode output slot of an [`Outputs`](crate::Outputs) request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Object,
    Assembly,
    Bitcode,
    PortableAssembly,
}

impl Slot {
    pub const ALL: [Slot; 4] = [
        Slot::Object,
        Slot::Assembly,
        Slot::Bitcode,
        Slot::PortableAssembly,
    ];
}

/// The emitter that serves a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    NativeObject,
    NativeAssembly,
    Bitcode,
    PortableAssembly,
}

impl Route {
    /// Invoke the matching emitter on `backend`.
    pub fn emit<B: CodeGenerator + ?Sized>(
        self,
        backend: &B,
        module: &Module,
        path: &Path,
    ) -> Result<(), EmitError> {
        match self {
            Route::NativeObject => backend.emit_object(module, path),
            Route::NativeAssembly => backend.emit_assembly(module, path),
            Route::Bitcode => backend.emit_bitcode(module, path),
            Route::PortableAssembly => backend.emit_portable_assembly(module, path),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Route::NativeObject => "native object",
            Route::NativeAssembly => "native assembly",
            Route::Bitcode => "bitcode",
            Route::PortableAssembly => "portable assembly",
        })
    }
}

/// The emitter for `slot` on architecture `arch`.
#[must_use]
pub const fn route(arch: Arch, slot: Slot) -> Route {
    match (slot, arch.code_form()) {
        (Slot::Object, CodeForm::Native) => Route::NativeObject,
        (Slot::Assembly, CodeForm::Native) => Route::NativeAssembly,
        (Slot::Object | Slot::Bitcode, _) => Route::Bitcode,
        (Slot::Assembly | Slot::PortableAssembly, _) => Route::PortableAssembly,
    }
}
