//! Artifact Coordinator
//!
//! Fans one [`Outputs`] request out to the backends. Code slots go through
//! [`route`] in the order object, assembly, bitcode, portable assembly; the C
//! header and C source follow, in the mangling the target asks for.
//!
//! The first failing slot aborts the call. Files already written by earlier
//! slots are left on disk.

use kiln_codegen::c::{self, Mangling};
use kiln_codegen::{CodeGenerator, EmitError, NativeBackend};
use kiln_ir::Module;
use tracing::debug;

use crate::dispatch::route;
use crate::outputs::Outputs;

/// Produce every artifact in `outputs` with the in-tree backend.
pub fn compile_module_to(module: &Module, outputs: &Outputs) -> Result<(), EmitError> {
    compile_module_to_with(&NativeBackend, module, outputs)
}

/// Produce every artifact in `outputs`, using `backend` for the code slots.
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(module = module.name(), target = %module.target(), requested = outputs.len())
)]
pub fn compile_module_to_with<B: CodeGenerator + ?Sized>(
    backend: &B,
    module: &Module,
    outputs: &Outputs,
) -> Result<(), EmitError> {
    if outputs.is_empty() {
        debug!("nothing requested");
        return Ok(());
    }

    let arch = module.target().arch();
    for (slot, path) in outputs.code_slots() {
        let emitter = route(arch, slot);
        debug!(?slot, route = %emitter, path = %path.display(), "dispatching");
        emitter.emit(backend, module, path)?;
    }

    let mangling = Mangling::for_target(module.target());
    if let Some(path) = outputs.c_header_path() {
        debug!(?mangling, path = %path.display(), "dispatching C header");
        c::emit_header(module, path, mangling)?;
    }
    if let Some(path) = outputs.c_source_path() {
        debug!(?mangling, path = %path.display(), "dispatching C source");
        c::emit_implementation(module, path, mangling)?;
    }

    Ok(())
}
