//! Standalone Runtime Builder
//!
//! Produces an object containing only the runtime support code, for linking
//! alongside modules compiled with `no_runtime` (or loaded by a JIT host).

use std::path::{Path, PathBuf};

use kiln_codegen::EmitError;
use kiln_ir::{Features, Module, Target};

use crate::entry::compile_module_to_object;

/// Name of the module built by [`standalone_runtime_module`].
pub const STANDALONE_RUNTIME_NAME: &str = "standalone_runtime";

/// An empty module on `target` with `no_runtime` and `jit` cleared, so its
/// object embeds the runtime.
#[must_use]
pub fn standalone_runtime_module(target: Target) -> Module {
    let target = target.without_feature(Features::NO_RUNTIME | Features::JIT);
    Module::new(STANDALONE_RUNTIME_NAME, target)
}

/// Write the standalone runtime object for `target`.
///
/// `None` or an empty filename gives `standalone_runtime.o` (`.obj` on MSVC
/// targets). On bitcode-only architectures the file holds bitcode.
#[tracing::instrument(level = "debug", skip_all, fields(target = %target))]
pub fn compile_standalone_runtime(
    filename: Option<&Path>,
    target: Target,
) -> Result<PathBuf, EmitError> {
    let module = standalone_runtime_module(target);
    compile_module_to_object(&module, filename)
}
