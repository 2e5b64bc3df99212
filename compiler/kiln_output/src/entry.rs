//! Convenience Entry Points
//!
//! One function per artifact kind. Each takes an optional filename, applies
//! the filename policy when it is absent or empty, and returns the path that
//! was written. Code artifacts go through the coordinator (and therefore the
//! routing table); HTML, text and C go straight to their backends.

use std::path::{Path, PathBuf};

use kiln_codegen::c::{self, Mangling};
use kiln_codegen::{html, text, EmitError};
use kiln_ir::Module;

use crate::coordinator::compile_module_to;
use crate::filename::{resolve_filename, ArtifactKind};
use crate::outputs::Outputs;

/// Object file. Bitcode content on bitcode-only architectures.
pub fn compile_module_to_object(
    module: &Module,
    filename: Option<&Path>,
) -> Result<PathBuf, EmitError> {
    let path = resolve_filename(module, ArtifactKind::Object, filename);
    compile_module_to(module, &Outputs::new().object(&path))?;
    Ok(path)
}

/// Assembly file. Portable assembly text on bitcode-only architectures.
pub fn compile_module_to_assembly(
    module: &Module,
    filename: Option<&Path>,
) -> Result<PathBuf, EmitError> {
    let path = resolve_filename(module, ArtifactKind::Assembly, filename);
    compile_module_to(module, &Outputs::new().assembly(&path))?;
    Ok(path)
}

/// Object and assembly files, in one coordinator call.
pub fn compile_module_to_native(
    module: &Module,
    object: Option<&Path>,
    assembly: Option<&Path>,
) -> Result<(PathBuf, PathBuf), EmitError> {
    let object = resolve_filename(module, ArtifactKind::Object, object);
    let assembly = resolve_filename(module, ArtifactKind::Assembly, assembly);
    compile_module_to(module, &Outputs::new().object(&object).assembly(&assembly))?;
    Ok((object, assembly))
}

pub fn compile_module_to_bitcode(
    module: &Module,
    filename: Option<&Path>,
) -> Result<PathBuf, EmitError> {
    let path = resolve_filename(module, ArtifactKind::Bitcode, filename);
    compile_module_to(module, &Outputs::new().bitcode(&path))?;
    Ok(path)
}

pub fn compile_module_to_portable_assembly(
    module: &Module,
    filename: Option<&Path>,
) -> Result<PathBuf, EmitError> {
    let path = resolve_filename(module, ArtifactKind::PortableAssembly, filename);
    compile_module_to(module, &Outputs::new().portable_assembly(&path))?;
    Ok(path)
}

/// Bitcode and portable assembly text, in one coordinator call.
pub fn compile_module_to_portable(
    module: &Module,
    bitcode: Option<&Path>,
    portable_assembly: Option<&Path>,
) -> Result<(PathBuf, PathBuf), EmitError> {
    let bitcode = resolve_filename(module, ArtifactKind::Bitcode, bitcode);
    let portable_assembly =
        resolve_filename(module, ArtifactKind::PortableAssembly, portable_assembly);
    compile_module_to(
        module,
        &Outputs::new()
            .bitcode(&bitcode)
            .portable_assembly(&portable_assembly),
    )?;
    Ok((bitcode, portable_assembly))
}

pub fn compile_module_to_html(
    module: &Module,
    filename: Option<&Path>,
) -> Result<PathBuf, EmitError> {
    let path = resolve_filename(module, ArtifactKind::Html, filename);
    html::emit_html(module, &path)?;
    Ok(path)
}

/// The `.stmt` text dump.
pub fn compile_module_to_text(
    module: &Module,
    filename: Option<&Path>,
) -> Result<PathBuf, EmitError> {
    let path = resolve_filename(module, ArtifactKind::Text, filename);
    text::emit_text(module, &path)?;
    Ok(path)
}

/// C header, C++ flavoured when the target requests C++ mangling.
pub fn compile_module_to_c_header(
    module: &Module,
    filename: Option<&Path>,
) -> Result<PathBuf, EmitError> {
    let path = resolve_filename(module, ArtifactKind::CHeader, filename);
    c::emit_header(module, &path, Mangling::for_target(module.target()))?;
    Ok(path)
}

/// C implementation, C++ flavoured when the target requests C++ mangling.
pub fn compile_module_to_c_source(
    module: &Module,
    filename: Option<&Path>,
) -> Result<PathBuf, EmitError> {
    let path = resolve_filename(module, ArtifactKind::CSource, filename);
    c::emit_implementation(module, &path, Mangling::for_target(module.target()))?;
    Ok(path)
}

/// C header then C implementation.
pub fn compile_module_to_c(
    module: &Module,
    header: Option<&Path>,
    source: Option<&Path>,
) -> Result<(PathBuf, PathBuf), EmitError> {
    let header = compile_module_to_c_header(module, header)?;
    let source = compile_module_to_c_source(module, source)?;
    Ok((header, source))
}
