//! Plain text (`.stmt`) dump.

use std::path::Path;

use kiln_ir::Module;

use crate::error::{write_artifact, EmitError};

/// Emit the text dump of `module` (its `Display` form) at `path`.
#[tracing::instrument(level = "debug", skip_all, fields(module = module.name(), path = %path.display()))]
pub fn emit_text(module: &Module, path: &Path) -> Result<(), EmitError> {
    write_artifact(path, module.to_string().as_bytes())
}
