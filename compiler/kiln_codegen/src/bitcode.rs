//! Portable Bitcode
//!
//! Bitcode is the target-neutral serialized form of a [`Module`]. It is also
//! what an "object file" *is* for architectures whose code form is
//! `BitcodeOnly`.
//!
//! # Format
//!
//! ```text
//! ┌──────────┬──────────────┬──────────────────────────┐
//! │ "KBC\0"  │ version: u32 │ bincode(Module)          │
//! │ 4 bytes  │ little-endian│                          │
//! └──────────┴──────────────┴──────────────────────────┘
//! ```
//!
//! The version is checked before the payload is decoded, so a format bump
//! reports [`EmitError::BitcodeVersion`] rather than a confusing decode error.

use std::path::Path;

use kiln_ir::Module;

use crate::error::{write_artifact, EmitError};

/// Leading bytes of every bitcode file.
pub const BITCODE_MAGIC: [u8; 4] = *b"KBC\0";

/// Current container format version.
pub const BITCODE_VERSION: u32 = 1;

const HEADER_LEN: usize = BITCODE_MAGIC.len() + 4;

/// Serialize `module` into a bitcode buffer.
pub fn encode(module: &Module) -> Result<Vec<u8>, EmitError> {
    let mut bytes = Vec::with_capacity(HEADER_LEN + 256);
    bytes.extend_from_slice(&BITCODE_MAGIC);
    bytes.extend_from_slice(&BITCODE_VERSION.to_le_bytes());
    bincode::serialize_into(&mut bytes, module)
        .map_err(|e| EmitError::BitcodeEncode(e.to_string()))?;
    Ok(bytes)
}

/// Check whether `bytes` start with the bitcode magic.
#[must_use]
pub fn is_bitcode(bytes: &[u8]) -> bool {
    bytes.starts_with(&BITCODE_MAGIC)
}

/// Deserialize a module from a bitcode buffer.
pub fn decode(bytes: &[u8]) -> Result<Module, EmitError> {
    let rest = bytes
        .strip_prefix(&BITCODE_MAGIC[..])
        .ok_or(EmitError::BadBitcodeMagic)?;

    let (version, payload) = match rest {
        [a, b, c, d, payload @ ..] => (u32::from_le_bytes([*a, *b, *c, *d]), payload),
        _ => {
            return Err(EmitError::BitcodeDecode(
                "truncated header".to_string(),
            ))
        }
    };
    if version != BITCODE_VERSION {
        return Err(EmitError::BitcodeVersion {
            found: version,
            expected: BITCODE_VERSION,
        });
    }

    bincode::deserialize(payload).map_err(|e| EmitError::BitcodeDecode(e.to_string()))
}

/// Emit `module` as bitcode at `path`.
#[tracing::instrument(level = "debug", skip_all, fields(module = module.name(), path = %path.display()))]
pub fn emit_bitcode(module: &Module, path: &Path) -> Result<(), EmitError> {
    let bytes = encode(module)?;
    write_artifact(path, &bytes)
}

/// Read a module back from a bitcode file.
pub fn read_bitcode(path: &Path) -> Result<Module, EmitError> {
    let bytes = std::fs::read(path).map_err(|e| EmitError::io(path, e))?;
    decode(&bytes)
}
