//! Filename Policy
//!
//! Default output names are `<module name>.<extension>`, where the extension
//! depends on the artifact kind and, for objects only, on the target:
//!
//! | Kind | Extension |
//! |------|-----------|
//! | Object | `.obj` on Windows without MinGW, `.o` everywhere else |
//! | Assembly | `.s` |
//! | Bitcode | `.bc` |
//! | Portable assembly | `.ll` |
//! | C header / source | `.h` / `.c` |
//! | HTML / text dump | `.html` / `.stmt` |
//!
//! Everything here is a pure function of its inputs.

use std::fmt;
use std::path::{Path, PathBuf};

use kiln_ir::{Module, Target};

/// Every artifact kind the coordinator can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Native object file (`.o` / `.obj`).
    Object,
    /// Native assembly text (`.s`).
    Assembly,
    /// Portable bitcode (`.bc`).
    Bitcode,
    /// Portable assembly text (`.ll`).
    PortableAssembly,
    /// C header (`.h`).
    CHeader,
    /// C implementation (`.c`).
    CSource,
    /// HTML debug dump (`.html`).
    Html,
    /// Plain text dump (`.stmt`).
    Text,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 8] = [
        ArtifactKind::Object,
        ArtifactKind::Assembly,
        ArtifactKind::Bitcode,
        ArtifactKind::PortableAssembly,
        ArtifactKind::CHeader,
        ArtifactKind::CSource,
        ArtifactKind::Html,
        ArtifactKind::Text,
    ];

    /// File extension for this kind on `target`, without the dot.
    #[must_use]
    pub fn extension(self, target: &Target) -> &'static str {
        match self {
            ArtifactKind::Object if target.is_msvc() => "obj",
            ArtifactKind::Object => "o",
            ArtifactKind::Assembly => "s",
            ArtifactKind::Bitcode => "bc",
            ArtifactKind::PortableAssembly => "ll",
            ArtifactKind::CHeader => "h",
            ArtifactKind::CSource => "c",
            ArtifactKind::Html => "html",
            ArtifactKind::Text => "stmt",
        }
    }

    /// Human-readable description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            ArtifactKind::Object => "native object file",
            ArtifactKind::Assembly => "assembly text",
            ArtifactKind::Bitcode => "portable bitcode",
            ArtifactKind::PortableAssembly => "portable assembly text",
            ArtifactKind::CHeader => "C header",
            ArtifactKind::CSource => "C source",
            ArtifactKind::Html => "HTML dump",
            ArtifactKind::Text => "text dump",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// `<module_name>.<extension>` for `kind` on `target`.
#[must_use]
pub fn default_filename(module_name: &str, target: &Target, kind: ArtifactKind) -> PathBuf {
    PathBuf::from(format!("{module_name}.{}", kind.extension(target)))
}

/// The caller's path when it is present and non-empty, otherwise the default.
#[must_use]
pub fn resolve_filename(module: &Module, kind: ArtifactKind, requested: Option<&Path>) -> PathBuf {
    match requested {
        Some(path) if !path.as_os_str().is_empty() => path.to_path_buf(),
        _ => default_filename(module.name(), module.target(), kind),
    }
}
