//! Output Request
//!
//! Which artifacts to produce, and where. Every slot is optional and any
//! subset may be requested together; an empty request is a no-op. A slot
//! holding an empty path counts as unset.

use std::path::{Path, PathBuf};

use crate::dispatch::Slot;

/// Requested output files for one coordinator call.
///
/// Non-empty paths are used verbatim. Apply the filename policy
/// ([`resolve_filename`](crate::resolve_filename)) before filling a slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outputs {
    pub object: Option<PathBuf>,
    pub assembly: Option<PathBuf>,
    pub bitcode: Option<PathBuf>,
    pub portable_assembly: Option<PathBuf>,
    pub c_header: Option<PathBuf>,
    pub c_source: Option<PathBuf>,
}

impl Outputs {
    /// A request for nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn object(mut self, path: impl Into<PathBuf>) -> Self {
        self.object = Some(path.into());
        self
    }

    #[must_use]
    pub fn assembly(mut self, path: impl Into<PathBuf>) -> Self {
        self.assembly = Some(path.into());
        self
    }

    #[must_use]
    pub fn bitcode(mut self, path: impl Into<PathBuf>) -> Self {
        self.bitcode = Some(path.into());
        self
    }

    #[must_use]
    pub fn portable_assembly(mut self, path: impl Into<PathBuf>) -> Self {
        self.portable_assembly = Some(path.into());
        self
    }

    #[must_use]
    pub fn c_header(mut self, path: impl Into<PathBuf>) -> Self {
        self.c_header = Some(path.into());
        self
    }

    #[must_use]
    pub fn c_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.c_source = Some(path.into());
        self
    }

    /// Populated native/bitcode slots, in dispatch order.
    pub fn code_slots(&self) -> impl Iterator<Item = (Slot, &Path)> {
        [
            (Slot::Object, &self.object),
            (Slot::Assembly, &self.assembly),
            (Slot::Bitcode, &self.bitcode),
            (Slot::PortableAssembly, &self.portable_assembly),
        ]
        .into_iter()
        .filter_map(|(slot, path)| populated(path.as_deref()).map(|path| (slot, path)))
    }

    /// The C header path, if requested.
    #[must_use]
    pub fn c_header_path(&self) -> Option<&Path> {
        populated(self.c_header.as_deref())
    }

    /// The C source path, if requested.
    #[must_use]
    pub fn c_source_path(&self) -> Option<&Path> {
        populated(self.c_source.as_deref())
    }

    /// Number of populated slots.
    #[must_use]
    pub fn len(&self) -> usize {
        [
            &self.object,
            &self.assembly,
            &self.bitcode,
            &self.portable_assembly,
            &self.c_header,
            &self.c_source,
        ]
        .into_iter()
        .filter(|slot| populated(slot.as_deref()).is_some())
        .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn populated(slot: Option<&Path>) -> Option<&Path> {
    slot.filter(|path| !path.as_os_str().is_empty())
}
