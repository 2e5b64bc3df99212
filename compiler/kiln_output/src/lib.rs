//! Kiln Output - Artifact-Output Coordinator
//!
//! Given a finalized [`Module`](kiln_ir::Module), decides which artifacts to
//! write, routes each to the right backend in `kiln_codegen`, and names the
//! files when the caller does not.
//!
//! # Pieces
//!
//! - **Filename policy** ([`filename`]): `<module>.<ext>`, `.obj` only for MSVC
//!   Windows targets.
//! - **Output request** ([`Outputs`]): optional paths for object, assembly,
//!   bitcode, portable assembly, C header and C source.
//! - **Routing** ([`route`]): bitcode-only architectures get bitcode for
//!   "object" and portable text for "assembly".
//! - **Coordinator** ([`compile_module_to`]) and one convenience entry point
//!   per artifact kind (`compile_module_to_object`, ...).
//! - **Standalone runtime** ([`compile_standalone_runtime`]).
//!
//! # Example
//!
//! ```ignore
//! use kiln_ir::{Module, Target};
//! use kiln_output::{compile_module_to, Outputs};
//!
//! let module = Module::new("kernel", Target::from_env()?);
//! compile_module_to(&module, &Outputs::new().object("kernel.o").c_header("kernel.h"))?;
//! ```
//!
//! # Debugging
//!
//! - `RUST_LOG=kiln_output=debug` - one event per dispatched slot
//! - `RUST_LOG=kiln_codegen=trace` - backend spans and written byte counts
//! - `KILN_TARGET=x86-64-windows-mingw` - target used by `Target::from_env`

mod coordinator;
pub mod dispatch;
mod entry;
pub mod filename;
mod outputs;
mod standalone;

pub use coordinator::{compile_module_to, compile_module_to_with};
pub use dispatch::{route, Route, Slot};
pub use entry::{
    compile_module_to_assembly, compile_module_to_bitcode, compile_module_to_c,
    compile_module_to_c_header, compile_module_to_c_source, compile_module_to_html,
    compile_module_to_native, compile_module_to_object, compile_module_to_portable,
    compile_module_to_portable_assembly, compile_module_to_text,
};
pub use filename::{default_filename, resolve_filename, ArtifactKind};
pub use outputs::Outputs;
pub use standalone::{
    compile_standalone_runtime, standalone_runtime_module, STANDALONE_RUNTIME_NAME,
};

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static TRACING_INIT: Once = Once::new();

/// Logging filter for a `RUST_LOG`-style directive string.
///
/// `None` or a blank value leaves logging off. Directives that fail to parse
/// are dropped.
#[must_use]
pub fn log_filter(directives: Option<&str>) -> Option<EnvFilter> {
    let directives = directives.map(str::trim).filter(|d| !d.is_empty())?;
    Some(EnvFilter::builder().parse_lossy(directives))
}

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Safe to call multiple times. Does nothing unless `RUST_LOG` is set, and
/// leaves an already-installed global subscriber in place.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let Some(filter) = log_filter(std::env::var("RUST_LOG").ok().as_deref()) else {
            return;
        };
        let installed = tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_level(true))
            .with(filter)
            .try_init();
        if installed.is_err() {
            tracing::debug!("global subscriber already installed");
        }
    });
}
