//! Runtime support symbols.
//!
//! Objects built for a target whose [`RuntimeLinkage`] is `Embedded` define
//! these symbols themselves; otherwise they reference them as undefined and
//! expect a standalone runtime object (or the JIT host) to provide them.

use kiln_ir::{Function, Module, RuntimeLinkage, Target};
use rustc_hash::FxHashSet;

/// Symbols provided by the kiln runtime, in emission order.
pub const RUNTIME_SYMBOLS: &[&str] = &[
    "kiln_runtime_init",
    "kiln_malloc",
    "kiln_free",
    "kiln_error",
    "kiln_print",
];

/// Whether `name` is one of the runtime's symbols.
#[must_use]
pub fn is_runtime_symbol(name: &str) -> bool {
    RUNTIME_SYMBOLS.contains(&name)
}

/// Runtime symbols `module` does not define itself, in emission order.
///
/// A module function named like a runtime symbol takes its place, so the
/// object never carries two definitions of one name.
#[must_use]
pub fn runtime_symbols_for(module: &Module) -> Vec<&'static str> {
    let provided: FxHashSet<String> = module
        .functions()
        .iter()
        .map(Function::flat_name)
        .filter(|name| is_runtime_symbol(name))
        .collect();
    RUNTIME_SYMBOLS
        .iter()
        .copied()
        .filter(|name| !provided.contains(*name))
        .collect()
}

/// Whether objects for `target` define the runtime symbols.
#[must_use]
pub fn embeds_runtime(target: &Target) -> bool {
    target.runtime_linkage() == RuntimeLinkage::Embedded
}
