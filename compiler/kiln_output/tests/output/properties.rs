//! Property tests for the filename policy and routing table.

#![allow(
    clippy::doc_markdown,
    clippy::redundant_closure_for_method_calls,
    reason = "Proptest macros generate code with these patterns"
)]

use std::path::{Path, PathBuf};

use kiln_ir::{Arch, Features, Module, Os, Target};
use kiln_output::{
    default_filename, resolve_filename, route, standalone_runtime_module, ArtifactKind, Route,
    Slot,
};
use proptest::prelude::*;

fn target_strategy() -> impl Strategy<Value = Target> {
    (
        prop::sample::select(Os::ALL.to_vec()),
        prop::sample::select(Arch::ALL.to_vec()),
        prop_oneof![Just(32u8), Just(64u8)],
        any::<u64>(),
    )
        .prop_map(|(os, arch, bits, flags)| {
            let mut target = Target::new(os, arch, bits);
            for feature in Features::from_bits_truncate(flags).iter() {
                target.set_feature(feature, true);
            }
            target
        })
}

fn kind_strategy() -> impl Strategy<Value = ArtifactKind> {
    prop::sample::select(ArtifactKind::ALL.to_vec())
}

fn module_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,15}").expect("valid regex")
}

proptest! {
    #[test]
    fn obj_extension_only_for_msvc_windows(target in target_strategy()) {
        let ext = ArtifactKind::Object.extension(&target);
        let msvc = target.os() == Os::Windows && !target.has_feature(Features::MINGW);
        prop_assert_eq!(ext == "obj", msvc);
        prop_assert!(ext == "obj" || ext == "o");
    }

    #[test]
    fn default_is_name_dot_extension(
        name in module_name_strategy(),
        target in target_strategy(),
        kind in kind_strategy(),
    ) {
        let expected = PathBuf::from(format!("{name}.{}", kind.extension(&target)));
        prop_assert_eq!(default_filename(&name, &target, kind), expected);
    }

    #[test]
    fn absent_or_empty_filename_resolves_to_default(
        name in module_name_strategy(),
        target in target_strategy(),
        kind in kind_strategy(),
    ) {
        let module = Module::new(name.clone(), target);
        let default = default_filename(&name, &target, kind);
        prop_assert_eq!(resolve_filename(&module, kind, None), default.clone());
        prop_assert_eq!(resolve_filename(&module, kind, Some(Path::new(""))), default);
    }

    #[test]
    fn requested_filename_is_verbatim(
        requested in "[a-zA-Z0-9_./-]{1,24}",
        target in target_strategy(),
        kind in kind_strategy(),
    ) {
        let module = Module::new("kernel", target);
        let resolved = resolve_filename(&module, kind, Some(Path::new(&requested)));
        prop_assert_eq!(resolved, PathBuf::from(&requested));
    }

    #[test]
    fn object_slot_is_bitcode_iff_pnacl(target in target_strategy()) {
        let object = route(target.arch(), Slot::Object);
        let assembly = route(target.arch(), Slot::Assembly);
        let pnacl = target.arch() == Arch::PNaCl;
        prop_assert_eq!(object == Route::Bitcode, pnacl);
        prop_assert_eq!(assembly == Route::PortableAssembly, pnacl);
    }

    #[test]
    fn standalone_module_never_has_runtime_flags(target in target_strategy()) {
        let module = standalone_runtime_module(target);
        prop_assert!(!module.target().has_feature(Features::NO_RUNTIME));
        prop_assert!(!module.target().has_feature(Features::JIT));
        prop_assert_eq!(module.target().os(), target.os());
        prop_assert_eq!(module.target().arch(), target.arch());
        prop_assert_eq!(module.target().bits(), target.bits());
    }

    #[test]
    fn target_string_round_trips(target in target_strategy()) {
        let parsed: Target = target.to_string().parse().unwrap();
        prop_assert_eq!(parsed, target);
    }
}
