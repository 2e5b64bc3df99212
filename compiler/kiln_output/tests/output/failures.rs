//! Partial failure and file counts against the real backends.

use kiln_codegen::EmitError;
use kiln_output::{compile_module_to, compile_module_to_object, Outputs};
use tempfile::TempDir;

use crate::util::{kernel_module, target};

fn file_count(dir: &TempDir) -> usize {
    std::fs::read_dir(dir.path()).unwrap().count()
}

#[test]
fn every_requested_kind_writes_one_file() {
    let dir = tempfile::tempdir().unwrap();
    let module = kernel_module("kernel", target("x86-64-linux"));
    let p = |name: &str| dir.path().join(name);

    let outputs = Outputs::new()
        .object(p("kernel.o"))
        .assembly(p("kernel.s"))
        .bitcode(p("kernel.bc"))
        .portable_assembly(p("kernel.ll"))
        .c_header(p("kernel.h"))
        .c_source(p("kernel.c"));
    compile_module_to(&module, &outputs).unwrap();
    assert_eq!(file_count(&dir), outputs.len());
    assert_eq!(file_count(&dir), 6);
}

#[test]
fn zero_kinds_write_zero_files() {
    let dir = tempfile::tempdir().unwrap();
    let module = kernel_module("kernel", target("x86-64-linux"));
    compile_module_to(&module, &Outputs::new()).unwrap();
    assert_eq!(file_count(&dir), 0);
}

#[test]
fn empty_slot_paths_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let module = kernel_module("kernel", target("x86-64-linux"));
    let bitcode = dir.path().join("kernel.bc");

    assert!(Outputs::new().object("").is_empty());

    let outputs = Outputs::new().object("").bitcode(&bitcode).c_header("");
    compile_module_to(&module, &outputs).unwrap();
    assert!(bitcode.exists());
    assert_eq!(file_count(&dir), 1);
}

#[test]
fn failed_slot_keeps_earlier_files() {
    let dir = tempfile::tempdir().unwrap();
    let module = kernel_module("kernel", target("x86-64-linux"));
    let object = dir.path().join("kernel.o");
    let bitcode = dir.path().join("kernel.bc");

    let outputs = Outputs::new()
        .object(&object)
        .assembly(dir.path().join("missing").join("kernel.s"))
        .bitcode(&bitcode);
    let result = compile_module_to(&module, &outputs);

    assert!(matches!(result, Err(EmitError::InvalidPath { .. })));
    assert!(object.exists(), "earlier slot is not rolled back");
    assert!(!bitcode.exists(), "later slot never runs");
}

#[test]
fn unknown_arch_object_is_unsupported() {
    let dir = tempfile::tempdir().unwrap();
    let module = kernel_module("kernel", target("arch_unknown-64-linux"));
    let result = compile_module_to_object(&module, Some(&dir.path().join("kernel.o")));

    match result {
        Err(EmitError::UnsupportedTarget { target, artifact }) => {
            assert_eq!(target, "arch_unknown-64-linux");
            assert_eq!(artifact, "object");
        }
        other => panic!("expected UnsupportedTarget, got {other:?}"),
    }
    assert_eq!(file_count(&dir), 0);
}

#[test]
fn unknown_arch_still_gets_bitcode() {
    let dir = tempfile::tempdir().unwrap();
    let module = kernel_module("kernel", target("arch_unknown-64-linux"));
    let path = dir.path().join("kernel.bc");
    compile_module_to(&module, &Outputs::new().bitcode(&path)).unwrap();
    assert!(path.exists());
}
