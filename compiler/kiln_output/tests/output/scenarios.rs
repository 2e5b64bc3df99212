//! End-to-end scenarios with default filenames.

use std::path::{Path, PathBuf};

use kiln_codegen::bitcode;
use kiln_codegen::runtime::RUNTIME_SYMBOLS;
use kiln_output::{
    compile_module_to_assembly, compile_module_to_c, compile_module_to_html,
    compile_module_to_native, compile_module_to_object, compile_module_to_portable,
    compile_module_to_text, compile_standalone_runtime,
};
use object::{BinaryFormat, Object as _};
use pretty_assertions::assert_eq;

use crate::util::{enter_temp_dir, kernel_module, object_defines, target};

#[test]
fn kernel_on_linux_writes_native_object() {
    let dir = enter_temp_dir();
    let module = kernel_module("kernel", target("x86-64-linux"));

    let path = compile_module_to_object(&module, None).unwrap();
    assert_eq!(path, PathBuf::from("kernel.o"));
    assert_eq!(dir.files(), ["kernel.o"]);

    let bytes = std::fs::read(dir.path().join("kernel.o")).unwrap();
    let file = object::File::parse(&*bytes).unwrap();
    assert_eq!(file.format(), BinaryFormat::Elf);
    assert!(!bitcode::is_bitcode(&bytes));
    assert_ne!(bytes, bitcode::encode(&module).unwrap());
    assert!(object_defines(&bytes, "brighten"));
}

#[test]
fn kernel_on_pnacl_object_is_bitcode() {
    let dir = enter_temp_dir();
    let module = kernel_module("kernel", target("pnacl-32-nacl"));

    let path = compile_module_to_object(&module, None).unwrap();
    assert_eq!(path, PathBuf::from("kernel.o"));
    assert_eq!(bitcode::read_bitcode(&dir.path().join("kernel.o")).unwrap(), module);
}

#[test]
fn kernel_on_pnacl_assembly_is_portable_text() {
    let dir = enter_temp_dir();
    let module = kernel_module("kernel", target("pnacl-32-nacl"));

    let path = compile_module_to_assembly(&module, None).unwrap();
    assert_eq!(path, PathBuf::from("kernel.s"));
    let text = std::fs::read_to_string(dir.path().join("kernel.s")).unwrap();
    assert_eq!(text, kiln_codegen::portable::portable_text(&module));
    assert!(text.contains("target triple = \"le32-unknown-nacl\""));
}

#[test]
fn foo_on_windows_writes_obj() {
    let dir = enter_temp_dir();
    let module = kernel_module("foo", target("x86-64-windows"));

    let path = compile_module_to_object(&module, None).unwrap();
    assert_eq!(path, PathBuf::from("foo.obj"));
    let bytes = std::fs::read(dir.path().join("foo.obj")).unwrap();
    assert_eq!(object::File::parse(&*bytes).unwrap().format(), BinaryFormat::Coff);
}

#[test]
fn foo_on_mingw_writes_o() {
    let dir = enter_temp_dir();
    let module = kernel_module("foo", target("x86-64-windows-mingw"));

    compile_module_to_object(&module, None).unwrap();
    assert_eq!(dir.files(), ["foo.o"]);
}

#[test]
fn empty_filename_uses_default() {
    let dir = enter_temp_dir();
    let module = kernel_module("kernel", target("arm-64-linux"));

    let path = compile_module_to_object(&module, Some(Path::new(""))).unwrap();
    assert_eq!(path, PathBuf::from("kernel.o"));
    assert_eq!(dir.files(), ["kernel.o"]);
}

#[test]
fn explicit_filename_is_verbatim() {
    let dir = enter_temp_dir();
    let module = kernel_module("kernel", target("x86-64-linux"));
    let wanted = dir.path().join("custom_name.bin");

    let path = compile_module_to_object(&module, Some(&wanted)).unwrap();
    assert_eq!(path, wanted);
    assert_eq!(dir.files(), ["custom_name.bin"]);
}

#[test]
fn native_pair_uses_both_defaults() {
    let dir = enter_temp_dir();
    let module = kernel_module("kernel", target("x86-64-osx"));

    let (object, assembly) = compile_module_to_native(&module, None, None).unwrap();
    assert_eq!(object, PathBuf::from("kernel.o"));
    assert_eq!(assembly, PathBuf::from("kernel.s"));
    assert_eq!(dir.files(), ["kernel.o", "kernel.s"]);
}

#[test]
fn portable_pair_uses_both_defaults() {
    let dir = enter_temp_dir();
    let module = kernel_module("kernel", target("x86-64-linux"));

    compile_module_to_portable(&module, None, None).unwrap();
    assert_eq!(dir.files(), ["kernel.bc", "kernel.ll"]);
}

#[test]
fn dumps_and_c_use_defaults() {
    let dir = enter_temp_dir();
    let module = kernel_module("kernel", target("x86-64-linux"));

    compile_module_to_html(&module, None).unwrap();
    compile_module_to_text(&module, None).unwrap();
    let (header, source) = compile_module_to_c(&module, None, None).unwrap();
    assert_eq!(header, PathBuf::from("kernel.h"));
    assert_eq!(source, PathBuf::from("kernel.c"));
    assert_eq!(
        dir.files(),
        ["kernel.c", "kernel.h", "kernel.html", "kernel.stmt"]
    );

    let text = std::fs::read_to_string(dir.path().join("kernel.stmt")).unwrap();
    assert_eq!(text, module.to_string());
    let header = std::fs::read_to_string(dir.path().join("kernel.h")).unwrap();
    assert!(header.contains("int32_t brighten(uint8_t *input, uint8_t *output, int32_t amount, int32_t width);"));
    assert!(!header.contains("helper"));
}

#[test]
fn standalone_runtime_defines_runtime_symbols() {
    let dir = enter_temp_dir();

    let path = compile_standalone_runtime(None, target("x86-64-linux-no_runtime")).unwrap();
    assert_eq!(path, PathBuf::from("standalone_runtime.o"));

    let bytes = std::fs::read(dir.path().join("standalone_runtime.o")).unwrap();
    for name in RUNTIME_SYMBOLS {
        assert!(object_defines(&bytes, name), "{name} should be defined");
    }
}

#[test]
fn standalone_runtime_on_msvc_is_obj() {
    let dir = enter_temp_dir();

    let path = compile_standalone_runtime(None, target("x86-64-windows-jit")).unwrap();
    assert_eq!(path, PathBuf::from("standalone_runtime.obj"));
    assert_eq!(dir.files(), ["standalone_runtime.obj"]);
}

#[test]
fn standalone_runtime_on_pnacl_is_bitcode() {
    let dir = enter_temp_dir();

    compile_standalone_runtime(None, target("pnacl-32-nacl-no_runtime")).unwrap();
    let module = bitcode::read_bitcode(&dir.path().join("standalone_runtime.o")).unwrap();
    assert_eq!(module.name(), "standalone_runtime");
    assert_eq!(module.target().to_string(), "pnacl-32-nacl");
}

#[test]
fn no_runtime_object_references_runtime() {
    let dir = enter_temp_dir();
    let module = kernel_module("kernel", target("x86-64-linux-no_runtime"));

    compile_module_to_object(&module, None).unwrap();
    let bytes = std::fs::read(dir.path().join("kernel.o")).unwrap();
    assert!(!object_defines(&bytes, "kiln_malloc"));
    assert!(object_defines(&bytes, "brighten"));
}
