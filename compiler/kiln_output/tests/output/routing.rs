//! Routing through a recording backend.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use kiln_codegen::{CodeGenerator, EmitError};
use kiln_ir::Module;
use kiln_output::{compile_module_to_with, Outputs};
use pretty_assertions::assert_eq;

use crate::util::{kernel_module, target};

/// Records every emitter call instead of writing files.
#[derive(Default)]
pub struct Recorder {
    calls: RefCell<Vec<(&'static str, PathBuf)>>,
    fail_on: Option<&'static str>,
}

impl Recorder {
    pub fn failing_on(emitter: &'static str) -> Self {
        Self {
            calls: RefCell::default(),
            fail_on: Some(emitter),
        }
    }

    pub fn emitters(&self) -> Vec<&'static str> {
        self.calls.borrow().iter().map(|(name, _)| *name).collect()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.calls.borrow().iter().map(|(_, path)| path.clone()).collect()
    }

    fn record(&self, emitter: &'static str, path: &Path) -> Result<(), EmitError> {
        self.calls.borrow_mut().push((emitter, path.to_path_buf()));
        if self.fail_on == Some(emitter) {
            return Err(EmitError::ObjectWrite {
                path: path.display().to_string(),
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

impl CodeGenerator for Recorder {
    fn emit_object(&self, _module: &Module, path: &Path) -> Result<(), EmitError> {
        self.record("object", path)
    }

    fn emit_assembly(&self, _module: &Module, path: &Path) -> Result<(), EmitError> {
        self.record("assembly", path)
    }

    fn emit_bitcode(&self, _module: &Module, path: &Path) -> Result<(), EmitError> {
        self.record("bitcode", path)
    }

    fn emit_portable_assembly(&self, _module: &Module, path: &Path) -> Result<(), EmitError> {
        self.record("portable", path)
    }
}

fn all_code_slots() -> Outputs {
    Outputs::new()
        .object("k.o")
        .assembly("k.s")
        .bitcode("k.bc")
        .portable_assembly("k.ll")
}

#[test]
fn native_target_uses_native_emitters() {
    for target_str in ["x86-64-linux", "arm-32-ios", "hexagon-32-linux", "x86-64-windows"] {
        let recorder = Recorder::default();
        let module = kernel_module("k", target(target_str));
        compile_module_to_with(&recorder, &module, &all_code_slots()).unwrap();
        assert_eq!(
            recorder.emitters(),
            ["object", "assembly", "bitcode", "portable"],
            "{target_str}"
        );
    }
}

#[test]
fn bitcode_only_target_substitutes_portable_emitters() {
    let recorder = Recorder::default();
    let module = kernel_module("k", target("pnacl-32-nacl"));
    compile_module_to_with(&recorder, &module, &all_code_slots()).unwrap();

    assert_eq!(
        recorder.emitters(),
        ["bitcode", "portable", "bitcode", "portable"]
    );
    // Paths stay with their slots.
    assert_eq!(
        recorder.paths(),
        [
            PathBuf::from("k.o"),
            PathBuf::from("k.s"),
            PathBuf::from("k.bc"),
            PathBuf::from("k.ll"),
        ]
    );
}

#[test]
fn only_requested_slots_dispatch() {
    let recorder = Recorder::default();
    let module = kernel_module("k", target("x86-64-linux"));
    compile_module_to_with(&recorder, &module, &Outputs::new().assembly("k.s")).unwrap();
    assert_eq!(recorder.emitters(), ["assembly"]);
}

#[test]
fn empty_request_dispatches_nothing() {
    let recorder = Recorder::default();
    let module = kernel_module("k", target("pnacl-32-nacl"));
    compile_module_to_with(&recorder, &module, &Outputs::new()).unwrap();
    assert!(recorder.emitters().is_empty());
}

#[test]
fn failure_stops_dispatch() {
    let recorder = Recorder::failing_on("assembly");
    let module = kernel_module("k", target("x86-64-linux"));
    let result = compile_module_to_with(&recorder, &module, &all_code_slots());

    assert!(matches!(result, Err(EmitError::ObjectWrite { .. })));
    assert_eq!(recorder.emitters(), ["object", "assembly"]);
}
