//! Shared helpers for the output integration tests.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use kiln_ir::{Argument, BinaryOp, Expr, Function, Linkage, Module, ScalarType, Stmt, Target};
use object::{Object as _, ObjectSymbol as _};
use tempfile::TempDir;

/// Serializes tests that change the working directory.
static CWD_LOCK: Mutex<()> = Mutex::new(());

/// A temporary working directory, restored on drop.
pub struct WorkDir {
    dir: TempDir,
    previous: PathBuf,
    _guard: MutexGuard<'static, ()>,
}

impl WorkDir {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Names of the files in the directory, sorted.
    pub fn files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        let _ = env::set_current_dir(&self.previous);
    }
}

/// Run the rest of the test inside a fresh temporary working directory.
pub fn enter_temp_dir() -> WorkDir {
    kiln_output::init_tracing();
    let guard = CWD_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    let previous = env::current_dir().unwrap();
    let dir = tempfile::tempdir().unwrap();
    env::set_current_dir(dir.path()).unwrap();
    WorkDir {
        dir,
        previous,
        _guard: guard,
    }
}

pub fn target(s: &str) -> Target {
    s.parse().unwrap()
}

/// A small brightening kernel plus an internal helper.
pub fn kernel_module(name: &str, target: Target) -> Module {
    let x = Expr::var("x", ScalarType::I32);
    let pixel = Expr::cast(ScalarType::I32, Expr::load("input", ScalarType::U8, x.clone()));
    let brightened = Expr::binary(
        BinaryOp::Min,
        Expr::binary(BinaryOp::Add, pixel, Expr::var("amount", ScalarType::I32)),
        Expr::int(255),
    );
    Module::new(name, target)
        .with_function(
            Function::new("brighten", ScalarType::I32)
                .with_arg(Argument::buffer("input", ScalarType::U8))
                .with_arg(Argument::buffer("output", ScalarType::U8))
                .with_arg(Argument::scalar("amount", ScalarType::I32))
                .with_arg(Argument::scalar("width", ScalarType::I32))
                .with_body(vec![
                    Stmt::for_(
                        "x",
                        Expr::int(0),
                        Expr::var("width", ScalarType::I32),
                        vec![Stmt::store(
                            "output",
                            x,
                            Expr::cast(ScalarType::U8, brightened),
                        )],
                    ),
                    Stmt::Return(Expr::int(0)),
                ]),
        )
        .with_function(Function::new("helper", ScalarType::I32).with_linkage(Linkage::Internal))
}

/// Parse `bytes` as an object file and report whether `name` is defined.
pub fn object_defines(bytes: &[u8], name: &str) -> bool {
    let file = object::File::parse(bytes).unwrap();
    file.symbols()
        .any(|sym| sym.name().ok() == Some(name) && sym.is_definition())
}
