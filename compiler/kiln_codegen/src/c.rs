//! C Source Generation
//!
//! Renders a [`Module`] as a C header (declarations of the external functions)
//! or a C implementation (definitions of every function). Each comes in two
//! flavours chosen by the target's `CPLUSPLUS_MANGLING` feature:
//!
//! | Mangling | Namespaced names | Linkage |
//! |----------|------------------|---------|
//! | C        | flattened (`ns_f`) | wrapped in `extern "C"` when read by C++ |
//! | C++      | `namespace ns { f }` | C++ |

use std::path::Path;

use kiln_ir::{BinaryOp, Expr, Features, Function, Module, ScalarType, Stmt, Target};
use rustc_hash::FxHashSet;

use crate::error::{write_artifact, EmitError};

const INDENT: &str = "    ";

/// Symbol naming convention of generated C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mangling {
    C,
    CPlusPlus,
}

impl Mangling {
    /// `CPlusPlus` iff the target requests C++ name mangling.
    #[must_use]
    pub fn for_target(target: &Target) -> Self {
        if target.has_feature(Features::CPLUSPLUS_MANGLING) {
            Mangling::CPlusPlus
        } else {
            Mangling::C
        }
    }
}

/// What [`CodegenC`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CMode {
    CHeader,
    CPlusPlusHeader,
    CImplementation,
    CPlusPlusImplementation,
}

impl CMode {
    #[must_use]
    pub const fn header(mangling: Mangling) -> Self {
        match mangling {
            Mangling::C => CMode::CHeader,
            Mangling::CPlusPlus => CMode::CPlusPlusHeader,
        }
    }

    #[must_use]
    pub const fn implementation(mangling: Mangling) -> Self {
        match mangling {
            Mangling::C => CMode::CImplementation,
            Mangling::CPlusPlus => CMode::CPlusPlusImplementation,
        }
    }

    #[must_use]
    pub const fn is_header(self) -> bool {
        matches!(self, CMode::CHeader | CMode::CPlusPlusHeader)
    }

    #[must_use]
    pub const fn mangling(self) -> Mangling {
        match self {
            CMode::CHeader | CMode::CImplementation => Mangling::C,
            CMode::CPlusPlusHeader | CMode::CPlusPlusImplementation => Mangling::CPlusPlus,
        }
    }
}

fn c_type(ty: ScalarType) -> String {
    match ty {
        ScalarType::Bool => "bool".to_string(),
        ScalarType::Int(bits) => format!("int{bits}_t"),
        ScalarType::UInt(bits) => format!("uint{bits}_t"),
        ScalarType::Float(bits) if bits <= 32 => "float".to_string(),
        ScalarType::Float(_) => "double".to_string(),
    }
}

fn header_guard(module_name: &str) -> String {
    let name: String = module_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("KILN_{name}_H")
}

/// Renders modules as C or C++ source.
#[derive(Debug, Clone, Copy)]
pub struct CodegenC {
    mode: CMode,
}

impl CodegenC {
    #[must_use]
    pub const fn new(mode: CMode) -> Self {
        Self { mode }
    }

    #[must_use]
    pub const fn mode(&self) -> CMode {
        self.mode
    }

    /// Render `module` in this generator's mode.
    #[must_use]
    pub fn compile(&self, module: &Module) -> String {
        let mut printer = Printer {
            out: String::new(),
            depth: 0,
            mangling: self.mode.mangling(),
        };
        if self.mode.is_header() {
            printer.header(module);
        } else {
            printer.implementation(module);
        }
        printer.out
    }
}

struct Printer {
    out: String,
    depth: usize,
    mangling: Mangling,
}

impl Printer {
    fn line(&mut self, text: &str) {
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.out.push_str(INDENT);
            }
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    fn extern_c_open(&mut self) {
        self.line("#ifdef __cplusplus");
        self.line("extern \"C\" {");
        self.line("#endif");
    }

    fn extern_c_close(&mut self) {
        self.line("#ifdef __cplusplus");
        self.line("}  // extern \"C\"");
        self.line("#endif");
    }

    fn header(&mut self, module: &Module) {
        let guard = header_guard(module.name());
        self.line(&format!("#ifndef {guard}"));
        self.line(&format!("#define {guard}"));
        self.line("");
        self.line("#include <stdbool.h>");
        self.line("#include <stdint.h>");
        self.line("");

        if self.mangling == Mangling::C {
            self.extern_c_open();
            self.line("");
        }
        for function in module.external_functions() {
            self.in_namespaces(function, |p| {
                let proto = p.prototype(function);
                p.line(&format!("{proto};"));
            });
            self.line("");
        }
        if self.mangling == Mangling::C {
            self.extern_c_close();
            self.line("");
        }

        self.line(&format!("#endif  // {guard}"));
    }

    fn implementation(&mut self, module: &Module) {
        self.line(&format!(
            "// kiln module '{}' for {}",
            module.name(),
            module.target()
        ));
        self.line("#include <math.h>");
        self.line("#include <stdbool.h>");
        self.line("#include <stdint.h>");
        self.line("");

        let externs = undefined_callees(module);
        if !externs.is_empty() {
            self.extern_c_open();
            for (name, ret, params) in &externs {
                let params: Vec<String> = params.iter().map(|ty| c_type(*ty)).collect();
                let params = if params.is_empty() {
                    "void".to_string()
                } else {
                    params.join(", ")
                };
                self.line(&format!("{} {name}({params});", c_type(*ret)));
            }
            self.extern_c_close();
            self.line("");
        }

        if self.mangling == Mangling::C {
            self.extern_c_open();
            self.line("");
        }
        for function in module.functions() {
            self.in_namespaces(function, |p| {
                let proto = p.prototype(function);
                p.line(&format!("{proto};"));
            });
        }
        if !module.is_empty() {
            self.line("");
        }
        for function in module.functions() {
            self.in_namespaces(function, |p| p.definition(function));
            self.line("");
        }
        if self.mangling == Mangling::C {
            self.extern_c_close();
        }
    }

    fn in_namespaces(&mut self, function: &Function, body: impl FnOnce(&mut Self)) {
        let namespaces = match self.mangling {
            Mangling::C => Vec::new(),
            Mangling::CPlusPlus => function.namespaces(),
        };
        for ns in &namespaces {
            self.line(&format!("namespace {ns} {{"));
        }
        body(self);
        for ns in namespaces.iter().rev() {
            self.line(&format!("}}  // namespace {ns}"));
        }
    }

    fn function_name(&self, function: &Function) -> String {
        match self.mangling {
            Mangling::C => function.flat_name(),
            Mangling::CPlusPlus => function.simple_name().to_string(),
        }
    }

    fn prototype(&self, function: &Function) -> String {
        let storage = if function.is_external() { "" } else { "static " };
        let params: Vec<String> = function
            .args
            .iter()
            .map(|arg| {
                if arg.is_buffer() {
                    format!("{} *{}", c_type(arg.ty), arg.name)
                } else {
                    format!("{} {}", c_type(arg.ty), arg.name)
                }
            })
            .collect();
        let params = if params.is_empty() {
            "void".to_string()
        } else {
            params.join(", ")
        };
        format!(
            "{storage}{} {}({params})",
            c_type(function.ret),
            self.function_name(function)
        )
    }

    fn definition(&mut self, function: &Function) {
        let proto = self.prototype(function);
        self.line(&format!("{proto} {{"));
        self.depth += 1;
        for stmt in &function.body {
            self.stmt(stmt);
        }
        if !matches!(function.body.last(), Some(Stmt::Return(_))) {
            let zero = match function.ret {
                ScalarType::Bool => "false",
                ScalarType::Float(_) => "0.0",
                _ => "0",
            };
            self.line(&format!("return {zero};"));
        }
        self.depth -= 1;
        self.line("}");
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Let { name, value } => {
                let text = format!("const {} {name} = {};", c_type(value.ty()), self.expr(value));
                self.line(&text);
            }
            Stmt::Store {
                buffer,
                index,
                value,
            } => {
                let text = format!("{buffer}[{}] = {};", self.expr(index), self.expr(value));
                self.line(&text);
            }
            Stmt::For {
                var,
                min,
                extent,
                body,
            } => {
                let text = format!(
                    "for (int32_t {var} = {}, {var}_end = {var} + ({}); {var} < {var}_end; {var}++) {{",
                    self.expr(min),
                    self.expr(extent)
                );
                self.line(&text);
                self.depth += 1;
                for stmt in body {
                    self.stmt(stmt);
                }
                self.depth -= 1;
                self.line("}");
            }
            Stmt::Evaluate(expr) => {
                let text = format!("(void){};", self.expr(expr));
                self.line(&text);
            }
            Stmt::Return(expr) => {
                let text = format!("return {};", self.expr(expr));
                self.line(&text);
            }
        }
    }

    fn call_name(&self, name: &str) -> String {
        match self.mangling {
            Mangling::C => name.replace(kiln_ir::NAMESPACE_SEPARATOR, "_"),
            Mangling::CPlusPlus => name.to_string(),
        }
    }

    fn expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::IntImm { value, ty } => {
                if *ty == ScalarType::I32 {
                    value.to_string()
                } else {
                    format!("(({}){value})", c_type(*ty))
                }
            }
            Expr::FloatImm { value, ty } => float_literal(*value, *ty),
            Expr::BoolImm(value) => value.to_string(),
            Expr::Var { name, .. } => name.clone(),
            Expr::Binary { op, lhs, rhs } => {
                let ty = lhs.ty();
                let (a, b) = (self.expr(lhs), self.expr(rhs));
                match op {
                    BinaryOp::Mod if ty.is_float() => {
                        let func = if ty == ScalarType::F32 { "fmodf" } else { "fmod" };
                        format!("{func}({a}, {b})")
                    }
                    BinaryOp::Min => format!("(({a}) < ({b}) ? ({a}) : ({b}))"),
                    BinaryOp::Max => format!("(({a}) > ({b}) ? ({a}) : ({b}))"),
                    _ => {
                        let symbol = op.symbol().unwrap_or("?");
                        format!("({a} {symbol} {b})")
                    }
                }
            }
            Expr::Cast { ty, value } => format!("(({})({}))", c_type(*ty), self.expr(value)),
            Expr::Load { buffer, index, .. } => format!("{buffer}[{}]", self.expr(index)),
            Expr::Call { name, args, .. } => {
                let args: Vec<String> = args.iter().map(|arg| self.expr(arg)).collect();
                format!("{}({})", self.call_name(name), args.join(", "))
            }
        }
    }
}

fn float_literal(value: f64, ty: ScalarType) -> String {
    let suffix = if ty == ScalarType::F32 { "f" } else { "" };
    if value.is_nan() {
        "NAN".to_string()
    } else if value.is_infinite() {
        let sign = if value < 0.0 { "-" } else { "" };
        format!("{sign}INFINITY")
    } else {
        format!("{value:?}{suffix}")
    }
}

/// Callees not defined by the module, with their signatures, in first-use order.
fn undefined_callees(module: &Module) -> Vec<(String, ScalarType, Vec<ScalarType>)> {
    let defined: FxHashSet<&str> = module
        .functions()
        .iter()
        .map(|f| f.name.as_str())
        .collect();
    let mut seen = FxHashSet::default();
    let mut found = Vec::new();

    let mut visit = |expr: &Expr| {
        if let Expr::Call { name, ty, args } = expr {
            if !defined.contains(name.as_str()) && seen.insert(name.clone()) {
                found.push((name.clone(), *ty, args.iter().map(Expr::ty).collect()));
            }
        }
    };
    for function in module.functions() {
        walk_stmts(&function.body, &mut visit);
    }
    found
}

fn walk_stmts(stmts: &[Stmt], visit: &mut impl FnMut(&Expr)) {
    for stmt in stmts {
        match stmt {
            Stmt::Let { value, .. } => walk_expr(value, visit),
            Stmt::Store { index, value, .. } => {
                walk_expr(index, visit);
                walk_expr(value, visit);
            }
            Stmt::For {
                min, extent, body, ..
            } => {
                walk_expr(min, visit);
                walk_expr(extent, visit);
                walk_stmts(body, visit);
            }
            Stmt::Evaluate(expr) | Stmt::Return(expr) => walk_expr(expr, visit),
        }
    }
}

fn walk_expr(expr: &Expr, visit: &mut impl FnMut(&Expr)) {
    visit(expr);
    match expr {
        Expr::Binary { lhs, rhs, .. } => {
            walk_expr(lhs, visit);
            walk_expr(rhs, visit);
        }
        Expr::Cast { value, .. } => walk_expr(value, visit),
        Expr::Load { index, .. } => walk_expr(index, visit),
        Expr::Call { args, .. } => {
            for arg in args {
                walk_expr(arg, visit);
            }
        }
        Expr::IntImm { .. } | Expr::FloatImm { .. } | Expr::BoolImm(_) | Expr::Var { .. } => {}
    }
}

/// Emit the C header for `module` at `path`.
#[tracing::instrument(level = "debug", skip_all, fields(module = module.name(), path = %path.display(), mangling = ?mangling))]
pub fn emit_header(module: &Module, path: &Path, mangling: Mangling) -> Result<(), EmitError> {
    let text = CodegenC::new(CMode::header(mangling)).compile(module);
    write_artifact(path, text.as_bytes())
}

/// Emit the C implementation for `module` at `path`.
#[tracing::instrument(level = "debug", skip_all, fields(module = module.name(), path = %path.display(), mangling = ?mangling))]
pub fn emit_implementation(
    module: &Module,
    path: &Path,
    mangling: Mangling,
) -> Result<(), EmitError> {
    let text = CodegenC::new(CMode::implementation(mangling)).compile(module);
    write_artifact(path, text.as_bytes())
}
