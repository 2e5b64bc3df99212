//! Portable Assembly Text
//!
//! Renders a [`Module`] as LLVM-flavoured SSA text (`.ll`). This is the
//! human-readable sibling of [`bitcode`](crate::bitcode) and the "assembly"
//! form of architectures whose [`CodeForm`](kiln_ir::CodeForm) is
//! `BitcodeOnly`.
//!
//! # Lowering
//!
//! - Scalars map to `i1`/`iN`/`half`/`float`/`double`; buffers are `ptr`.
//! - `let` binds a name to an SSA value for the rest of its block.
//! - Loop counters live in an `alloca` slot; each `for` gets a
//!   header/body/exit block triple.
//! - `min`/`max` lower to the `llvm.{s,u}{min,max}` and `llvm.{min,max}num`
//!   intrinsics, declared once per module.
//! - Functions whose body does not end in `return` get a zero return.

use std::path::Path;

use kiln_ir::{Arch, BinaryOp, Expr, Features, Function, Module, Os, RuntimeLinkage, ScalarType, Stmt, Target};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{write_artifact, EmitError};

/// Target triple spelling for `target`.
#[must_use]
pub fn llvm_triple(target: &Target) -> String {
    let arch = match (target.arch(), target.bits()) {
        (Arch::X86, 64) => "x86_64",
        (Arch::X86, _) => "i386",
        (Arch::Arm, 64) => "aarch64",
        (Arch::Arm, _) if target.has_feature(Features::ARMV7S) => "armv7s",
        (Arch::Arm, _) => "armv7",
        (Arch::Mips, 64) => "mips64",
        (Arch::Mips, _) => "mips",
        (Arch::PowerPc, 64) => "powerpc64",
        (Arch::PowerPc, _) => "powerpc",
        (Arch::Hexagon, _) => "hexagon",
        (Arch::PNaCl, _) => "le32",
        (Arch::Unknown, _) => "unknown",
    };
    let rest = match target.os() {
        Os::Linux => "unknown-linux-gnu",
        Os::Android => "unknown-linux-android",
        Os::Windows if target.has_feature(Features::MINGW) => "pc-windows-gnu",
        Os::Windows => "pc-windows-msvc",
        Os::OSX => "apple-macosx",
        Os::IOS => "apple-ios",
        Os::NaCl => "unknown-nacl",
        Os::Unknown => "unknown-unknown",
    };
    format!("{arch}-{rest}")
}

fn ir_type(ty: ScalarType) -> String {
    match ty {
        ScalarType::Bool => "i1".to_string(),
        ScalarType::Int(bits) | ScalarType::UInt(bits) => format!("i{bits}"),
        ScalarType::Float(16) => "half".to_string(),
        ScalarType::Float(32) => "float".to_string(),
        ScalarType::Float(_) => "double".to_string(),
    }
}

/// Suffix used in overloaded intrinsic names (`i32`, `f64`).
fn intrinsic_suffix(ty: ScalarType) -> String {
    match ty {
        ScalarType::Float(bits) => format!("f{bits}"),
        other => ir_type(other),
    }
}

/// Floats are written as the hex bit pattern of the value widened to double,
/// which is exact for every float width.
fn float_literal(value: f64, ty: ScalarType) -> String {
    let widened = if ty == ScalarType::F32 {
        f64::from(value as f32)
    } else {
        value
    };
    format!("0x{:016X}", widened.to_bits())
}

fn zero_literal(ty: ScalarType) -> String {
    match ty {
        ScalarType::Bool => "false".to_string(),
        ScalarType::Float(_) => float_literal(0.0, ty),
        _ => "0".to_string(),
    }
}

/// Module-wide state: external declarations and the set of defined symbols.
struct ModuleContext {
    defined: FxHashSet<String>,
    declares: FxHashMap<String, String>,
}

impl ModuleContext {
    fn new(module: &Module) -> Self {
        Self {
            defined: module.functions().iter().map(Function::flat_name).collect(),
            declares: FxHashMap::default(),
        }
    }

    fn declare(&mut self, symbol: &str, ret: ScalarType, params: &[ScalarType]) {
        if self.defined.contains(symbol) || self.declares.contains_key(symbol) {
            return;
        }
        let params: Vec<String> = params.iter().map(|ty| ir_type(*ty)).collect();
        self.declares.insert(
            symbol.to_string(),
            format!("declare {} @{symbol}({})", ir_type(ret), params.join(", ")),
        );
    }

    fn sorted_declares(&self) -> Vec<&str> {
        let mut names: Vec<&String> = self.declares.keys().collect();
        names.sort();
        names
            .into_iter()
            .filter_map(|name| self.declares.get(name).map(String::as_str))
            .collect()
    }
}

/// Per-function lowering state.
struct Lowerer<'m> {
    ctx: &'m mut ModuleContext,
    out: String,
    scope: FxHashMap<String, String>,
    next_value: u32,
    next_label: u32,
    terminated: bool,
}

impl<'m> Lowerer<'m> {
    fn new(ctx: &'m mut ModuleContext) -> Self {
        Self {
            ctx,
            out: String::new(),
            scope: FxHashMap::default(),
            next_value: 0,
            next_label: 0,
            terminated: false,
        }
    }

    fn fresh(&mut self) -> String {
        let name = format!("%.t{}", self.next_value);
        self.next_value += 1;
        name
    }

    fn inst(&mut self, text: &str) {
        self.out.push_str("  ");
        self.out.push_str(text);
        self.out.push('\n');
    }

    /// Emit `%v = <rhs>` and return `%v`.
    fn assign(&mut self, rhs: &str) -> String {
        let value = self.fresh();
        self.inst(&format!("{value} = {rhs}"));
        value
    }

    fn terminate(&mut self, text: &str) {
        self.inst(text);
        self.terminated = true;
    }

    fn start_block(&mut self, label: &str) {
        self.out.push_str(label);
        self.out.push_str(":\n");
        self.terminated = false;
    }

    fn lower_function(mut self, function: &Function) -> String {
        let linkage = if function.is_external() {
            ""
        } else {
            "internal "
        };
        let params: Vec<String> = function
            .args
            .iter()
            .map(|arg| {
                let ty = if arg.is_buffer() {
                    "ptr".to_string()
                } else {
                    ir_type(arg.ty)
                };
                format!("{ty} %{}", arg.name)
            })
            .collect();
        for arg in &function.args {
            self.scope.insert(arg.name.clone(), format!("%{}", arg.name));
        }

        let header = format!(
            "define {linkage}{} @{}({}) {{\n",
            ir_type(function.ret),
            function.flat_name(),
            params.join(", ")
        );
        self.start_block("entry");
        self.lower_block(&function.body, function.ret);
        if !self.terminated {
            let ret = format!("ret {} {}", ir_type(function.ret), zero_literal(function.ret));
            self.terminate(&ret);
        }

        let mut text = header;
        text.push_str(&self.out);
        text.push_str("}\n");
        text
    }

    fn lower_block(&mut self, body: &[Stmt], ret: ScalarType) {
        let saved = self.scope.clone();
        for stmt in body {
            if self.terminated {
                break;
            }
            self.lower_stmt(stmt, ret);
        }
        self.scope = saved;
    }

    fn lower_stmt(&mut self, stmt: &Stmt, ret: ScalarType) {
        match stmt {
            Stmt::Let { name, value } => {
                let value = self.lower_expr(value);
                self.scope.insert(name.clone(), value);
            }
            Stmt::Store {
                buffer,
                index,
                value,
            } => {
                let ty = value.ty();
                let value = self.lower_expr(value);
                let ptr = self.element_ptr(buffer, ty, index);
                self.inst(&format!("store {} {value}, ptr {ptr}", ir_type(ty)));
            }
            Stmt::For {
                var,
                min,
                extent,
                body,
            } => self.lower_loop(var, min, extent, body, ret),
            Stmt::Evaluate(expr) => {
                self.lower_expr(expr);
            }
            Stmt::Return(expr) => {
                let value = self.lower_expr(expr);
                self.terminate(&format!("ret {} {value}", ir_type(ret)));
            }
        }
    }

    fn lower_loop(&mut self, var: &str, min: &Expr, extent: &Expr, body: &[Stmt], ret: ScalarType) {
        let id = self.next_label;
        self.next_label += 1;
        let header = format!("loop.header.{id}");
        let body_label = format!("loop.body.{id}");
        let exit = format!("loop.exit.{id}");

        let min = self.lower_expr(min);
        let extent = self.lower_expr(extent);
        let end = self.assign(&format!("add i32 {min}, {extent}"));
        let slot = format!("%{var}.addr.{id}");
        self.inst(&format!("{slot} = alloca i32"));
        self.inst(&format!("store i32 {min}, ptr {slot}"));
        self.terminate(&format!("br label %{header}"));

        self.start_block(&header);
        let counter = self.assign(&format!("load i32, ptr {slot}"));
        let cond = self.assign(&format!("icmp slt i32 {counter}, {end}"));
        self.terminate(&format!("br i1 {cond}, label %{body_label}, label %{exit}"));

        self.start_block(&body_label);
        let saved = self.scope.insert(var.to_string(), counter.clone());
        self.lower_block(body, ret);
        if !self.terminated {
            let next = self.assign(&format!("add i32 {counter}, 1"));
            self.inst(&format!("store i32 {next}, ptr {slot}"));
            self.terminate(&format!("br label %{header}"));
        }
        match saved {
            Some(previous) => self.scope.insert(var.to_string(), previous),
            None => self.scope.remove(var),
        };

        self.start_block(&exit);
    }

    fn element_ptr(&mut self, buffer: &str, elem: ScalarType, index: &Expr) -> String {
        let index_ty = ir_type(index.ty());
        let index = self.lower_expr(index);
        let base = self.lookup(buffer);
        self.assign(&format!(
            "getelementptr inbounds {}, ptr {base}, {index_ty} {index}",
            ir_type(elem)
        ))
    }

    fn lookup(&self, name: &str) -> String {
        self.scope
            .get(name)
            .cloned()
            .unwrap_or_else(|| format!("%{name}"))
    }

    fn lower_expr(&mut self, expr: &Expr) -> String {
        match expr {
            Expr::IntImm { value, .. } => value.to_string(),
            Expr::FloatImm { value, ty } => float_literal(*value, *ty),
            Expr::BoolImm(value) => value.to_string(),
            Expr::Var { name, .. } => self.lookup(name),
            Expr::Binary { op, lhs, rhs } => {
                let ty = lhs.ty();
                let lhs = self.lower_expr(lhs);
                let rhs = self.lower_expr(rhs);
                self.lower_binary(*op, ty, &lhs, &rhs)
            }
            Expr::Cast { ty, value } => {
                let from = value.ty();
                let value = self.lower_expr(value);
                self.lower_cast(from, *ty, value)
            }
            Expr::Load { buffer, ty, index } => {
                let ptr = self.element_ptr(buffer, *ty, index);
                self.assign(&format!("load {}, ptr {ptr}", ir_type(*ty)))
            }
            Expr::Call { name, ty, args } => {
                let symbol = name.replace(kiln_ir::NAMESPACE_SEPARATOR, "_");
                let arg_types: Vec<ScalarType> = args.iter().map(Expr::ty).collect();
                let values: Vec<String> = args.iter().map(|arg| self.lower_expr(arg)).collect();
                self.ctx.declare(&symbol, *ty, &arg_types);
                let operands: Vec<String> = arg_types
                    .iter()
                    .zip(&values)
                    .map(|(ty, value)| format!("{} {value}", ir_type(*ty)))
                    .collect();
                self.assign(&format!(
                    "call {} @{symbol}({})",
                    ir_type(*ty),
                    operands.join(", ")
                ))
            }
        }
    }

    fn lower_binary(&mut self, op: BinaryOp, ty: ScalarType, lhs: &str, rhs: &str) -> String {
        let t = ir_type(ty);
        let float = ty.is_float();
        let unsigned = ty.is_unsigned();
        let opcode = match op {
            BinaryOp::Add if float => "fadd",
            BinaryOp::Add => "add",
            BinaryOp::Sub if float => "fsub",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul if float => "fmul",
            BinaryOp::Mul => "mul",
            BinaryOp::Div if float => "fdiv",
            BinaryOp::Div if unsigned => "udiv",
            BinaryOp::Div => "sdiv",
            BinaryOp::Mod if float => "frem",
            BinaryOp::Mod if unsigned => "urem",
            BinaryOp::Mod => "srem",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Min | BinaryOp::Max => {
                let base = match (op, float, unsigned) {
                    (BinaryOp::Min, true, _) => "minnum",
                    (BinaryOp::Max, true, _) => "maxnum",
                    (BinaryOp::Min, false, true) => "umin",
                    (BinaryOp::Min, false, false) => "smin",
                    (_, false, true) => "umax",
                    _ => "smax",
                };
                let symbol = format!("llvm.{base}.{}", intrinsic_suffix(ty));
                self.ctx.declare(&symbol, ty, &[ty, ty]);
                return self.assign(&format!("call {t} @{symbol}({t} {lhs}, {t} {rhs})"));
            }
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                let pred = comparison_predicate(op, float, unsigned);
                let cmp = if float { "fcmp" } else { "icmp" };
                return self.assign(&format!("{cmp} {pred} {t} {lhs}, {rhs}"));
            }
        };
        self.assign(&format!("{opcode} {t} {lhs}, {rhs}"))
    }

    fn lower_cast(&mut self, from: ScalarType, to: ScalarType, value: String) -> String {
        if from == to {
            return value;
        }
        let (src, dst) = (ir_type(from), ir_type(to));
        if to == ScalarType::Bool {
            return if from.is_float() {
                let zero = zero_literal(from);
                self.assign(&format!("fcmp une {src} {value}, {zero}"))
            } else {
                self.assign(&format!("icmp ne {src} {value}, 0"))
            };
        }
        let opcode = match (from.is_float(), to.is_float()) {
            (false, false) => match from.bits().cmp(&to.bits()) {
                std::cmp::Ordering::Greater => "trunc",
                std::cmp::Ordering::Less if from.is_unsigned() => "zext",
                std::cmp::Ordering::Less => "sext",
                // Same width, signedness only: no instruction needed.
                std::cmp::Ordering::Equal => return value,
            },
            (false, true) if from.is_unsigned() => "uitofp",
            (false, true) => "sitofp",
            (true, false) if to.is_unsigned() => "fptoui",
            (true, false) => "fptosi",
            (true, true) if from.bits() > to.bits() => "fptrunc",
            (true, true) => "fpext",
        };
        self.assign(&format!("{opcode} {src} {value} to {dst}"))
    }
}

fn comparison_predicate(op: BinaryOp, float: bool, unsigned: bool) -> &'static str {
    match (op, float, unsigned) {
        (BinaryOp::Eq, true, _) => "oeq",
        (BinaryOp::Ne, true, _) => "one",
        (BinaryOp::Lt, true, _) => "olt",
        (BinaryOp::Le, true, _) => "ole",
        (BinaryOp::Gt, true, _) => "ogt",
        (BinaryOp::Ge, true, _) => "oge",
        (BinaryOp::Eq, false, _) => "eq",
        (BinaryOp::Ne, false, _) => "ne",
        (BinaryOp::Lt, false, true) => "ult",
        (BinaryOp::Lt, false, false) => "slt",
        (BinaryOp::Le, false, true) => "ule",
        (BinaryOp::Le, false, false) => "sle",
        (BinaryOp::Gt, false, true) => "ugt",
        (BinaryOp::Gt, false, false) => "sgt",
        (BinaryOp::Ge, false, true) => "uge",
        _ => "sge",
    }
}

/// Render `module` as portable assembly text.
#[must_use]
pub fn portable_text(module: &Module) -> String {
    let target = module.target();
    let mut ctx = ModuleContext::new(module);
    let functions: Vec<String> = module
        .functions()
        .iter()
        .map(|function| Lowerer::new(&mut ctx).lower_function(function))
        .collect();

    let runtime = match target.runtime_linkage() {
        RuntimeLinkage::Embedded => "embedded",
        RuntimeLinkage::External => "external",
    };

    let mut out = String::new();
    out.push_str(&format!("; ModuleID = '{}'\n", module.name()));
    out.push_str(&format!("source_filename = \"{}\"\n", module.name()));
    out.push_str(&format!("target triple = \"{}\"\n", llvm_triple(target)));
    out.push_str(&format!("; kiln target: {target}\n"));
    out.push_str(&format!("; runtime: {runtime}\n"));

    for function in &functions {
        out.push('\n');
        out.push_str(function);
    }

    let declares = ctx.sorted_declares();
    if !declares.is_empty() {
        out.push('\n');
        for declare in declares {
            out.push_str(declare);
            out.push('\n');
        }
    }
    out
}

/// Emit `module` as portable assembly text at `path`.
#[tracing::instrument(level = "debug", skip_all, fields(module = module.name(), path = %path.display()))]
pub fn emit_portable_assembly(module: &Module, path: &Path) -> Result<(), EmitError> {
    let text = portable_text(module);
    write_artifact(path, text.as_bytes())
}

#[cfg(test)]
mod tests;
