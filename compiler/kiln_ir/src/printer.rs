//! Human-readable text rendering of lowered modules.
//!
//! `Display` on [`Module`] is the `.stmt` text dump format. The output is for
//! people reading compiler output; nothing parses it back.

use std::fmt::{self, Display, Formatter, Write};

use crate::expr::{BinaryOp, Expr, ScalarType, Stmt};
use crate::module::{ArgKind, Argument, Function, Linkage, Module};

const INDENT: &str = "  ";

impl Display for ScalarType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScalarType::Bool => f.write_str("bool"),
            ScalarType::Int(bits) => write!(f, "int{bits}"),
            ScalarType::UInt(bits) => write!(f, "uint{bits}"),
            ScalarType::Float(bits) => write!(f, "float{bits}"),
        }
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol().unwrap_or_else(|| self.name()))
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expr::IntImm { value, ty } => {
                if *ty == ScalarType::I32 {
                    write!(f, "{value}")
                } else {
                    write!(f, "({ty}){value}")
                }
            }
            Expr::FloatImm { value, ty } => {
                if *ty == ScalarType::F32 {
                    write!(f, "{value:?}f")
                } else {
                    write!(f, "{value:?}")
                }
            }
            Expr::BoolImm(value) => write!(f, "{value}"),
            Expr::Var { name, .. } => f.write_str(name),
            Expr::Binary { op, lhs, rhs } => match op.symbol() {
                Some(symbol) => write!(f, "({lhs} {symbol} {rhs})"),
                None => write!(f, "{}({lhs}, {rhs})", op.name()),
            },
            Expr::Cast { ty, value } => write!(f, "{ty}({value})"),
            Expr::Load { buffer, index, .. } => write!(f, "{buffer}[{index}]"),
            Expr::Call { name, args, .. } => {
                write!(f, "{name}(")?;
                write_comma_separated(f, args)?;
                f.write_char(')')
            }
        }
    }
}

fn write_comma_separated<T: Display>(f: &mut Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_indent(f: &mut Formatter<'_>, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        f.write_str(INDENT)?;
    }
    Ok(())
}

fn write_stmt(f: &mut Formatter<'_>, stmt: &Stmt, depth: usize) -> fmt::Result {
    write_indent(f, depth)?;
    match stmt {
        Stmt::Let { name, value } => writeln!(f, "let {name} = {value}"),
        Stmt::Store {
            buffer,
            index,
            value,
        } => writeln!(f, "{buffer}[{index}] = {value}"),
        Stmt::For {
            var,
            min,
            extent,
            body,
        } => {
            writeln!(f, "for ({var}, {min}, {extent}) {{")?;
            write_block(f, body, depth + 1)?;
            write_indent(f, depth)?;
            writeln!(f, "}}")
        }
        Stmt::Evaluate(expr) => writeln!(f, "{expr}"),
        Stmt::Return(expr) => writeln!(f, "return {expr}"),
    }
}

fn write_block(f: &mut Formatter<'_>, body: &[Stmt], depth: usize) -> fmt::Result {
    body.iter().try_for_each(|stmt| write_stmt(f, stmt, depth))
}

impl Display for Stmt {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_stmt(f, self, 0)
    }
}

impl Display for Argument {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.kind {
            ArgKind::Scalar => write!(f, "{} {}", self.ty, self.name),
            ArgKind::Buffer => write!(f, "buffer<{}> {}", self.ty, self.name),
        }
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let linkage = match self.linkage {
            Linkage::External => "external",
            Linkage::Internal => "internal",
        };
        write!(f, "{linkage} func {}(", self.name)?;
        write_comma_separated(f, &self.args)?;
        writeln!(f, ") -> {} {{", self.ret)?;
        write_block(f, &self.body, 1)?;
        writeln!(f, "}}")
    }
}

impl Display for Module {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "module name={}, target={}", self.name(), self.target())?;
        self.functions()
            .iter()
            .try_for_each(|function| write!(f, "{function}"))
    }
}
