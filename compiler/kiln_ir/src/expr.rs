//! Lowered expressions and statements.
//!
//! This is the final, fully-lowered form handed to backends: scalar types
//! only, explicit buffer loads and stores, and counted loops. Every
//! expression knows its own type so backends never need an environment to
//! render it.

use serde::{Deserialize, Serialize};

/// A scalar machine type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    Bool,
    /// Signed integer of the given bit width.
    Int(u8),
    /// Unsigned integer of the given bit width.
    UInt(u8),
    /// IEEE float of the given bit width (32 or 64).
    Float(u8),
}

impl ScalarType {
    pub const I8: Self = ScalarType::Int(8);
    pub const I16: Self = ScalarType::Int(16);
    pub const I32: Self = ScalarType::Int(32);
    pub const I64: Self = ScalarType::Int(64);
    pub const U8: Self = ScalarType::UInt(8);
    pub const U16: Self = ScalarType::UInt(16);
    pub const U32: Self = ScalarType::UInt(32);
    pub const U64: Self = ScalarType::UInt(64);
    pub const F32: Self = ScalarType::Float(32);
    pub const F64: Self = ScalarType::Float(64);

    /// Width in bits. `Bool` is one bit.
    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            ScalarType::Bool => 1,
            ScalarType::Int(bits) | ScalarType::UInt(bits) | ScalarType::Float(bits) => bits,
        }
    }

    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, ScalarType::Float(_))
    }

    #[must_use]
    pub const fn is_unsigned(self) -> bool {
        matches!(self, ScalarType::UInt(_) | ScalarType::Bool)
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Min,
    Max,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    /// Comparisons and logical operators produce `Bool`.
    #[must_use]
    pub const fn is_boolean(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::Ne
                | BinaryOp::Lt
                | BinaryOp::Le
                | BinaryOp::Gt
                | BinaryOp::Ge
                | BinaryOp::And
                | BinaryOp::Or
        )
    }

    /// Infix spelling, or `None` for `min`/`max` which print as calls.
    #[must_use]
    pub const fn symbol(self) -> Option<&'static str> {
        match self {
            BinaryOp::Add => Some("+"),
            BinaryOp::Sub => Some("-"),
            BinaryOp::Mul => Some("*"),
            BinaryOp::Div => Some("/"),
            BinaryOp::Mod => Some("%"),
            BinaryOp::Eq => Some("=="),
            BinaryOp::Ne => Some("!="),
            BinaryOp::Lt => Some("<"),
            BinaryOp::Le => Some("<="),
            BinaryOp::Gt => Some(">"),
            BinaryOp::Ge => Some(">="),
            BinaryOp::And => Some("&&"),
            BinaryOp::Or => Some("||"),
            BinaryOp::Min | BinaryOp::Max => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
            BinaryOp::Mod => "mod",
            BinaryOp::Min => "min",
            BinaryOp::Max => "max",
            BinaryOp::Eq => "eq",
            BinaryOp::Ne => "ne",
            BinaryOp::Lt => "lt",
            BinaryOp::Le => "le",
            BinaryOp::Gt => "gt",
            BinaryOp::Ge => "ge",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}

/// A typed expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    IntImm {
        value: i64,
        ty: ScalarType,
    },
    FloatImm {
        value: f64,
        ty: ScalarType,
    },
    BoolImm(bool),
    Var {
        name: String,
        ty: ScalarType,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Cast {
        ty: ScalarType,
        value: Box<Expr>,
    },
    /// Read `buffer[index]`; `ty` is the buffer's element type.
    Load {
        buffer: String,
        ty: ScalarType,
        index: Box<Expr>,
    },
    /// Call an extern function by symbol name.
    Call {
        name: String,
        ty: ScalarType,
        args: Vec<Expr>,
    },
}

impl Expr {
    /// A 32-bit signed integer immediate.
    #[must_use]
    pub fn int(value: i64) -> Self {
        Expr::IntImm {
            value,
            ty: ScalarType::I32,
        }
    }

    #[must_use]
    pub fn float(value: f64) -> Self {
        Expr::FloatImm {
            value,
            ty: ScalarType::F32,
        }
    }

    #[must_use]
    pub fn var(name: impl Into<String>, ty: ScalarType) -> Self {
        Expr::Var {
            name: name.into(),
            ty,
        }
    }

    #[must_use]
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    #[must_use]
    pub fn cast(ty: ScalarType, value: Expr) -> Self {
        Expr::Cast {
            ty,
            value: Box::new(value),
        }
    }

    #[must_use]
    pub fn load(buffer: impl Into<String>, ty: ScalarType, index: Expr) -> Self {
        Expr::Load {
            buffer: buffer.into(),
            ty,
            index: Box::new(index),
        }
    }

    #[must_use]
    pub fn call(name: impl Into<String>, ty: ScalarType, args: Vec<Expr>) -> Self {
        Expr::Call {
            name: name.into(),
            ty,
            args,
        }
    }

    /// The type this expression evaluates to.
    #[must_use]
    pub fn ty(&self) -> ScalarType {
        match self {
            Expr::IntImm { ty, .. }
            | Expr::FloatImm { ty, .. }
            | Expr::Var { ty, .. }
            | Expr::Cast { ty, .. }
            | Expr::Load { ty, .. }
            | Expr::Call { ty, .. } => *ty,
            Expr::BoolImm(_) => ScalarType::Bool,
            Expr::Binary { op, lhs, .. } => {
                if op.is_boolean() {
                    ScalarType::Bool
                } else {
                    lhs.ty()
                }
            }
        }
    }
}

/// A lowered statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// Bind `name` for the rest of the enclosing block.
    Let { name: String, value: Expr },
    /// Write `buffer[index] = value`.
    Store {
        buffer: String,
        index: Expr,
        value: Expr,
    },
    /// `for var in min..min+extent`, with `var` typed `Int(32)`.
    For {
        var: String,
        min: Expr,
        extent: Expr,
        body: Vec<Stmt>,
    },
    /// Evaluate for side effects (typically a call).
    Evaluate(Expr),
    Return(Expr),
}

impl Stmt {
    #[must_use]
    pub fn let_(name: impl Into<String>, value: Expr) -> Self {
        Stmt::Let {
            name: name.into(),
            value,
        }
    }

    #[must_use]
    pub fn store(buffer: impl Into<String>, index: Expr, value: Expr) -> Self {
        Stmt::Store {
            buffer: buffer.into(),
            index,
            value,
        }
    }

    #[must_use]
    pub fn for_(var: impl Into<String>, min: Expr, extent: Expr, body: Vec<Stmt>) -> Self {
        Stmt::For {
            var: var.into(),
            min,
            extent,
            body,
        }
    }
}
