//! Lowered modules.
//!
//! A [`Module`] is one finalized compilation unit: a name (used for default
//! output filenames), the [`Target`] it was lowered for, and its functions.
//! Output backends only ever borrow a module.

use serde::{Deserialize, Serialize};

use crate::expr::{ScalarType, Stmt};
use crate::target::Target;

/// Separator for namespaced function names (`ns::inner::func`).
pub const NAMESPACE_SEPARATOR: &str = "::";

/// Symbol visibility of a lowered function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Linkage {
    /// Visible to the linker and declared in generated headers.
    External,
    /// Local to the emitted artifact.
    Internal,
}

/// How an argument is passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArgKind {
    /// Passed by value.
    Scalar,
    /// Passed as a pointer to elements of the argument's type.
    Buffer,
}

/// A function argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    pub kind: ArgKind,
    pub ty: ScalarType,
}

impl Argument {
    #[must_use]
    pub fn scalar(name: impl Into<String>, ty: ScalarType) -> Self {
        Self {
            name: name.into(),
            kind: ArgKind::Scalar,
            ty,
        }
    }

    #[must_use]
    pub fn buffer(name: impl Into<String>, ty: ScalarType) -> Self {
        Self {
            name: name.into(),
            kind: ArgKind::Buffer,
            ty,
        }
    }

    #[must_use]
    pub fn is_buffer(&self) -> bool {
        self.kind == ArgKind::Buffer
    }
}

/// A fully lowered function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub linkage: Linkage,
    pub args: Vec<Argument>,
    pub ret: ScalarType,
    pub body: Vec<Stmt>,
}

impl Function {
    /// An external function returning `ret`, with no arguments and an empty body.
    #[must_use]
    pub fn new(name: impl Into<String>, ret: ScalarType) -> Self {
        Self {
            name: name.into(),
            linkage: Linkage::External,
            args: Vec::new(),
            ret,
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_linkage(mut self, linkage: Linkage) -> Self {
        self.linkage = linkage;
        self
    }

    #[must_use]
    pub fn with_arg(mut self, arg: Argument) -> Self {
        self.args.push(arg);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Vec<Stmt>) -> Self {
        self.body = body;
        self
    }

    /// The name without any namespace qualification.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.name
            .rsplit(NAMESPACE_SEPARATOR)
            .next()
            .unwrap_or(&self.name)
    }

    /// Enclosing namespaces, outermost first.
    #[must_use]
    pub fn namespaces(&self) -> Vec<&str> {
        let mut parts: Vec<&str> = self.name.split(NAMESPACE_SEPARATOR).collect();
        parts.pop();
        parts
    }

    /// Flat symbol name: namespaces joined with `_`.
    #[must_use]
    pub fn flat_name(&self) -> String {
        self.name.replace(NAMESPACE_SEPARATOR, "_")
    }

    #[must_use]
    pub fn is_external(&self) -> bool {
        self.linkage == Linkage::External
    }
}

/// A finalized, target-bound compilation unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    name: String,
    target: Target,
    functions: Vec<Function>,
}

impl Module {
    /// An empty module bound to `target`.
    #[must_use]
    pub fn new(name: impl Into<String>, target: Target) -> Self {
        Self {
            name: name.into(),
            target,
            functions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_function(mut self, function: Function) -> Self {
        self.functions.push(function);
        self
    }

    pub fn append(&mut self, function: Function) {
        self.functions.push(function);
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn target(&self) -> &Target {
        &self.target
    }

    #[must_use]
    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    /// External functions, in declaration order.
    pub fn external_functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.iter().filter(|f| f.is_external())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
