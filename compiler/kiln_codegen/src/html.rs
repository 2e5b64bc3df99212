//! HTML debug dump.
//!
//! A self-contained page showing the module's target and every function, with
//! one nested `<div>` per statement so loop structure can be folded in a
//! browser. Expressions use the same spelling as the `.stmt` text dump.

use std::path::Path;

use kiln_ir::{Function, Module, Stmt};

use crate::error::{write_artifact, EmitError};

const STYLE: &str = "body { font-family: monospace; }\n\
.function { margin: 1em 0; }\n\
.block { margin-left: 2em; }\n\
.keyword { font-weight: bold; }\n";

/// Escape text for HTML element content and attribute values.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn keyword(word: &str) -> String {
    format!("<span class=\"keyword\">{word}</span>")
}

fn render_stmt(out: &mut String, stmt: &Stmt) {
    match stmt {
        Stmt::For {
            var,
            min,
            extent,
            body,
        } => {
            out.push_str(&format!(
                "<div class=\"stmt\">{} ({}, {}, {}) {{\n<div class=\"block\">\n",
                keyword("for"),
                escape(var),
                escape(&min.to_string()),
                escape(&extent.to_string())
            ));
            for stmt in body {
                render_stmt(out, stmt);
            }
            out.push_str("</div>\n}</div>\n");
        }
        Stmt::Let { name, value } => out.push_str(&format!(
            "<div class=\"stmt\">{} {} = {}</div>\n",
            keyword("let"),
            escape(name),
            escape(&value.to_string())
        )),
        Stmt::Return(value) => out.push_str(&format!(
            "<div class=\"stmt\">{} {}</div>\n",
            keyword("return"),
            escape(&value.to_string())
        )),
        Stmt::Store { .. } | Stmt::Evaluate(_) => out.push_str(&format!(
            "<div class=\"stmt\">{}</div>\n",
            escape(stmt.to_string().trim_end())
        )),
    }
}

fn render_function(out: &mut String, function: &Function) {
    let args: Vec<String> = function.args.iter().map(ToString::to_string).collect();
    let linkage = if function.is_external() {
        "external"
    } else {
        "internal"
    };
    out.push_str(&format!(
        "<div class=\"function\" id=\"{}\">\n",
        escape(&function.flat_name())
    ));
    out.push_str(&format!(
        "{} {} {}({}) -&gt; {} {{\n<div class=\"block\">\n",
        keyword(linkage),
        keyword("func"),
        escape(&function.name),
        escape(&args.join(", ")),
        function.ret
    ));
    for stmt in &function.body {
        render_stmt(out, stmt);
    }
    out.push_str("</div>\n}\n</div>\n");
}

/// Render `module` as an HTML page.
#[must_use]
pub fn render_html(module: &Module) -> String {
    let name = escape(module.name());
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(&format!("<title>{name}</title>\n"));
    out.push_str(&format!("<style>\n{STYLE}</style>\n</head>\n<body>\n"));
    out.push_str(&format!("<h1>Module {name}</h1>\n"));
    out.push_str(&format!(
        "<p>Target: <code>{}</code></p>\n",
        escape(&module.target().to_string())
    ));
    for function in module.functions() {
        render_function(&mut out, function);
    }
    out.push_str("</body>\n</html>\n");
    out
}

/// Emit the HTML dump of `module` at `path`.
#[tracing::instrument(level = "debug", skip_all, fields(module = module.name(), path = %path.display()))]
pub fn emit_html(module: &Module, path: &Path) -> Result<(), EmitError> {
    let html = render_html(module);
    write_artifact(path, html.as_bytes())
}
