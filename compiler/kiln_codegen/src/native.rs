//! Native Object and Assembly Emission
//!
//! Writes relocatable objects for the module's target:
//! - ELF (Linux, Android, NaCl, unknown OS)
//! - Mach-O (OSX, iOS)
//! - COFF (Windows)
//!
//! # Layout
//!
//! ```text
//! ┌───────────────┐    ┌──────────────┐    ┌─────────────┐
//! │ kiln Module   │───▶│ MachineInfo  │───▶│ Object File │
//! │ (+ Target)    │    │ format/arch  │    │  (.o/.obj)  │
//! └───────────────┘    └──────────────┘    └─────────────┘
//! ```
//!
//! Each function gets one `.text` symbol whose body is the architecture's trap
//! instruction; instruction selection belongs to the code generator that
//! produced the module. When the target embeds the runtime, the runtime
//! symbols are defined (weak where the format allows it); otherwise they are
//! referenced as undefined.
//!
//! Architectures whose [`CodeForm`](kiln_ir::CodeForm) is `BitcodeOnly` have
//! no machine description here and are rejected with
//! [`EmitError::UnsupportedTarget`]. Routing them to bitcode is the caller's job.

use std::fmt;
use std::path::Path;

use kiln_ir::{Arch, Function, Module, Os, Target};
use object::write::{Object, StandardSection, Symbol, SymbolSection};
use object::{Architecture, BinaryFormat, Endianness, SymbolFlags, SymbolKind, SymbolScope};

use crate::error::{write_artifact, EmitError};
use crate::runtime::{embeds_runtime, runtime_symbols_for};

/// Object format, machine and byte order for a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineInfo {
    pub format: BinaryFormat,
    pub architecture: Architecture,
    pub endianness: Endianness,
}

impl MachineInfo {
    /// Describe the machine for `target`.
    ///
    /// # Errors
    ///
    /// Returns [`EmitError::UnsupportedTarget`] for architectures with no
    /// native form (`PNaCl`) or no known machine (`Unknown`).
    pub fn for_target(target: &Target, artifact: &'static str) -> Result<Self, EmitError> {
        let architecture = match (target.arch(), target.bits()) {
            (Arch::X86, 64) => Architecture::X86_64,
            (Arch::X86, _) => Architecture::I386,
            (Arch::Arm, 64) => Architecture::Aarch64,
            (Arch::Arm, _) => Architecture::Arm,
            (Arch::Mips, 64) => Architecture::Mips64,
            (Arch::Mips, _) => Architecture::Mips,
            (Arch::PowerPc, 64) => Architecture::PowerPc64,
            (Arch::PowerPc, _) => Architecture::PowerPc,
            (Arch::Hexagon, _) => Architecture::Hexagon,
            (Arch::PNaCl | Arch::Unknown, _) => {
                return Err(EmitError::UnsupportedTarget {
                    target: target.to_string(),
                    artifact,
                })
            }
        };

        let endianness = match target.arch() {
            Arch::Mips | Arch::PowerPc => Endianness::Big,
            _ => Endianness::Little,
        };

        Ok(Self {
            format: binary_format(target.os()),
            architecture,
            endianness,
        })
    }
}

/// Object container used by an operating system.
#[must_use]
pub fn binary_format(os: Os) -> BinaryFormat {
    match os {
        Os::Windows => BinaryFormat::Coff,
        Os::OSX | Os::IOS => BinaryFormat::MachO,
        Os::Linux | Os::Android | Os::NaCl | Os::Unknown => BinaryFormat::Elf,
    }
}

/// Encoded trap instruction used as every function body.
fn trap_stub(target: &Target) -> &'static [u8] {
    match (target.arch(), target.bits()) {
        // ud2
        (Arch::X86, _) => &[0x0F, 0x0B],
        // brk #0
        (Arch::Arm, 64) => &[0x00, 0x00, 0x20, 0xD4],
        // udf #0
        (Arch::Arm, _) => &[0xF0, 0x00, 0xF0, 0xE7],
        // break
        (Arch::Mips, _) => &[0x00, 0x00, 0x00, 0x0D],
        // tw 31,0,0
        (Arch::PowerPc, _) => &[0x7F, 0xE0, 0x00, 0x08],
        // trap0(#0)
        (Arch::Hexagon, _) => &[0x00, 0xC0, 0x00, 0x54],
        (Arch::PNaCl | Arch::Unknown, _) => &[],
    }
}

fn trap_mnemonic(target: &Target) -> &'static str {
    match (target.arch(), target.bits()) {
        (Arch::X86, _) => "ud2",
        (Arch::Arm, 64) => "brk #0",
        (Arch::Arm, _) => "udf #0",
        (Arch::Mips, _) => "break",
        (Arch::PowerPc, _) => "trap",
        (Arch::Hexagon, _) => "trap0(#0)",
        (Arch::PNaCl | Arch::Unknown, _) => "",
    }
}

fn comment_prefix(target: &Target) -> &'static str {
    match (target.arch(), target.bits()) {
        (Arch::Arm, 32) => "@",
        (Arch::Arm | Arch::Hexagon, _) => "//",
        _ => "#",
    }
}

fn function_alignment(target: &Target) -> u64 {
    if target.arch() == Arch::X86 {
        16
    } else {
        4
    }
}

/// Prefix the platform C ABI adds to symbol names in assembly.
fn symbol_prefix(target: &Target) -> &'static str {
    if target.os().is_apple() || (target.os() == Os::Windows && target.bits() == 32) {
        "_"
    } else {
        ""
    }
}

fn symbol_scope(function: &Function) -> SymbolScope {
    if function.is_external() {
        SymbolScope::Linkage
    } else {
        SymbolScope::Compilation
    }
}

fn build_object(module: &Module) -> Result<Object<'static>, EmitError> {
    let target = module.target();
    let machine = MachineInfo::for_target(target, "object")?;

    let mut obj = Object::new(machine.format, machine.architecture, machine.endianness);
    let text = obj.section_id(StandardSection::Text);
    let stub = trap_stub(target);
    let align = function_alignment(target);

    let define = |obj: &mut Object<'static>, name: String, scope: SymbolScope, weak: bool| {
        let offset = obj.append_section_data(text, stub, align);
        obj.add_symbol(Symbol {
            name: name.into_bytes(),
            value: offset,
            size: stub.len() as u64,
            kind: SymbolKind::Text,
            scope,
            weak,
            section: SymbolSection::Section(text),
            flags: SymbolFlags::None,
        });
    };

    for function in module.functions() {
        define(&mut obj, function.flat_name(), symbol_scope(function), false);
    }

    let runtime = runtime_symbols_for(module);
    if embeds_runtime(target) {
        // COFF has no weak definitions.
        let weak = machine.format != BinaryFormat::Coff;
        for name in runtime {
            define(&mut obj, name.to_string(), SymbolScope::Linkage, weak);
        }
    } else {
        for name in runtime {
            obj.add_symbol(Symbol {
                name: name.as_bytes().to_vec(),
                value: 0,
                size: 0,
                kind: SymbolKind::Text,
                scope: SymbolScope::Dynamic,
                weak: false,
                section: SymbolSection::Undefined,
                flags: SymbolFlags::None,
            });
        }
    }

    Ok(obj)
}

fn serialize_object(module: &Module, path_label: &str) -> Result<Vec<u8>, EmitError> {
    build_object(module)?
        .write()
        .map_err(|e| EmitError::ObjectWrite {
            path: path_label.to_string(),
            message: e.to_string(),
        })
}

/// Serialize `module` as a relocatable object in memory.
///
/// # Errors
///
/// Returns an error if the target has no native form or the object writer
/// rejects the format/architecture combination.
pub fn object_bytes(module: &Module) -> Result<Vec<u8>, EmitError> {
    serialize_object(module, "<memory>")
}

/// Emit `module` as a native object file at `path`.
#[tracing::instrument(level = "debug", skip_all, fields(module = module.name(), path = %path.display()))]
pub fn emit_object(module: &Module, path: &Path) -> Result<(), EmitError> {
    let bytes = serialize_object(module, &path.display().to_string())?;
    write_artifact(path, &bytes)
}

fn line(out: &mut String, args: fmt::Arguments<'_>) {
    out.push_str(&fmt::format(args));
    out.push('\n');
}

/// Render `module` as GNU-as flavoured assembly text.
///
/// # Errors
///
/// Returns an error if the target has no native form.
pub fn assembly_text(module: &Module) -> Result<String, EmitError> {
    let target = module.target();
    let machine = MachineInfo::for_target(target, "assembly")?;
    let comment = comment_prefix(target);
    let prefix = symbol_prefix(target);
    let trap = trap_mnemonic(target);
    let p2align = function_alignment(target).trailing_zeros();

    let mut out = String::new();
    line(
        &mut out,
        format_args!("{comment} kiln module '{}' for {target}", module.name()),
    );
    line(&mut out, format_args!("\t.text"));

    for function in module.functions() {
        let sym = format!("{prefix}{}", function.flat_name());
        out.push('\n');
        if function.is_external() {
            line(&mut out, format_args!("\t.globl\t{sym}"));
        }
        write_symbol_type(&mut out, machine.format, target, &sym);
        line(&mut out, format_args!("\t.p2align\t{p2align}"));
        line(&mut out, format_args!("{sym}:"));
        for stmt in &function.body {
            for text in stmt.to_string().lines() {
                line(&mut out, format_args!("\t{comment} {text}"));
            }
        }
        line(&mut out, format_args!("\t{trap}"));
        if machine.format == BinaryFormat::Elf {
            line(&mut out, format_args!("\t.size\t{sym}, .-{sym}"));
        }
    }

    if embeds_runtime(target) {
        out.push('\n');
        line(&mut out, format_args!("\t{comment} embedded runtime"));
        for name in runtime_symbols_for(module) {
            let sym = format!("{prefix}{name}");
            match machine.format {
                BinaryFormat::MachO => {
                    line(&mut out, format_args!("\t.globl\t{sym}"));
                    line(&mut out, format_args!("\t.weak_definition\t{sym}"));
                }
                BinaryFormat::Coff => line(&mut out, format_args!("\t.globl\t{sym}")),
                _ => line(&mut out, format_args!("\t.weak\t{sym}")),
            }
            write_symbol_type(&mut out, machine.format, target, &sym);
            line(&mut out, format_args!("{sym}:"));
            line(&mut out, format_args!("\t{trap}"));
        }
    } else {
        out.push('\n');
        line(
            &mut out,
            format_args!("\t{comment} runtime symbols resolved externally"),
        );
    }

    Ok(out)
}

fn write_symbol_type(out: &mut String, format: BinaryFormat, target: &Target, sym: &str) {
    match format {
        BinaryFormat::Elf => {
            // `@` starts a comment in 32-bit ARM assembly.
            let marker = if target.arch() == Arch::Arm && target.bits() == 32 {
                '%'
            } else {
                '@'
            };
            line(out, format_args!("\t.type\t{sym},{marker}function"));
        }
        BinaryFormat::Coff => {
            line(
                out,
                format_args!("\t.def\t{sym};\t.scl\t2;\t.type\t32;\t.endef"),
            );
        }
        _ => {}
    }
}

/// Emit `module` as native assembly text at `path`.
#[tracing::instrument(level = "debug", skip_all, fields(module = module.name(), path = %path.display()))]
pub fn emit_assembly(module: &Module, path: &Path) -> Result<(), EmitError> {
    let text = assembly_text(module)?;
    write_artifact(path, text.as_bytes())
}
