//! Target Descriptors
//!
//! A [`Target`] names the architecture, operating system, pointer width and
//! feature flags a module is compiled for. It is a plain value: once a
//! [`Module`](crate::Module) is bound to a target, nothing downstream mutates it.
//!
//! # String Form
//!
//! Targets print and parse as `<arch>-<bits>-<os>[-<feature>...]`:
//!
//! - `x86-64-linux` - 64-bit x86 Linux
//! - `x86-64-windows-mingw` - 64-bit Windows using the MinGW ABI
//! - `pnacl-32-nacl` - Portable Native Client (bitcode only)
//! - `host-jit` - the compiling machine, with JIT mode enabled
//!
//! Features always print in one canonical order, so two targets with the same
//! flags produce the same string no matter how the flags were set.
//!
//! # Environment
//!
//! [`Target::from_env`] reads `KILN_TARGET`, falling back to the host target
//! when the variable is unset or empty.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Environment variable consulted by [`Target::from_env`].
pub const TARGET_ENV_VAR: &str = "KILN_TARGET";

/// Error produced when a target string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetParseError {
    /// The target string was empty.
    #[error("empty target string")]
    Empty,
    /// A `-`-separated token matched no architecture, width, OS or feature.
    #[error("unknown token '{token}' in target string '{target}'")]
    UnknownToken { token: String, target: String },
    /// Architecture, bits or OS was given twice.
    #[error("target string '{target}' specifies {component} more than once (at '{token}')")]
    Duplicate {
        token: String,
        target: String,
        component: &'static str,
    },
    /// The string did not specify one of architecture, bits or OS.
    #[error("target string '{target}' does not specify {missing}")]
    Incomplete {
        target: String,
        missing: &'static str,
    },
}

/// How an architecture's "object file" is produced.
///
/// Every architecture declares this explicitly; there is no fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeForm {
    /// A native code generator exists: objects are machine code.
    Native,
    /// No native code generator exists: the object form *is* bitcode and the
    /// assembly form *is* portable assembly text.
    BitcodeOnly,
}

/// Architecture family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arch {
    Unknown,
    X86,
    Arm,
    Mips,
    Hexagon,
    PowerPc,
    /// Portable Native Client: a portable low-level virtual ISA.
    PNaCl,
}

impl Arch {
    /// All architectures, in declaration order.
    pub const ALL: [Arch; 7] = [
        Arch::Unknown,
        Arch::X86,
        Arch::Arm,
        Arch::Mips,
        Arch::Hexagon,
        Arch::PowerPc,
        Arch::PNaCl,
    ];

    /// The object form this architecture supports.
    #[must_use]
    pub const fn code_form(self) -> CodeForm {
        match self {
            Arch::PNaCl => CodeForm::BitcodeOnly,
            Arch::Unknown
            | Arch::X86
            | Arch::Arm
            | Arch::Mips
            | Arch::Hexagon
            | Arch::PowerPc => CodeForm::Native,
        }
    }

    /// Canonical name used in target strings.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Arch::Unknown => "arch_unknown",
            Arch::X86 => "x86",
            Arch::Arm => "arm",
            Arch::Mips => "mips",
            Arch::Hexagon => "hexagon",
            Arch::PowerPc => "powerpc",
            Arch::PNaCl => "pnacl",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|arch| arch.name() == name)
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Os {
    Unknown,
    Linux,
    Windows,
    OSX,
    Android,
    IOS,
    NaCl,
}

impl Os {
    /// All operating systems, in declaration order.
    pub const ALL: [Os; 7] = [
        Os::Unknown,
        Os::Linux,
        Os::Windows,
        Os::OSX,
        Os::Android,
        Os::IOS,
        Os::NaCl,
    ];

    /// Canonical name used in target strings.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Os::Unknown => "os_unknown",
            Os::Linux => "linux",
            Os::Windows => "windows",
            Os::OSX => "osx",
            Os::Android => "android",
            Os::IOS => "ios",
            Os::NaCl => "nacl",
        }
    }

    /// Apple platforms use Mach-O and prefix C symbols with `_`.
    #[must_use]
    pub const fn is_apple(self) -> bool {
        matches!(self, Os::OSX | Os::IOS)
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|os| os.name() == name)
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// Independent target feature flags.
    ///
    /// Flags never interact with each other at the descriptor level; policy
    /// decisions that combine them (e.g. the object file extension) live with
    /// their consumers.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, Serialize, Deserialize)]
    pub struct Features: u64 {
        /// Generate code for the in-process JIT rather than ahead-of-time.
        const JIT = 1 << 0;
        /// Emit debug checks and symbols.
        const DEBUG = 1 << 1;
        /// Do not embed the runtime; it is linked separately.
        const NO_RUNTIME = 1 << 2;
        /// Windows with the MinGW ABI instead of MSVC.
        const MINGW = 1 << 3;
        /// Generated C output uses C++ name mangling.
        const CPLUSPLUS_MANGLING = 1 << 4;
        const SSE41 = 1 << 5;
        const AVX = 1 << 6;
        const AVX2 = 1 << 7;
        const FMA = 1 << 8;
        const ARMV7S = 1 << 9;
        const NO_NEON = 1 << 10;
    }
}

/// Feature names in canonical print order.
const FEATURE_NAMES: &[(Features, &str)] = &[
    (Features::JIT, "jit"),
    (Features::DEBUG, "debug"),
    (Features::NO_RUNTIME, "no_runtime"),
    (Features::MINGW, "mingw"),
    (Features::CPLUSPLUS_MANGLING, "c_plus_plus_name_mangling"),
    (Features::SSE41, "sse41"),
    (Features::AVX, "avx"),
    (Features::AVX2, "avx2"),
    (Features::FMA, "fma"),
    (Features::ARMV7S, "armv7s"),
    (Features::NO_NEON, "no_neon"),
];

/// Whether the runtime support code is compiled into each object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeLinkage {
    /// Runtime symbols are defined in the emitted object.
    Embedded,
    /// Runtime symbols are left undefined for the linker or JIT to resolve.
    External,
}

/// A compilation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    os: Os,
    arch: Arch,
    bits: u8,
    features: Features,
}

impl Target {
    /// Create a target with no features set.
    #[must_use]
    pub const fn new(os: Os, arch: Arch, bits: u8) -> Self {
        Self {
            os,
            arch,
            bits,
            features: Features::empty(),
        }
    }

    /// The target of the machine running the compiler.
    #[must_use]
    pub fn host() -> Self {
        let bits = if cfg!(target_pointer_width = "64") {
            64
        } else {
            32
        };

        let arch = if cfg!(any(target_arch = "x86", target_arch = "x86_64")) {
            Arch::X86
        } else if cfg!(any(target_arch = "arm", target_arch = "aarch64")) {
            Arch::Arm
        } else if cfg!(any(target_arch = "mips", target_arch = "mips64")) {
            Arch::Mips
        } else if cfg!(any(target_arch = "powerpc", target_arch = "powerpc64")) {
            Arch::PowerPc
        } else {
            Arch::Unknown
        };

        let os = if cfg!(target_os = "android") {
            Os::Android
        } else if cfg!(target_os = "linux") {
            Os::Linux
        } else if cfg!(target_os = "windows") {
            Os::Windows
        } else if cfg!(target_os = "macos") {
            Os::OSX
        } else if cfg!(target_os = "ios") {
            Os::IOS
        } else {
            Os::Unknown
        };

        let target = Self::new(os, arch, bits);
        if cfg!(all(target_os = "windows", target_env = "gnu")) {
            target.with_feature(Features::MINGW)
        } else {
            target
        }
    }

    /// Read the target from `KILN_TARGET`, defaulting to [`Target::host`].
    pub fn from_env() -> Result<Self, TargetParseError> {
        Self::from_env_value(std::env::var(TARGET_ENV_VAR).ok().as_deref())
    }

    /// Resolve an (optional) environment value the way [`Target::from_env`] does.
    pub fn from_env_value(value: Option<&str>) -> Result<Self, TargetParseError> {
        match value.map(str::trim) {
            None | Some("") => Ok(Self::host()),
            Some(s) => s.parse(),
        }
    }

    #[must_use]
    pub const fn os(&self) -> Os {
        self.os
    }

    #[must_use]
    pub const fn arch(&self) -> Arch {
        self.arch
    }

    /// Pointer width in bits (32 or 64).
    #[must_use]
    pub const fn bits(&self) -> u8 {
        self.bits
    }

    #[must_use]
    pub fn features(&self) -> Features {
        self.features
    }

    #[must_use]
    pub fn has_feature(&self, feature: Features) -> bool {
        self.features.contains(feature)
    }

    /// Set or clear a feature in place.
    pub fn set_feature(&mut self, feature: Features, enabled: bool) {
        self.features.set(feature, enabled);
    }

    #[must_use]
    pub fn with_feature(mut self, feature: Features) -> Self {
        self.features.insert(feature);
        self
    }

    #[must_use]
    pub fn without_feature(mut self, feature: Features) -> Self {
        self.features.remove(feature);
        self
    }

    /// Whether runtime support code is embedded in emitted objects.
    ///
    /// JIT code borrows the host process's runtime, so it never embeds one.
    #[must_use]
    pub fn runtime_linkage(&self) -> RuntimeLinkage {
        if self.has_feature(Features::NO_RUNTIME) || self.has_feature(Features::JIT) {
            RuntimeLinkage::External
        } else {
            RuntimeLinkage::Embedded
        }
    }

    /// Windows with the MSVC ABI (as opposed to MinGW).
    #[must_use]
    pub fn is_msvc(&self) -> bool {
        matches!(self.os, Os::Windows) && !self.has_feature(Features::MINGW)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.arch, self.bits, self.os)?;
        for (feature, name) in FEATURE_NAMES {
            if self.features.contains(*feature) {
                write!(f, "-{name}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for Target {
    type Err = TargetParseError;

    /// Parse `<arch>-<bits>-<os>[-<feature>...]`.
    ///
    /// Tokens may appear in any order. A leading `host` token fills in the
    /// host's architecture, bits and OS (and its features), which later tokens
    /// may then override. Naming a component twice is an error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TargetParseError::Empty);
        }

        let mut arch = None;
        let mut bits = None;
        let mut os = None;
        let mut features = Features::empty();
        // Components named explicitly; host defaults may be overridden once.
        let mut seen = (false, false, false);
        let duplicate = |token: &str, component| TargetParseError::Duplicate {
            token: token.to_string(),
            target: s.to_string(),
            component,
        };

        for (index, token) in s.split('-').enumerate() {
            if index == 0 && token == "host" {
                let host = Self::host();
                arch = Some(host.arch);
                bits = Some(host.bits);
                os = Some(host.os);
                features = host.features;
            } else if let Some(a) = Arch::from_name(token) {
                if std::mem::replace(&mut seen.0, true) {
                    return Err(duplicate(token, "an architecture"));
                }
                arch = Some(a);
            } else if token == "32" || token == "64" {
                if std::mem::replace(&mut seen.1, true) {
                    return Err(duplicate(token, "a bit width"));
                }
                bits = token.parse().ok();
            } else if let Some(o) = Os::from_name(token) {
                if std::mem::replace(&mut seen.2, true) {
                    return Err(duplicate(token, "an operating system"));
                }
                os = Some(o);
            } else if let Some((feature, _)) = FEATURE_NAMES.iter().find(|(_, n)| *n == token) {
                features.insert(*feature);
            } else {
                return Err(TargetParseError::UnknownToken {
                    token: token.to_string(),
                    target: s.to_string(),
                });
            }
        }

        let incomplete = |missing| TargetParseError::Incomplete {
            target: s.to_string(),
            missing,
        };
        let arch = arch.ok_or_else(|| incomplete("an architecture"))?;
        let bits = bits.ok_or_else(|| incomplete("a bit width"))?;
        let os = os.ok_or_else(|| incomplete("an operating system"))?;

        Ok(Self {
            os,
            arch,
            bits,
            features,
        })
    }
}
