//! Backends that turn a parsed instruction set into C source.
//!
//! Each emitter takes the shared, read-only [`Definition`] plus its own
//! options and returns the complete text of one artifact:
//!
//! - [`emit_dispatch`]: the interpreter's `OP_CASE` blocks.
//! - [`emit_metadata`]: the `opcode_size` lookup.
//! - [`emit_dump`]: the optional disassembler.
//! - [`emit_opcodes`]: the opcode enum and name table.
//!
//! Emitters never write files; the caller decides what to do with the text.

mod dispatch;
mod dump;
mod metadata;
mod naming;
mod opcodes;

use std::fmt::{self, Write as FmtWrite};

use thiserror::Error;
use vmgen_schema::{GuardMode, Inclusion, OperandSpec};

pub use dispatch::{DispatchOptions, emit_dispatch};
pub use dump::{DumpOptions, emit_dump};
pub use metadata::{MetadataOptions, emit_metadata};
pub use naming::{include_guard, prefixed};
pub use opcodes::{OpcodeTableOptions, emit_opcodes};

/// Errors that can occur while rendering an artifact.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("formatting error: {0}")]
    Format(#[from] fmt::Error),

    #[error("invalid naming prefix '{0}'")]
    InvalidPrefix(String),

    #[error("cannot derive an include guard from '{0}'")]
    InvalidGuardSeed(String),

    #[error("{what} '{value}' is not a valid C identifier")]
    InvalidSymbol { what: &'static str, value: String },
}

const BANNER: &str = "/* Generated by vmgen. Do not edit. */";
const INDENT: &str = "    ";

pub(crate) fn check_symbol(what: &'static str, value: &str) -> Result<(), EmitError> {
    if vmgen_schema::is_identifier(value) {
        Ok(())
    } else {
        Err(EmitError::InvalidSymbol {
            what,
            value: value.to_string(),
        })
    }
}

/// Write one line per operand, wrapping guarded operands in `#ifdef` blocks.
///
/// Adjacent operands under the same guard share a block. Operands dropped by
/// a resolved [`GuardMode`] produce nothing.
pub(crate) fn write_operands<'a, F>(
    out: &mut String,
    operands: &'a [OperandSpec],
    mode: &GuardMode,
    mut line: F,
) -> fmt::Result
where
    F: FnMut(&mut String, &'a OperandSpec) -> fmt::Result,
{
    let mut open: Option<&str> = None;
    for operand in operands {
        let wanted = match mode.inclusion(operand) {
            Inclusion::Never => continue,
            Inclusion::Always => None,
            Inclusion::When(guard) => Some(guard),
        };
        if open != wanted {
            if let Some(guard) = open {
                writeln!(out, "#endif /* {guard} */")?;
            }
            if let Some(guard) = wanted {
                writeln!(out, "#ifdef {guard}")?;
            }
            open = wanted;
        }
        line(out, operand)?;
    }
    if let Some(guard) = open {
        writeln!(out, "#endif /* {guard} */")?;
    }
    Ok(())
}

/// Open an include guard and a feature gate.
pub(crate) fn write_prologue(out: &mut String, guard: &str, feature: &str) -> fmt::Result {
    writeln!(out, "{BANNER}")?;
    writeln!(out, "#ifndef {guard}")?;
    writeln!(out, "#define {guard}")?;
    writeln!(out)?;
    writeln!(out, "#ifdef {feature}")?;
    Ok(())
}

pub(crate) fn write_epilogue(out: &mut String, guard: &str, feature: &str) -> fmt::Result {
    writeln!(out, "#endif /* {feature} */")?;
    writeln!(out)?;
    writeln!(out, "#endif /* {guard} */")?;
    Ok(())
}
