//! Interpreter dispatch: one `OP_CASE` block per opcode.

use std::fmt::Write as FmtWrite;

use tracing::debug;
use vmgen_schema::{Definition, Fragment, GuardMode};

use crate::{BANNER, EmitError, INDENT, check_symbol, write_operands};

/// Names the dispatch skeleton provides to the generated cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Macro that opens a case, called with the opcode name.
    pub case_macro: String,
    /// Statement that fetches the next opcode and dispatches again.
    pub next: String,
    /// Instruction-stream cursor the read macros advance.
    pub cursor: String,
    /// Read macros are named `<read_prefix><type>`.
    pub read_prefix: String,
    pub guards: GuardMode,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            case_macro: "OP_CASE".into(),
            next: "NEXT();".into(),
            cursor: "PC".into(),
            read_prefix: "read_".into(),
            guards: GuardMode::Deferred,
        }
    }
}

/// Render the dispatch source by replaying the definition file.
///
/// Pass-through text is reproduced line for line; each header becomes a case
/// label followed by its operand reads, and each closing brace becomes the
/// continuation statement followed by `}`.
pub fn emit_dispatch(def: &Definition, opts: &DispatchOptions) -> Result<String, EmitError> {
    check_symbol("case macro", &opts.case_macro)?;
    check_symbol("cursor", &opts.cursor)?;
    if !opts.read_prefix.is_empty() {
        check_symbol("read prefix", &opts.read_prefix)?;
    }
    debug!(opcodes = def.len(), "emitting dispatch");

    let mut out = String::new();
    writeln!(out, "{BANNER}")?;

    for fragment in &def.fragments {
        match fragment {
            Fragment::Header(index) => {
                let opcode = &def.opcodes[*index];
                writeln!(out, "{}({})", opts.case_macro, opcode.name)?;
                writeln!(out, "{{")?;
                write_operands(&mut out, &opcode.operands, &opts.guards, |out, operand| {
                    writeln!(
                        out,
                        "{INDENT}{} {} = {}{}({});",
                        operand.ty, operand.name, opts.read_prefix, operand.ty, opts.cursor
                    )
                })?;
            }
            // The brace was already written with the case label.
            Fragment::Open => {}
            Fragment::Close(_) => {
                writeln!(out, "{INDENT}{}", opts.next)?;
                writeln!(out, "}}")?;
            }
            Fragment::Text(text) => writeln!(out, "{text}")?,
        }
    }

    Ok(out)
}
