//! Line-oriented parser for the instruction-definition DSL.
//!
//! Recognized lines:
//! - `DEF(NAME, type name [GUARD], ...)` declares an opcode.
//! - A lone `{` opens the handler block of the opcode declared last.
//! - A lone `}` closes it.
//! - Anything else is handler or glue text and is kept verbatim.

use thiserror::Error;
use tracing::{debug, trace};

use crate::schema::{Definition, Fragment, OpcodeDefinition, OperandSpec, is_identifier};

/// Errors raised while reading a definition file.
///
/// Line numbers are 1-based.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("line {line}: malformed DEF header: {reason}")]
    MalformedHeader { line: usize, reason: &'static str },

    #[error("line {line}: invalid opcode name '{name}'")]
    InvalidName { line: usize, name: String },

    #[error("line {line}: operand {position} of {opcode} is empty")]
    EmptyOperand {
        line: usize,
        opcode: String,
        position: usize,
    },

    #[error("line {line}: operand '{token}' of {opcode} has a type but no name")]
    MissingOperandName {
        line: usize,
        opcode: String,
        token: String,
    },

    #[error("line {line}: operand '{token}' of {opcode} must be 'type name [guard]'")]
    TooManyOperandWords {
        line: usize,
        opcode: String,
        token: String,
    },

    #[error("line {line}: '{word}' in {opcode} is not an identifier")]
    InvalidIdentifier {
        line: usize,
        opcode: String,
        word: String,
    },

    #[error("line {line}: duplicate opcode {name} (first defined on line {first})")]
    DuplicateOpcode {
        line: usize,
        name: String,
        first: usize,
    },

    #[error("line {line}: '{{' does not follow a DEF header")]
    UnexpectedOpen { line: usize },

    #[error("line {line}: '}}' outside of a handler block")]
    UnexpectedClose { line: usize },

    #[error("line {line}: DEF header inside the handler block of {opcode}")]
    HeaderInsideBlock { line: usize, opcode: String },

    #[error("handler block of {opcode} opened on line {line} is never closed")]
    UnterminatedBlock { line: usize, opcode: String },

    #[error("line {line}: {opcode} has no handler block")]
    MissingBlock { line: usize, opcode: String },

    #[error("line {line}: opcode number overflows when counting from {first}")]
    SequenceOverflow { line: usize, first: u32 },
}

impl DefinitionError {
    /// Line the error was reported against.
    pub fn line(&self) -> usize {
        match self {
            Self::MalformedHeader { line, .. }
            | Self::InvalidName { line, .. }
            | Self::EmptyOperand { line, .. }
            | Self::MissingOperandName { line, .. }
            | Self::TooManyOperandWords { line, .. }
            | Self::InvalidIdentifier { line, .. }
            | Self::DuplicateOpcode { line, .. }
            | Self::UnexpectedOpen { line }
            | Self::UnexpectedClose { line }
            | Self::HeaderInsideBlock { line, .. }
            | Self::UnterminatedBlock { line, .. }
            | Self::MissingBlock { line, .. }
            | Self::SequenceOverflow { line, .. } => *line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Outside { pending: Option<usize> },
    Inside { opcode: usize, opened: usize },
}

/// Parse a definition file, numbering opcodes from zero.
pub fn parse(source: &str) -> Result<Definition, DefinitionError> {
    parse_from(source, 0)
}

/// Parse a definition file, numbering opcodes from `first_opcode`.
pub fn parse_from(source: &str, first_opcode: u32) -> Result<Definition, DefinitionError> {
    let mut def = Definition::default();
    let mut state = State::Outside { pending: None };

    for (idx, text) in source.lines().enumerate() {
        let line = idx + 1;

        if let Some(args) = header_arguments(text, line)? {
            match state {
                State::Inside { opcode, .. } => {
                    return Err(DefinitionError::HeaderInsideBlock {
                        line,
                        opcode: def.opcodes[opcode].name.clone(),
                    });
                }
                State::Outside {
                    pending: Some(opcode),
                } => return Err(missing_block(&def.opcodes[opcode])),
                State::Outside { pending: None } => {}
            }

            let sequence = u32::try_from(def.opcodes.len())
                .ok()
                .and_then(|count| first_opcode.checked_add(count))
                .ok_or(DefinitionError::SequenceOverflow {
                    line,
                    first: first_opcode,
                })?;
            let opcode = parse_header(args, line, sequence)?;
            if let Some(first) = def.find(&opcode.name) {
                return Err(DefinitionError::DuplicateOpcode {
                    line,
                    name: opcode.name,
                    first: first.line,
                });
            }

            debug!(
                opcode = %opcode.name,
                sequence,
                operands = opcode.operands.len(),
                "parsed opcode"
            );
            let index = def.opcodes.len();
            def.fragments.push(Fragment::Header(index));
            def.opcodes.push(opcode);
            state = State::Outside {
                pending: Some(index),
            };
            continue;
        }

        match (text.trim_end(), state) {
            ("{", State::Outside { pending: Some(opcode) }) => {
                trace!(line, "open handler block");
                def.fragments.push(Fragment::Open);
                state = State::Inside {
                    opcode,
                    opened: line,
                };
            }
            ("{", _) => return Err(DefinitionError::UnexpectedOpen { line }),
            ("}", State::Inside { opcode, .. }) => {
                trace!(line, "close handler block");
                def.fragments.push(Fragment::Close(opcode));
                state = State::Outside { pending: None };
            }
            ("}", State::Outside { .. }) => {
                return Err(DefinitionError::UnexpectedClose { line });
            }
            (_, State::Inside { opcode, .. }) => {
                def.opcodes[opcode].body.push(text.to_string());
                def.fragments.push(Fragment::Text(text.to_string()));
            }
            (_, State::Outside { .. }) => {
                def.fragments.push(Fragment::Text(text.to_string()));
            }
        }
    }

    match state {
        State::Inside { opcode, opened } => Err(DefinitionError::UnterminatedBlock {
            line: opened,
            opcode: def.opcodes[opcode].name.clone(),
        }),
        State::Outside {
            pending: Some(opcode),
        } => Err(missing_block(&def.opcodes[opcode])),
        State::Outside { pending: None } => Ok(def),
    }
}

fn missing_block(opcode: &OpcodeDefinition) -> DefinitionError {
    DefinitionError::MissingBlock {
        line: opcode.line,
        opcode: opcode.name.clone(),
    }
}

/// Returns the text between `DEF(` and the last `)` if the line is a header.
fn header_arguments(text: &str, line: usize) -> Result<Option<&str>, DefinitionError> {
    let Some(rest) = text.trim_start().strip_prefix("DEF(") else {
        return Ok(None);
    };
    let close = rest.rfind(')').ok_or(DefinitionError::MalformedHeader {
        line,
        reason: "missing closing parenthesis",
    })?;
    Ok(Some(&rest[..close]))
}

fn parse_header(args: &str, line: usize, sequence: u32) -> Result<OpcodeDefinition, DefinitionError> {
    let mut tokens = args.split(',');
    let name = tokens.next().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(DefinitionError::MalformedHeader {
            line,
            reason: "missing opcode name",
        });
    }
    if !is_identifier(name) {
        return Err(DefinitionError::InvalidName {
            line,
            name: name.to_string(),
        });
    }

    let mut operands = Vec::new();
    for (position, token) in tokens.enumerate() {
        operands.push(parse_operand(token.trim(), name, line, position + 1)?);
    }

    Ok(OpcodeDefinition {
        name: name.to_string(),
        sequence,
        operands,
        body: Vec::new(),
        line,
    })
}

fn parse_operand(
    token: &str,
    opcode: &str,
    line: usize,
    position: usize,
) -> Result<OperandSpec, DefinitionError> {
    let words: Vec<&str> = token.split_whitespace().collect();
    let operand = match words.as_slice() {
        [] => {
            return Err(DefinitionError::EmptyOperand {
                line,
                opcode: opcode.to_string(),
                position,
            });
        }
        [_] => {
            return Err(DefinitionError::MissingOperandName {
                line,
                opcode: opcode.to_string(),
                token: token.to_string(),
            });
        }
        [ty, name] => OperandSpec::new(*ty, *name),
        [ty, name, guard] => OperandSpec::guarded(*ty, *name, *guard),
        _ => {
            return Err(DefinitionError::TooManyOperandWords {
                line,
                opcode: opcode.to_string(),
                token: token.to_string(),
            });
        }
    };

    if let Some(word) = words.iter().find(|w| !is_identifier(w)) {
        return Err(DefinitionError::InvalidIdentifier {
            line,
            opcode: opcode.to_string(),
            word: word.to_string(),
        });
    }

    Ok(operand)
}
