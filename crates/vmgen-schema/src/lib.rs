//! Opcode schema for the vmgen instruction-set generator.
//!
//! An instruction set is described once, in a line-oriented definition file:
//!
//! ```text
//! DEF(Byte, uint8_t ch)
//! {
//!     if (*CUR++ != ch) { FAIL(); }
//! }
//! DEF(Str, STRING_t str, uint16_t len MOZVM_SMALL_STRING_INST)
//! {
//!     ...
//! }
//! ```
//!
//! [`parse`] turns that text into a [`Definition`]: the ordered opcodes with
//! their typed operands, plus the line fragments the dispatch emitter needs to
//! reproduce the handler text verbatim. The definition is immutable once
//! built and is shared by every backend.

mod parser;
mod schema;
mod widths;

pub use parser::{DefinitionError, parse, parse_from};
pub use schema::{Definition, Fragment, OpcodeDefinition, OperandSpec, is_identifier};
pub use widths::{GuardMode, Inclusion, SizeError, TypeWidths};

#[cfg(test)]
mod tests;
