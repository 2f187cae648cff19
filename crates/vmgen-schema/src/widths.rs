//! Operand widths and build-configuration guards.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::schema::{OpcodeDefinition, OperandSpec};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SizeError {
    #[error("no width known for type '{ty}' (operand {operand} of {opcode})")]
    UnknownType {
        opcode: String,
        operand: String,
        ty: String,
    },

    #[error("encoded size of {opcode} does not fit in 32 bits")]
    Overflow { opcode: String },
}

/// Encoded width in bytes of each primitive operand type.
///
/// Generated code always uses `sizeof(type)`; this table lets the generator
/// compute the same numbers itself for reports and checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeWidths {
    widths: BTreeMap<String, u32>,
}

impl Default for TypeWidths {
    fn default() -> Self {
        let widths = [
            ("uint8_t", 1),
            ("int8_t", 1),
            ("uint16_t", 2),
            ("int16_t", 2),
            ("uint32_t", 4),
            ("int32_t", 4),
            ("uint64_t", 8),
            ("int64_t", 8),
            ("uint8", 1),
            ("int8", 1),
            ("uint16", 2),
            ("int16", 2),
            ("uint32", 4),
            ("int32", 4),
            ("uint64", 8),
            ("int64", 8),
            ("char", 1),
            ("bool", 1),
            ("int", 4),
            ("unsigned", 4),
            ("float", 4),
            ("double", 8),
        ]
        .into_iter()
        .map(|(ty, width)| (ty.to_string(), width))
        .collect();
        Self { widths }
    }
}

impl TypeWidths {
    /// A table with no entries.
    pub fn empty() -> Self {
        Self {
            widths: BTreeMap::new(),
        }
    }

    /// Add or override the width of a type.
    pub fn insert(&mut self, ty: impl Into<String>, width: u32) -> Option<u32> {
        self.widths.insert(ty.into(), width)
    }

    pub fn get(&self, ty: &str) -> Option<u32> {
        self.widths.get(ty).copied()
    }
}

impl<S: Into<String>> Extend<(S, u32)> for TypeWidths {
    fn extend<I: IntoIterator<Item = (S, u32)>>(&mut self, iter: I) {
        for (ty, width) in iter {
            self.insert(ty, width);
        }
    }
}

/// How an emitter treats guarded operands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GuardMode {
    /// Leave the decision to the target compiler: wrap the operand in `#ifdef`.
    #[default]
    Deferred,
    /// Decide now: the listed symbols are defined, every other guard is not.
    Resolved(BTreeSet<String>),
}

/// What an emitter should do with one operand under a [`GuardMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inclusion<'a> {
    Always,
    Never,
    /// Emit inside a conditional block keyed on the symbol.
    When(&'a str),
}

impl GuardMode {
    pub fn resolved<I, S>(defined: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Resolved(defined.into_iter().map(Into::into).collect())
    }

    pub fn inclusion<'a>(&self, operand: &'a OperandSpec) -> Inclusion<'a> {
        match (&operand.guard, self) {
            (None, _) => Inclusion::Always,
            (Some(guard), Self::Deferred) => Inclusion::When(guard),
            (Some(guard), Self::Resolved(defined)) if defined.contains(guard) => Inclusion::Always,
            (Some(_), Self::Resolved(_)) => Inclusion::Never,
        }
    }
}

impl OpcodeDefinition {
    /// Bytes one instance of this instruction occupies in the stream when
    /// exactly the guards in `defined` are set.
    pub fn encoded_size(
        &self,
        header: u32,
        widths: &TypeWidths,
        defined: &BTreeSet<String>,
    ) -> Result<u32, SizeError> {
        let mut size = header;
        for operand in &self.operands {
            if operand.guard.as_ref().is_some_and(|g| !defined.contains(g)) {
                continue;
            }
            let width = widths.get(&operand.ty).ok_or_else(|| SizeError::UnknownType {
                opcode: self.name.clone(),
                operand: operand.name.clone(),
                ty: operand.ty.clone(),
            })?;
            size = size.checked_add(width).ok_or_else(|| SizeError::Overflow {
                opcode: self.name.clone(),
            })?;
        }
        Ok(size)
    }
}
