use std::fmt;

use thiserror::Error;

use crate::{messages::error::SchemaError, value::Value};

// Identifier
/// Compound identity of a server-owned object: the slot index within its
/// compartment plus the generation of the object currently occupying it.
///
/// The server bumps the generation every time an index is reused, so two
/// identifiers with the same index but different generations name different
/// incarnations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier {
    index: u32,
    generation: u32,
}

impl Identifier {
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Wire form: `[index, generation]`
    pub fn to_value(&self) -> Value {
        Value::Array(vec![
            Value::Integer(self.index.into()),
            Value::Integer(self.generation.into()),
        ])
    }

    /// Reads an identifier from its wire form, `field` is only used for error
    /// reporting.
    pub fn try_from_value(field: &str, value: &Value) -> Result<Self, SchemaError> {
        let invalid = |reason: &'static str| SchemaError::InvalidField {
            field: field.to_string(),
            reason,
        };

        let parts = value
            .as_array()
            .ok_or_else(|| invalid("identifier must be an array"))?;
        if parts.len() != 2 {
            return Err(invalid("identifier must have exactly two elements"));
        }

        let mut numbers = [0u32; 2];
        for (slot, part) in numbers.iter_mut().zip(parts) {
            let integer = part
                .as_integer()
                .ok_or_else(|| invalid("identifier elements must be integers"))?;
            *slot = u32::try_from(integer)
                .map_err(|_| invalid("identifier element out of range"))?;
        }

        Ok(Self::new(numbers[0], numbers[1]))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.index, self.generation)
    }
}

/// Two identifiers expected to name the same incarnation did not match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Generation Mismatch {left} - {right}")]
pub struct GenerationMismatchError {
    pub left: Identifier,
    pub right: Identifier,
}

/// Fails unless both index and generation of `left` and `right` agree.
///
/// Every mutation that depends on an existing delegate's identity goes through
/// this check first. A mismatch means the local mirror is stale relative to
/// the server and is never corrected silently.
pub fn check_generation(left: &Identifier, right: &Identifier) -> Result<(), GenerationMismatchError> {
    if left != right {
        return Err(GenerationMismatchError {
            left: *left,
            right: *right,
        });
    }
    Ok(())
}
