use penne_shared::{check_generation, Identifier, Message, SchemaError, Specifier};

use crate::{error::DispatchError, state::StateStore};

/// Resolves which delegate a signal invocation is aimed at.
///
/// A message without context targets the document. A table, entity or plot
/// context targets that compartment's delegate, which must still carry the
/// context's generation.
pub fn resolve_target(state: &StateStore, message: &Message) -> Result<(Specifier, Identifier), DispatchError> {
    let context = message.context().map_err(|error| match error {
        SchemaError::UnknownContextKind { .. } => DispatchError::UnresolvedSignalTarget {
            reason: error.to_string(),
        },
        other => DispatchError::Schema(other),
    })?;

    let Some(context) = context else {
        return Ok((Specifier::Document, state.document().info().id));
    };

    let specifier = context.specifier();
    let wanted = context.id();
    let current = state
        .identifier(specifier, wanted.index())
        .ok_or(DispatchError::MissingDelegate {
            specifier,
            index: wanted.index(),
        })?;
    check_generation(&current, &wanted)?;

    Ok((specifier, current))
}
