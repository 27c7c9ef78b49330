//! # Penne Shared
//! Wire-level types shared across the penne client: identifiers and the
//! generation guard, the identifier table, envelope decoding, message
//! reconstruction and client message encoding.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod identifier;
mod identifier_table;
mod messages;
mod specifier;
mod value;

pub use identifier::{check_generation, GenerationMismatchError, Identifier};
pub use identifier_table::{Action, HandleInfo, IdentifierTable, IdentifierTableError};
pub use messages::{
    client_message::{encode_frame, ClientMessage},
    decoder::{decode, decode_batch, Envelope, Payload},
    error::{DecodeError, EncodeError, SchemaError},
    message::{InvokeContext, InvokeId, Message},
};
pub use specifier::{Specifier, SpecifierError};
pub use value::{text_map, Value, ValueExt};
