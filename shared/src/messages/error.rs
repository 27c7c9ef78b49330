use thiserror::Error;

/// Errors that can occur while decoding an inbound frame
///
/// SECURITY: frames come straight off the network. Every malformed frame is
/// reported through one of these variants instead of panicking.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Byte stream is not valid CBOR
    #[error("Malformed frame of {frame_size} bytes: {reason}")]
    Malformed {
        frame_size: usize,
        reason: String,
    },

    /// Frame decoded, but is not an array of `[message_id, payload]` pairs
    #[error("Frame is not a message envelope: {reason}")]
    NotAnEnvelope {
        reason: &'static str,
    },

    /// Message id is not a non-negative integer that fits in a u32
    #[error("Invalid message id at envelope position {position}")]
    InvalidMessageId {
        position: usize,
    },

    /// Payload is not a CBOR map
    #[error("Payload of message {message_id} is not a map")]
    PayloadNotAMap {
        message_id: u32,
    },

    /// Payload map has a key that is not text
    #[error("Payload of message {message_id} has a non-text key")]
    NonTextKey {
        message_id: u32,
    },
}

/// Errors that can occur while reconstructing a typed message from a payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Field required by the message's action is absent
    #[error("Message for '{specifier}' is missing required field '{field}'")]
    MissingField {
        specifier: &'static str,
        field: &'static str,
    },

    /// Field is present but does not have the expected shape
    #[error("Field '{field}' is invalid: {reason}")]
    InvalidField {
        field: String,
        reason: &'static str,
    },

    /// Invocation context carries none of the known target tags
    #[error("Invocation context has no table, entity or plot target (keys: {keys:?})")]
    UnknownContextKind {
        keys: Vec<String>,
    },
}

/// Errors that can occur while encoding an outbound client message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// CBOR serialization failed
    #[error("Failed to encode client message {message_id}: {reason}")]
    SerializationFailed {
        message_id: u32,
        reason: String,
    },
}
