use std::collections::BTreeMap;

use log::trace;

use crate::{messages::error::DecodeError, value::Value};

/// Decoded attribute -> value pairs of one message
pub type Payload = BTreeMap<String, Value>;

// Envelope
/// One `[message_id, payload]` pair pulled off an inbound frame
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    pub message_id: u32,
    pub payload: Payload,
}

impl Envelope {
    pub fn new(message_id: u32, payload: Payload) -> Self {
        Self {
            message_id,
            payload,
        }
    }
}

/// Decodes a frame holding exactly one `[message_id, payload]` envelope.
pub fn decode(bytes: &[u8]) -> Result<Envelope, DecodeError> {
    let mut envelopes = decode_batch(bytes)?;
    if envelopes.len() != 1 {
        return Err(DecodeError::NotAnEnvelope {
            reason: "expected exactly one [message_id, payload] pair",
        });
    }
    envelopes.pop().ok_or(DecodeError::NotAnEnvelope {
        reason: "frame is empty",
    })
}

/// Decodes a frame of one or more envelopes laid out flat:
/// `[id0, payload0, id1, payload1, ...]`.
///
/// SECURITY: processes untrusted network data, every malformed input returns
/// an error.
pub fn decode_batch(bytes: &[u8]) -> Result<Vec<Envelope>, DecodeError> {
    let value: Value = ciborium::de::from_reader(bytes).map_err(|error| DecodeError::Malformed {
        frame_size: bytes.len(),
        reason: format!("{:?}", error),
    })?;

    let Value::Array(items) = value else {
        return Err(DecodeError::NotAnEnvelope {
            reason: "frame is not an array",
        });
    };
    if items.is_empty() {
        return Err(DecodeError::NotAnEnvelope {
            reason: "frame is empty",
        });
    }
    if items.len() % 2 != 0 {
        return Err(DecodeError::NotAnEnvelope {
            reason: "frame has an odd number of elements",
        });
    }

    let mut envelopes = Vec::with_capacity(items.len() / 2);
    let mut items = items.into_iter().enumerate();
    while let (Some((position, id_value)), Some((_, payload_value))) = (items.next(), items.next()) {
        let message_id = id_value
            .as_integer()
            .and_then(|integer| u32::try_from(integer).ok())
            .ok_or(DecodeError::InvalidMessageId { position })?;
        let payload = payload_from_value(message_id, payload_value)?;
        envelopes.push(Envelope::new(message_id, payload));
    }

    trace!("Decoded {} envelope(s) from a {} byte frame", envelopes.len(), bytes.len());
    Ok(envelopes)
}

fn payload_from_value(message_id: u32, value: Value) -> Result<Payload, DecodeError> {
    let Value::Map(entries) = value else {
        return Err(DecodeError::PayloadNotAMap { message_id });
    };

    entries
        .into_iter()
        .map(|(key, value)| match key {
            Value::Text(key) => Ok((key, value)),
            _ => Err(DecodeError::NonTextKey { message_id }),
        })
        .collect()
}
