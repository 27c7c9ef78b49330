use crate::{
    identifier::Identifier,
    messages::{
        error::EncodeError,
        message::{InvokeContext, InvokeId},
    },
    value::{text_map, Value},
};

// ClientMessage
/// Messages the client sends to the server
#[derive(Clone, Debug, PartialEq)]
pub enum ClientMessage {
    /// Introduces the client once the connection is up
    Introduction { client_name: String },
    /// Asks the server to run a method. Without an `invoke_id` the server
    /// sends no reply.
    InvokeMethod {
        method: Identifier,
        context: Option<InvokeContext>,
        invoke_id: Option<InvokeId>,
        args: Vec<Value>,
    },
}

impl ClientMessage {
    pub fn message_id(&self) -> u32 {
        match self {
            ClientMessage::Introduction { .. } => 0,
            ClientMessage::InvokeMethod { .. } => 1,
        }
    }

    pub fn to_payload(&self) -> Value {
        match self {
            ClientMessage::Introduction { client_name } => {
                text_map([("client_name", Value::Text(client_name.clone()))])
            }
            ClientMessage::InvokeMethod {
                method,
                context,
                invoke_id,
                args,
            } => {
                let mut entries = vec![("method", method.to_value())];
                if let Some(context) = context {
                    entries.push(("context", context.to_value()));
                }
                if let Some(invoke_id) = invoke_id {
                    entries.push(("invoke_id", invoke_id.to_value()));
                }
                entries.push(("args", Value::Array(args.clone())));
                text_map(entries)
            }
        }
    }

    /// `[message_id, payload]` as CBOR bytes
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        encode_frame(self.message_id(), self.to_payload())
    }
}

/// Encodes a single `[message_id, payload]` envelope
pub fn encode_frame(message_id: u32, payload: Value) -> Result<Vec<u8>, EncodeError> {
    let envelope = Value::Array(vec![Value::Integer(message_id.into()), payload]);
    let mut bytes = Vec::new();
    ciborium::ser::into_writer(&envelope, &mut bytes).map_err(|error| EncodeError::SerializationFailed {
        message_id,
        reason: format!("{:?}", error),
    })?;
    Ok(bytes)
}
