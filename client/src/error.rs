use thiserror::Error;

use penne_shared::{
    DecodeError, EncodeError, GenerationMismatchError, Identifier, InvokeId, SchemaError, Specifier,
    Value, ValueExt,
};

/// Errors that abort the dispatch of a single inbound message
///
/// None of these leave the state store partially modified, and none of them
/// stop the dispatch loop: the next message is processed normally.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// Frame could not be decoded into envelopes
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Message is missing fields its action requires
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Local mirror is stale relative to the server
    #[error(transparent)]
    GenerationMismatch(#[from] GenerationMismatchError),

    /// Message id was never negotiated into the identifier table
    #[error("Message id {message_id} not found in identifier table")]
    UnknownMessageId {
        message_id: u32,
    },

    /// No delegate constructor registered for the specifier
    #[error("No delegate registered for specifier '{specifier}'. Check the delegate registry passed to the client builder")]
    UnknownSpecifier {
        specifier: Specifier,
    },

    /// Message refers to a delegate that is not in the state store
    #[error("No delegate at {specifier}[{index}]")]
    MissingDelegate {
        specifier: Specifier,
        index: u32,
    },

    /// Create arrived for an index that still holds a live delegate
    #[error("Delegate {existing} already exists at {specifier}, refusing to replace it with {incoming}")]
    DelegateAlreadyExists {
        specifier: Specifier,
        existing: Identifier,
        incoming: Identifier,
    },

    /// Signal invocation context names no known target kind
    #[error("Couldn't resolve signal target: {reason}")]
    UnresolvedSignalTarget {
        reason: String,
    },

    /// Target delegate has no handler for the signal
    #[error("{specifier} delegate {target} has no handler for signal '{signal}'")]
    UnknownHandler {
        specifier: Specifier,
        target: Identifier,
        signal: String,
    },

    /// Server reported a failed method call nobody is waiting for
    #[error(transparent)]
    RemoteMethod(#[from] RemoteMethodError),

    /// Reply could not be correlated with a pending invocation
    #[error("Callback error: {0}")]
    Callback(#[from] CallbackError),

    /// State store lock is poisoned (a delegate hook panicked while holding
    /// it). Only state accessors report this, dispatch clears the poison.
    #[error("State store lock is poisoned - a delegate hook panicked while holding it")]
    StateLockPoisoned,
}

/// Server-side failure of a client-issued method call
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Method call ({invoke_id}) resulted in exception from server: {exception:?}")]
pub struct RemoteMethodError {
    pub invoke_id: InvokeId,
    /// The `method_exception` value as sent by the server
    pub exception: Value,
}

impl RemoteMethodError {
    pub fn code(&self) -> Option<i64> {
        self.exception.get_field("code").and_then(ValueExt::as_i64)
    }

    pub fn message(&self) -> Option<&str> {
        self.exception.get_field("message").and_then(Value::as_text)
    }
}

/// Errors that can occur in the callback registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallbackError {
    /// Invoke id is already waiting on a reply
    #[error("Invocation {invoke_id} is already registered")]
    DuplicateInvocation {
        invoke_id: InvokeId,
    },

    /// No callback is registered for the invoke id
    #[error("Reply for invocation {invoke_id} has no pending callback")]
    UnmatchedInvocation {
        invoke_id: InvokeId,
    },

    /// Registry lock is poisoned (a panic occurred while holding it)
    #[error("Callback registry lock is poisoned")]
    LockPoisoned,
}

/// Errors that can occur while sending a frame to the server
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameSinkError {
    /// Outbound half of the transport is gone
    #[error("Outbound channel is closed")]
    Closed,
}

/// Errors that can occur while issuing a method invocation
#[derive(Debug, Clone, Error)]
pub enum InvokeError {
    /// Client was built without an outbound frame sink
    #[error("Client has no outbound frame sink configured")]
    NoOutbound,

    /// Outbound frame could not be encoded
    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Outbound frame could not be sent
    #[error("Send error: {0}")]
    Send(#[from] FrameSinkError),

    /// Callback could not be registered
    #[error("Callback error: {0}")]
    Callback(#[from] CallbackError),

    /// No method delegate carries the requested name
    #[error("No method named '{name}' in the state store")]
    MethodNotFound {
        name: String,
    },

    /// State store lock is poisoned (a panic occurred while holding it)
    #[error("State store lock is poisoned")]
    StateLockPoisoned,
}
