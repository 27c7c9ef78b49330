//! # Penne Client
//! Client-side synchronization engine: decodes the server's message stream,
//! mirrors the server's objects as delegates in a local state store, routes
//! server-invoked signals to their handlers and correlates method replies
//! with the calls that issued them.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub mod shared {
    pub use penne_shared::{
        check_generation, decode, decode_batch, encode_frame, text_map, Action, ClientMessage,
        Envelope, GenerationMismatchError, HandleInfo, Identifier, IdentifierTable, InvokeContext,
        InvokeId, Message, Payload, Specifier, Value, ValueExt,
    };
}

mod callback_registry;
mod client;
mod delegate;
mod dispatch;
mod error;
mod signal_router;
mod state;

pub use callback_registry::{CallbackRegistry, ReplyCallback};
pub use client::{Client, ClientBuilder, ClientConfig, ClientHandle, FrameSink};
pub use delegate::{
    builtin::{DocumentDelegate, GenericDelegate},
    registry::{DelegateConstructor, DelegateRegistry},
    Delegate, DelegateInfo, DelegateType, SignalHandler, SignalHandlers,
};
pub use dispatch::{DispatchOutcome, Dispatcher, OtherMessage};
pub use error::{CallbackError, DispatchError, FrameSinkError, InvokeError, RemoteMethodError};
pub use signal_router::resolve_target;
pub use state::StateStore;
