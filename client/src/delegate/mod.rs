use std::{any::Any, collections::HashMap, sync::Arc};

use penne_shared::{Identifier, Message, SchemaError, Specifier, Value};

use crate::client::ClientHandle;

pub mod builtin;
pub mod registry;

/// Locally registered reaction to a server-invoked signal, called with the
/// signal's positional arguments
pub type SignalHandler = Arc<dyn Fn(&[Value]) + Send + Sync>;

/// Signal name -> handler
pub type SignalHandlers = HashMap<String, SignalHandler>;

// DelegateInfo
/// Identity of a delegate
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DelegateInfo {
    pub id: Identifier,
    pub name: Option<String>,
}

impl DelegateInfo {
    pub fn new(id: Identifier, name: Option<String>) -> Self {
        Self { id, name }
    }

    /// Identity carried by a creation message. Document messages carry no
    /// `id`, the document gets the default identifier instead.
    pub fn try_from_message(message: &Message) -> Result<Self, SchemaError> {
        let id = if message.specifier().is_document() {
            Identifier::default()
        } else {
            message.id()?
        };
        Ok(Self {
            id,
            name: message.name().map(str::to_string),
        })
    }

    /// # Panics
    ///
    /// Panics if a message for anything but the document lacks a valid `id`.
    /// Dispatched create messages always carry one.
    /// Consider using `try_from_message` for non-panicking error handling.
    pub fn from_message(message: &Message) -> Self {
        match Self::try_from_message(message) {
            Ok(info) => info,
            Err(error) => panic!("{}", error),
        }
    }
}

// Delegate
/// Client-side representative of one server-owned object.
///
/// Lifecycle hooks run on the dispatch context while the state store is
/// write-locked: they must not read the store back through their
/// [`ClientHandle`].
pub trait Delegate: Any + Send + Sync {
    fn info(&self) -> &DelegateInfo;

    /// Called once, right after the delegate entered the state store
    fn on_new(&mut self, _message: &Message) {}

    /// Called after the update's fields have been applied
    fn on_update(&mut self, _message: &Message) {}

    /// Called right before the delegate leaves the state store
    fn on_remove(&mut self, _message: &Message) {}

    /// Replaces one attribute wholesale. Fields a variant does not know about
    /// may be ignored.
    fn apply_update(&mut self, field: &str, value: &Value);

    fn signals(&self) -> &SignalHandlers;

    fn signals_mut(&mut self) -> &mut SignalHandlers;

    fn register_signal(&mut self, name: &str, handler: SignalHandler) {
        self.signals_mut().insert(name.to_string(), handler);
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Delegates that can be built directly from a creation message, so they can
/// be registered by type with
/// [`DelegateRegistry::register_type`](registry::DelegateRegistry::register_type)
pub trait DelegateType: Delegate + Sized {
    fn construct(client: ClientHandle, message: &Message, specifier: Specifier) -> Self;
}
