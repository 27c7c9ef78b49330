use std::sync::Arc;

use penne_shared::{IdentifierTable, Message, Specifier};

use crate::{
    client::{Client, ClientConfig, ClientHandle, FrameSink, Session},
    delegate::{registry::DelegateRegistry, Delegate, DelegateType},
    dispatch::Dispatcher,
    error::DispatchError,
    state::StateStore,
};

// ClientBuilder
/// Collects everything a [`Client`] needs before its session starts
pub struct ClientBuilder {
    config: ClientConfig,
    identifier_table: Option<IdentifierTable>,
    registry: DelegateRegistry,
    outbound: Option<Box<dyn FrameSink>>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            identifier_table: None,
            registry: DelegateRegistry::with_defaults(),
            outbound: None,
        }
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.config.strict = strict;
        self
    }

    pub fn client_name(mut self, client_name: impl Into<String>) -> Self {
        self.config.client_name = client_name.into();
        self
    }

    pub fn other_message_capacity(mut self, capacity: usize) -> Self {
        self.config.other_message_capacity = capacity;
        self
    }

    /// Table negotiated for this session. Defaults to
    /// [`IdentifierTable::standard`]. The table is locked on build.
    pub fn identifier_table(mut self, identifier_table: IdentifierTable) -> Self {
        self.identifier_table = Some(identifier_table);
        self
    }

    /// Replaces the whole delegate registry
    pub fn delegate_registry(mut self, registry: DelegateRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Overrides the constructor for one specifier
    pub fn delegate<F>(mut self, specifier: Specifier, constructor: F) -> Self
    where
        F: Fn(ClientHandle, &Message, Specifier) -> Box<dyn Delegate> + Send + Sync + 'static,
    {
        self.registry.register(specifier, constructor);
        self
    }

    /// Overrides the constructor for one specifier with `D::construct`
    pub fn delegate_type<D: DelegateType>(mut self, specifier: Specifier) -> Self {
        self.registry.register_type::<D>(specifier);
        self
    }

    /// Where outbound frames go. Without one, method invocations fail with
    /// [`InvokeError::NoOutbound`](crate::InvokeError::NoOutbound).
    pub fn outbound(mut self, sink: impl FrameSink + 'static) -> Self {
        self.outbound = Some(Box::new(sink));
        self
    }

    /// Creates the session and its document delegate. Fails if the registry
    /// has no document constructor.
    pub fn build(self) -> Result<Client, DispatchError> {
        let Self {
            config,
            identifier_table,
            registry,
            outbound,
        } = self;

        let document_constructor = registry.constructor(Specifier::Document)?;
        let mut identifier_table = identifier_table.unwrap_or_else(IdentifierTable::standard);
        if !identifier_table.is_locked() {
            identifier_table.lock();
        }
        let dispatcher = Dispatcher::new(identifier_table, registry, config.strict);

        let session = Arc::new_cyclic(|weak| {
            let handle = ClientHandle::new(weak.clone());
            let document = document_constructor(
                handle.clone(),
                &Message::empty(Specifier::Document),
                Specifier::Document,
            );
            Session::new(config, dispatcher, StateStore::new(document), outbound, handle)
        });

        Ok(Client::from_session(session))
    }
}
