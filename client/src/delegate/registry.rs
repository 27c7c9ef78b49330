use std::{collections::HashMap, sync::Arc};

use penne_shared::{Message, Specifier};

use crate::{
    client::ClientHandle,
    delegate::{
        builtin::{DocumentDelegate, GenericDelegate},
        Delegate, DelegateType,
    },
    error::DispatchError,
};

/// Builds the delegate for a creation message. The delegate's `info().id`
/// must equal the message's `id`, dispatch rejects the message otherwise.
pub type DelegateConstructor =
    Arc<dyn Fn(ClientHandle, &Message, Specifier) -> Box<dyn Delegate> + Send + Sync>;

// DelegateRegistry
/// Delegate factory: one constructor per specifier, starting from the
/// built-ins and overridable by the embedder before the client is built.
#[derive(Clone)]
pub struct DelegateRegistry {
    constructors: HashMap<Specifier, DelegateConstructor>,
}

impl Default for DelegateRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl DelegateRegistry {
    /// Registry without any constructor, every create fails until one is
    /// registered
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// `DocumentDelegate` for the document, `GenericDelegate` for the rest
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        for specifier in Specifier::ALL {
            if specifier.is_document() {
                registry.register_type::<DocumentDelegate>(specifier);
            } else {
                registry.register_type::<GenericDelegate>(specifier);
            }
        }
        registry
    }

    /// Replaces the constructor for `specifier`
    pub fn register<F>(&mut self, specifier: Specifier, constructor: F) -> &mut Self
    where
        F: Fn(ClientHandle, &Message, Specifier) -> Box<dyn Delegate> + Send + Sync + 'static,
    {
        self.constructors.insert(specifier, Arc::new(constructor));
        self
    }

    /// Replaces the constructor for `specifier` with `D::construct`
    pub fn register_type<D: DelegateType>(&mut self, specifier: Specifier) -> &mut Self {
        self.register(specifier, |client, message, specifier| {
            let delegate: Box<dyn Delegate> = Box::new(D::construct(client, message, specifier));
            delegate
        })
    }

    pub fn unregister(&mut self, specifier: Specifier) -> Option<DelegateConstructor> {
        self.constructors.remove(&specifier)
    }

    pub fn contains(&self, specifier: Specifier) -> bool {
        self.constructors.contains_key(&specifier)
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    pub fn specifiers(&self) -> impl Iterator<Item = Specifier> + '_ {
        self.constructors.keys().copied()
    }

    pub fn constructor(&self, specifier: Specifier) -> Result<DelegateConstructor, DispatchError> {
        self.constructors
            .get(&specifier)
            .cloned()
            .ok_or(DispatchError::UnknownSpecifier { specifier })
    }

    /// Instantiates the delegate registered for `specifier`
    pub fn create(
        &self,
        specifier: Specifier,
        client: ClientHandle,
        message: &Message,
    ) -> Result<Box<dyn Delegate>, DispatchError> {
        let constructor = self
            .constructors
            .get(&specifier)
            .ok_or(DispatchError::UnknownSpecifier { specifier })?;
        Ok(constructor(client, message, specifier))
    }
}
