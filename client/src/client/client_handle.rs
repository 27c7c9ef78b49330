use std::sync::{Arc, Weak};

use crate::client::{Client, Session};

// ClientHandle
/// Non-owning reference from a delegate back to its client.
///
/// Delegates are owned by the client's state store, so they hold this
/// instead of a [`Client`] to avoid a reference cycle.
#[derive(Clone, Default)]
pub struct ClientHandle {
    session: Weak<Session>,
}

impl ClientHandle {
    pub(crate) fn new(session: Weak<Session>) -> Self {
        Self { session }
    }

    /// Handle that never upgrades, for delegates built outside a client
    pub fn detached() -> Self {
        Self::default()
    }

    /// `None` once the client has been dropped
    pub fn upgrade(&self) -> Option<Client> {
        self.session.upgrade().map(Client::from_session)
    }

    pub fn is_alive(&self) -> bool {
        self.session.strong_count() > 0
    }

    pub fn ptr_eq(&self, client: &Client) -> bool {
        Weak::ptr_eq(&self.session, &Arc::downgrade(client.session()))
    }
}
