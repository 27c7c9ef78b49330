use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, RwLock,
    },
};

use log::{debug, info, warn};
use tokio::sync::{mpsc, oneshot};

use penne_shared::{
    decode, decode_batch, ClientMessage, Envelope, Identifier, IdentifierTable, InvokeContext, InvokeId,
    Specifier, Value,
};

use crate::{
    callback_registry::CallbackRegistry,
    client::{ClientBuilder, ClientConfig, ClientHandle, FrameSink},
    delegate::{registry::DelegateRegistry, Delegate},
    dispatch::{DispatchOutcome, Dispatcher, OtherMessage},
    error::{DispatchError, InvokeError, RemoteMethodError},
    state::StateStore,
};

/// Everything one connection to a server shares between the dispatch context
/// and the caller contexts
pub struct Session {
    config: ClientConfig,
    dispatcher: Dispatcher,
    state: RwLock<StateStore>,
    callbacks: CallbackRegistry,
    outbound: Option<Box<dyn FrameSink>>,
    next_invoke_id: AtomicU64,
    other_messages: Mutex<VecDeque<OtherMessage>>,
    handle: ClientHandle,
}

impl Session {
    pub(crate) fn new(
        config: ClientConfig,
        dispatcher: Dispatcher,
        state: StateStore,
        outbound: Option<Box<dyn FrameSink>>,
        handle: ClientHandle,
    ) -> Self {
        Self {
            config,
            dispatcher,
            state: RwLock::new(state),
            callbacks: CallbackRegistry::new(),
            outbound,
            next_invoke_id: AtomicU64::new(0),
            other_messages: Mutex::new(VecDeque::new()),
            handle,
        }
    }
}

// Client
/// A synchronization session with one server.
///
/// Inbound frames are fed through [`Client::handle_message`],
/// [`Client::handle_frame`] or the [`Client::run`] loop, strictly in arrival
/// order. Cloning the client is cheap and every clone refers to the same
/// session.
#[derive(Clone)]
pub struct Client {
    session: Arc<Session>,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub(crate) fn from_session(session: Arc<Session>) -> Self {
        Self { session }
    }

    pub(crate) fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Weak handle to this client, as given to delegates
    pub fn handle(&self) -> ClientHandle {
        self.session.handle.clone()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.session.config
    }

    pub fn identifier_table(&self) -> &IdentifierTable {
        self.session.dispatcher.identifier_table()
    }

    pub fn delegate_registry(&self) -> &DelegateRegistry {
        self.session.dispatcher.registry()
    }

    // Inbound

    /// Decodes and dispatches a frame carrying exactly one envelope
    pub fn handle_message(&self, bytes: &[u8]) -> Result<DispatchOutcome, DispatchError> {
        let envelope = decode(bytes)?;
        self.handle_envelope(envelope)
    }

    /// Decodes a possibly batched frame and dispatches each envelope in
    /// order. A failing envelope does not stop the ones after it. A frame
    /// that does not decode yields a single error.
    pub fn handle_frame(&self, bytes: &[u8]) -> Vec<Result<DispatchOutcome, DispatchError>> {
        match decode_batch(bytes) {
            Ok(envelopes) => envelopes
                .into_iter()
                .map(|envelope| self.handle_envelope(envelope))
                .collect(),
            Err(error) => vec![Err(error.into())],
        }
    }

    pub fn handle_envelope(&self, envelope: Envelope) -> Result<DispatchOutcome, DispatchError> {
        let outcome = self.session.dispatcher.dispatch(
            envelope,
            &self.session.state,
            &self.session.callbacks,
            &self.session.handle,
        )?;

        if let DispatchOutcome::Other(message) = &outcome {
            self.queue_other_message(message);
        }

        Ok(outcome)
    }

    fn queue_other_message(&self, message: &OtherMessage) {
        let capacity = self.session.config.other_message_capacity;
        if capacity == 0 {
            return;
        }
        let Ok(mut queue) = self.session.other_messages.lock() else {
            return;
        };
        while queue.len() >= capacity {
            if let Some(dropped) = queue.pop_front() {
                warn!("Other message queue is full, dropping {}", dropped.name);
            }
        }
        queue.push_back(message.clone());
    }

    /// Dispatches every frame received on `inbound` until the channel
    /// closes. Per-message failures are logged and skipped. A lifecycle hook
    /// that panics unwinds out of this loop, a new `run` on the same client
    /// picks up where it left off.
    pub async fn run(&self, mut inbound: mpsc::UnboundedReceiver<Vec<u8>>) {
        while let Some(frame) = inbound.recv().await {
            for result in self.handle_frame(&frame) {
                if let Err(error) = result {
                    warn!("Failed to dispatch message: {}", error);
                }
            }
        }
        debug!("Inbound channel closed, dispatch loop finished");
    }

    /// Messages the dispatcher did not apply to the state store, such as
    /// document resets, oldest first. The embedder is expected to drain these
    /// regularly, at most `ClientConfig::other_message_capacity` are kept.
    pub fn take_other_messages(&self) -> Vec<OtherMessage> {
        self.session
            .other_messages
            .lock()
            .map(|mut queue| queue.drain(..).collect())
            .unwrap_or_default()
    }

    // State access

    /// Runs `f` with shared access to the state store, serialized against
    /// dispatch
    pub fn try_with_state<R>(&self, f: impl FnOnce(&StateStore) -> R) -> Result<R, DispatchError> {
        let state = self
            .session
            .state
            .read()
            .map_err(|_| DispatchError::StateLockPoisoned)?;
        Ok(f(&state))
    }

    /// # Panics
    ///
    /// Panics if a delegate hook panicked while holding the state store.
    /// Consider using `try_with_state` for non-panicking error handling.
    pub fn with_state<R>(&self, f: impl FnOnce(&StateStore) -> R) -> R {
        match self.try_with_state(f) {
            Ok(result) => result,
            Err(error) => panic!("{}", error),
        }
    }

    /// `Ok(None)` if no delegate lives at `specifier[index]`
    pub fn with_delegate<R>(
        &self,
        specifier: Specifier,
        index: u32,
        f: impl FnOnce(&dyn Delegate) -> R,
    ) -> Result<Option<R>, DispatchError> {
        self.try_with_state(|state| state.get(specifier, index).map(f))
    }

    /// Mutable access for embedder-side changes such as registering signal
    /// handlers. Serialized against dispatch like every other access.
    pub fn with_delegate_mut<R>(
        &self,
        specifier: Specifier,
        index: u32,
        f: impl FnOnce(&mut dyn Delegate) -> R,
    ) -> Result<Option<R>, DispatchError> {
        let mut state = self
            .session
            .state
            .write()
            .map_err(|_| DispatchError::StateLockPoisoned)?;
        Ok(state.get_mut(specifier, index).map(|delegate| f(delegate)))
    }

    // Outbound

    /// Introduces this client to the server under the configured name
    pub fn send_intro(&self) -> Result<(), InvokeError> {
        let message = ClientMessage::Introduction {
            client_name: self.session.config.client_name.clone(),
        };
        info!("Introducing client as '{}'", self.session.config.client_name);
        self.send(&message)
    }

    /// Asks the server to run `method`. `callback` is called once with the
    /// reply, from the dispatch context.
    pub fn invoke_method<F>(
        &self,
        method: Identifier,
        args: Vec<Value>,
        context: Option<InvokeContext>,
        callback: F,
    ) -> Result<InvokeId, InvokeError>
    where
        F: FnOnce(Result<Value, RemoteMethodError>) + Send + 'static,
    {
        if self.session.outbound.is_none() {
            return Err(InvokeError::NoOutbound);
        }

        let invoke_id = InvokeId::from(self.session.next_invoke_id.fetch_add(1, Ordering::Relaxed));
        self.session
            .callbacks
            .register(invoke_id.clone(), Box::new(callback))?;

        let message = ClientMessage::InvokeMethod {
            method,
            context,
            invoke_id: Some(invoke_id.clone()),
            args,
        };
        if let Err(error) = self.send(&message) {
            self.session.callbacks.cancel(&invoke_id);
            return Err(error);
        }

        debug!("Invoked method {} as {}", method, invoke_id);
        Ok(invoke_id)
    }

    /// Asks the server to run `method` without waiting for a reply
    pub fn invoke_method_without_reply(
        &self,
        method: Identifier,
        args: Vec<Value>,
        context: Option<InvokeContext>,
    ) -> Result<(), InvokeError> {
        self.send(&ClientMessage::InvokeMethod {
            method,
            context,
            invoke_id: None,
            args,
        })
    }

    /// Like [`Client::invoke_method`], looking the method up by name
    pub fn invoke_method_by_name<F>(
        &self,
        name: &str,
        args: Vec<Value>,
        context: Option<InvokeContext>,
        callback: F,
    ) -> Result<InvokeId, InvokeError>
    where
        F: FnOnce(Result<Value, RemoteMethodError>) + Send + 'static,
    {
        let method = self.method_id(name)?;
        self.invoke_method(method, args, context, callback)
    }

    /// Invokes `method` and returns a receiver resolving to its reply. The
    /// receiver errors if the invocation is cancelled.
    pub fn call_method(
        &self,
        method: Identifier,
        args: Vec<Value>,
        context: Option<InvokeContext>,
    ) -> Result<oneshot::Receiver<Result<Value, RemoteMethodError>>, InvokeError> {
        let (sender, receiver) = oneshot::channel();
        self.invoke_method(method, args, context, move |result| {
            let _ = sender.send(result);
        })?;
        Ok(receiver)
    }

    /// Forgets a pending invocation, its callback is never called. Returns
    /// false if it was not pending.
    pub fn cancel_invocation(&self, invoke_id: &InvokeId) -> bool {
        self.session.callbacks.cancel(invoke_id)
    }

    pub fn pending_invocations(&self) -> usize {
        self.session.callbacks.len()
    }

    fn method_id(&self, name: &str) -> Result<Identifier, InvokeError> {
        let state = self
            .session
            .state
            .read()
            .map_err(|_| InvokeError::StateLockPoisoned)?;
        state
            .find_by_name(Specifier::Methods, name)
            .map(|delegate| delegate.info().id)
            .ok_or_else(|| InvokeError::MethodNotFound {
                name: name.to_string(),
            })
    }

    fn send(&self, message: &ClientMessage) -> Result<(), InvokeError> {
        let outbound = self.session.outbound.as_ref().ok_or(InvokeError::NoOutbound)?;
        let frame = message.encode()?;
        outbound.send_frame(frame)?;
        Ok(())
    }
}
