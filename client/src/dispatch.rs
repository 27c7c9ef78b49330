use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, info, warn};

use penne_shared::{
    check_generation, Action, Envelope, HandleInfo, Identifier, IdentifierTable, InvokeId, Message,
    Payload, Specifier, Value,
};

use crate::{
    callback_registry::CallbackRegistry,
    client::ClientHandle,
    delegate::{registry::DelegateRegistry, SignalHandler},
    error::{CallbackError, DispatchError, RemoteMethodError},
    signal_router,
    state::StateStore,
};

// OtherMessage
/// A message whose action is neither create, delete, update, invoke nor
/// reply. Such messages do not touch the state store, they are queued for the
/// embedder instead.
#[derive(Clone, Debug, PartialEq)]
pub struct OtherMessage {
    pub message_id: u32,
    pub name: String,
    pub specifier: Specifier,
    pub payload: Payload,
}

// DispatchOutcome
/// What a successfully dispatched message did
#[derive(Clone, Debug, PartialEq)]
pub enum DispatchOutcome {
    Created {
        specifier: Specifier,
        id: Identifier,
    },
    Deleted {
        specifier: Specifier,
        id: Identifier,
    },
    Updated {
        specifier: Specifier,
        id: Identifier,
    },
    Replied {
        invoke_id: InvokeId,
        /// Whether the server reported a method exception
        exception: bool,
    },
    SignalInvoked {
        signal: String,
        specifier: Specifier,
        target: Identifier,
    },
    Other(OtherMessage),
    /// Message id unknown to the identifier table, outside strict mode
    Ignored {
        message_id: u32,
    },
}

// Dispatcher
/// Applies decoded envelopes to the state store, one at a time.
///
/// Every check a message can fail runs before the store is touched, so an
/// error leaves the store exactly as it was.
pub struct Dispatcher {
    identifier_table: IdentifierTable,
    registry: DelegateRegistry,
    strict: bool,
}

impl Dispatcher {
    pub fn new(identifier_table: IdentifierTable, registry: DelegateRegistry, strict: bool) -> Self {
        Self {
            identifier_table,
            registry,
            strict,
        }
    }

    pub fn identifier_table(&self) -> &IdentifierTable {
        &self.identifier_table
    }

    pub fn registry(&self) -> &DelegateRegistry {
        &self.registry
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Dispatches one envelope. Lifecycle hooks run under the state write
    /// lock. Signal handlers and reply callbacks run after it is released.
    ///
    /// A hook that panics poisons the state lock. The next dispatch clears
    /// the poison and keeps applying messages to the store as the panicking
    /// hook left it.
    pub fn dispatch(
        &self,
        envelope: Envelope,
        state: &RwLock<StateStore>,
        callbacks: &CallbackRegistry,
        client: &ClientHandle,
    ) -> Result<DispatchOutcome, DispatchError> {
        let Envelope {
            message_id,
            payload,
        } = envelope;

        let Some(handle_info) = self.identifier_table.get(message_id) else {
            if self.strict {
                return Err(DispatchError::UnknownMessageId { message_id });
            }
            warn!("Ignoring message with unknown id {}", message_id);
            return Ok(DispatchOutcome::Ignored { message_id });
        };

        let action = handle_info.action();
        let specifier = handle_info.specifier();
        debug!(
            "Dispatching {} ({} {}), id {}",
            handle_info.name(),
            action,
            specifier,
            message_id
        );

        let message = Message::reconstruct(action, specifier, payload)?;

        match action {
            Action::Create => self.create(message, state, client),
            Action::Delete => self.delete(message, state),
            Action::Update => self.update(message, state),
            Action::Invoke => self.invoke(message, state),
            Action::Reply => self.reply(message, callbacks),
            Action::Other => Ok(self.other(message_id, handle_info, message)),
        }
    }

    fn create(
        &self,
        message: Message,
        state: &RwLock<StateStore>,
        client: &ClientHandle,
    ) -> Result<DispatchOutcome, DispatchError> {
        let specifier = message.specifier();
        let id = message.id()?;
        let delegate = self.registry.create(specifier, client.clone(), &message)?;
        check_generation(&delegate.info().id, &id)?;

        let mut state = write_state(state);
        state.insert(specifier, id, delegate)?.on_new(&message);

        Ok(DispatchOutcome::Created { specifier, id })
    }

    fn delete(&self, message: Message, state: &RwLock<StateStore>) -> Result<DispatchOutcome, DispatchError> {
        let specifier = message.specifier();
        let id = message.id()?;

        let mut state = write_state(state);
        let delegate = state
            .get_mut(specifier, id.index())
            .ok_or(DispatchError::MissingDelegate {
                specifier,
                index: id.index(),
            })?;
        check_generation(&delegate.info().id, &id)?;

        delegate.on_remove(&message);
        state.remove(specifier, id.index());

        Ok(DispatchOutcome::Deleted { specifier, id })
    }

    fn update(&self, message: Message, state: &RwLock<StateStore>) -> Result<DispatchOutcome, DispatchError> {
        let specifier = message.specifier();

        let mut state = write_state(state);

        if specifier.is_document() {
            let document = state.document_mut();
            document.on_update(&message);
            return Ok(DispatchOutcome::Updated {
                specifier,
                id: document.info().id,
            });
        }

        let id = message.id()?;
        let delegate = state
            .get_mut(specifier, id.index())
            .ok_or(DispatchError::MissingDelegate {
                specifier,
                index: id.index(),
            })?;
        check_generation(&delegate.info().id, &id)?;

        for (field, value) in message.fields() {
            delegate.apply_update(field, value);
        }
        delegate.on_update(&message);

        Ok(DispatchOutcome::Updated { specifier, id })
    }

    fn invoke(&self, message: Message, state: &RwLock<StateStore>) -> Result<DispatchOutcome, DispatchError> {
        let signal_id = message.id()?;

        let (handler, outcome): (SignalHandler, DispatchOutcome) = {
            let state = read_state(state);

            let signal = state
                .get(Specifier::Signals, signal_id.index())
                .ok_or(DispatchError::MissingDelegate {
                    specifier: Specifier::Signals,
                    index: signal_id.index(),
                })?;
            check_generation(&signal.info().id, &signal_id)?;
            let signal_name = signal.info().name.clone().unwrap_or_default();

            let (specifier, target) = signal_router::resolve_target(&state, &message)?;
            let handler = state
                .get(specifier, target.index())
                .and_then(|delegate| delegate.signals().get(&signal_name).cloned())
                .ok_or_else(|| DispatchError::UnknownHandler {
                    specifier,
                    target,
                    signal: signal_name.clone(),
                })?;

            (
                handler,
                DispatchOutcome::SignalInvoked {
                    signal: signal_name,
                    specifier,
                    target,
                },
            )
        };

        handler(message.signal_data()?);
        Ok(outcome)
    }

    fn reply(&self, message: Message, callbacks: &CallbackRegistry) -> Result<DispatchOutcome, DispatchError> {
        let invoke_id = message.invoke_id()?;

        if let Some(exception) = message.method_exception() {
            let error = RemoteMethodError {
                invoke_id: invoke_id.clone(),
                exception: exception.clone(),
            };
            return match callbacks.take(&invoke_id) {
                Ok(callback) => {
                    callback(Err(error));
                    Ok(DispatchOutcome::Replied {
                        invoke_id,
                        exception: true,
                    })
                }
                Err(CallbackError::UnmatchedInvocation { .. }) => Err(DispatchError::RemoteMethod(error)),
                Err(other) => Err(other.into()),
            };
        }

        let result = message.result().cloned().unwrap_or(Value::Null);
        callbacks.complete(&invoke_id, Ok(result))?;
        Ok(DispatchOutcome::Replied {
            invoke_id,
            exception: false,
        })
    }

    fn other(&self, message_id: u32, handle_info: &HandleInfo, message: Message) -> DispatchOutcome {
        info!("Received {} ({})", handle_info.name(), message.specifier());
        DispatchOutcome::Other(OtherMessage {
            message_id,
            name: handle_info.name().to_string(),
            specifier: message.specifier(),
            payload: message.into_fields(),
        })
    }
}

fn write_state(state: &RwLock<StateStore>) -> RwLockWriteGuard<'_, StateStore> {
    state.write().unwrap_or_else(|poisoned| {
        warn!("A delegate hook panicked while holding the state store, recovering");
        state.clear_poison();
        poisoned.into_inner()
    })
}

fn read_state(state: &RwLock<StateStore>) -> RwLockReadGuard<'_, StateStore> {
    state.read().unwrap_or_else(|poisoned| {
        warn!("A delegate hook panicked while holding the state store, recovering");
        state.clear_poison();
        poisoned.into_inner()
    })
}
