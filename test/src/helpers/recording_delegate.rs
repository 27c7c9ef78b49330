use std::{
    any::Any,
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use penne_client::{ClientHandle, Delegate, DelegateInfo, SignalHandlers};
use penne_shared::{Identifier, Message, Payload, Specifier, Value};

/// One lifecycle hook call, as seen by a [`RecordingDelegate`]
#[derive(Clone, Debug, PartialEq)]
pub enum LifecycleEvent {
    New {
        specifier: Specifier,
        id: Identifier,
        fields: Payload,
    },
    Update {
        specifier: Specifier,
        id: Identifier,
        fields: Payload,
    },
    Remove {
        specifier: Specifier,
        id: Identifier,
    },
}

impl LifecycleEvent {
    pub fn id(&self) -> Identifier {
        match self {
            LifecycleEvent::New { id, .. } | LifecycleEvent::Update { id, .. } | LifecycleEvent::Remove { id, .. } => {
                *id
            }
        }
    }
}

/// Lifecycle events of every recording delegate of a client, in call order
#[derive(Clone, Default)]
pub struct LifecycleLog {
    events: Arc<Mutex<Vec<LifecycleEvent>>>,
}

impl LifecycleLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: LifecycleEvent) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn take(&self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Delegate that records its lifecycle and keeps its attributes
pub struct RecordingDelegate {
    client: ClientHandle,
    specifier: Specifier,
    info: DelegateInfo,
    attributes: BTreeMap<String, Value>,
    signals: SignalHandlers,
    log: LifecycleLog,
}

impl RecordingDelegate {
    pub fn new(client: ClientHandle, message: &Message, specifier: Specifier, log: LifecycleLog) -> Self {
        Self {
            client,
            specifier,
            info: DelegateInfo::from_message(message),
            attributes: message.fields().clone(),
            signals: SignalHandlers::new(),
            log,
        }
    }

    /// Registry constructor writing into `log`
    pub fn constructor(
        log: LifecycleLog,
    ) -> impl Fn(ClientHandle, &Message, Specifier) -> Box<dyn Delegate> + Send + Sync + 'static {
        move |client, message, specifier| {
            let delegate: Box<dyn Delegate> =
                Box::new(RecordingDelegate::new(client, message, specifier, log.clone()));
            delegate
        }
    }

    pub fn client(&self) -> &ClientHandle {
        &self.client
    }

    pub fn attribute(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field)
    }
}

impl Delegate for RecordingDelegate {
    fn info(&self) -> &DelegateInfo {
        &self.info
    }

    fn on_new(&mut self, message: &Message) {
        self.log.push(LifecycleEvent::New {
            specifier: self.specifier,
            id: self.info.id,
            fields: message.fields().clone(),
        });
    }

    fn on_update(&mut self, message: &Message) {
        self.log.push(LifecycleEvent::Update {
            specifier: self.specifier,
            id: self.info.id,
            fields: message.fields().clone(),
        });
    }

    fn on_remove(&mut self, _message: &Message) {
        self.log.push(LifecycleEvent::Remove {
            specifier: self.specifier,
            id: self.info.id,
        });
    }

    fn apply_update(&mut self, field: &str, value: &Value) {
        if field == "name" {
            self.info.name = value.as_text().map(str::to_string);
        }
        self.attributes.insert(field.to_string(), value.clone());
    }

    fn signals(&self) -> &SignalHandlers {
        &self.signals
    }

    fn signals_mut(&mut self) -> &mut SignalHandlers {
        &mut self.signals
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
