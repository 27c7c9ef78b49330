use std::{any::Any, collections::BTreeMap};

use log::{debug, warn};

use penne_shared::{Identifier, Message, Specifier, Value};

use crate::{
    client::ClientHandle,
    delegate::{Delegate, DelegateInfo, DelegateType, SignalHandlers},
};

// GenericDelegate
/// Default delegate for every compartment except the document. Keeps every
/// field it has been created or updated with.
pub struct GenericDelegate {
    client: ClientHandle,
    specifier: Specifier,
    info: DelegateInfo,
    attributes: BTreeMap<String, Value>,
    signals: SignalHandlers,
}

impl GenericDelegate {
    pub fn client(&self) -> &ClientHandle {
        &self.client
    }

    pub fn specifier(&self) -> Specifier {
        self.specifier
    }

    pub fn attribute(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field)
    }

    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }
}

impl DelegateType for GenericDelegate {
    fn construct(client: ClientHandle, message: &Message, specifier: Specifier) -> Self {
        Self {
            client,
            specifier,
            info: DelegateInfo::from_message(message),
            attributes: message.fields().clone(),
            signals: SignalHandlers::new(),
        }
    }
}

impl Delegate for GenericDelegate {
    fn info(&self) -> &DelegateInfo {
        &self.info
    }

    fn on_new(&mut self, _message: &Message) {
        debug!("{} delegate {} created", self.specifier, self.info.id);
    }

    fn on_remove(&mut self, _message: &Message) {
        debug!("{} delegate {} removed", self.specifier, self.info.id);
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

// DocumentDelegate
/// The document singleton. Exists for the whole session and tracks which
/// methods and signals are attached to the document itself.
pub struct DocumentDelegate {
    client: ClientHandle,
    info: DelegateInfo,
    methods_list: Vec<Identifier>,
    signals_list: Vec<Identifier>,
    signals: SignalHandlers,
}

impl DocumentDelegate {
    pub fn client(&self) -> &ClientHandle {
        &self.client
    }

    pub fn methods_list(&self) -> &[Identifier] {
        &self.methods_list
    }

    pub fn signals_list(&self) -> &[Identifier] {
        &self.signals_list
    }

    fn read_lists(&mut self, field: &str, value: &Value) {
        match field {
            "methods_list" => self.methods_list = identifier_list(field, value),
            "signals_list" => self.signals_list = identifier_list(field, value),
            _ => {}
        }
    }
}

fn identifier_list(field: &str, value: &Value) -> Vec<Identifier> {
    let Some(items) = value.as_array() else {
        warn!("document field '{}' is not a list, treating it as empty", field);
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match Identifier::try_from_value(field, item) {
            Ok(id) => Some(id),
            Err(error) => {
                warn!("skipping malformed entry in document field '{}': {}", field, error);
                None
            }
        })
        .collect()
}

impl DelegateType for DocumentDelegate {
    fn construct(client: ClientHandle, message: &Message, _specifier: Specifier) -> Self {
        let mut document = Self {
            client,
            info: DelegateInfo::from_message(message),
            methods_list: Vec::new(),
            signals_list: Vec::new(),
            signals: SignalHandlers::new(),
        };
        for (field, value) in message.fields() {
            document.read_lists(field, value);
        }
        document
    }
}

impl Delegate for DocumentDelegate {
    fn info(&self) -> &DelegateInfo {
        &self.info
    }

    // document updates are not applied field by field by the dispatcher
    fn on_update(&mut self, message: &Message) {
        for (field, value) in message.fields() {
            self.read_lists(field, value);
        }
    }

    fn apply_update(&mut self, field: &str, value: &Value) {
        self.read_lists(field, value);
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
