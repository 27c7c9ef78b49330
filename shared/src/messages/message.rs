use std::fmt;

use crate::{
    identifier::Identifier,
    identifier_table::Action,
    messages::{decoder::Payload, error::SchemaError},
    specifier::Specifier,
    value::{text_map, Value},
};

// InvokeId
/// Correlates a client-issued method invocation with the server's reply
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InvokeId(String);

impl InvokeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Text(self.0.clone())
    }

    /// Accepts text, or an integer normalised to its decimal text
    pub fn try_from_value(value: &Value) -> Result<Self, SchemaError> {
        if let Some(text) = value.as_text() {
            return Ok(Self(text.to_string()));
        }
        if let Some(integer) = value.as_integer() {
            return Ok(Self(i128::from(integer).to_string()));
        }
        Err(SchemaError::InvalidField {
            field: "invoke_id".to_string(),
            reason: "invoke id must be text or an integer",
        })
    }
}

impl From<u64> for InvokeId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for InvokeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for InvokeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for InvokeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// InvokeContext
/// Which delegate a signal or method invocation is aimed at.
/// Absence of a context means the document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InvokeContext {
    Table(Identifier),
    Entity(Identifier),
    Plot(Identifier),
}

impl InvokeContext {
    /// Compartment the target lives in
    pub fn specifier(&self) -> Specifier {
        match self {
            InvokeContext::Table(_) => Specifier::Tables,
            InvokeContext::Entity(_) => Specifier::Entities,
            InvokeContext::Plot(_) => Specifier::Plots,
        }
    }

    pub fn id(&self) -> Identifier {
        match self {
            InvokeContext::Table(id) | InvokeContext::Entity(id) | InvokeContext::Plot(id) => *id,
        }
    }

    /// Wire tag
    pub fn tag(&self) -> &'static str {
        match self {
            InvokeContext::Table(_) => "table",
            InvokeContext::Entity(_) => "entity",
            InvokeContext::Plot(_) => "plot",
        }
    }

    pub fn to_value(&self) -> Value {
        text_map([(self.tag(), self.id().to_value())])
    }

    /// `Ok(None)` for a null context. Tags are probed in the order
    /// table, entity, plot.
    pub fn try_from_value(value: &Value) -> Result<Option<Self>, SchemaError> {
        if value.is_null() {
            return Ok(None);
        }

        let entries = value.as_map().ok_or_else(|| SchemaError::InvalidField {
            field: "context".to_string(),
            reason: "context must be a map",
        })?;
        let lookup = |tag: &str| {
            entries
                .iter()
                .find(|(key, _)| key.as_text() == Some(tag))
                .map(|(_, value)| value)
        };

        if let Some(id) = lookup("table") {
            return Ok(Some(InvokeContext::Table(Identifier::try_from_value("context.table", id)?)));
        }
        if let Some(id) = lookup("entity") {
            return Ok(Some(InvokeContext::Entity(Identifier::try_from_value("context.entity", id)?)));
        }
        if let Some(id) = lookup("plot") {
            return Ok(Some(InvokeContext::Plot(Identifier::try_from_value("context.plot", id)?)));
        }

        Err(SchemaError::UnknownContextKind {
            keys: entries
                .iter()
                .map(|(key, _)| key.as_text().unwrap_or("<non-text>").to_string())
                .collect(),
        })
    }
}

// Message
/// A specifier-tagged record decoded from a payload. Lives for one dispatch.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    specifier: Specifier,
    fields: Payload,
}

impl Message {
    /// Builds a message without validating any fields
    pub fn new(specifier: Specifier, fields: Payload) -> Self {
        Self { specifier, fields }
    }

    pub fn empty(specifier: Specifier) -> Self {
        Self::new(specifier, Payload::new())
    }

    /// Builds a message and checks that the fields `action` depends on are
    /// present and well formed.
    pub fn reconstruct(action: Action, specifier: Specifier, payload: Payload) -> Result<Self, SchemaError> {
        let message = Self::new(specifier, payload);
        match action {
            Action::Create | Action::Delete => {
                message.id()?;
            }
            Action::Update => {
                // the document has no generation-checked identity
                if !specifier.is_document() {
                    message.id()?;
                }
            }
            Action::Reply => {
                message.invoke_id()?;
            }
            Action::Invoke => {
                message.id()?;
                message.signal_data()?;
            }
            Action::Other => {}
        }
        Ok(message)
    }

    pub fn specifier(&self) -> Specifier {
        self.specifier
    }

    pub fn fields(&self) -> &Payload {
        &self.fields
    }

    pub fn into_fields(self) -> Payload {
        self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn id(&self) -> Result<Identifier, SchemaError> {
        Identifier::try_from_value("id", self.require("id")?)
    }

    pub fn invoke_id(&self) -> Result<InvokeId, SchemaError> {
        InvokeId::try_from_value(self.require("invoke_id")?)
    }

    /// Reply result, absent means null
    pub fn result(&self) -> Option<&Value> {
        self.fields.get("result")
    }

    /// Server-side failure of a client-issued call, if any
    pub fn method_exception(&self) -> Option<&Value> {
        self.fields.get("method_exception").filter(|value| !value.is_null())
    }

    /// Positional arguments of a signal invocation
    pub fn signal_data(&self) -> Result<&[Value], SchemaError> {
        self.require("signal_data")?
            .as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| SchemaError::InvalidField {
                field: "signal_data".to_string(),
                reason: "signal data must be an array",
            })
    }

    pub fn context(&self) -> Result<Option<InvokeContext>, SchemaError> {
        match self.fields.get("context") {
            None => Ok(None),
            Some(value) => InvokeContext::try_from_value(value),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_text)
    }

    fn require(&self, field: &'static str) -> Result<&Value, SchemaError> {
        self.fields.get(field).ok_or(SchemaError::MissingField {
            specifier: self.specifier.as_str(),
            field,
        })
    }
}
