use std::{collections::HashMap, fmt};

use crate::specifier::Specifier;

pub mod error;
pub use error::IdentifierTableError;

// Action
/// What a server message asks the client to do with its state compartment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    Delete,
    Update,
    Invoke,
    Reply,
    /// Communication, reset and document-only frames
    Other,
}

impl Action {
    /// Parsing is total: anything but the five dispatchable actions is `Other`
    pub fn from_name(name: &str) -> Self {
        match name {
            "create" => Action::Create,
            "delete" => Action::Delete,
            "update" => Action::Update,
            "invoke" => Action::Invoke,
            "reply" => Action::Reply,
            _ => Action::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Delete => "delete",
            Action::Update => "update",
            Action::Invoke => "invoke",
            Action::Reply => "reply",
            Action::Other => "other",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// HandleInfo
/// Handling metadata for one server message id. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandleInfo {
    action: Action,
    specifier: Specifier,
    name: String,
}

impl HandleInfo {
    pub fn new(action: Action, specifier: Specifier, name: impl Into<String>) -> Self {
        Self {
            action,
            specifier,
            name: name.into(),
        }
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn specifier(&self) -> Specifier {
        self.specifier
    }

    /// Protocol message name, used for logging
    pub fn name(&self) -> &str {
        &self.name
    }
}

// IdentifierTable
/// Mapping from the compact server message id to its [`HandleInfo`].
///
/// Built once at session setup and locked. The client only ever reads it.
#[derive(Clone, Debug, Default)]
pub struct IdentifierTable {
    entries: HashMap<u32, HandleInfo>,
    locked: bool,
}

const STANDARD_SERVER_MESSAGES: [(u32, &str, Action, Specifier); 36] = [
    (0, "MsgMethodCreate", Action::Create, Specifier::Methods),
    (1, "MsgMethodDelete", Action::Delete, Specifier::Methods),
    (2, "MsgSignalCreate", Action::Create, Specifier::Signals),
    (3, "MsgSignalDelete", Action::Delete, Specifier::Signals),
    (4, "MsgEntityCreate", Action::Create, Specifier::Entities),
    (5, "MsgEntityUpdate", Action::Update, Specifier::Entities),
    (6, "MsgEntityDelete", Action::Delete, Specifier::Entities),
    (7, "MsgPlotCreate", Action::Create, Specifier::Plots),
    (8, "MsgPlotUpdate", Action::Update, Specifier::Plots),
    (9, "MsgPlotDelete", Action::Delete, Specifier::Plots),
    (10, "MsgBufferCreate", Action::Create, Specifier::Buffers),
    (11, "MsgBufferDelete", Action::Delete, Specifier::Buffers),
    (12, "MsgBufferViewCreate", Action::Create, Specifier::BufferViews),
    (13, "MsgBufferViewDelete", Action::Delete, Specifier::BufferViews),
    (14, "MsgMaterialCreate", Action::Create, Specifier::Materials),
    (15, "MsgMaterialUpdate", Action::Update, Specifier::Materials),
    (16, "MsgMaterialDelete", Action::Delete, Specifier::Materials),
    (17, "MsgImageCreate", Action::Create, Specifier::Images),
    (18, "MsgImageDelete", Action::Delete, Specifier::Images),
    (19, "MsgTextureCreate", Action::Create, Specifier::Textures),
    (20, "MsgTextureDelete", Action::Delete, Specifier::Textures),
    (21, "MsgSamplerCreate", Action::Create, Specifier::Samplers),
    (22, "MsgSamplerDelete", Action::Delete, Specifier::Samplers),
    (23, "MsgLightCreate", Action::Create, Specifier::Lights),
    (24, "MsgLightUpdate", Action::Update, Specifier::Lights),
    (25, "MsgLightDelete", Action::Delete, Specifier::Lights),
    (26, "MsgGeometryCreate", Action::Create, Specifier::Geometries),
    (27, "MsgGeometryDelete", Action::Delete, Specifier::Geometries),
    (28, "MsgTableCreate", Action::Create, Specifier::Tables),
    (29, "MsgTableUpdate", Action::Update, Specifier::Tables),
    (30, "MsgTableDelete", Action::Delete, Specifier::Tables),
    (31, "MsgDocumentUpdate", Action::Update, Specifier::Document),
    (32, "MsgDocumentReset", Action::Other, Specifier::Document),
    (33, "MsgSignalInvoke", Action::Invoke, Specifier::Signals),
    (34, "MsgMethodReply", Action::Reply, Specifier::Methods),
    (35, "MsgDocumentInitialized", Action::Other, Specifier::Document),
];

impl IdentifierTable {
    pub fn builder() -> Self {
        Self::default()
    }

    /// The protocol's standard server message table, locked
    pub fn standard() -> Self {
        let mut table = Self::builder();
        for (message_id, name, action, specifier) in STANDARD_SERVER_MESSAGES {
            table.add(message_id, HandleInfo::new(action, specifier, name));
        }
        table.build()
    }

    /// # Panics
    ///
    /// Panics if the table is locked or `message_id` is already assigned.
    /// Consider using `try_add` for non-panicking error handling.
    pub fn add(&mut self, message_id: u32, info: HandleInfo) -> &mut Self {
        self.check_lock();
        if let Some(existing) = self.entries.get(&message_id) {
            panic!(
                "Message id {} is already assigned to {}",
                message_id,
                existing.name()
            );
        }
        self.entries.insert(message_id, info);
        self
    }

    pub fn try_add(&mut self, message_id: u32, info: HandleInfo) -> Result<&mut Self, IdentifierTableError> {
        self.try_check_lock()?;
        if let Some(existing) = self.entries.get(&message_id) {
            return Err(IdentifierTableError::DuplicateMessageId {
                message_id,
                existing: existing.name().to_string(),
            });
        }
        self.entries.insert(message_id, info);
        Ok(self)
    }

    pub fn try_lock(&mut self) -> Result<(), IdentifierTableError> {
        self.try_check_lock()?;
        self.locked = true;
        Ok(())
    }

    pub fn lock(&mut self) {
        self.check_lock();
        self.locked = true;
    }

    /// Returns Err if the table is locked
    pub fn try_check_lock(&self) -> Result<(), IdentifierTableError> {
        if self.locked {
            Err(IdentifierTableError::AlreadyLocked)
        } else {
            Ok(())
        }
    }

    /// Panics if the table is locked
    pub fn check_lock(&self) {
        if self.locked {
            panic!("Identifier table already locked!");
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Locks the table and hands it out, leaving an empty builder behind
    pub fn build(&mut self) -> Self {
        self.locked = true;
        std::mem::take(self)
    }

    pub fn get(&self, message_id: u32) -> Option<&HandleInfo> {
        self.entries.get(&message_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&u32, &HandleInfo)> {
        self.entries.iter()
    }
}
