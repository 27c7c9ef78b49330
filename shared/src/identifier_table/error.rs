use thiserror::Error;

/// Errors that can occur while building an identifier table
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierTableError {
    /// Table is locked and cannot be modified
    #[error("Identifier table is already locked and cannot be modified. IdentifierTable.lock() has been called and no further changes are allowed")]
    AlreadyLocked,

    /// Message id was already assigned to another handle
    #[error("Message id {message_id} is already assigned to {existing}")]
    DuplicateMessageId {
        message_id: u32,
        existing: String,
    },
}
