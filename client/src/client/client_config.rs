use std::default::Default;

/// Contains Config properties which will be used by the Client
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Determines whether a message id missing from the identifier table is
    /// an error. When false such messages are logged and skipped.
    pub strict: bool,
    /// Name sent to the server in the introduction message
    pub client_name: String,
    /// Most other messages kept until the embedder drains them with
    /// `Client::take_other_messages`. Once full the oldest is dropped. Zero
    /// disables the queue.
    pub other_message_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            strict: false,
            client_name: "Rust Client".to_string(),
            other_message_capacity: 256,
        }
    }
}
