pub mod client_message;
pub mod decoder;
pub mod error;
pub mod message;
