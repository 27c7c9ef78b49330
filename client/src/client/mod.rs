mod client;
pub use client::Client;

mod client_builder;
pub use client_builder::ClientBuilder;

mod client_config;
pub use client_config::ClientConfig;

mod client_handle;
pub use client_handle::ClientHandle;

mod frame_sink;
pub use frame_sink::FrameSink;

pub(crate) use client::Session;
