use tokio::sync::mpsc;

use crate::error::FrameSinkError;

/// Outbound half of the transport. Receives fully encoded CBOR frames.
pub trait FrameSink: Send + Sync {
    fn send_frame(&self, frame: Vec<u8>) -> Result<(), FrameSinkError>;
}

impl FrameSink for mpsc::UnboundedSender<Vec<u8>> {
    fn send_frame(&self, frame: Vec<u8>) -> Result<(), FrameSinkError> {
        self.send(frame).map_err(|_| FrameSinkError::Closed)
    }
}
