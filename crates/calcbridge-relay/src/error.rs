/// Errors that can occur in the relay engine.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The target channel is not alive; writes fail fast without touching
    /// the medium.
    #[error("{0} channel is closed")]
    ChannelClosed(&'static str),

    /// Media-level failure (serial open, TCP connect, I/O).
    #[error("transport error: {0}")]
    Transport(#[from] calcbridge_transport::TransportError),

    /// The relayed bytes could not be interpreted.
    #[error("frame error: {0}")]
    Frame(#[from] calcbridge_frame::FrameError),

    /// I/O failure inside a channel loop.
    #[error("relay I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A channel thread ended by panic rather than by its loop exit.
    #[error("{0} channel thread panicked")]
    ChannelPanicked(&'static str),
}

pub type Result<T> = std::result::Result<T, RelayError>;
