/// Errors that can occur while interpreting a frame.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame bytes are not valid UTF-8. Logged and dropped by the
    /// relay loops; never fatal.
    #[error("frame is not valid UTF-8: {0}")]
    ProtocolDecode(#[from] std::str::Utf8Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
