/// Errors that can occur on the bridge media.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The serial device exists but the OS refused access.
    /// Fatal to the process; surfaced with a remediation hint by the CLI.
    #[error("serial device access denied for {path}: {source}")]
    PermissionDenied {
        path: String,
        source: serialport::Error,
    },

    /// Failed to open the serial device.
    #[error("failed to open serial port {path}: {source}")]
    Open {
        path: String,
        source: serialport::Error,
    },

    /// Failed to connect to the server.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    /// The connect attempt did not complete within the configured timeout.
    /// Retryable: the server may simply not be reachable yet.
    #[error("connect to {addr} timed out")]
    ConnectTimeout { addr: String },

    /// The server address did not resolve to any socket address.
    #[error("invalid server address: {addr}")]
    InvalidAddress { addr: String },

    /// An I/O error occurred on an open medium.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
