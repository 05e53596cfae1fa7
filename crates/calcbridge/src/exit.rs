use std::fmt;
use std::io;

use calcbridge_relay::RelayError;
use calcbridge_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::PermissionDenied
        | io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

/// Unrecoverable startup failures (device access denied, server
/// unreachable) all exit 1; only shell-local timeouts and bad arguments
/// leave that range.
pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::PermissionDenied { ref path, .. } => CliError::new(
            FAILURE,
            format!("{context}: {err}\n{}", permission_hint(path)),
        ),
        TransportError::ConnectTimeout { .. } => {
            CliError::new(TIMEOUT, format!("{context}: {err}"))
        }
        TransportError::InvalidAddress { .. } => CliError::new(USAGE, format!("{context}: {err}")),
        TransportError::Io(source) => io_error(context, source),
        other => CliError::new(FAILURE, format!("{context}: {other}")),
    }
}

pub fn relay_error(context: &str, err: RelayError) -> CliError {
    match err {
        RelayError::Transport(err) => transport_error(context, err),
        RelayError::Io(source) => io_error(context, source),
        RelayError::ChannelClosed(_) => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

/// Remediation guidance for the common udev/group misconfiguration. The
/// commands are printed, never executed.
pub fn permission_hint(path: &str) -> String {
    format!(
        "the serial device is not accessible; on Linux, try:\n\
         \u{20}   sudo usermod -a -G dialout $USER   (then log out and back in)\n\
         \u{20}   sudo chmod a+rw {path}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_denied_is_a_startup_failure_with_hint() {
        let err = TransportError::PermissionDenied {
            path: "/dev/ttyACM0".to_string(),
            source: serial_denied(),
        };
        let cli = transport_error("open failed", err);
        assert_eq!(cli.code, FAILURE);
        assert!(cli.message.contains("dialout"));
        assert!(cli.message.contains("/dev/ttyACM0"));
    }

    #[test]
    fn unreachable_server_is_a_startup_failure() {
        let err = TransportError::Connect {
            addr: "example.com:2052".to_string(),
            source: io::ErrorKind::HostUnreachable.into(),
        };
        assert_eq!(transport_error("connect failed", err).code, FAILURE);
    }

    #[test]
    fn refused_connection_is_a_startup_failure() {
        let err = TransportError::Io(io::ErrorKind::ConnectionRefused.into());
        assert_eq!(transport_error("connect failed", err).code, FAILURE);
    }

    #[test]
    fn failed_serial_open_is_a_startup_failure() {
        let err = TransportError::Open {
            path: "/dev/ttyACM0".to_string(),
            source: serialport::Error::new(serialport::ErrorKind::NoDevice, "gone"),
        };
        assert_eq!(transport_error("open failed", err).code, FAILURE);
    }

    #[test]
    fn connect_timeout_maps_to_timeout_code() {
        let err = TransportError::ConnectTimeout {
            addr: "example.com:2052".to_string(),
        };
        assert_eq!(transport_error("connect failed", err).code, TIMEOUT);
    }

    fn serial_denied() -> serialport::Error {
        serialport::Error::new(
            serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied),
            "denied",
        )
    }
}
