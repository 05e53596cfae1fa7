use std::time::Duration;

/// Relay configuration, passed into the coordinator at construction.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Server hostname or IP.
    pub address: String,
    /// Server TCP port.
    pub port: u16,
    /// Re-run discovery and reopen the serial device after an I/O failure.
    pub reconnect: bool,
    /// Open this device path directly instead of scanning for a marker match.
    pub manual_port: Option<String>,
    /// Serial baud rate.
    pub baud_rate: u32,
    /// Serial per-read idle timeout.
    pub serial_timeout: Duration,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Socket read poll timeout; keeps the read loop responsive to stop().
    pub poll_timeout: Duration,
    /// Sleep between discovery/reconnect attempts.
    pub retry_interval: Duration,
}

impl RelayConfig {
    /// The `host:port` string used for the TCP connect.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            address: "tinethub.tkbstudios.com".to_string(),
            port: 2052,
            reconnect: true,
            manual_port: None,
            baud_rate: 9600,
            serial_timeout: Duration::from_secs(3),
            connect_timeout: Duration::from_secs(10),
            poll_timeout: Duration::from_millis(100),
            retry_interval: Duration::from_secs(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_protocol_timings() {
        let config = RelayConfig::default();
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.serial_timeout, Duration::from_secs(3));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.poll_timeout, Duration::from_millis(100));
        assert_eq!(config.retry_interval, Duration::from_secs(1));
        assert!(config.reconnect);
    }

    #[test]
    fn server_addr_joins_host_and_port() {
        let config = RelayConfig {
            address: "127.0.0.1".to_string(),
            port: 4000,
            ..RelayConfig::default()
        };
        assert_eq!(config.server_addr(), "127.0.0.1:4000");
    }
}
