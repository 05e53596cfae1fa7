//! Reserved control frames (ASCII, case-sensitive).

/// Sent serial-ward once the TCP link is established or re-established.
/// Always written with the trailing delimiter.
pub const BRIDGE_CONNECTED: &str = "bridgeConnected";

/// Sent serial-ward when the TCP link is lost or torn down.
pub const INTERNET_DISCONNECTED: &str = "internetDisconnected";

/// Sent by the server to request a graceful session end.
pub const DISCONNECT: &str = "DISCONNECT";
