use calcbridge_relay::{Coordinator, RelayConfig};
use tracing::info;

use crate::cmd::{parse_duration, BridgeArgs};
use crate::exit::{relay_error, CliError, CliResult, INTERNAL, SUCCESS};

pub fn run(args: BridgeArgs) -> CliResult<i32> {
    let config = RelayConfig {
        address: args.address,
        port: args.port,
        reconnect: !args.no_reconnect,
        manual_port: args.port_path,
        baud_rate: args.baud_rate,
        serial_timeout: parse_duration(&args.serial_timeout)?,
        connect_timeout: parse_duration(&args.connect_timeout)?,
        retry_interval: parse_duration(&args.retry_interval)?,
        ..RelayConfig::default()
    };

    info!(server = %config.server_addr(), "starting bridge, waiting for calculator");
    let coordinator =
        Coordinator::from_config(&config).map_err(|err| relay_error("bridge startup failed", err))?;

    let shutdown = coordinator.shutdown_handle();
    ctrlc::set_handler(move || {
        info!("interrupt received, closing bridge");
        shutdown.shutdown();
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))?;

    coordinator
        .run()
        .map_err(|err| relay_error("bridge failed", err))?;
    Ok(SUCCESS)
}
