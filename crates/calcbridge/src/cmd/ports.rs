use calcbridge_transport::locator::{find_marked_port, list_ports};
use tracing::debug;

use crate::cmd::PortsArgs;
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{print_ports, OutputFormat};

pub fn run(_args: PortsArgs, format: OutputFormat) -> CliResult<i32> {
    let ports = list_ports().map_err(|err| transport_error("port scan failed", err))?;

    if ports.is_empty() {
        eprintln!("no serial ports found");
        return Ok(SUCCESS);
    }

    if let Some(path) = find_marked_port(&ports) {
        debug!(path, "calculator candidate present");
    }
    print_ports(&ports, format);
    Ok(SUCCESS)
}
