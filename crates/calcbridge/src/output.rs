use std::io::IsTerminal;

use calcbridge_transport::PortEntry;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct PortRow<'a> {
    path: &'a str,
    description: &'a str,
}

pub fn print_ports(ports: &[PortEntry], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let rows: Vec<PortRow<'_>> = ports
                .iter()
                .map(|port| PortRow {
                    path: &port.path,
                    description: &port.description,
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string(&rows).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PATH", "DESCRIPTION"]);
            for port in ports {
                table.add_row(vec![port.path.clone(), port.description.clone()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (index, port) in ports.iter().enumerate() {
                println!("{}. {} - {}", index + 1, port.path, port.description);
            }
        }
    }
}
