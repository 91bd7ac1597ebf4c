//! API server command: `dealflow serve`.

use std::path::PathBuf;

use anyhow::Result;

use dealflow::crm::server::start_server;
use dealflow::dealflow_config::DealflowConfig;

pub async fn cmd_serve(
    config: &DealflowConfig,
    offline: bool,
    fixtures: Option<PathBuf>,
) -> Result<()> {
    for warning in config.validate() {
        eprintln!("{} {}", console::style("warning:").yellow().bold(), warning);
    }

    let mut server = config.server_config()?;
    server.offline = offline;
    server.fixtures = fixtures;

    if offline {
        println!(
            "{}",
            console::style("Offline mode: changes are kept in memory only").dim()
        );
    }

    start_server(server).await
}
