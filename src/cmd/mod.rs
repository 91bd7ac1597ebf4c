//! CLI command implementations.
//!
//! | Module   | Commands handled |
//! |----------|------------------|
//! | `init`   | `Init`           |
//! | `serve`  | `Serve`          |
//! | `stages` | `Stages`         |
//! | `board`  | `Board`          |
//! | `report` | `Report`         |
//! | `config` | `Config`         |

pub mod board;
pub mod config;
pub mod init;
pub mod report;
pub mod serve;
pub mod stages;

pub use board::cmd_board;
pub use config::cmd_config;
pub use init::cmd_init;
pub use report::cmd_report;
pub use serve::cmd_serve;
pub use stages::cmd_stages;

use std::sync::Arc;

use anyhow::{Result, bail};
use dealflow::crm::api::AppState;
use dealflow::crm::server::build_state;
use dealflow::dealflow_config::DealflowConfig;

/// Open the project's database for a one-shot command.
pub(crate) async fn open_project(config: &DealflowConfig) -> Result<Arc<AppState>> {
    if !config.is_initialized() {
        bail!(
            "No dealflow project found in {}. Run `dealflow init` first.",
            config.project_dir.display()
        );
    }
    build_state(&config.server_config()?).await
}

/// `1234567.5` → `$1,234,568`.
pub(crate) fn money(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}
