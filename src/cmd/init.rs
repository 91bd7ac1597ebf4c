//! Project initialization: `dealflow init`.

use anyhow::{Context, Result};

use dealflow::crm::db::CrmDb;
use dealflow::dealflow_config::{DealflowConfig, DealflowToml};

pub fn cmd_init(config: &DealflowConfig, force: bool) -> Result<()> {
    let was_initialized = config.is_initialized();

    std::fs::create_dir_all(&config.dealflow_dir)
        .with_context(|| format!("Failed to create {}", config.dealflow_dir.display()))?;

    if !was_initialized || force {
        DealflowToml::default().save(&config.config_path())?;
    }

    let db_path = config.db_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    CrmDb::new(&db_path).context("Failed to initialize CRM database")?;

    if was_initialized && !force {
        println!(
            "dealflow project already initialized at {}",
            config.dealflow_dir.display()
        );
        println!("Database verified at {}", db_path.display());
        return Ok(());
    }

    println!(
        "Initialized dealflow project at {}",
        config.dealflow_dir.display()
    );
    println!();
    println!("  .dealflow/");
    println!("  ├── dealflow.toml   # Server, pipeline, reporting and logging settings");
    println!("  └── crm.db          # Contacts, deals, tasks and pipeline stages");
    println!();
    println!("Next steps:");
    println!("  1. Run `dealflow stages list` to review the pipeline");
    println!("  2. Run `dealflow serve` to start the API");

    Ok(())
}
