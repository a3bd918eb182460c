//! Initialize the tango home directory.

use tracing::info;

use crate::config::Config;
use crate::error::Error;
use crate::store::Database;

/// Run the init command.
pub fn run() -> Result<(), Error> {
    let dir = Config::global_dir()?;
    std::fs::create_dir_all(&dir)?;
    info!(path = %dir.display(), "Created tango directory");

    let db_path = Config::db_path()?;
    Database::open(&db_path)?;
    info!(path = %db_path.display(), "Opened record database");

    let config_path = Config::path()?;
    if config_path.exists() {
        println!("tango already initialized at {}", dir.display());
        return Ok(());
    }

    let config = Config::default();
    config.save()?;
    info!("Created config.toml");

    println!("tango initialized at {}", dir.display());
    println!();
    println!("Next steps:");
    println!("  - point your chat client at 'tango mcp' to start logging phrases");
    println!(
        "  - fill in [notify] in {} to enable the daily digest",
        config_path.display()
    );
    println!("  - schedule 'tango notify' (cron or a systemd timer) once per day");

    Ok(())
}
