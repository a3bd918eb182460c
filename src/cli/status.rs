//! Show record counts and storage paths.

use crate::config::Config;
use crate::error::Error;
use crate::store::Database;

/// Run the status command.
pub fn run() -> Result<(), Error> {
    let db_path = Config::db_path()?;
    if !db_path.exists() {
        println!("Not initialized. Run 'tango init' first.");
        return Ok(());
    }

    let db = Database::open(&db_path)?;
    println!("Database:    {}", db_path.display());
    println!("Phrases:     {}", db.phrase_count()?);
    println!("Corrections: {}", db.correction_count()?);

    Ok(())
}
