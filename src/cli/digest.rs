//! Generate and print or send the review digest.

use chrono::Utc;

use crate::config::Config;
use crate::digest::generate_digest;
use crate::error::Error;
use crate::notify::{render_digest, Notifier};
use crate::store::Database;

/// Run the digest command.
///
/// `send` pushes the rendered message to the configured channel; `as_json`
/// prints the raw digest instead of the rendered message.
pub async fn run(send: bool, as_json: bool) -> Result<(), Error> {
    let config = Config::load()?;
    let db = Database::open(&Config::db_path()?)?;

    let digest = generate_digest(&db, Utc::now(), &config.digest)?;
    let message = render_digest(&digest);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&digest)?);
    } else {
        println!("{}", message);
    }

    if send {
        let notifier = Notifier::new(config.notify.clone())?;
        notifier.send(&message).await?;
        println!("Digest sent.");
    }

    Ok(())
}
