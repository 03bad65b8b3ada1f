pub mod history;
pub mod sync;
pub mod tags;

use dynsync_core::logging_facility;
use dynsync_engine::AppConfig;
use dynsync_store::db;
use rusqlite::Connection;
use std::path::Path;

/// Load configuration, start logging and open the migrated database
pub fn open(config: Option<&Path>) -> Result<(AppConfig, Connection), Box<dyn std::error::Error>> {
    let config = AppConfig::load(config)?;
    logging_facility::init(config.logging.profile);
    let conn = db::open_migrated(&config.database.path)?;
    Ok((config, conn))
}
