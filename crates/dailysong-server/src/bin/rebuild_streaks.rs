//! Recomputes every user's streak from their post history.

use std::sync::Arc;

use tracing::info;

use dailysong_core::SystemClock;
use dailysong_db::Database;
use dailysong_server::config::Config;

fn main() -> anyhow::Result<()> {
    dailysong_server::init();

    let db_path = Config::db_path_from_env();
    let db = Database::open(&db_path, Arc::new(SystemClock))?;

    let updated = db.rebuild_all_streaks()?;
    info!("Rebuilt streaks for {} users", updated);
    Ok(())
}
