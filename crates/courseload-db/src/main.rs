use std::env;
use std::path::PathBuf;

use anyhow::Context;
use courseload_db::{queryable_keys, Config, CourseDbManager};
use tracing::info;

/// Environment variable naming the config file when no argument is given.
const CONFIG_ENV: &str = "COURSELOAD_CONFIG";

fn main() -> anyhow::Result<()> {
    let config_path = env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));

    let config = match &config_path {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    config.logging.init();

    // The store is unusable without its connection and schema, so either failure ends startup.
    let db = CourseDbManager::open(&config.database)
        .context("Failed to initialize course database")?;

    let courses = db.course_keys()?;
    info!(
        path = %config.database.path.display(),
        courses = courses.len(),
        "Course database ready"
    );

    for (key, label) in queryable_keys() {
        info!(key, label, "Queryable course field");
    }

    Ok(())
}
