mod ambiguity;
mod batch;
mod categorize;
mod config;
mod db;
mod error;
mod extract;
mod ident;
mod models;
mod reconcile;
mod run;
mod source;

use anyhow::{Context, Result};

fn main() -> Result<()> {
    let mut args: Vec<String> = std::env::args().collect();
    init_logging(&mut args);

    if args.len() < 2 {
        run::print_usage();
        return Ok(());
    }

    let cfg = config::load_config(&config::config_path()?)?;
    let db_path = get_db_path()?;
    let mut db = db::Database::open(&db_path)?;
    log::debug!("using store {}", db_path.display());

    run::as_cli(&args, &cfg, &mut db)
}

/// `-v`/`-q` pick the default level; `RUST_LOG` still wins.
fn init_logging(args: &mut Vec<String>) {
    let mut level = "info";
    args.retain(|a| match a.as_str() {
        "-v" | "--verbose" => {
            level = "debug";
            false
        }
        "-q" | "--quiet" => {
            level = "warn";
            false
        }
        _ => true,
    });
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn get_db_path() -> Result<std::path::PathBuf> {
    let proj_dirs = config::project_dirs()?;
    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    Ok(data_dir.join("cardledger.db"))
}
