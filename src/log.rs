use crate::locations::get_log_dir;
use chrono::Utc;
use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::{layer::SubscriberExt, Registry};

const MAX_LOG_AGE_DAYS: i64 = 30;

fn other<E: std::fmt::Display>(error: E) -> io::Error {
    io::Error::new(io::ErrorKind::Other, error.to_string())
}

pub(crate) fn init_logging(debug: bool) -> io::Result<WorkerGuard> {
    let log_file = get_log_location()?;
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let formatter = BunyanFormattingLayer::new("devconsole".into(), non_blocking);

    let subscriber = Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(formatter);
    // The HTTP client logs through `log`
    tracing_log::LogTracer::init().map_err(other)?;
    tracing::subscriber::set_global_default(subscriber).map_err(other)?;

    Ok(guard)
}

fn get_log_location() -> io::Result<PathBuf> {
    let log_dir = get_log_dir()?;
    let timestamp = Utc::now().format("%Y-%m-%d-%H-%M-%S");
    let log_file = log_dir.join(format!("devconsole-{}.log", timestamp));
    clean_logfiles(&log_dir)?;
    Ok(log_file)
}

// Logfiles from more than 30 days ago are deleted
fn clean_logfiles(log_dir: &Path) -> io::Result<()> {
    for file in std::fs::read_dir(log_dir)? {
        let file = file?;
        let modified: chrono::DateTime<Utc> = file.metadata()?.modified()?.into();
        if is_expired(modified, Utc::now()) {
            std::fs::remove_file(file.path())?;
        }
    }
    Ok(())
}

fn is_expired(modified: chrono::DateTime<Utc>, now: chrono::DateTime<Utc>) -> bool {
    now.signed_duration_since(modified).num_days() > MAX_LOG_AGE_DAYS
}
