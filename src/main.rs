use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use dotenvy::dotenv;
use tracing::info;
use tracing_appender::rolling;

use dtr_scan::config::Config;
use dtr_scan::db::init_db;
use dtr_scan::device::{LogFeedback, StdinReader};
use dtr_scan::persist::{
    AttendanceStore, BatchWorker, MemoryStore, SqliteStore, persistence_queue,
};
use dtr_scan::pipeline::{
    AttendanceCache, PersonDirectory, Pipeline, ScanDebouncer, run_scan_loop,
};
use dtr_scan::utils::clock::SystemClock;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "dtr-scan.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("DTR scan pipeline starting...");

    // Pick the store backend, then load the roster before the scan loop starts
    let (store, directory): (Arc<dyn AttendanceStore>, PersonDirectory) =
        match config.store_backend.as_str() {
            "sqlite" => {
                let pool = init_db(&config.database_url).await;
                let directory = PersonDirectory::load(&pool).await?;
                (
                    Arc::new(SqliteStore::new(pool)) as Arc<dyn AttendanceStore>,
                    directory,
                )
            }
            "memory" => {
                let directory = match &config.roster_file {
                    Some(path) => PersonDirectory::from_json_file(path)?,
                    None => PersonDirectory::simulated(),
                };
                (Arc::new(MemoryStore::new()) as Arc<dyn AttendanceStore>, directory)
            }
            other => bail!("unknown STORE_BACKEND {other:?} (expected sqlite or memory)"),
        };

    if directory.is_empty() {
        info!("Roster is empty; every scan will read as unregistered");
    }

    let (queue, drain) = persistence_queue();
    let worker = BatchWorker::new(
        drain,
        store,
        config.batch_size,
        Duration::from_secs(config.batch_timeout_secs),
    );
    let worker_handle = tokio::spawn(worker.run());

    let pipeline = Pipeline::new(
        directory,
        AttendanceCache::new(config.cache_capacity),
        ScanDebouncer::new(Duration::from_secs(config.scan_cooldown_secs)),
        queue,
        SystemClock,
    );

    let mut reader = StdinReader::new();
    let feedback = LogFeedback;
    let poll_timeout = Duration::from_millis(config.reader_poll_ms);

    tokio::select! {
        _ = run_scan_loop(&pipeline, &mut reader, &feedback, poll_timeout) => {},
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        },
    }

    // Dropping the pipeline closes the queue; the worker drains and
    // commits everything outstanding before we exit.
    drop(pipeline);
    worker_handle.await?;

    info!("All pending mutations flushed; exiting");
    Ok(())
}
