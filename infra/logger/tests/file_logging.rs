use std::fs;
use std::time::Duration;
use strata_logger::{LevelFilter, Logger};
use tempfile::tempdir;

#[test]
fn json_file_logging_writes_structured_lines() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let log_dir = tmp_dir.path().join("logs");

    let logger = Logger::builder()
        .name("strata-file-logging")
        .console(None)
        .json(true)
        .path(&log_dir)
        .level(LevelFilter::INFO)
        .init()?;
    assert!(logger.writes_files());

    tracing::info!(user_id = 7, "user created");

    std::thread::sleep(Duration::from_millis(30));
    drop(logger);

    let log_file = fs::read_dir(&log_dir)?
        .flatten()
        .map(|entry| entry.path())
        .find(|path| path.extension().and_then(|ext| ext.to_str()) == Some("log"))
        .expect("log file should be created");

    let contents = fs::read_to_string(&log_file)?;
    let line = contents.lines().find(|l| l.contains("user created")).expect("event line");
    assert!(line.starts_with('{'), "file layer should emit JSON, got: {line}");
    assert!(line.contains("\"user_id\":7"));

    Ok(())
}
