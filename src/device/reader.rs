use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("reader I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Boundary to the physical card reader. `poll` blocks up to `timeout`
/// and returns a normalized card UID, or None when no card is present.
/// Implementations should degrade to `Ok(None)` on transient hardware
/// hiccups rather than erroring indefinitely.
#[async_trait]
pub trait CardReader: Send {
    async fn poll(&mut self, timeout: Duration) -> Result<Option<String>, ReaderError>;
}

/// Line-based reader over stdin. Most USB RFID readers present as a
/// keyboard wedge (UID followed by a newline), so this covers both real
/// wedge hardware and manual testing at a terminal.
pub struct StdinReader {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinReader {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for StdinReader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CardReader for StdinReader {
    async fn poll(&mut self, timeout: Duration) -> Result<Option<String>, ReaderError> {
        // next_line is cancel-safe, so timing out here loses no input
        match tokio::time::timeout(timeout, self.lines.next_line()).await {
            Err(_elapsed) => Ok(None),
            Ok(Ok(None)) => Ok(None), // EOF: treat as idle
            Ok(Ok(Some(line))) => {
                let uid = line.trim();
                if uid.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(uid.to_uppercase()))
                }
            }
            Ok(Err(e)) => Err(e.into()),
        }
    }
}
