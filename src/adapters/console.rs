//! Serial console adapter.
//!
//! Implements [`SerialPort`] over the process console.  On ESP-IDF stdin
//! and stdout are routed through the UART VFS driver, so the same std I/O
//! calls work on target and on the host.
//!
//! A dedicated reader thread blocks on stdin and forwards complete lines
//! through [`SERIAL_RX`]; the supervisor loop only ever drains that
//! channel, so `read_line` never blocks.

use std::io::{BufRead, Read, Write};
use std::time::Duration;

use embassy_sync::channel::TrySendError;
use log::{info, warn};

use crate::app::ports::SerialPort;
use crate::channels::{SERIAL_LINE_CAP, SERIAL_RX, SerialLine};

const READER_STACK_SIZE: usize = 4096;
const IDLE_BACKOFF: Duration = Duration::from_millis(20);
/// Raw bytes kept for one line: a full frame plus `\r\n`.
const LINE_LIMIT: usize = SERIAL_LINE_CAP + 2;

/// Line-oriented console backed by the reader thread.
pub struct UartConsole {
    _reader: std::thread::JoinHandle<()>,
}

impl UartConsole {
    /// Spawn the reader thread.
    pub fn start() -> std::io::Result<Self> {
        let reader = std::thread::Builder::new()
            .name("console-rx".into())
            .stack_size(READER_STACK_SIZE)
            .spawn(reader_loop)?;
        info!("Console: reader started");
        Ok(Self { _reader: reader })
    }
}

impl SerialPort for UartConsole {
    fn read_line(&mut self) -> Option<String> {
        SERIAL_RX.try_receive().ok().map(|line| line.as_str().to_string())
    }

    fn write_line(&mut self, line: &str) {
        let mut out = std::io::stdout().lock();
        // Nowhere to report a failed console write.
        let _ = writeln!(out, "{line}");
        let _ = out.flush();
    }
}

fn reader_loop() {
    let stdin = std::io::stdin();
    let mut lines = LineBuffer::default();
    let mut chunk = Vec::with_capacity(LINE_LIMIT);

    loop {
        chunk.clear();
        let read = stdin
            .lock()
            .take(lines.room() as u64)
            .read_until(b'\n', &mut chunk);
        // Bytes consumed before an error still belong to the line.
        if let Some(line) = lines.push(&chunk) {
            forward(line.trim());
        }
        match read {
            Ok(0) => std::thread::sleep(IDLE_BACKOFF),
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => std::thread::sleep(IDLE_BACKOFF),
            Err(e) => {
                warn!("Console: read error: {}", e);
                lines.clear();
                std::thread::sleep(IDLE_BACKOFF);
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Line assembly
// ───────────────────────────────────────────────────────────────

/// Assembles newline-terminated lines from raw reads, holding at most
/// [`LINE_LIMIT`] bytes.  A line that outgrows the limit is discarded up to
/// and including its newline.
#[derive(Debug, Default)]
struct LineBuffer {
    pending: Vec<u8>,
    overflowed: bool,
}

impl LineBuffer {
    /// Bytes the next read may add.  Never zero.
    fn room(&self) -> usize {
        LINE_LIMIT.saturating_sub(self.pending.len()).max(1)
    }

    /// Append one read; returns the completed line, newline included.
    fn push(&mut self, chunk: &[u8]) -> Option<String> {
        self.pending.extend_from_slice(chunk);
        if self.pending.last() == Some(&b'\n') {
            let raw = std::mem::take(&mut self.pending);
            if std::mem::take(&mut self.overflowed) {
                warn!("Console: dropping line over {} bytes", SERIAL_LINE_CAP);
                return None;
            }
            return match String::from_utf8(raw) {
                Ok(line) => Some(line),
                Err(e) => {
                    warn!("Console: dropping non-UTF-8 line ({} bytes)", e.as_bytes().len());
                    None
                }
            };
        }
        if self.pending.len() >= LINE_LIMIT {
            self.pending.clear();
            self.overflowed = true;
        }
        None
    }

    fn clear(&mut self) {
        self.pending.clear();
        self.overflowed = false;
    }
}

/// Hand one trimmed line to the loop, waiting while the channel is full.
fn forward(line: &str) {
    if line.is_empty() {
        return;
    }
    let Ok(mut msg) = SerialLine::try_from(line) else {
        warn!("Console: dropping {}-byte line (max {})", line.len(), SERIAL_LINE_CAP);
        return;
    };
    loop {
        match SERIAL_RX.try_send(msg) {
            Ok(()) => return,
            Err(TrySendError::Full(back)) => {
                msg = back;
                std::thread::sleep(IDLE_BACKOFF);
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
