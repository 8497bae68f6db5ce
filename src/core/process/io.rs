// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Output streaming and capture.
//!
//! ```text
//! run_child()
//!   stdout reader task ─┐
//!   stderr reader task ─┼─ each line: trace! + keep
//!   child.wait()       ─┘
//!   --> ProcessOutput { exit_code, stdout, stderr }
//! ```

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tracing::{trace, warn};

use super::builder::{ProcessBuilder, ProcessOutput, StreamFlags};
use crate::error::Result;

impl ProcessBuilder {
    /// Streams output while the child runs, then collects it.
    pub(super) async fn run_child(&self, name: &str, child: &mut Child) -> Result<ProcessOutput> {
        let stdout = child
            .stdout
            .take()
            .map(|r| spawn_reader(r, self.stdout_flags(), name, "stdout"));
        let stderr = child
            .stderr
            .take()
            .map(|r| spawn_reader(r, self.stderr_flags(), name, "stderr"));

        let status = child.wait().await?;

        Ok(ProcessOutput::new(
            status.code().unwrap_or(-1),
            join_reader(stdout).await,
            join_reader(stderr).await,
        ))
    }
}

fn spawn_reader<R>(reader: R, flags: StreamFlags, process: &str, stream: &'static str) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let process = process.to_string();
    tokio::spawn(async move { read_stream(reader, flags, &process, stream).await })
}

async fn join_reader(handle: Option<JoinHandle<String>>) -> String {
    match handle {
        Some(handle) => handle.await.unwrap_or_default(),
        None => String::new(),
    }
}

/// Reads lines until EOF. Keeps them joined by `\n` if `KEEP_IN_STRING` is set.
///
/// Bytes that are not UTF-8 are replaced, so one bad line never drops the rest.
async fn read_stream<R>(reader: R, flags: StreamFlags, process: &str, stream: &str) -> String
where
    R: AsyncRead + Unpin,
{
    let mut kept = String::new();
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(trim_newline(&buf));
                if flags.contains(StreamFlags::FORWARD_TO_LOG) {
                    trace!(process = %process, stream = %stream, line = %line, "output");
                }
                if flags.contains(StreamFlags::KEEP_IN_STRING) {
                    if !kept.is_empty() {
                        kept.push('\n');
                    }
                    kept.push_str(&line);
                }
            }
            Err(e) => {
                warn!(process = %process, stream = %stream, error = %e, "error reading stream");
                break;
            }
        }
    }

    kept
}

fn trim_newline(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
