//! Cancellable subprocess execution.

use std::{
    io::Read,
    process::{Command, Stdio},
    sync::mpsc::{self, RecvTimeoutError},
    thread,
    time::Duration,
};

use tracing::{debug, trace};

use crate::{cancel::CancelToken, error::ErrorContext, MetaError, Result};

/// Runs external tools while watching a [`CancelToken`].
///
/// The child is polled every `poll_interval`; once the token is set the child
/// is killed and [`MetaError::Cancelled`] is returned.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    poll_interval: Duration,
}

impl CommandRunner {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
        }
    }

    /// Runs `command` to completion and returns its stdout.
    pub fn run(&self, command: Command, cancel: &CancelToken) -> Result<Vec<u8>> {
        self.run_with_lines(command, cancel, &mut |_| {})
    }

    /// Like [`CommandRunner::run`], also handing every stdout line to `on_line`
    /// as it arrives. Both `\n` and `\r` end a line.
    pub fn run_with_lines(
        &self,
        mut command: Command,
        cancel: &CancelToken,
        on_line: &mut dyn FnMut(&str),
    ) -> Result<Vec<u8>> {
        cancel.check()?;

        let cmdline = describe(&command);
        debug!("Running `{cmdline}`");

        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| {
                MetaError::CommandSpawn {
                    command: cmdline.clone(),
                    source,
                }
            })?;

        let (tx, rx) = mpsc::channel::<Vec<u8>>();
        let stdout_reader = child.stdout.take().map(|mut stdout| {
            thread::spawn(move || {
                let mut buf = [0u8; 8192];
                loop {
                    match stdout.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            if tx.send(buf[..n].to_vec()).is_err() {
                                break;
                            }
                        }
                    }
                }
            })
        });
        let stderr_reader = child.stderr.take().map(|mut stderr| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = stderr.read_to_end(&mut buf);
                buf
            })
        });

        let mut output = Vec::new();
        let mut pending = Vec::new();
        let status = loop {
            match rx.recv_timeout(self.poll_interval) {
                Ok(chunk) => {
                    output.extend_from_slice(&chunk);
                    pending.extend_from_slice(&chunk);
                    drain_lines(&mut pending, on_line);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => thread::sleep(self.poll_interval),
            }

            if cancel.is_cancelled() {
                debug!("Cancelling `{cmdline}`");
                let _ = child.kill();
                let _ = child.wait();
                return Err(MetaError::Cancelled);
            }

            if let Some(status) = child
                .try_wait()
                .with_context(|| format!("waiting for `{cmdline}`"))?
            {
                break status;
            }
        };

        if let Some(reader) = stdout_reader {
            let _ = reader.join();
        }
        for chunk in rx.try_iter() {
            output.extend_from_slice(&chunk);
            pending.extend_from_slice(&chunk);
        }
        drain_lines(&mut pending, on_line);
        if !pending.is_empty() {
            on_line(&String::from_utf8_lossy(&pending));
        }

        let stderr = stderr_reader
            .map(|reader| reader.join().unwrap_or_default())
            .unwrap_or_default();

        trace!("`{cmdline}` exited with {status}");
        if !status.success() {
            return Err(MetaError::CommandFailed {
                command: cmdline,
                status,
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }

        Ok(output)
    }
}

const MISSING_MARKERS: [&str; 4] = ["not found", "no such", "can't find", "nothing matches"];

/// Turns a failed command whose stderr reports a missing object into
/// [`MetaError::NotFound`] naming `subject`.
pub fn classify_missing(err: MetaError, subject: impl FnOnce() -> String) -> MetaError {
    match err {
        MetaError::CommandFailed {
            ref stderr, ..
        } if is_missing(stderr) => MetaError::NotFound(subject()),
        other => other,
    }
}

fn is_missing(stderr: &str) -> bool {
    let stderr = stderr.to_lowercase();
    MISSING_MARKERS.iter().any(|marker| stderr.contains(marker))
}

fn describe(command: &Command) -> String {
    std::iter::once(command.get_program())
        .chain(command.get_args())
        .map(|part| part.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Hands every complete line in `pending` to `on_line`, keeping the unfinished tail.
fn drain_lines(pending: &mut Vec<u8>, on_line: &mut dyn FnMut(&str)) {
    while let Some(end) = pending.iter().position(|b| matches!(b, b'\n' | b'\r')) {
        let line: Vec<u8> = pending.drain(..=end).collect();
        let line = String::from_utf8_lossy(&line[..end]);
        if !line.is_empty() {
            on_line(&line);
        }
    }
}
