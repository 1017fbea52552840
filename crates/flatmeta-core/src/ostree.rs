//! [`ContentStore`] backed by the `ostree` command line tool.

use std::{
    path::{Path, PathBuf},
    process::Command,
    sync::LazyLock,
};

use regex::Regex;
use tracing::debug;

use flatmeta_events::{EventSink, MetaEvent};

use crate::{
    cancel::CancelToken,
    command::{classify_missing, CommandRunner},
    error::MetaError,
    store::{CommitRoot, ContentStore, PullRequest},
    Result,
};

static PROGRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"objects[^(]*\((\d+)/(\d+)\)").expect("invalid progress pattern")
});

/// Fetched and requested object counts from an `ostree pull` status line.
pub fn parse_progress(line: &str) -> Option<(u64, u64)> {
    let caps = PROGRESS_RE.captures(line)?;
    let fetched = caps[1].parse().ok()?;
    let requested = caps[2].parse().ok()?;
    Some((fetched, requested))
}

pub struct OstreeCli {
    bin: String,
    repo: PathBuf,
    runner: CommandRunner,
}

impl OstreeCli {
    pub fn new(bin: impl Into<String>, repo: impl Into<PathBuf>, runner: CommandRunner) -> Self {
        Self {
            bin: bin.into(),
            repo: repo.into(),
            runner,
        }
    }

    pub fn repo(&self) -> &Path {
        &self.repo
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.bin);
        command.arg(format!("--repo={}", self.repo.display()));
        command
    }

    /// Turns off commit signature checks for `remote`.
    ///
    /// The setting is written to the private repo config and persists for
    /// later pulls from the same installation.
    fn verification_command(&self, remote: &str) -> Command {
        let mut command = self.command();
        command
            .args(["config", "set"])
            .arg(format!("remote \"{remote}\".gpg-verify"))
            .arg("false");
        command
    }

    fn pull_command(&self, request: &PullRequest) -> Command {
        let mut command = self.command();
        command.arg("pull");
        if request.disable_static_deltas {
            command.arg("--disable-static-deltas");
        }
        for subpath in &request.subpaths {
            command.arg(format!("--subpath={subpath}"));
        }
        command.arg(&request.remote).args(&request.refs);
        command
    }
}

impl ContentStore for OstreeCli {
    fn pull(
        &self,
        request: &PullRequest,
        events: &dyn EventSink,
        cancel: &CancelToken,
    ) -> Result<()> {
        if !request.gpg_verify {
            self.runner
                .run(self.verification_command(&request.remote), cancel)?;
        }

        let mut last = None;
        self.runner.run_with_lines(
            self.pull_command(request),
            cancel,
            &mut |line| {
                if let Some(progress) = parse_progress(line) {
                    if last != Some(progress) {
                        last = Some(progress);
                        events.emit(MetaEvent::PullProgress {
                            fetched: progress.0,
                            requested: progress.1,
                        });
                    }
                } else {
                    debug!("{line}");
                }
            },
        )?;
        Ok(())
    }

    fn read_commit(
        &self,
        remote: &str,
        reference: &str,
        cancel: &CancelToken,
    ) -> Result<CommitRoot> {
        let mut command = self.command();
        command.arg("rev-parse").arg(format!("{remote}:{reference}"));

        let stdout = self
            .runner
            .run(command, cancel)
            .map_err(|err| classify_missing(err, || format!("Commit of {reference}")))?;
        let checksum = String::from_utf8_lossy(&stdout).trim().to_string();
        if checksum.is_empty() {
            return Err(MetaError::NotFound(format!("Commit of {reference}")));
        }

        Ok(CommitRoot {
            reference: reference.to_string(),
            checksum,
        })
    }

    fn read_file(&self, root: &CommitRoot, path: &str, cancel: &CancelToken) -> Result<Vec<u8>> {
        let mut command = self.command();
        command.arg("cat").arg(&root.checksum).arg(path);

        self.runner
            .run(command, cancel)
            .map_err(|err| classify_missing(err, || format!("{path} in {}", root.reference)))
    }
}
