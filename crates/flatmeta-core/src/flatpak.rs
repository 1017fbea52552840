//! [`RemoteCatalog`] backed by the `flatpak` command line tool.

use std::{
    path::{Path, PathBuf},
    process::Command,
};

use tracing::{debug, trace};
use url::Url;

use crate::{
    cancel::CancelToken,
    command::{classify_missing, CommandRunner},
    refs::RemoteRef,
    store::RemoteCatalog,
    Result,
};

/// Environment variable pointing `flatpak --user` at the private installation.
pub const USER_DIR_ENV: &str = "FLATPAK_USER_DIR";

pub struct FlatpakCli {
    bin: String,
    installation: PathBuf,
    runner: CommandRunner,
}

impl FlatpakCli {
    pub fn new(bin: impl Into<String>, installation: impl Into<PathBuf>, runner: CommandRunner) -> Self {
        Self {
            bin: bin.into(),
            installation: installation.into(),
            runner,
        }
    }

    pub fn installation(&self) -> &Path {
        &self.installation
    }

    fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut command = Command::new(&self.bin);
        command
            .env(USER_DIR_ENV, &self.installation)
            .arg("--user")
            .args(args);
        command
    }

    fn output(&self, command: Command, cancel: &CancelToken) -> Result<String> {
        let stdout = self.runner.run(command, cancel)?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

impl RemoteCatalog for FlatpakCli {
    fn remote_names(&self, cancel: &CancelToken) -> Result<Vec<String>> {
        let command = self.command(["remotes", "--show-disabled", "--columns=name"]);
        Ok(parse_remote_names(&self.output(command, cancel)?))
    }

    fn add_remote(&self, name: &str, url: &Url, cancel: &CancelToken) -> Result<()> {
        let command = self.command([
            "remote-add",
            "--if-not-exists",
            "--no-gpg-verify",
            name,
            url.as_str(),
        ]);
        self.runner.run(command, cancel)?;
        Ok(())
    }

    fn list_remote_refs(&self, remote: &str, cancel: &CancelToken) -> Result<Vec<RemoteRef>> {
        let command = self.command([
            "remote-ls",
            "--all",
            "--arch=*",
            "--columns=ref,options",
            remote,
        ]);
        let refs = parse_ref_listing(&self.output(command, cancel)?);
        debug!("Remote {remote} lists {} refs", refs.len());
        Ok(refs)
    }

    fn remote_ref_metadata(
        &self,
        remote: &str,
        reference: &RemoteRef,
        cancel: &CancelToken,
    ) -> Result<Vec<u8>> {
        let formatted = reference.format_ref();
        let command = self.command([
            "remote-info",
            "--cached",
            "--show-metadata",
            remote,
            formatted.as_str(),
        ]);
        self.runner
            .run(command, cancel)
            .map_err(|err| classify_missing(err, || format!("Metadata of {formatted}")))
    }
}

fn parse_remote_names(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Parses `remote-ls --columns=ref,options` output.
///
/// Lines whose first column is not a ref (headers, notices) are skipped.
fn parse_ref_listing(output: &str) -> Vec<RemoteRef> {
    output
        .lines()
        .filter_map(|line| {
            let mut columns = line.split('\t');
            let reference = columns.next()?.trim();
            let mut remote_ref = match RemoteRef::parse(reference) {
                Ok(remote_ref) => remote_ref,
                Err(_) => {
                    trace!("Ignoring listing line {line:?}");
                    return None;
                }
            };
            if let Some(options) = columns.next() {
                let (eol, eol_rebase) = parse_eol_options(options.trim());
                remote_ref.eol = eol;
                remote_ref.eol_rebase = eol_rebase;
            }
            Some(remote_ref)
        })
        .collect()
}

/// Extracts `eol=` and `eol-rebase=` from the comma separated options column.
///
/// Segments that start no known option belong to the previous value, since an
/// end-of-life reason may itself contain commas.
fn parse_eol_options(options: &str) -> (Option<String>, Option<String>) {
    #[derive(Clone, Copy)]
    enum Field {
        Eol,
        EolRebase,
    }

    let mut eol: Option<String> = None;
    let mut eol_rebase: Option<String> = None;
    let mut current = None;

    for segment in options.split(',') {
        if let Some(value) = segment.strip_prefix("eol-rebase=") {
            eol_rebase = Some(value.to_string());
            current = Some(Field::EolRebase);
        } else if let Some(value) = segment.strip_prefix("eol=") {
            eol = Some(value.to_string());
            current = Some(Field::Eol);
        } else if let Some(field) = current {
            let target = match field {
                Field::Eol => &mut eol,
                Field::EolRebase => &mut eol_rebase,
            };
            if let Some(value) = target {
                value.push(',');
                value.push_str(segment);
            }
        }
    }

    (eol, eol_rebase)
}
