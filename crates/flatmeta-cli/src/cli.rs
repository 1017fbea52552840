use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueHint};
use flatmeta_core::options::Options;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    help_template = "{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}",
    arg_required_else_help = true
)]
pub struct Args {
    /// Name of the remote to query
    pub remote_name: String,

    /// Register the remote with this URL if it is not configured yet
    #[arg(short, long, value_hint = ValueHint::Url)]
    pub url: Option<String>,

    /// Only report these refs, written as kind/name/arch/branch
    #[arg(short = 'r', long = "ref", num_args = 1.., action = ArgAction::Append)]
    pub refs: Vec<String>,

    /// Don't pull anything, use cached commits and the remote summary
    #[arg(long)]
    pub no_pull: bool,

    /// Don't load metadata
    #[arg(long)]
    pub no_metadata: bool,

    /// Don't load manifests
    #[arg(long)]
    pub no_manifest: bool,

    /// Skip .Sources, .Locale and .Debug refs
    #[arg(long)]
    pub no_built_extensions: bool,

    /// Set output verbosity
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write the report to this file instead of stdout
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Provide custom config file
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub config: Option<String>,

    /// Disable colors in log output
    #[arg(long)]
    pub no_color: bool,

    /// Log as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

impl Args {
    pub fn options(&self) -> Options {
        Options {
            remote_name: self.remote_name.clone(),
            remote_url: self.url.clone(),
            refs: self.refs.clone(),
            pull: !self.no_pull,
            get_metadata: !self.no_metadata,
            get_manifest: !self.no_manifest,
            get_built_extensions: !self.no_built_extensions,
        }
    }
}
