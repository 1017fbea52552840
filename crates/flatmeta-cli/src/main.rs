use clap::Parser;
use cli::Args;
use flatmeta_config::{Config, ConfigError};
use flatmeta_core::{
    cancel::CancelToken,
    fetch::Session,
    installation::Installation,
    report::write_report,
    run, Result,
};
use flatmeta_utils::path::resolve_path;
use logging::setup_logging;
use progress::LogSink;
use tracing::{debug, error};

mod cli;
mod logging;
mod progress;
mod signals;
mod utils;

const EXIT_FAILURE: i32 = 1;
const EXIT_CANCELLED: i32 = 130;

fn handle_cli(args: &Args, cancel: &CancelToken) -> Result<()> {
    signals::install(cancel.clone())?;

    let config_path = args
        .config
        .as_deref()
        .map(resolve_path)
        .transpose()
        .map_err(ConfigError::from)?;
    let config = Config::load(config_path.as_deref())?;
    debug!("Configuration: {config:?}");

    let installation = Installation::open(&config)?;
    let session = Session {
        catalog: &installation.catalog,
        store: &installation.store,
        events: &LogSink,
        cancel,
    };

    let entries = run(session, &args.options())?;
    cancel.check()?;
    write_report(&entries, args.output.as_deref())
}

fn main() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    let args = Args::parse();
    utils::set_color(!args.no_color);
    setup_logging(&args);

    let cancel = CancelToken::new();
    if let Err(err) = handle_cli(&args, &cancel) {
        if err.is_cancelled() || cancel.is_cancelled() {
            match signals::caught() {
                Some(signal) => error!("Interrupted by {signal}, no report written"),
                None => error!("Cancelled, no report written"),
            }
            std::process::exit(EXIT_CANCELLED);
        }

        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(EXIT_FAILURE);
    }
}
