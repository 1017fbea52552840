use flatmeta_events::{EventSink, MetaEvent};
use tracing::{debug, info, trace};

/// Forwards run events to the log.
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: MetaEvent) {
        match &event {
            MetaEvent::PullStarting {
                remote,
                refs,
                subpaths,
            } => {
                debug!("Pull of {refs} refs from {remote} started ({})", subpaths.join(", "))
            }
            MetaEvent::PullProgress {
                fetched,
                requested,
            } => {
                if let Some(percent) = event.percent() {
                    info!("Progress {percent:.2}% : objects fetched: {fetched}/{requested}");
                }
            }
            MetaEvent::PullComplete {
                remote,
            } => debug!("Pull from {remote} complete"),
            MetaEvent::RefLoading {
                reference,
            } => trace!("Loading {reference}"),
            MetaEvent::RefMissing {
                reference,
                reason,
            } => debug!("Using embedded metadata for {reference}: {reason}"),
            MetaEvent::ManifestMissing {
                reference,
            } => trace!("{reference} has no manifest"),
        }
    }
}
