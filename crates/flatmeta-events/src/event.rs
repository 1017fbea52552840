/// Events emitted while querying a remote.
///
/// They only feed observability; nothing in the run depends on them being consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaEvent {
    /// A batched pull is about to start.
    PullStarting {
        remote: String,
        refs: usize,
        subpaths: Vec<String>,
    },
    /// Object counts reported by the content store during a pull.
    PullProgress { fetched: u64, requested: u64 },
    /// The batched pull finished.
    PullComplete { remote: String },
    /// Metadata is being loaded for a ref.
    RefLoading { reference: String },
    /// The ref has no local commit; embedded metadata is used instead.
    RefMissing { reference: String, reason: String },
    /// The ref's commit carries no `files/manifest.json`.
    ManifestMissing { reference: String },
}

impl MetaEvent {
    /// Completion percentage of a [`MetaEvent::PullProgress`] event.
    pub fn percent(&self) -> Option<f64> {
        match self {
            MetaEvent::PullProgress {
                fetched,
                requested,
            } if *requested > 0 => Some(*fetched as f64 * 100.0 / *requested as f64),
            _ => None,
        }
    }
}
