/// What a run queries and which parts of each ref it reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub remote_name: String,
    pub remote_url: Option<String>,
    /// Exact formatted refs to keep; empty keeps every ref.
    pub refs: Vec<String>,
    pub pull: bool,
    pub get_metadata: bool,
    pub get_manifest: bool,
    pub get_built_extensions: bool,
}

impl Options {
    /// Options for a full run against `remote_name`.
    pub fn new(remote_name: impl Into<String>) -> Self {
        Self {
            remote_name: remote_name.into(),
            remote_url: None,
            refs: Vec::new(),
            pull: true,
            get_metadata: true,
            get_manifest: true,
            get_built_extensions: true,
        }
    }
}
