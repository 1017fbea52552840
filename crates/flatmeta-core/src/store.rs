//! Seams to the package catalog and the content store.

use url::Url;

use flatmeta_events::EventSink;

use crate::{cancel::CancelToken, refs::RemoteRef, Result};

/// Remote management of the private installation.
pub trait RemoteCatalog {
    fn remote_names(&self, cancel: &CancelToken) -> Result<Vec<String>>;

    fn add_remote(&self, name: &str, url: &Url, cancel: &CancelToken) -> Result<()>;

    /// Every ref the remote advertises, in listing order.
    fn list_remote_refs(&self, remote: &str, cancel: &CancelToken) -> Result<Vec<RemoteRef>>;

    /// Metadata embedded in the remote summary for `reference`.
    fn remote_ref_metadata(
        &self,
        remote: &str,
        reference: &RemoteRef,
        cancel: &CancelToken,
    ) -> Result<Vec<u8>>;
}

/// One batched, subpath-restricted pull.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub remote: String,
    pub refs: Vec<String>,
    pub subpaths: Vec<String>,
    pub disable_static_deltas: bool,
    pub gpg_verify: bool,
}

/// The commit a ref currently points at in the local store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRoot {
    pub reference: String,
    pub checksum: String,
}

/// Content-addressed store backing the installation.
///
/// Missing refs and files are reported as [`crate::error::MetaError::NotFound`].
pub trait ContentStore {
    fn pull(&self, request: &PullRequest, events: &dyn EventSink, cancel: &CancelToken)
        -> Result<()>;

    fn read_commit(&self, remote: &str, reference: &str, cancel: &CancelToken)
        -> Result<CommitRoot>;

    fn read_file(&self, root: &CommitRoot, path: &str, cancel: &CancelToken) -> Result<Vec<u8>>;
}
