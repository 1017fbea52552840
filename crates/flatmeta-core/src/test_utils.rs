//! In-memory catalog and content store for tests.

use std::{cell::RefCell, collections::HashMap};

use url::Url;

use flatmeta_events::{EventSink, MetaEvent};

use crate::{
    cancel::CancelToken,
    error::MetaError,
    refs::RemoteRef,
    store::{CommitRoot, ContentStore, PullRequest, RemoteCatalog},
    Result,
};

type Files = HashMap<String, Vec<u8>>;

#[derive(Default)]
pub struct MemoryCatalog {
    remotes: RefCell<Vec<String>>,
    refs: Vec<RemoteRef>,
    metadata: HashMap<String, Vec<u8>>,
    added: RefCell<Vec<(String, String)>>,
}

impl MemoryCatalog {
    pub fn new<I, S>(remotes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            remotes: RefCell::new(remotes.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn with_refs(mut self, refs: Vec<RemoteRef>) -> Self {
        self.refs = refs;
        self
    }

    pub fn with_metadata(mut self, reference: &str, metadata: &str) -> Self {
        self.metadata
            .insert(reference.to_string(), metadata.as_bytes().to_vec());
        self
    }

    /// Remotes registered through [`RemoteCatalog::add_remote`], with their URLs.
    pub fn added(&self) -> Vec<(String, String)> {
        self.added.borrow().clone()
    }
}

impl RemoteCatalog for MemoryCatalog {
    fn remote_names(&self, cancel: &CancelToken) -> Result<Vec<String>> {
        cancel.check()?;
        Ok(self.remotes.borrow().clone())
    }

    fn add_remote(&self, name: &str, url: &Url, cancel: &CancelToken) -> Result<()> {
        cancel.check()?;
        self.remotes.borrow_mut().push(name.to_string());
        self.added
            .borrow_mut()
            .push((name.to_string(), url.to_string()));
        Ok(())
    }

    fn list_remote_refs(&self, remote: &str, cancel: &CancelToken) -> Result<Vec<RemoteRef>> {
        cancel.check()?;
        if !self.remotes.borrow().iter().any(|name| name == remote) {
            return Err(MetaError::RemoteNotFound(remote.to_string()));
        }
        Ok(self.refs.clone())
    }

    fn remote_ref_metadata(
        &self,
        _remote: &str,
        reference: &RemoteRef,
        cancel: &CancelToken,
    ) -> Result<Vec<u8>> {
        cancel.check()?;
        let reference = reference.format_ref();
        self.metadata
            .get(&reference)
            .cloned()
            .ok_or_else(|| MetaError::NotFound(format!("Metadata of {reference}")))
    }
}

/// Content store with a "remote" side that pulls copy from and a local side reads hit.
#[derive(Default)]
pub struct MemoryStore {
    remote: HashMap<String, Files>,
    local: RefCell<HashMap<String, Files>>,
    pulls: RefCell<Vec<PullRequest>>,
    cancel_during_pull: bool,
    failing_reads: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_remote_file(mut self, reference: &str, path: &str, content: &str) -> Self {
        self.remote
            .entry(reference.to_string())
            .or_default()
            .insert(path.to_string(), content.as_bytes().to_vec());
        self
    }

    pub fn with_local_file(self, reference: &str, path: &str, content: &str) -> Self {
        self.local
            .borrow_mut()
            .entry(reference.to_string())
            .or_default()
            .insert(path.to_string(), content.as_bytes().to_vec());
        self
    }

    /// Sets the cancel token once the first ref of a pull has been copied.
    pub fn cancel_during_pull(mut self) -> Self {
        self.cancel_during_pull = true;
        self
    }

    /// Makes every commit lookup fail with an unrecoverable error.
    pub fn failing_reads(mut self) -> Self {
        self.failing_reads = true;
        self
    }

    pub fn pulls(&self) -> Vec<PullRequest> {
        self.pulls.borrow().clone()
    }

    pub fn has_local_file(&self, reference: &str, path: &str) -> bool {
        self.local
            .borrow()
            .get(reference)
            .is_some_and(|files| files.contains_key(path))
    }
}

fn in_subpaths(path: &str, subpaths: &[String]) -> bool {
    subpaths.iter().any(|subpath| {
        path == subpath
            || path
                .strip_prefix(subpath.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

impl ContentStore for MemoryStore {
    fn pull(
        &self,
        request: &PullRequest,
        events: &dyn EventSink,
        cancel: &CancelToken,
    ) -> Result<()> {
        cancel.check()?;
        self.pulls.borrow_mut().push(request.clone());

        let requested = request.refs.len() as u64;
        for (fetched, reference) in request.refs.iter().enumerate() {
            cancel.check()?;

            if let Some(files) = self.remote.get(reference) {
                let mut local = self.local.borrow_mut();
                let target = local.entry(reference.clone()).or_default();
                for (path, content) in files {
                    if in_subpaths(path, &request.subpaths) {
                        target.insert(path.clone(), content.clone());
                    }
                }
            }
            events.emit(MetaEvent::PullProgress {
                fetched: fetched as u64 + 1,
                requested,
            });

            if self.cancel_during_pull {
                cancel.cancel();
            }
        }
        cancel.check()
    }

    fn read_commit(
        &self,
        _remote: &str,
        reference: &str,
        cancel: &CancelToken,
    ) -> Result<CommitRoot> {
        cancel.check()?;
        if self.failing_reads {
            return Err(MetaError::Custom("repository is corrupt".to_string()));
        }
        if !self.local.borrow().contains_key(reference) {
            return Err(MetaError::NotFound(format!("Commit of {reference}")));
        }
        Ok(CommitRoot {
            reference: reference.to_string(),
            checksum: format!("commit-of-{reference}"),
        })
    }

    fn read_file(&self, root: &CommitRoot, path: &str, cancel: &CancelToken) -> Result<Vec<u8>> {
        cancel.check()?;
        self.local
            .borrow()
            .get(&root.reference)
            .and_then(|files| files.get(path))
            .cloned()
            .ok_or_else(|| MetaError::NotFound(format!("{path} in {}", root.reference)))
    }
}
