//! Pulling selected refs and loading their metadata and manifests.

use serde_json::Value;
use tracing::{debug, error, info};

use flatmeta_events::{EventSink, MetaEvent};

use crate::{
    cancel::CancelToken,
    error::MetaError,
    keyfile::KeyFile,
    options::Options,
    projection::{project, ProjectedMetadata},
    refs::RemoteRef,
    report::ReportEntry,
    store::{CommitRoot, ContentStore, PullRequest, RemoteCatalog},
    Result,
};

pub const METADATA_PATH: &str = "/metadata";
pub const MANIFEST_PATH: &str = "/files/manifest.json";

/// Collaborators of one run.
#[derive(Clone, Copy)]
pub struct Session<'a> {
    pub catalog: &'a dyn RemoteCatalog,
    pub store: &'a dyn ContentStore,
    pub events: &'a dyn EventSink,
    pub cancel: &'a CancelToken,
}

/// Subpaths a pull has to retrieve for `options`.
pub fn pull_subpaths(options: &Options) -> Vec<String> {
    let mut subpaths = vec![METADATA_PATH.to_string()];
    if options.get_manifest {
        subpaths.push(MANIFEST_PATH.to_string());
    }
    subpaths
}

/// Pulls `refs` when requested, then yields one entry per ref in order.
///
/// Entries are loaded lazily; the first failing one ends the run.
pub fn fetch<'a>(
    session: Session<'a>,
    refs: Vec<RemoteRef>,
    options: &'a Options,
) -> Result<impl Iterator<Item = Result<ReportEntry>> + 'a> {
    if options.pull && !refs.is_empty() {
        pull(session, &refs, options)?;
    }

    Ok(refs
        .into_iter()
        .map(move |remote_ref| load_entry(session, options, &remote_ref)))
}

fn pull(session: Session<'_>, refs: &[RemoteRef], options: &Options) -> Result<()> {
    let request = PullRequest {
        remote: options.remote_name.clone(),
        refs: refs.iter().map(RemoteRef::format_ref).collect(),
        subpaths: pull_subpaths(options),
        disable_static_deltas: true,
        gpg_verify: false,
    };

    info!(
        "Pulling {} from {} refs of {}",
        request.subpaths.join(", "),
        request.refs.len(),
        request.remote
    );
    session.events.emit(MetaEvent::PullStarting {
        remote: request.remote.clone(),
        refs: request.refs.len(),
        subpaths: request.subpaths.clone(),
    });

    session.store.pull(&request, session.events, session.cancel)?;

    session.events.emit(MetaEvent::PullComplete {
        remote: request.remote,
    });
    Ok(())
}

fn load_entry(session: Session<'_>, options: &Options, remote_ref: &RemoteRef) -> Result<ReportEntry> {
    session.cancel.check()?;

    let reference = remote_ref.format_ref();
    debug!("Loading {reference}");
    session.events.emit(MetaEvent::RefLoading {
        reference: reference.clone(),
    });

    let root = match session
        .store
        .read_commit(&options.remote_name, &reference, session.cancel)
    {
        Ok(root) => Some(root),
        Err(err) if err.is_not_found() => {
            error!("Can't read local ref {reference}: {err}");
            session.events.emit(MetaEvent::RefMissing {
                reference: reference.clone(),
                reason: err.to_string(),
            });
            None
        }
        Err(err) => return Err(err),
    };

    let metadata = if options.get_metadata {
        Some(load_metadata(session, options, remote_ref, root.as_ref())?)
    } else {
        None
    };

    let manifest = match &root {
        Some(root) if options.get_manifest && !remote_ref.is_built_extension() => {
            load_manifest(session, root)?
        }
        _ => None,
    };

    Ok(ReportEntry {
        reference,
        metadata,
        manifest,
    })
}

fn load_metadata(
    session: Session<'_>,
    options: &Options,
    remote_ref: &RemoteRef,
    root: Option<&CommitRoot>,
) -> Result<ProjectedMetadata> {
    let bytes = match (root, &remote_ref.metadata) {
        (Some(root), _) => session.store.read_file(root, METADATA_PATH, session.cancel)?,
        (None, Some(embedded)) => embedded.clone(),
        (None, None) => {
            session
                .catalog
                .remote_ref_metadata(&options.remote_name, remote_ref, session.cancel)?
        }
    };

    let invalid = |source| {
        MetaError::Metadata {
            reference: remote_ref.format_ref(),
            source,
        }
    };
    let keyfile = KeyFile::parse(&bytes).map_err(invalid)?;
    project(&keyfile).map_err(invalid)
}

fn load_manifest(session: Session<'_>, root: &CommitRoot) -> Result<Option<Value>> {
    match session.store.read_file(root, MANIFEST_PATH, session.cancel) {
        Ok(bytes) => {
            serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|source| {
                    MetaError::Manifest {
                        reference: root.reference.clone(),
                        source,
                    }
                })
        }
        Err(err) if err.is_not_found() => {
            info!("No manifest in {}", root.reference);
            session.events.emit(MetaEvent::ManifestMissing {
                reference: root.reference.clone(),
            });
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
