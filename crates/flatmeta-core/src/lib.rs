use tracing::info;

pub use error::MetaError;

pub mod cancel;
pub mod command;
pub mod error;
pub mod fetch;
pub mod flatpak;
pub mod installation;
pub mod keyfile;
pub mod options;
pub mod ostree;
pub mod projection;
pub mod refs;
pub mod report;
pub mod schema;
pub mod select;
pub mod store;
#[cfg(test)]
pub mod test_utils;

pub type Result<T> = std::result::Result<T, MetaError>;

use fetch::{fetch, Session};
use installation::ensure_remote;
use options::Options;
use report::ReportEntry;
use select::select_refs;

/// Queries the remote and loads every selected ref into a report entry.
///
/// Nothing is returned unless every entry loaded; callers write the report afterwards.
pub fn run(session: Session<'_>, options: &Options) -> Result<Vec<ReportEntry>> {
    ensure_remote(session.catalog, options, session.cancel)?;

    let refs = session
        .catalog
        .list_remote_refs(&options.remote_name, session.cancel)?;
    let listed = refs.len();
    let selected = select_refs(refs, options);
    info!("Selected {} of {listed} refs from {}", selected.len(), options.remote_name);

    fetch(session, selected, options)?.collect()
}

#[cfg(test)]
mod tests {
    use flatmeta_events::{CollectorSink, MetaEvent, NullSink};
    use serde_json::{json, Value};
    use tempfile::tempdir;

    use super::*;
    use crate::{
        cancel::CancelToken,
        fetch::{MANIFEST_PATH, METADATA_PATH},
        refs::RemoteRef,
        report::write_report,
        test_utils::{MemoryCatalog, MemoryStore},
    };

    const EOL_APP: &str = "app/org.old.Viewer/x86_64/stable";
    const APP: &str = "app/org.example.Viewer/x86_64/stable";

    fn listed(reference: &str, metadata: &str) -> RemoteRef {
        let mut remote_ref = RemoteRef::parse(reference).unwrap();
        remote_ref.metadata = Some(metadata.as_bytes().to_vec());
        remote_ref
    }

    fn remote_with_eol_app() -> MemoryCatalog {
        let mut eol = listed(EOL_APP, "[Application]\nname=org.old.Viewer\n");
        eol.eol = Some("Replaced by org.example.Viewer".to_string());

        MemoryCatalog::new(["flathub"]).with_refs(vec![
            eol,
            listed(
                APP,
                "[Application]\nname=org.example.Viewer\nruntime=org.freedesktop.Platform/x86_64/23.08\n\n[Context]\nshared=network;ipc;\n",
            ),
        ])
    }

    #[test]
    fn test_offline_run_uses_embedded_metadata() {
        let catalog = remote_with_eol_app();
        let store = MemoryStore::new();
        let cancel = CancelToken::new();
        let session = Session {
            catalog: &catalog,
            store: &store,
            events: &NullSink,
            cancel: &cancel,
        };
        let mut options = Options::new("flathub");
        options.pull = false;
        options.get_manifest = false;

        let entries = run(session, &options).unwrap();

        assert!(store.pulls().is_empty());
        assert_eq!(
            serde_json::to_value(&entries).unwrap(),
            json!([{
                "ref": APP,
                "metadata": {
                    "Application": {
                        "name": "org.example.Viewer",
                        "runtime": "org.freedesktop.Platform/x86_64/23.08"
                    },
                    "Context": {"shared": ["network", "ipc"]}
                },
                "manifest": null
            }])
        );
    }

    #[test]
    fn test_written_report_parses_back() {
        let catalog = remote_with_eol_app();
        let store = MemoryStore::new()
            .with_remote_file(APP, METADATA_PATH, "[Application]\nname=org.example.Viewer\n")
            .with_remote_file(
                APP,
                MANIFEST_PATH,
                r#"{"id": "org.example.Viewer", "modules": [{"name": "viewer"}]}"#,
            );
        let cancel = CancelToken::new();
        let events = CollectorSink::default();
        let session = Session {
            catalog: &catalog,
            store: &store,
            events: &events,
            cancel: &cancel,
        };
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");

        let entries = run(session, &Options::new("flathub")).unwrap();
        write_report(&entries, Some(&path)).unwrap();

        let parsed: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        let array = parsed.as_array().unwrap();
        assert_eq!(array.len(), 1);
        let entry = array[0].as_object().unwrap();
        assert_eq!(
            entry.keys().collect::<Vec<_>>(),
            vec!["ref", "metadata", "manifest"]
        );
        assert_eq!(entry["ref"], APP);
        assert_eq!(entry["metadata"]["Application"]["name"], "org.example.Viewer");
        assert_eq!(entry["manifest"]["modules"][0]["name"], "viewer");

        assert_eq!(store.pulls()[0].refs, vec![APP]);
        assert!(events.events().contains(&MetaEvent::PullProgress {
            fetched: 1,
            requested: 1
        }));
    }

    #[test]
    fn test_cancel_during_pull_writes_nothing() {
        let catalog = remote_with_eol_app();
        let store = MemoryStore::new()
            .with_remote_file(APP, METADATA_PATH, "[Application]\n")
            .cancel_during_pull();
        let cancel = CancelToken::new();
        let session = Session {
            catalog: &catalog,
            store: &store,
            events: &NullSink,
            cancel: &cancel,
        };
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");

        let result = run(session, &Options::new("flathub"))
            .and_then(|entries| write_report(&entries, Some(&path)));

        assert!(result.unwrap_err().is_cancelled());
        assert!(cancel.is_cancelled());
        assert!(!path.exists());
    }

    #[test]
    fn test_unknown_remote_gets_registered() {
        let catalog = MemoryCatalog::new(Vec::<String>::new());
        let store = MemoryStore::new();
        let cancel = CancelToken::new();
        let session = Session {
            catalog: &catalog,
            store: &store,
            events: &NullSink,
            cancel: &cancel,
        };
        let mut options = Options::new("flathub");
        options.remote_url = Some("https://dl.flathub.org/repo/".to_string());

        let entries = run(session, &options).unwrap();

        assert!(entries.is_empty());
        assert_eq!(catalog.added().len(), 1);
    }

    #[test]
    fn test_ref_filter_and_built_extensions() {
        let catalog = MemoryCatalog::new(["flathub"]).with_refs(vec![
            listed(APP, "[Application]\n"),
            listed("runtime/org.example.Viewer.Locale/x86_64/stable", "[Runtime]\n"),
            listed("app/org.other.App/x86_64/stable", "[Application]\n"),
        ]);
        let store = MemoryStore::new();
        let cancel = CancelToken::new();
        let session = Session {
            catalog: &catalog,
            store: &store,
            events: &NullSink,
            cancel: &cancel,
        };
        let mut options = Options::new("flathub");
        options.pull = false;
        options.get_built_extensions = false;
        options.refs = vec![
            "runtime/org.example.Viewer.Locale/x86_64/stable".to_string(),
            APP.to_string(),
        ];

        let entries = run(session, &options).unwrap();

        let refs: Vec<_> = entries.iter().map(|entry| entry.reference.as_str()).collect();
        assert_eq!(refs, vec![APP]);
    }
}
