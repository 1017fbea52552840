mod event;
mod sink;

pub use event::*;
pub use sink::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_sink() {
        NullSink.emit(MetaEvent::PullComplete {
            remote: "flathub".to_string(),
        });
    }

    #[test]
    fn test_collector_keeps_pull_order() {
        let sink = CollectorSink::default();
        sink.emit(MetaEvent::PullStarting {
            remote: "flathub".to_string(),
            refs: 2,
            subpaths: vec!["/metadata".to_string()],
        });
        sink.emit(MetaEvent::PullProgress {
            fetched: 3,
            requested: 12,
        });
        sink.emit(MetaEvent::PullComplete {
            remote: "flathub".to_string(),
        });

        let events = sink.events();
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], MetaEvent::PullStarting { refs: 2, .. }));
        assert_eq!(events[1].percent(), Some(25.0));
        assert!(matches!(&events[2], MetaEvent::PullComplete { .. }));
    }

    #[test]
    fn test_collector_sink() {
        let sink = CollectorSink::default();
        assert!(sink.is_empty());

        sink.emit(MetaEvent::ManifestMissing {
            reference: "app/org.example.App/x86_64/stable".to_string(),
        });

        assert_eq!(sink.len(), 1);
        assert_eq!(
            sink.events(),
            vec![MetaEvent::ManifestMissing {
                reference: "app/org.example.App/x86_64/stable".to_string(),
            }]
        );
    }

    #[test]
    fn test_percent_ignores_empty_pull() {
        let event = MetaEvent::PullProgress {
            fetched: 0,
            requested: 0,
        };
        assert_eq!(event.percent(), None);
    }
}
