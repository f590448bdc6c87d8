//! Hot reload while traffic is in flight.

use std::sync::Arc;
use std::thread;

use domain_tags::config::RuleRecord;
use domain_tags::tagger::{DomainTagger, Handshake};
use uuid::Uuid;

use super::common::{sample_config, ConsoleSink, FakeSession};

#[test]
fn reload_reports_counts() {
    let tagger = DomainTagger::from_config(&sample_config());

    let summary = tagger.reload(&[
        RuleRecord {
            host: "a.example.com".into(),
            tag: Some("alpha".into()),
            message: None,
        },
        RuleRecord {
            host: "b.example.com".into(),
            tag: Some("beta".into()),
            message: None,
        },
        RuleRecord {
            host: "c.example.com".into(),
            tag: Some("alpha".into()),
            message: None,
        },
    ]);

    assert_eq!(summary.rules, 3);
    assert_eq!(summary.known_tags, 2);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.version, 2);
}

#[test]
fn sessions_decided_before_reload_keep_their_decision() {
    let tagger = DomainTagger::from_config(&sample_config());
    let session = Uuid::new_v4();

    tagger.on_handshake(&Handshake {
        strong_id: Some(session),
        server_hostname: Some("vip.example.com".into()),
        ..Handshake::default()
    });

    // vip.example.com disappears from the table
    tagger.reload(&[RuleRecord {
        host: "other.example.com".into(),
        tag: Some("other".into()),
        message: None,
    }]);

    let decision = tagger.on_session_established(session, None);
    assert_eq!(decision.rule.tag.as_deref(), Some("vip"));

    // applying still works against the new known-tags set
    let mut player = FakeSession::default();
    let sink = ConsoleSink::default();
    let outcome = tagger.apply(&decision, &mut player, "Alice", &sink);
    assert_eq!(outcome.added.as_deref(), Some("vip"));
}

#[test]
fn reload_under_concurrent_handshakes_is_safe() {
    let tagger = Arc::new(DomainTagger::from_config(&sample_config()));
    let mut handles = vec![];

    for _ in 0..4 {
        let tagger = Arc::clone(&tagger);
        handles.push(thread::spawn(move || {
            for _ in 0..500 {
                let session = Uuid::new_v4();
                tagger.on_handshake(&Handshake {
                    strong_id: Some(session),
                    server_hostname: Some("vip.example.com".into()),
                    ..Handshake::default()
                });
                // always a complete decision, from one table version or another
                let decision = tagger.on_session_established(session, None);
                assert!(decision.rule.is_unmapped() || decision.rule.tag.is_some());
            }
        }));
    }

    {
        let tagger = Arc::clone(&tagger);
        handles.push(thread::spawn(move || {
            for i in 0..50 {
                let records = if i % 2 == 0 {
                    sample_config().rules
                } else {
                    Vec::new()
                };
                tagger.reload(&records);
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(tagger.engine().version() >= 51);
}
