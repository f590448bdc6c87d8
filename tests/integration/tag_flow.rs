//! End-to-end handshake → resolution → application scenarios.

use domain_tags::tagger::{DomainTagger, Handshake};
use uuid::Uuid;

use super::common::{sample_config, ConsoleSink, FakeSession};

#[test]
fn vip_session_gains_label_and_broadcast() {
    let tagger = DomainTagger::from_config(&sample_config());
    let session = Uuid::new_v4();

    tagger.on_handshake(&Handshake {
        strong_id: Some(session),
        origin_addr: Some("203.0.113.10".into()),
        server_hostname: Some("vip.example.com".into()),
        original_handshake: None,
    });

    let decision = tagger.on_session_established(session, Some("203.0.113.10"));
    let mut player = FakeSession::default();
    let sink = ConsoleSink::default();

    let outcome = tagger.apply(&decision, &mut player, "Alice", &sink);

    assert_eq!(outcome.added.as_deref(), Some("vip"));
    assert_eq!(player.labels(), vec!["vip".to_string()]);
    assert_eq!(sink.commands(), vec!["broadcast Alice joined VIP".to_string()]);
}

#[test]
fn switching_hosts_swaps_labels_exclusively() {
    let tagger = DomainTagger::from_config(&sample_config());
    let mut player = FakeSession::default();
    let sink = ConsoleSink::default();

    // first connect through the staff host
    let session = Uuid::new_v4();
    tagger.on_handshake(&Handshake {
        strong_id: Some(session),
        server_hostname: Some("staff.example.com".into()),
        ..Handshake::default()
    });
    let decision = tagger.on_session_established(session, None);
    tagger.apply(&decision, &mut player, "Bob", &sink);
    assert_eq!(player.labels(), vec!["staff".to_string()]);

    // reconnect through the vip host: exclusive mode swaps the label
    let session = Uuid::new_v4();
    tagger.on_handshake(&Handshake {
        strong_id: Some(session),
        server_hostname: Some("vip.example.com".into()),
        ..Handshake::default()
    });
    let decision = tagger.on_session_established(session, None);
    let outcome = tagger.apply(&decision, &mut player, "Bob", &sink);

    assert_eq!(outcome.added.as_deref(), Some("vip"));
    assert_eq!(outcome.removed, vec!["staff".to_string()]);
    assert_eq!(player.labels(), vec!["vip".to_string()]);
}

#[test]
fn clear_rule_removes_known_tags_only() {
    let tagger = DomainTagger::from_config(&sample_config());
    let mut player = FakeSession::with_labels(&["vip", "staff", "external"]);
    let sink = ConsoleSink::default();

    let session = Uuid::new_v4();
    tagger.on_handshake(&Handshake {
        strong_id: Some(session),
        server_hostname: Some("plain.example.com".into()),
        ..Handshake::default()
    });
    let decision = tagger.on_session_established(session, None);
    tagger.apply(&decision, &mut player, "Carol", &sink);

    // labels not referenced by any rule are untouched
    assert_eq!(player.labels(), vec!["external".to_string()]);
    assert!(sink.commands().is_empty());
}

#[test]
fn message_only_rule_dispatches_without_label_changes() {
    let tagger = DomainTagger::from_config(&sample_config());
    let mut player = FakeSession::with_labels(&["vip"]);
    let sink = ConsoleSink::default();

    let session = Uuid::new_v4();
    tagger.on_handshake(&Handshake {
        strong_id: Some(session),
        server_hostname: Some("greet.example.com".into()),
        ..Handshake::default()
    });
    let decision = tagger.on_session_established(session, None);
    let outcome = tagger.apply(&decision, &mut player, "Dave", &sink);

    assert!(outcome.is_noop());
    assert_eq!(player.labels(), vec!["vip".to_string()]);
    assert_eq!(sink.commands(), vec!["tellraw Dave welcome".to_string()]);
}

#[test]
fn unknown_host_resolves_unmapped_and_changes_nothing() {
    let tagger = DomainTagger::from_config(&sample_config());
    let mut player = FakeSession::with_labels(&["vip"]);
    let sink = ConsoleSink::default();

    let session = Uuid::new_v4();
    tagger.on_handshake(&Handshake {
        strong_id: Some(session),
        server_hostname: Some("unlisted.example.com".into()),
        ..Handshake::default()
    });
    let decision = tagger.on_session_established(session, None);

    assert!(decision.rule.is_unmapped());
    let outcome = tagger.apply(&decision, &mut player, "Eve", &sink);
    assert!(outcome.is_noop());
    assert!(sink.commands().is_empty());
}

#[test]
fn dispatch_failure_never_propagates() {
    let tagger = DomainTagger::from_config(&sample_config());
    let mut player = FakeSession::default();
    let sink = ConsoleSink::failing();

    let session = Uuid::new_v4();
    tagger.on_handshake(&Handshake {
        strong_id: Some(session),
        server_hostname: Some("vip.example.com".into()),
        ..Handshake::default()
    });
    let decision = tagger.on_session_established(session, None);

    // label mutation still happens; the failed dispatch was only logged
    let outcome = tagger.apply(&decision, &mut player, "Frank", &sink);
    assert_eq!(outcome.added.as_deref(), Some("vip"));
    assert_eq!(sink.commands().len(), 1);
}
