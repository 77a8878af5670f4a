//! Envelope decoder vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use owlsub_core::protocol::{EnvelopeDecoder, Event, StreamOnlineEvent, SubscriptionType};

mod vector_loader;
use vector_loader::load;

#[test]
fn decoder_vectors() {
    let files = [
        "welcome_ok.json",
        "keepalive_ok.json",
        "reconnect_ok.json",
        "reconnect_missing_url.json",
        "notification_stream_online.json",
        "notification_missing_subscription.json",
        "revocation_ok.json",
        "stale_eleven_minutes.json",
        "unknown_type.json",
        "malformed.json",
        "missing_timestamp.json",
    ];

    for f in files {
        let v = load(f);
        let mut decoder = EnvelopeDecoder::default();
        let res = decoder.parse_at(&v.bytes(), v.now);

        if let Some(err) = v.expect_error {
            let e = res.expect_err("expected error");
            assert_eq!(e.reason(), err.reason, "vector={}", v.description);
            continue;
        }

        let event = res.expect("expected decoded event");
        let ex = v.expect.expect("missing expect block");
        assert_eq!(event.kind().as_str(), ex["kind"].as_str().unwrap(), "vector={}", v.description);

        match event {
            Event::Welcome(w) => {
                assert_eq!(w.session_id(), ex["session_id"].as_str().unwrap());
                assert_eq!(
                    w.keepalive_timeout().map(|d| d.as_secs()),
                    ex["keepalive_secs"].as_u64()
                );
            }
            Event::Keepalive(_) => {}
            Event::Reconnect(r) => {
                assert_eq!(r.session_id(), ex["session_id"].as_str().unwrap());
                assert_eq!(r.reconnect_url(), ex["reconnect_url"].as_str().unwrap());
            }
            Event::Notification(n) => {
                assert_eq!(n.message_id, ex["message_id"].as_str().unwrap());
                assert_eq!(n.subscription.kind, ex["subscription_type"].as_str().unwrap());
                assert_eq!(
                    n.subscription.condition_str("broadcaster_user_id"),
                    ex["broadcaster_user_id"].as_str()
                );
            }
            Event::Revocation(r) => {
                assert_eq!(r.subscription.status, ex["status"].as_str().unwrap());
                assert_eq!(r.subscription.kind, ex["subscription_type"].as_str().unwrap());
            }
        }
    }
}

#[test]
fn notification_body_decodes_into_typed_event() {
    let v = load("notification_stream_online.json");
    let mut decoder = EnvelopeDecoder::default();
    let Event::Notification(n) = decoder.parse_at(&v.bytes(), v.now).unwrap() else {
        panic!("expected notification");
    };

    assert_eq!(n.subscription.subscription_type(), SubscriptionType::StreamOnline);
    assert_eq!(n.subscription.transport.method, "websocket");

    let online: StreamOnlineEvent = n.event_as().unwrap();
    assert_eq!(online.broadcaster_user_login, "owlcaster");
    assert_eq!(online.stream_type, "live");
}

#[test]
fn notification_body_mismatch_is_reported() {
    let v = load("notification_stream_online.json");
    let mut decoder = EnvelopeDecoder::default();
    let Event::Notification(n) = decoder.parse_at(&v.bytes(), v.now).unwrap() else {
        panic!("expected notification");
    };

    #[derive(Debug, serde::Deserialize)]
    struct NeedsField {
        #[allow(dead_code)]
        missing_field: String,
    }

    let err = n.event_as::<NeedsField>().expect_err("must not decode");
    assert_eq!(err.reason(), "payload_mismatch");
}
