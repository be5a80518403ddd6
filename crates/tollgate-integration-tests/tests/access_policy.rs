//! End-to-end access decisions through the mediator actor.
//!
//! Each test drives a spawned mediator through its handle and checks the
//! side effects recorded by the fixture's collaborators.

use tollgate_approval::{InboundMessage, OutboundMessage, Target, Transition};
use tollgate_test::{Event, MediatorFixture, init_test_tracing, origin};

fn request(host: &str) -> InboundMessage {
    InboundMessage::ProviderRequest {
        origin: origin(host),
    }
}

#[tokio::test]
async fn test_privacy_off_approves_every_origin() {
    init_test_tracing();
    let fixture = MediatorFixture::new().without_privacy();
    let (handle, _task) = fixture.spawn();

    for host in ["a", "b", "never-seen"] {
        assert!(handle.is_approved(origin(host)).await.unwrap());
    }

    // Toggling privacy back on falls through to the (empty) cache.
    fixture.privacy.set(true);
    assert!(!handle.is_approved(origin("a")).await.unwrap());
}

#[tokio::test]
async fn test_approval_lasts_until_cleared() {
    let fixture = MediatorFixture::new();
    let (handle, _task) = fixture.spawn();

    assert!(!handle.is_approved(origin("a")).await.unwrap());
    handle.approve(origin("a")).await.unwrap();
    assert!(handle.is_approved(origin("a")).await.unwrap());
    assert!(!handle.is_approved(origin("b")).await.unwrap());

    let cleared = handle.clear_approved_origins().await.unwrap();
    assert_eq!(cleared, Transition::Cleared { cleared: 1 });
    assert!(!handle.is_approved(origin("a")).await.unwrap());

    let again = handle.clear_approved_origins().await.unwrap();
    assert_eq!(again, Transition::Cleared { cleared: 0 });
}

#[tokio::test]
async fn test_locked_wallet_request_waits_for_user() {
    let fixture = MediatorFixture::new().locked();
    let (handle, _task) = fixture.spawn();

    let transition = handle.inbound(request("a")).await.unwrap();
    assert!(transition.is_pending());

    let pending = handle.pending().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].origin, origin("a"));
    assert_eq!(fixture.popup.opens(), 1);
    assert!(fixture.popup.is_open());
    assert!(fixture.transport.sent().is_empty());
}

#[tokio::test]
async fn test_locked_wallet_asks_even_for_cached_origin() {
    let fixture = MediatorFixture::new();
    let (handle, _task) = fixture.spawn();
    handle.approve(origin("a")).await.unwrap();
    fixture.log.take();

    fixture.unlocked.set(false);
    let transition = handle.inbound(request("a")).await.unwrap();
    assert!(transition.is_pending());
    assert_eq!(fixture.log.events(), vec![Event::PopupOpened]);
}

#[tokio::test]
async fn test_cached_origin_is_granted_without_popup() {
    let fixture = MediatorFixture::new();
    let (handle, _task) = fixture.spawn();
    handle.approve(origin("a")).await.unwrap();
    fixture.log.take();

    let transition = handle.inbound(request("a")).await.unwrap();
    assert_eq!(
        transition,
        Transition::Granted {
            origin: origin("a"),
            resolved: 1,
        }
    );
    assert_eq!(
        fixture.log.events(),
        vec![
            Event::PopupClosed,
            Event::Sent(OutboundMessage::ProviderApproved, Target::Active),
            Event::Notified,
        ]
    );
    assert_eq!(fixture.popup.opens(), 0);
    assert!(handle.pending().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_user_approval_resolves_pending_request() {
    let fixture = MediatorFixture::new();
    let (handle, _task) = fixture.spawn();

    handle.inbound(request("a")).await.unwrap();
    let transition = handle.approve(origin("a")).await.unwrap();

    assert!(transition.is_granted());
    assert!(handle.pending().await.unwrap().is_empty());
    assert!(!fixture.popup.is_open());
    assert_eq!(fixture.notifier.count(), 1);
    assert_eq!(
        fixture.transport.last(),
        Some((OutboundMessage::ProviderApproved, Target::Active))
    );
}

#[tokio::test]
async fn test_rejection_is_not_remembered() {
    let fixture = MediatorFixture::new();
    let (handle, _task) = fixture.spawn();

    handle.inbound(request("b")).await.unwrap();
    let transition = handle.reject(origin("b")).await.unwrap();
    assert_eq!(
        transition,
        Transition::Rejected {
            origin: origin("b"),
            resolved: 1,
        }
    );
    assert_eq!(fixture.transport.actions(), vec!["provider-rejected"]);
    assert!(handle.pending().await.unwrap().is_empty());
    assert!(!handle.is_approved(origin("b")).await.unwrap());
    assert_eq!(fixture.notifier.count(), 0);

    let again = handle.inbound(request("b")).await.unwrap();
    assert!(again.is_pending());
    assert_eq!(fixture.popup.opens(), 2);
}

#[tokio::test]
async fn test_privacy_status_query_grants_without_request() {
    let fixture = MediatorFixture::new().without_privacy();
    let (handle, _task) = fixture.spawn();

    let transition = handle.inbound(InboundMessage::PrivacyStatusQuery).await.unwrap();
    assert_eq!(transition, Transition::AmbientGrant);
    assert_eq!(
        fixture.log.events(),
        vec![
            Event::Sent(OutboundMessage::ProviderApproved, Target::Active),
            Event::Notified,
        ]
    );
    assert!(handle.pending().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_privacy_status_query_silent_with_privacy_on() {
    let fixture = MediatorFixture::new();
    let (handle, _task) = fixture.spawn();

    let transition = handle.inbound(InboundMessage::PrivacyStatusQuery).await.unwrap();
    assert_eq!(transition, Transition::Ignored);
    assert!(fixture.log.events().is_empty());
}

#[tokio::test]
async fn test_double_approve_equals_single() {
    let fixture = MediatorFixture::new();
    let (handle, _task) = fixture.spawn();

    handle.approve(origin("a")).await.unwrap();
    handle.approve(origin("a")).await.unwrap();
    assert!(handle.is_approved(origin("a")).await.unwrap());

    let cleared = handle.clear_approved_origins().await.unwrap();
    assert_eq!(cleared, Transition::Cleared { cleared: 1 });
}

#[tokio::test]
async fn test_queries_reply_to_active_context() {
    let fixture = MediatorFixture::new().locked();
    let (handle, _task) = fixture.spawn();

    handle
        .inbound(InboundMessage::IsApprovedQuery {
            origin: origin("a"),
        })
        .await
        .unwrap();
    handle.inbound(InboundMessage::IsUnlockedQuery).await.unwrap();

    assert_eq!(
        fixture.transport.sent(),
        vec![
            (
                OutboundMessage::AnswerIsApproved { is_approved: false },
                Target::Active
            ),
            (
                OutboundMessage::AnswerIsUnlocked { is_unlocked: false },
                Target::Active
            ),
        ]
    );
}

#[tokio::test]
async fn test_transport_failure_keeps_state_change() {
    let fixture = MediatorFixture::new();
    let (handle, _task) = fixture.spawn();
    fixture.transport.set_failing(true);

    handle.inbound(request("a")).await.unwrap();
    handle.approve(origin("a")).await.unwrap();

    assert!(fixture.transport.sent().is_empty());
    assert!(handle.is_approved(origin("a")).await.unwrap());
    assert!(handle.pending().await.unwrap().is_empty());
}
