//! Wallet lock and mediator shutdown.

use tollgate_approval::{ApprovalError, InboundMessage, OutboundMessage, Target, Transition};
use tollgate_test::{MediatorFixture, origin};

#[tokio::test]
async fn test_lock_clears_approvals_and_broadcasts() {
    let fixture = MediatorFixture::new();
    let (handle, _task) = fixture.spawn();
    handle.approve(origin("a")).await.unwrap();
    handle.approve(origin("b")).await.unwrap();

    let transition = handle.lock().await.unwrap();
    assert_eq!(transition, Transition::Locked { cleared: 2 });
    assert_eq!(
        fixture.transport.last(),
        Some((OutboundMessage::WalletLocked, Target::All))
    );
    assert!(!handle.is_approved(origin("a")).await.unwrap());
    assert!(!handle.is_approved(origin("b")).await.unwrap());
}

#[tokio::test]
async fn test_lock_leaves_pending_requests_queued() {
    let fixture = MediatorFixture::new();
    let (handle, _task) = fixture.spawn();
    handle
        .inbound(InboundMessage::ProviderRequest {
            origin: origin("a"),
        })
        .await
        .unwrap();

    fixture.unlocked.set(false);
    handle.lock().await.unwrap();

    let pending = handle.pending().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].origin, origin("a"));
    assert!(fixture.popup.is_open());

    // Unlocking does not resolve anything by itself; the user still decides.
    fixture.unlocked.set(true);
    handle.approve(origin("a")).await.unwrap();
    assert!(handle.pending().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_clear_does_not_broadcast() {
    let fixture = MediatorFixture::new();
    let (handle, _task) = fixture.spawn();
    handle.approve(origin("a")).await.unwrap();
    let sent_before = fixture.transport.sent().len();

    handle.clear_approved_origins().await.unwrap();
    assert_eq!(fixture.transport.sent().len(), sent_before);
    assert!(!handle.is_approved(origin("a")).await.unwrap());
}

#[tokio::test]
async fn test_privacy_off_survives_lock() {
    let fixture = MediatorFixture::new().without_privacy();
    let (handle, _task) = fixture.spawn();
    handle.lock().await.unwrap();
    assert!(handle.is_approved(origin("anyone")).await.unwrap());
}

#[tokio::test]
async fn test_stopped_mediator_reports_closed() {
    let fixture = MediatorFixture::new();
    let (handle, task) = fixture.spawn();
    task.abort();
    let _ = task.await;

    assert!(handle.is_closed());
    assert!(matches!(
        handle.is_unlocked().await,
        Err(ApprovalError::MediatorClosed)
    ));
    assert!(matches!(
        handle.approve(origin("a")).await,
        Err(ApprovalError::MediatorClosed)
    ));
}

#[tokio::test]
async fn test_actor_stops_when_last_handle_drops() {
    let fixture = MediatorFixture::new();
    let (handle, task) = fixture.spawn();
    let clone = handle.clone();
    drop(handle);
    assert!(!clone.is_closed());
    drop(clone);
    task.await.unwrap();
}
