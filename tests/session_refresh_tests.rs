// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session timer behavior, driven with paused tokio time.

use lms_portal::services::TimerState;
use std::time::Duration;

mod common;
use common::{Harness, PASSWORD};

const INTERVAL: Duration = Duration::from_secs(60);

#[tokio::test(start_paused = true)]
async fn test_refresh_rotates_credentials_and_rearms() {
    let h = Harness::with_refresh_interval(INTERVAL);
    h.register("alice@example.com").await;
    let before = h.facade.current_session().await.unwrap();

    tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;

    let after = h.facade.current_session().await.expect("still signed in");
    assert_eq!(after.uid, before.uid);
    assert_ne!(after.refresh_token, before.refresh_token);
    assert_eq!(h.facade.timer_state(), TimerState::Armed);

    // And again on the next interval.
    tokio::time::sleep(INTERVAL).await;
    let again = h.facade.current_session().await.unwrap();
    assert_ne!(again.refresh_token, after.refresh_token);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_failure_logs_out() {
    let h = Harness::with_refresh_interval(INTERVAL);
    h.register("bob@example.com").await;
    let mut rx = h.facade.subscribe();
    assert!(rx.borrow_and_update().is_some());

    h.identity.fail_refreshes(true);
    tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;

    assert!(h.facade.current_session().await.is_none());
    assert_eq!(h.facade.timer_state(), TimerState::Idle);
    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_disabled_account_is_logged_out_on_refresh() {
    let h = Harness::with_refresh_interval(INTERVAL);
    let uid = h.register("carol@example.com").await;
    assert!(h.identity.disable_account(&uid));

    tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;
    assert!(h.facade.get_current_user().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_login_restarts_the_interval() {
    let h = Harness::with_refresh_interval(INTERVAL);
    h.register("dave@example.com").await;
    let first = h.facade.current_session().await.unwrap();

    // Half an interval in, sign out and back in.
    tokio::time::sleep(INTERVAL / 2).await;
    h.facade.logout().await;
    assert!(h.facade.login("dave@example.com", PASSWORD).await.success);
    let second = h.facade.current_session().await.unwrap();
    assert_ne!(second.refresh_token, first.refresh_token);

    // The first timer would have fired here; it was cancelled.
    tokio::time::sleep(INTERVAL / 2 + Duration::from_secs(1)).await;
    assert_eq!(
        h.facade.current_session().await.unwrap().refresh_token,
        second.refresh_token
    );

    tokio::time::sleep(INTERVAL / 2).await;
    assert_ne!(
        h.facade.current_session().await.unwrap().refresh_token,
        second.refresh_token
    );
}

#[tokio::test(start_paused = true)]
async fn test_slow_refresh_does_not_log_out_next_user() {
    let h = Harness::new();
    h.register("erin@example.com").await;
    h.facade.logout().await;
    let frank = h.register("frank@example.com").await;
    h.facade.logout().await;
    assert!(h.facade.login("erin@example.com", PASSWORD).await.success);

    h.identity.delay_refreshes(Duration::from_secs(10));
    let facade = h.facade.clone();
    let refresh = tokio::spawn(async move { facade.refresh_session().await });

    // Erin signs out while her refresh is in flight and Frank signs in.
    tokio::time::sleep(Duration::from_secs(1)).await;
    h.facade.logout().await;
    assert!(h.facade.login("frank@example.com", PASSWORD).await.success);

    // Erin's revoked token makes her refresh fail; Frank stays signed in.
    assert!(refresh.await.unwrap());
    assert_eq!(h.facade.current_session().await.unwrap().uid, frank);
    assert_eq!(h.facade.timer_state(), TimerState::Armed);
}

#[tokio::test(start_paused = true)]
async fn test_manual_refresh_when_signed_out() {
    let h = Harness::with_refresh_interval(INTERVAL);
    assert!(!h.facade.refresh_session().await);
    assert_eq!(h.facade.timer_state(), TimerState::Idle);
}
