// tests/login_flow_tests.rs
mod common;

use common::*;
use chrono::Duration;
use storefront::auth::{verify_session, Caller, HmacIdentityVerifier};
use storefront::errors::AppError;
use storefront::models::SenderRole;
use storefront::services::{chat, login};

#[tokio::test]
async fn happy_path_login_then_chat() {
  let h = test_state();
  seed_order(h.store.as_ref(), "09012345678", "1234", vec![order_item("Latte", 1, 500)]).await;

  // phone formatting differences must not matter
  let outcome = login::customer_login(&h.state, "090-1234-5678", "1234").await.unwrap();

  // the minted token verifies and is scoped to the order
  let claims = verify_session(SESSION_SECRET.as_bytes(), Some(&outcome.token)).expect("valid session");
  assert_eq!(claims.order_id, outcome.order.id);
  assert_eq!(claims.phone, "09012345678");

  let caller = Caller::CustomerSession(claims);

  // empty log first
  let log = chat::list_messages(&h.state, &caller, &outcome.order.id).await.unwrap();
  assert!(log.messages.is_empty());

  // send "Hello", list again, see it attributed to the customer
  chat::send_message(&h.state, &caller, &outcome.order.id, Some("Hello"), None)
    .await
    .unwrap();
  let log = chat::list_messages(&h.state, &caller, &outcome.order.id).await.unwrap();
  assert_eq!(log.messages.len(), 1);
  assert_eq!(log.messages[0].text, "Hello");
  assert_eq!(log.messages[0].sender_role, SenderRole::Customer);
}

#[tokio::test]
async fn login_picks_the_most_recent_order_for_the_phone() {
  let h = test_state();
  let _older = seed_order(h.store.as_ref(), "09012345678", "1234", vec![order_item("Latte", 1, 500)]).await;
  tokio::time::sleep(std::time::Duration::from_millis(5)).await;
  let newer = seed_order(h.store.as_ref(), "09012345678", "1234", vec![order_item("Bagel", 1, 300)]).await;

  let outcome = login::customer_login(&h.state, "09012345678", "1234").await.unwrap();
  assert_eq!(outcome.order.id, newer.id);
}

#[tokio::test]
async fn wrong_pin_is_unauthenticated() {
  let h = test_state();
  seed_order(h.store.as_ref(), "09012345678", "1234", vec![order_item("Latte", 1, 500)]).await;

  let err = login::customer_login(&h.state, "09012345678", "4321").await.unwrap_err();
  assert!(matches!(err, AppError::Unauthenticated), "got {err:?}");
}

#[tokio::test]
async fn unknown_phone_is_not_found_and_bad_input_is_validation() {
  let h = test_state();

  let err = login::customer_login(&h.state, "09012345678", "1234").await.unwrap_err();
  assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");

  for (phone, pin) in [("", "1234"), ("09012345678", ""), ("09012345678", "12"), ("09012345678", "12ab")] {
    let err = login::customer_login(&h.state, phone, pin).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "({phone:?},{pin:?}) got {err:?}");
  }
}

#[tokio::test]
async fn federated_login_resolves_the_subjects_latest_order() {
  let h = test_state();
  seed_order_for_subject(
    h.store.as_ref(),
    "09012345678",
    "1234",
    Some("google-uid-1"),
    vec![order_item("Latte", 1, 500)],
  )
  .await;

  let id_token =
    HmacIdentityVerifier::issue(IDENTITY_SECRET.as_bytes(), "google-uid-1", false, Duration::hours(1)).unwrap();
  let outcome = login::federated_login(&h.state, &id_token).await.unwrap();

  let claims = verify_session(SESSION_SECRET.as_bytes(), Some(&outcome.token)).expect("valid session");
  assert_eq!(claims.order_id, outcome.order.id);
  assert_eq!(claims.phone, "09012345678");
}

#[tokio::test]
async fn federated_login_rejects_bad_tokens_and_unknown_subjects() {
  let h = test_state();

  let err = login::federated_login(&h.state, "garbage-token").await.unwrap_err();
  assert!(matches!(err, AppError::Unauthenticated), "got {err:?}");

  let id_token =
    HmacIdentityVerifier::issue(IDENTITY_SECRET.as_bytes(), "nobody", false, Duration::hours(1)).unwrap();
  let err = login::federated_login(&h.state, &id_token).await.unwrap_err();
  assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");
}
