// tests/http_api_tests.rs
mod common;

use actix_web::cookie::Cookie;
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use common::*;
use serde_json::{json, Value};
use storefront::auth::session::{sign_session, SignOptions};
use storefront::db::OrderStore;
use storefront::web::configure_app_routes;

macro_rules! spawn_app {
  ($state:expr) => {
    test::init_service(
      App::new()
        .app_data(web::Data::new($state.clone()))
        .configure(configure_app_routes),
    )
    .await
  };
}

fn session_cookie_from(resp: &actix_web::dev::ServiceResponse) -> Cookie<'static> {
  resp
    .response()
    .cookies()
    .find(|c| c.name() == "cust_session")
    .expect("session cookie set")
    .into_owned()
}

#[actix_web::test]
async fn health_check_works() {
  let h = test_state();
  let app = spawn_app!(h.state);

  let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn messages_require_authentication() {
  let h = test_state();
  let app = spawn_app!(h.state);

  let resp = test::call_service(&app, test::TestRequest::get().uri("/customer/messages").to_request()).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/customer/messages")
      .set_json(json!({"text": "hi"}))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn login_chat_roundtrip_over_http() {
  let h = test_state();
  seed_order(h.store.as_ref(), "09012345678", "1234", vec![order_item("Latte", 1, 500)]).await;
  let app = spawn_app!(h.state);

  // login sets the session cookie
  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/customer/login")
      .set_json(json!({"phone": "09012345678", "pin": "1234"}))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let cookie = session_cookie_from(&resp);
  assert!(cookie.http_only().unwrap_or(false));
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["ok"], json!(true));
  let order_id = body["orderId"].as_str().unwrap().to_string();

  // list: empty
  let resp = test::call_service(
    &app,
    test::TestRequest::get()
      .uri("/customer/messages")
      .cookie(cookie.clone())
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["order"]["id"].as_str().unwrap(), order_id);
  assert_eq!(body["messages"].as_array().unwrap().len(), 0);

  // send "Hello"
  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/customer/messages")
      .cookie(cookie.clone())
      .set_json(json!({"text": "Hello"}))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);

  // list again: one customer message
  let resp = test::call_service(
    &app,
    test::TestRequest::get()
      .uri("/customer/messages")
      .cookie(cookie.clone())
      .to_request(),
  )
  .await;
  let body: Value = test::read_body_json(resp).await;
  let messages = body["messages"].as_array().unwrap();
  assert_eq!(messages.len(), 1);
  assert_eq!(messages[0]["senderRole"], json!("customer"));
  assert_eq!(messages[0]["text"], json!("Hello"));

  // empty send is a 400
  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/customer/messages")
      .cookie(cookie.clone())
      .set_json(json!({"text": "   "}))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  // logout clears the cookie
  let resp = test::call_service(
    &app,
    test::TestRequest::post().uri("/customer/logout").cookie(cookie).to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let cleared = session_cookie_from(&resp);
  assert!(cleared.value().is_empty());
}

#[actix_web::test]
async fn wrong_pin_and_unknown_phone_map_to_401_and_404() {
  let h = test_state();
  seed_order(h.store.as_ref(), "09012345678", "1234", vec![order_item("Latte", 1, 500)]).await;
  let app = spawn_app!(h.state);

  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/customer/login")
      .set_json(json!({"phone": "09012345678", "pin": "0000"}))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/customer/login")
      .set_json(json!({"phone": "09099999999", "pin": "1234"}))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn stale_session_for_another_order_is_forbidden_not_found_out() {
  let h = test_state();
  let order = seed_order(h.store.as_ref(), "09012345678", "1234", vec![order_item("Latte", 1, 500)]).await;
  let app = spawn_app!(h.state);

  // a signed session naming this order but carrying a different phone:
  // structurally valid, ownership check must reject it
  let token = sign_session(SESSION_SECRET.as_bytes(), &order.id, "09000000000", SignOptions::default()).unwrap();
  let resp = test::call_service(
    &app,
    test::TestRequest::get()
      .uri("/customer/messages")
      .cookie(Cookie::new("cust_session", token))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  let body: Value = test::read_body_json(resp).await;
  // generic body: no hint whether the order exists
  assert_eq!(body["error"], json!("Forbidden"));
}

#[actix_web::test]
async fn garbage_session_cookie_is_unauthenticated() {
  let h = test_state();
  let app = spawn_app!(h.state);

  let resp = test::call_service(
    &app,
    test::TestRequest::get()
      .uri("/customer/messages")
      .cookie(Cookie::new("cust_session", "not.a.token"))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn admin_marks_paid_over_http_idempotently() {
  let h = test_state();
  let order = seed_order(h.store.as_ref(), "09012345678", "1234", vec![order_item("Latte", 10, 500)]).await;
  let app = spawn_app!(h.state);
  let bearer = admin_bearer_token();

  // no token → 401
  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri(&format!("/admin/orders/{}/mark-paid", order.id))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri(&format!("/admin/orders/{}/mark-paid", order.id))
      .insert_header(("Authorization", format!("Bearer {}", bearer)))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["ok"], json!(true));
  assert_eq!(body["orderId"].as_str().unwrap(), order.id);

  // second call: still ok, still exactly one ledger entry
  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri(&format!("/admin/orders/{}/mark-paid", order.id))
      .insert_header(("Authorization", format!("Bearer {}", bearer)))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);

  let movements = h.store.list_cash_movements(100).await.unwrap();
  assert_eq!(movements.len(), 1);
  assert_eq!(movements[0].amount_cents, 5000);
}

#[actix_web::test]
async fn admin_reads_any_order_chat_with_order_id_param() {
  let h = test_state();
  let order = seed_order(h.store.as_ref(), "09012345678", "1234", vec![order_item("Latte", 1, 500)]).await;
  let app = spawn_app!(h.state);
  let bearer = admin_bearer_token();

  // missing orderId → 400
  let resp = test::call_service(
    &app,
    test::TestRequest::get()
      .uri("/customer/messages")
      .insert_header(("Authorization", format!("Bearer {}", bearer)))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  // admin send lands with the admin role
  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/customer/messages")
      .insert_header(("Authorization", format!("Bearer {}", bearer)))
      .set_json(json!({"text": "On it", "orderId": order.id}))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);

  let resp = test::call_service(
    &app,
    test::TestRequest::get()
      .uri(&format!("/customer/messages?orderId={}", order.id))
      .insert_header(("Authorization", format!("Bearer {}", bearer)))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  let messages = body["messages"].as_array().unwrap();
  assert_eq!(messages.len(), 1);
  assert_eq!(messages[0]["senderRole"], json!("admin"));
}

#[actix_web::test]
async fn oversized_image_maps_to_413() {
  use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
  use base64::Engine;

  let h = test_state();
  seed_order(h.store.as_ref(), "09012345678", "1234", vec![order_item("Latte", 1, 500)]).await;
  let app = spawn_app!(h.state);

  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/customer/login")
      .set_json(json!({"phone": "09012345678", "pin": "1234"}))
      .to_request(),
  )
  .await;
  let cookie = session_cookie_from(&resp);

  let oversized = vec![0u8; h.state.config.max_image_bytes() + 1];
  let data_url = format!("data:image/png;base64,{}", BASE64_STANDARD.encode(&oversized));
  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/customer/messages")
      .cookie(cookie)
      .set_json(json!({"imageDataUrl": data_url}))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[actix_web::test]
async fn checkout_then_products_flow() {
  let h = test_state();
  let product = seed_product(h.store.as_ref(), "Latte", 500).await;
  let app = spawn_app!(h.state);

  let resp = test::call_service(&app, test::TestRequest::get().uri("/products").to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["products"].as_array().unwrap().len(), 1);

  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/checkout")
      .set_json(json!({
        "name": "Aki",
        "phone": "090-1234-5678",
        "pin": "1234",
        "items": [{"productId": product.id, "qty": 2, "customText": "oat milk"}]
      }))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  let order_id = body["orderId"].as_str().unwrap();

  let order = h.store.find_order(order_id).await.unwrap().unwrap();
  assert_eq!(order.totals.revenue_cents, 1000);
  assert_eq!(order.items[0].custom_text.as_deref(), Some("oat milk"));
}
