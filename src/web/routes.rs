// src/web/routes.rs

use actix_web::web;

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Called in `main.rs` (and the test suite) to configure services for the
/// Actix App.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .route("/health", web::get().to(health_check_handler))
    // Storefront
    .route(
      "/products",
      web::get().to(crate::web::handlers::store_handlers::list_products_handler),
    )
    .route(
      "/checkout",
      web::post().to(crate::web::handlers::store_handlers::checkout_handler),
    )
    // Customer session + chat
    .service(
      web::scope("/customer")
        .route(
          "/login",
          web::post().to(crate::web::handlers::customer_handlers::login_handler),
        )
        .route(
          "/login-federated",
          web::post().to(crate::web::handlers::customer_handlers::login_federated_handler),
        )
        .route(
          "/logout",
          web::post().to(crate::web::handlers::customer_handlers::logout_handler),
        )
        .route(
          "/messages",
          web::get().to(crate::web::handlers::chat_handlers::list_messages_handler),
        )
        .route(
          "/messages",
          web::post().to(crate::web::handlers::chat_handlers::send_message_handler),
        ),
    )
    // Back office
    .service(
      web::scope("/admin")
        .route(
          "/orders",
          web::get().to(crate::web::handlers::admin_handlers::list_orders_handler),
        )
        .route(
          "/orders/{id}/mark-paid",
          web::post().to(crate::web::handlers::admin_handlers::mark_paid_handler),
        )
        .route(
          "/orders/{id}/mark-delivered",
          web::post().to(crate::web::handlers::admin_handlers::mark_delivered_handler),
        )
        .route(
          "/orders/{id}/cancel",
          web::post().to(crate::web::handlers::admin_handlers::cancel_order_handler),
        )
        .route(
          "/cash-movements",
          web::get().to(crate::web::handlers::admin_handlers::list_movements_handler),
        )
        .route(
          "/cash-movements",
          web::post().to(crate::web::handlers::admin_handlers::create_movement_handler),
        )
        .route(
          "/products",
          web::post().to(crate::web::handlers::admin_handlers::create_product_handler),
        )
        .route(
          "/products/{id}",
          web::put().to(crate::web::handlers::admin_handlers::update_product_handler),
        ),
    );
}
