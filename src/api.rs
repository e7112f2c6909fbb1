//! HTTP surface over the cart session

use axum::{extract::{Path, State}, http::StatusCode, routing::{get, post, put}, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::domain::aggregates::{CartSummary, LineItemCandidate};
use crate::domain::checkout;
use crate::domain::pricing::ShippingRate;
use crate::domain::value_objects::Money;
use crate::session::CartSession;

#[derive(Clone)]
pub struct AppState { pub session: Arc<Mutex<CartSession>> }

impl AppState {
    pub fn new(session: CartSession) -> Self { Self { session: Arc::new(Mutex::new(session)) } }
}

type ApiResult<T> = Result<T, (StatusCode, String)>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "storefront-cart"})) }))
        .route("/api/v1/cart", get(get_cart).delete(clear_cart))
        .route("/api/v1/cart/items", post(add_item))
        .route("/api/v1/cart/items/:id", put(update_item).delete(remove_item))
        .route("/api/v1/cart/items/:id/wishlist", post(move_to_wishlist))
        .route("/api/v1/cart/promo", post(apply_promo))
        .route("/api/v1/cart/shipping", put(set_shipping))
        .route("/api/v1/shipping-options", get(shipping_options))
        .route("/api/v1/checkout", post(start_checkout))
        .layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()).with_state(state)
}

async fn get_cart(State(s): State<AppState>) -> Json<CartSummary> {
    Json(s.session.lock().await.cart().summary())
}

async fn clear_cart(State(s): State<AppState>) -> Json<CartSummary> {
    let mut session = s.session.lock().await;
    session.clear_cart();
    Json(session.cart().summary())
}

async fn add_item(State(s): State<AppState>, Json(r): Json<LineItemCandidate>) -> ApiResult<Json<CartSummary>> {
    let mut session = s.session.lock().await;
    session.try_add_to_cart(r).map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;
    Ok(Json(session.cart().summary()))
}

#[derive(Debug, Deserialize)] pub struct UpdateQuantityRequest { pub quantity: i64 }

async fn update_item(State(s): State<AppState>, Path(id): Path<String>, Json(r): Json<UpdateQuantityRequest>) -> ApiResult<Json<CartSummary>> {
    if r.quantity < 1 { return Err((StatusCode::UNPROCESSABLE_ENTITY, "quantity must be at least 1".to_string())); }
    let mut session = s.session.lock().await;
    if session.cart().item(&id).is_none() { return Err((StatusCode::NOT_FOUND, "Not found".to_string())); }
    session.update_quantity(&id, r.quantity);
    Ok(Json(session.cart().summary()))
}

async fn remove_item(State(s): State<AppState>, Path(id): Path<String>) -> Json<CartSummary> {
    let mut session = s.session.lock().await;
    session.remove_from_cart(&id);
    Json(session.cart().summary())
}

async fn move_to_wishlist(State(s): State<AppState>, Path(id): Path<String>) -> Json<CartSummary> {
    let mut session = s.session.lock().await;
    session.move_to_wishlist(&id);
    Json(session.cart().summary())
}

#[derive(Debug, Deserialize)] pub struct PromoRequest { pub code: String }
#[derive(Debug, Serialize, Deserialize)] pub struct PromoResponse { pub applied: bool, pub cart: CartSummary }

async fn apply_promo(State(s): State<AppState>, Json(r): Json<PromoRequest>) -> Json<PromoResponse> {
    let mut session = s.session.lock().await;
    let applied = session.apply_promo_code(&r.code);
    Json(PromoResponse { applied, cart: session.cart().summary() })
}

#[derive(Debug, Deserialize)] pub struct ShippingRequest { pub option: String }

async fn set_shipping(State(s): State<AppState>, Json(r): Json<ShippingRequest>) -> Json<CartSummary> {
    let mut session = s.session.lock().await;
    session.set_shipping_option(r.option);
    Json(session.cart().summary())
}

async fn shipping_options(State(s): State<AppState>) -> Json<Vec<ShippingRate>> {
    Json(s.session.lock().await.cart().pricing().shipping_rates().to_vec())
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")] pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")] pub total: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")] pub error: Option<String>,
}

async fn start_checkout(State(s): State<AppState>) -> (StatusCode, Json<CheckoutResponse>) {
    let (pending, delay) = {
        let session = s.session.lock().await;
        (session.prepare_checkout(), session.checkout_delay())
    };
    let result = match pending {
        Ok(pending) => checkout::submit(pending, delay).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(receipt) => (StatusCode::OK, Json(CheckoutResponse { success: true, order_id: Some(receipt.order_id), total: Some(receipt.total), error: None })),
        Err(e) => (StatusCode::BAD_REQUEST, Json(CheckoutResponse { success: false, order_id: None, total: None, error: Some(e.to_string()) })),
    }
}
