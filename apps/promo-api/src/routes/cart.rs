//! # Cart Handlers
//!
//! Thin wrappers: extract, call [`CartService`], serialize the snapshot.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌──────────┐     ┌──────────┐     ┌──────────────┐     ┌──────────┐    │
//! │  │  Empty   │────►│ In Cart  │────►│ Coupon/Gifts │────►│ Checkout │    │
//! │  │  Cart    │     │          │     │              │     │          │    │
//! │  └──────────┘     └──────────┘     └──────────────┘     └──────────┘    │
//! │                    add_item          apply_coupon        records the    │
//! │                    update_item       toggle_gift         redemption,    │
//! │                    remove_item       dismiss offer       deletes cart   │
//! │                        │                                                │
//! │                        ▼                                                │
//! │                    clear_cart ─────► (back to empty)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use tracing::debug;

use promo_core::PromotionSnapshot;

use super::USER_ID_HEADER;
use crate::error::ApiResult;
use crate::services::CartService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_ref: String,
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyCouponRequest {
    pub code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleGiftRequest {
    pub product_ref: String,
}

type SnapshotResult = ApiResult<Json<PromotionSnapshot>>;

fn user_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub async fn get_cart(
    State(state): State<Arc<AppState>>,
    Path(cart_id): Path<String>,
) -> SnapshotResult {
    debug!(cart_id = %cart_id, "get_cart");
    Ok(Json(CartService::new(state).snapshot(&cart_id).await?))
}

pub async fn add_item(
    State(state): State<Arc<AppState>>,
    Path(cart_id): Path<String>,
    Json(request): Json<AddItemRequest>,
) -> SnapshotResult {
    debug!(cart_id = %cart_id, product = %request.product_ref, "add_item");
    Ok(Json(
        CartService::new(state)
            .add_item(&cart_id, &request.product_ref, request.quantity)
            .await?,
    ))
}

pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Path((cart_id, item_id)): Path<(String, String)>,
    Json(request): Json<UpdateItemRequest>,
) -> SnapshotResult {
    debug!(cart_id = %cart_id, item_id = %item_id, quantity = request.quantity, "update_item");
    Ok(Json(
        CartService::new(state)
            .update_quantity(&cart_id, &item_id, request.quantity)
            .await?,
    ))
}

pub async fn remove_item(
    State(state): State<Arc<AppState>>,
    Path((cart_id, item_id)): Path<(String, String)>,
) -> SnapshotResult {
    debug!(cart_id = %cart_id, item_id = %item_id, "remove_item");
    Ok(Json(
        CartService::new(state)
            .remove_item(&cart_id, &item_id)
            .await?,
    ))
}

pub async fn clear_cart(
    State(state): State<Arc<AppState>>,
    Path(cart_id): Path<String>,
) -> SnapshotResult {
    debug!(cart_id = %cart_id, "clear_cart");
    Ok(Json(CartService::new(state).clear(&cart_id).await?))
}

pub async fn apply_coupon(
    State(state): State<Arc<AppState>>,
    Path(cart_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<ApplyCouponRequest>,
) -> SnapshotResult {
    debug!(cart_id = %cart_id, code = %request.code, "apply_coupon");
    let user = user_id(&headers);
    Ok(Json(
        CartService::new(state)
            .apply_coupon(&cart_id, &request.code, user.as_deref())
            .await?,
    ))
}

pub async fn remove_coupon(
    State(state): State<Arc<AppState>>,
    Path(cart_id): Path<String>,
) -> SnapshotResult {
    debug!(cart_id = %cart_id, "remove_coupon");
    Ok(Json(CartService::new(state).remove_coupon(&cart_id).await?))
}

pub async fn toggle_gift(
    State(state): State<Arc<AppState>>,
    Path(cart_id): Path<String>,
    Json(request): Json<ToggleGiftRequest>,
) -> SnapshotResult {
    debug!(cart_id = %cart_id, product = %request.product_ref, "toggle_gift");
    Ok(Json(
        CartService::new(state)
            .toggle_gift(&cart_id, &request.product_ref)
            .await?,
    ))
}

pub async fn dismiss_gift_offer(
    State(state): State<Arc<AppState>>,
    Path(cart_id): Path<String>,
) -> SnapshotResult {
    debug!(cart_id = %cart_id, "dismiss_gift_offer");
    Ok(Json(
        CartService::new(state)
            .dismiss_gift_offer(&cart_id)
            .await?,
    ))
}

pub async fn checkout(
    State(state): State<Arc<AppState>>,
    Path(cart_id): Path<String>,
    headers: HeaderMap,
) -> SnapshotResult {
    debug!(cart_id = %cart_id, "checkout");
    let user = user_id(&headers);
    Ok(Json(
        CartService::new(state)
            .checkout(&cart_id, user.as_deref())
            .await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_user_id_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(user_id(&headers), None);

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("  "));
        assert_eq!(user_id(&headers), None);

        headers.insert(USER_ID_HEADER, HeaderValue::from_static(" alice "));
        assert_eq!(user_id(&headers), Some("alice".to_string()));
    }

    #[test]
    fn test_add_item_request_quantity_optional() {
        let request: AddItemRequest = serde_json::from_str(r#"{"productRef":"tee"}"#).unwrap();
        assert_eq!(request.product_ref, "tee");
        assert_eq!(request.quantity, None);
    }
}
