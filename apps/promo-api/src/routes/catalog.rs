//! Product, coupon and gift popup handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use tracing::debug;

use promo_core::{CouponDefinition, GiftPromotionConfig, ProductSummary};

use crate::error::ApiResult;
use crate::services::CatalogService;
use crate::state::AppState;

pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id_or_slug): Path<String>,
) -> ApiResult<Json<ProductSummary>> {
    debug!(id_or_slug = %id_or_slug, "get_product");
    Ok(Json(CatalogService::new(state).product(&id_or_slug).await?))
}

pub async fn get_coupon(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> ApiResult<Json<CouponDefinition>> {
    debug!(code = %code, "get_coupon");
    Ok(Json(CatalogService::new(state).coupon(&code).await?))
}

pub async fn put_coupon(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Json(definition): Json<CouponDefinition>,
) -> ApiResult<Json<CouponDefinition>> {
    Ok(Json(
        CatalogService::new(state)
            .upsert_coupon(&code, definition)
            .await?,
    ))
}

pub async fn get_gift_popup(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<GiftPromotionConfig>> {
    Ok(Json(CatalogService::new(state).gift_popup().await?))
}

pub async fn put_gift_popup(
    State(state): State<Arc<AppState>>,
    Json(config): Json<GiftPromotionConfig>,
) -> ApiResult<Json<GiftPromotionConfig>> {
    Ok(Json(
        CatalogService::new(state).upsert_gift_popup(config).await?,
    ))
}
