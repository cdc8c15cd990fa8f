//! # Catalog Service
//!
//! Read access to products, coupons and the gift popup, plus the admin
//! upserts for coupons and the gift promotion.

use std::sync::Arc;

use tracing::info;

use promo_core::validation::{
    validate_coupon_code, validate_coupon_definition, validate_gift_config, validate_product_ref,
};
use promo_core::{CouponDefinition, GiftPromotionConfig, ProductSummary};

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::state::AppState;

#[derive(Clone)]
pub struct CatalogService {
    state: Arc<AppState>,
}

impl CatalogService {
    pub fn new(state: Arc<AppState>) -> Self {
        CatalogService { state }
    }

    /// Looks a product up by id or slug. Inactive products are returned
    /// as-is; only adding them to a cart is refused.
    pub async fn product(&self, id_or_slug: &str) -> ApiResult<ProductSummary> {
        validate_product_ref(id_or_slug)?;
        self.state
            .collaborators
            .product(id_or_slug)
            .await
            .map_err(|e| ApiError::new(ErrorCode::ProductUnavailable, e.to_string()))?
            .ok_or_else(|| ApiError::not_found("Product", id_or_slug))
    }

    pub async fn coupon(&self, code: &str) -> ApiResult<CouponDefinition> {
        let code = validate_coupon_code(code)?;
        self.state
            .db
            .coupons()
            .get_by_code(&code)
            .await?
            .ok_or_else(|| ApiError::not_found("Coupon", &code))
    }

    /// Creates or replaces a coupon. The path code wins over the body's.
    pub async fn upsert_coupon(
        &self,
        code: &str,
        mut definition: CouponDefinition,
    ) -> ApiResult<CouponDefinition> {
        definition.code = validate_coupon_code(code)?;
        validate_coupon_definition(&definition)?;

        self.state.db.coupons().upsert(&definition).await?;
        info!(
            code = %definition.code,
            kind = definition.discount_type.as_str(),
            active = definition.is_active,
            "Coupon saved"
        );
        Ok(definition)
    }

    pub async fn gift_popup(&self) -> ApiResult<GiftPromotionConfig> {
        self.state
            .db
            .gift_promotion()
            .get()
            .await?
            .ok_or_else(|| ApiError::not_found("Gift promotion", "current"))
    }

    /// Replaces the gift promotion. Carts pick the change up on their next
    /// recompute.
    pub async fn upsert_gift_popup(
        &self,
        config: GiftPromotionConfig,
    ) -> ApiResult<GiftPromotionConfig> {
        validate_gift_config(&config)?;

        self.state.db.gift_promotion().upsert(&config).await?;
        info!(
            active = config.active,
            min = %config.min_cart_value,
            gifts = config.gift_products.len(),
            "Gift promotion saved"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use chrono::{Duration, Utc};
    use promo_core::{DiscountKind, Money};
    use promo_db::{Database, DbConfig};

    async fn service() -> CatalogService {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        CatalogService::new(Arc::new(AppState::new(db, ApiConfig::default())))
    }

    fn definition() -> CouponDefinition {
        let now = Utc::now();
        CouponDefinition {
            code: "ignored".to_string(),
            discount_type: DiscountKind::Percentage,
            discount_amount: 1500,
            minimum_order_value: Money::major(200),
            start_date: now,
            end_date: now + Duration::days(10),
            usage_limit: None,
            usage_limit_per_user: None,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_coupon_upsert_normalises_code() {
        let service = service().await;

        let saved = service.upsert_coupon("spring15", definition()).await.unwrap();
        assert_eq!(saved.code, "SPRING15");
        assert_eq!(service.coupon("Spring15").await.unwrap(), saved);
    }

    #[tokio::test]
    async fn test_coupon_upsert_validates() {
        let service = service().await;
        let mut bad = definition();
        bad.discount_amount = 20_000;

        let err = service.upsert_coupon("TOO_MUCH", bad).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(
            service.coupon("TOO_MUCH").await.unwrap_err().code,
            ErrorCode::NotFound
        );
    }

    #[tokio::test]
    async fn test_gift_popup_round_trip() {
        let service = service().await;
        assert_eq!(service.gift_popup().await.unwrap_err().code, ErrorCode::NotFound);

        let config = GiftPromotionConfig {
            active: true,
            min_cart_value: Money::major(1000),
            max_cart_value: Some(Money::major(800)),
            max_selectable_gifts: 1,
            gift_products: vec!["mug".into()],
            title: "Gift".into(),
            sub_title: String::new(),
        };
        let err = service.upsert_gift_popup(config.clone()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let config = GiftPromotionConfig {
            max_cart_value: None,
            ..config
        };
        service.upsert_gift_popup(config.clone()).await.unwrap();
        assert_eq!(service.gift_popup().await.unwrap(), config);
    }

    #[tokio::test]
    async fn test_product_lookup() {
        let service = service().await;
        service
            .state
            .db
            .products()
            .upsert(&ProductSummary {
                id: "p-1".into(),
                slug: "black-tee".into(),
                name: "Black Tee".into(),
                price: Money::major(799),
                image_url: None,
                images: vec![],
                is_active: false,
            })
            .await
            .unwrap();

        assert_eq!(service.product("black-tee").await.unwrap().id, "p-1");
        assert_eq!(service.product("nope").await.unwrap_err().code, ErrorCode::NotFound);
    }
}
