//! # Seed Data Generator
//!
//! Populates a database with a demo catalog, coupons and a gift promotion.
//!
//! ## Usage
//! ```bash
//! # Seed ./promo_dev.db
//! cargo run -p promo-db --bin seed
//!
//! # Specify database path
//! cargo run -p promo-db --bin seed -- --db ./data/promo.db
//! ```
//!
//! ## Generated Data
//! - Apparel and accessories products, priced in whole units
//! - `SAVE10`: 10% off orders of 1000.00 or more, once per user
//! - `FLAT500`: 500.00 off, 100 redemptions overall
//! - `SUMMER25`: expired 25% coupon (for testing rejections)
//! - Gift promotion: pick up to 2 gifts on orders from 1500.00

use chrono::{Duration, Utc};
use std::env;

use promo_core::{CouponDefinition, DiscountKind, GiftPromotionConfig, Money, ProductSummary};
use promo_db::migrations::migration_status;
use promo_db::{Database, DbConfig};

/// (slug, name, price in whole units)
const PRODUCTS: &[(&str, &str, i64)] = &[
    ("black-tee", "Black Tee", 799),
    ("white-tee", "White Tee", 799),
    ("denim-jacket", "Denim Jacket", 3499),
    ("chinos", "Slim Chinos", 1899),
    ("hoodie", "Zip Hoodie", 2299),
    ("sneakers", "Canvas Sneakers", 2999),
    ("cap", "Logo Cap", 499),
    ("belt", "Leather Belt", 999),
];

/// Zero-value items only ever handed out as gifts.
const GIFTS: &[(&str, &str)] = &[
    ("gift-mug", "Enamel Mug"),
    ("gift-tote", "Canvas Tote"),
    ("gift-socks", "Crew Socks"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./promo_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Promo Engine Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./promo_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Seeding {}", db_path);
    let db = Database::new(DbConfig::new(&db_path)).await?;

    let (total, applied) = migration_status(db.pool()).await?;
    println!("  ✓ migrations {}/{}", applied, total);

    for (slug, name, price) in PRODUCTS {
        db.products().upsert(&product(slug, name, Money::major(*price))).await?;
    }
    for (slug, name) in GIFTS {
        db.products().upsert(&product(slug, name, Money::zero())).await?;
    }
    let active = db.products().list_active(100).await?;
    println!("  ✓ {} products ({} active)", PRODUCTS.len() + GIFTS.len(), active.len());

    let now = Utc::now();
    let coupons = [
        CouponDefinition {
            code: "SAVE10".to_string(),
            discount_type: DiscountKind::Percentage,
            discount_amount: 1000,
            minimum_order_value: Money::major(1000),
            start_date: now - Duration::days(1),
            end_date: now + Duration::days(90),
            usage_limit: None,
            usage_limit_per_user: Some(1),
            is_active: true,
        },
        CouponDefinition {
            code: "FLAT500".to_string(),
            discount_type: DiscountKind::Fixed,
            discount_amount: Money::major(500).cents(),
            minimum_order_value: Money::zero(),
            start_date: now - Duration::days(1),
            end_date: now + Duration::days(30),
            usage_limit: Some(100),
            usage_limit_per_user: None,
            is_active: true,
        },
        CouponDefinition {
            code: "SUMMER25".to_string(),
            discount_type: DiscountKind::Percentage,
            discount_amount: 2500,
            minimum_order_value: Money::zero(),
            start_date: now - Duration::days(120),
            end_date: now - Duration::days(30),
            usage_limit: None,
            usage_limit_per_user: None,
            is_active: true,
        },
    ];
    for coupon in &coupons {
        db.coupons().upsert(coupon).await?;
    }
    println!("  ✓ {} coupons", coupons.len());

    db.gift_promotion()
        .upsert(&GiftPromotionConfig {
            active: true,
            min_cart_value: Money::major(1500),
            max_cart_value: None,
            max_selectable_gifts: 2,
            gift_products: GIFTS.iter().map(|(slug, _)| slug.to_string()).collect(),
            title: "Pick your free gifts".to_string(),
            sub_title: "Orders over 1500.00 get up to two gifts".to_string(),
        })
        .await?;
    println!("  ✓ gift promotion");

    println!();
    println!("✓ Seed complete!");
    Ok(())
}

/// Builds a product whose id and slug are the same string.
fn product(slug: &str, name: &str, price: Money) -> ProductSummary {
    ProductSummary {
        id: slug.to_string(),
        slug: slug.to_string(),
        name: name.to_string(),
        price,
        image_url: Some(format!("/images/{slug}.jpg")),
        images: vec![format!("/images/{slug}-1.jpg"), format!("/images/{slug}-2.jpg")],
        is_active: true,
    }
}
