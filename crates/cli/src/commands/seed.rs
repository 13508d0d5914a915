//! Demo data seeding command.
//!
//! Inserts a handful of products and published articles so a fresh install
//! has something to show.

use tracing::info;

use kiosk_core::Price;
use kiosk_web::db::{ArticleRepository, ProductRepository};
use kiosk_web::models::{NewArticle, NewProduct};

/// Demo products: name, description, price, quantity.
const PRODUCTS: &[(&str, &str, &str, i32)] = &[
    ("Laptop", "A dependable workhorse laptop.", "1999.00", 12),
    ("Desktop", "Tower desktop with room to grow.", "2999.00", 4),
    ("Smartphone", "Fits in a pocket, mostly.", "999.00", 30),
];

/// Demo articles: title, content.
const ARTICLES: &[(&str, &str)] = &[
    (
        "Welcome to the shop",
        "We opened the doors today. Laptops, desktops, and smartphones are \
         in stock; orders ship the next business day.",
    ),
    (
        "Spring restock",
        "The spring restock has landed. Quantities are limited on the \
         desktop line, so order early.",
    ),
];

/// Seed the database with demo data.
///
/// # Errors
///
/// Returns an error on invalid demo data or database failure.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;

    let products = ProductRepository::new(&pool);
    for (name, description, price, quantity) in PRODUCTS {
        let product = products
            .create(&NewProduct {
                name: (*name).to_string(),
                description: (*description).to_string(),
                price: Price::parse(price)?,
                quantity: *quantity,
                has_extended_warranty: false,
                archived: false,
                preview_path: None,
                created_by: None,
            })
            .await?;
        info!(product_id = %product.id, name, "seeded product");
    }

    let articles = ArticleRepository::new(&pool);
    let author = articles.create_author("The Kiosk Team", "We run the shop.").await?;
    let category = articles.create_category("News").await?;
    let tag = articles.create_tag("shop").await?;

    for (title, content) in ARTICLES {
        let article = articles
            .create(&NewArticle {
                title: (*title).to_string(),
                content: (*content).to_string(),
                author_id: Some(author.id),
                category_id: Some(category.id),
                tag_ids: vec![tag.id],
                publish: true,
            })
            .await?;
        info!(article_id = %article.id, title, "seeded article");
    }

    info!("Seeding complete!");
    Ok(())
}
