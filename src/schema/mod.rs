use sqlx::migrate::MigrateError;
use sqlx::PgPool;
use tracing::info;

use crate::models::Product;

/// Fixture rows loaded by `seed`: (name, cost, quantity).
static FIXTURES: &[(&str, i32, i32)] = &[("Iphone", 29000, 1), ("McDonalds Toys", 75, 120)];

/// Apply every pending migration under `./migrations`.
pub async fn migrate(pool: &PgPool) -> Result<(), MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Replace the contents of `products` with the fixture rows.
///
/// Runs in one transaction, so running it twice leaves exactly the fixtures.
pub async fn seed(pool: &PgPool) -> Result<Vec<Product>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let removed = sqlx::query("DELETE FROM products")
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let mut products = Vec::with_capacity(FIXTURES.len());
    for &(name, cost, quantity) in FIXTURES {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, cost, quantity)
            VALUES ($1, $2, $3)
            RETURNING id, name, cost, quantity, date_created, date_updated
            "#,
        )
        .bind(name)
        .bind(cost)
        .bind(quantity)
        .fetch_one(&mut *tx)
        .await?;
        products.push(product);
    }

    tx.commit().await?;

    info!(removed, inserted = products.len(), "Seeded products");
    Ok(products)
}
