use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A row of the `products` table.
///
/// `id` and both timestamps are assigned by the database; nothing in this
/// service writes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    /// Cost in the smallest currency unit (e.g. 29000 = $290.00)
    pub cost: i32,
    pub quantity: i32,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}
