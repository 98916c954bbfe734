use serde::{Deserialize, Serialize};

/// A registered card holder, loaded once from the roster at startup.
/// Never mutated by the scan pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Person {
    pub id: String,
    pub name: String,
    pub card_uid: String,
    pub department: Option<String>,
}
