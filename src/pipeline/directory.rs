use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use futures::StreamExt;
use sqlx::SqlitePool;
use tracing::info;

use crate::model::Person;

/// Immutable card-to-person mapping, populated once before the scan loop
/// starts. Roster changes happen out of band and take effect on restart.
pub struct PersonDirectory {
    by_card: HashMap<String, Person>,
}

impl PersonDirectory {
    pub fn new(people: impl IntoIterator<Item = Person>) -> Self {
        let by_card = people
            .into_iter()
            .map(|p| (p.card_uid.to_uppercase(), p))
            .collect();
        Self { by_card }
    }

    pub fn lookup(&self, card_uid: &str) -> Option<&Person> {
        self.by_card.get(card_uid)
    }

    pub fn len(&self) -> usize {
        self.by_card.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_card.is_empty()
    }

    /// Stream the full roster out of the users table.
    pub async fn load(pool: &SqlitePool) -> Result<Self> {
        let mut stream = sqlx::query_as::<_, Person>(
            "SELECT id, name, card_uid, department FROM users",
        )
        .fetch(pool);

        let mut people = Vec::new();

        while let Some(row) = stream.next().await {
            let person = row.map_err(|e| anyhow!("roster row fetch failed: {}", e))?;
            people.push(person);
        }

        let directory = Self::new(people);
        info!("Roster load complete: {} registered cards", directory.len());
        Ok(directory)
    }

    /// Load a roster from a JSON file (dev setups without a prepared db).
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read roster file {}", path.display()))?;
        let people: Vec<Person> = serde_json::from_str(&raw)
            .with_context(|| format!("invalid roster file {}", path.display()))?;

        let directory = Self::new(people);
        info!(
            "Roster file load complete: {} registered cards from {}",
            directory.len(),
            path.display()
        );
        Ok(directory)
    }

    /// Built-in roster for the memory backend, so the binary runs end to
    /// end without hardware or a prepared database.
    pub fn simulated() -> Self {
        let users = [
            ("user1", "John Doe", "12345678", "CCIS"),
            ("user2", "Jane Smith", "87654321", "COE"),
            ("user3", "Mike Johnson", "11223344", "CAS"),
        ];

        Self::new(users.into_iter().map(|(id, name, card_uid, dept)| Person {
            id: id.to_string(),
            name: name.to_string(),
            card_uid: card_uid.to_string(),
            department: Some(dept.to_string()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn lookup_is_keyed_by_uppercase_uid() {
        let directory = PersonDirectory::new([Person {
            id: "user1".to_string(),
            name: "Jane Doe".to_string(),
            card_uid: "abcd1234".to_string(),
            department: None,
        }]);

        assert!(directory.lookup("ABCD1234").is_some());
        assert!(directory.lookup("DEADBEEF").is_none());
    }

    #[test]
    fn loads_roster_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id":"user1","name":"Jane Doe","card_uid":"ABCD1234","department":null}}]"#
        )
        .unwrap();

        let directory = PersonDirectory::from_json_file(file.path()).unwrap();
        assert_eq!(directory.len(), 1);
        assert_eq!(directory.lookup("ABCD1234").unwrap().name, "Jane Doe");
    }

    #[tokio::test]
    async fn loads_roster_from_users_table() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}/attendance.db", dir.path().display());
        let pool = crate::db::init_db(&url).await;

        sqlx::query("INSERT INTO users (id, name, card_uid, department) VALUES (?, ?, ?, ?)")
            .bind("user1")
            .bind("Jane Doe")
            .bind("abcd1234")
            .bind(Some("COE"))
            .execute(&pool)
            .await
            .unwrap();

        let directory = PersonDirectory::load(&pool).await.unwrap();

        assert_eq!(directory.len(), 1);
        // stored lowercase, resolved through the normalized index
        assert_eq!(directory.lookup("ABCD1234").unwrap().name, "Jane Doe");
    }

    #[test]
    fn simulated_roster_has_reference_cards() {
        let directory = PersonDirectory::simulated();
        assert_eq!(directory.lookup("12345678").unwrap().name, "John Doe");
        assert_eq!(directory.len(), 3);
    }
}
