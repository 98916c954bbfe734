use async_trait::async_trait;
use chrono::NaiveTime;
use sqlx::{Sqlite, SqlitePool};

use crate::model::{AttendanceRecord, PendingMutation, RecordKey, Slot};
use crate::persist::{AttendanceStore, StoreError};

/// Document-over-sqlite attendance store. One row per `{person_id}_{date}`
/// key; batches commit inside a single transaction so a batch is
/// all-or-nothing.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn exec_set<'e, E>(executor: E, record: &AttendanceRecord) -> Result<(), sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO attendance
                (doc_key, person_id, person_name, date,
                 time_in_am, time_out_am, time_in_pm, time_out_pm)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(doc_key) DO UPDATE SET
                person_name = excluded.person_name,
                time_in_am = excluded.time_in_am,
                time_out_am = excluded.time_out_am,
                time_in_pm = excluded.time_in_pm,
                time_out_pm = excluded.time_out_pm
            "#,
        )
        .bind(record.key().doc_key())
        .bind(&record.person_id)
        .bind(&record.person_name)
        .bind(record.date)
        .bind(record.time_in_am)
        .bind(record.time_out_am)
        .bind(record.time_in_pm)
        .bind(record.time_out_pm)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Field update with upsert: a patch landing before (or instead of) its
    /// create still leaves a row carrying the stamped slot.
    async fn exec_update<'e, E>(
        executor: E,
        key: &RecordKey,
        slot: Slot,
        time: NaiveTime,
    ) -> Result<(), sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        // column name comes from Slot::column(), a fixed set of identifiers
        let sql = format!(
            r#"
            INSERT INTO attendance (doc_key, person_id, person_name, date, {col})
            VALUES (?, ?, '', ?, ?)
            ON CONFLICT(doc_key) DO UPDATE SET {col} = excluded.{col}
            "#,
            col = slot.column()
        );

        sqlx::query(&sql)
            .bind(key.doc_key())
            .bind(&key.person_id)
            .bind(key.date)
            .bind(time)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn fetch(&self, key: &RecordKey) -> Result<Option<AttendanceRecord>, StoreError> {
        let record = sqlx::query_as::<_, AttendanceRecord>(
            r#"
            SELECT person_id, person_name, date,
                   time_in_am, time_out_am, time_in_pm, time_out_pm
            FROM attendance WHERE doc_key = ?
            "#,
        )
        .bind(key.doc_key())
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }
}

#[async_trait]
impl AttendanceStore for SqliteStore {
    async fn set(&self, record: &AttendanceRecord) -> Result<(), StoreError> {
        Self::exec_set(&self.pool, record).await?;
        Ok(())
    }

    async fn update(
        &self,
        key: &RecordKey,
        slot: Slot,
        time: NaiveTime,
    ) -> Result<(), StoreError> {
        Self::exec_update(&self.pool, key, slot, time).await?;
        Ok(())
    }

    async fn commit_batch(&self, ops: &[PendingMutation]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        for op in ops {
            match op {
                PendingMutation::Create(record) => {
                    Self::exec_set(&mut *tx, record).await?;
                }
                PendingMutation::Patch { key, slot, time } => {
                    Self::exec_update(&mut *tx, key, *slot, *time).await?;
                }
            }
        }

        tx.commit().await?;
        Ok(())
    }
}
