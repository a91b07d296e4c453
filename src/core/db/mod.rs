mod counter;
mod memory;
mod model;
mod state;

use std::sync::Arc;

use sqlx::{Any, Connection};
use state::DbState;
use tracing::debug;

pub use counter::CountRepository;
pub use memory::InMemoryCountRepo;
pub use model::Backend;

use crate::error::StoreError;
use crate::models::ObjectCount;
use model::CounterRow;

/// Cumulative counts in a SQL database (SQLite or PostgreSQL).
#[derive(Debug, Clone)]
pub struct CountDb {
    state: Arc<DbState>,
}

impl CountDb {
    /// Connect to `url` (`sqlite://...` or `postgres://...`) and apply migrations.
    pub async fn new(url: &str) -> Result<Self, StoreError> {
        Ok(Self {
            state: Arc::new(DbState::new(url).await?),
        })
    }

    pub async fn close(&self) {
        self.state.close().await
    }
}

impl CountRepository for CountDb {
    async fn read_values(&self, classes: Option<&[String]>) -> Result<Vec<ObjectCount>, StoreError> {
        let mut conn = self.state.conn().await?;
        let rows: Vec<(String, i64)> = match classes {
            None => {
                sqlx::query_as::<Any, (String, i64)>(
                    "SELECT object_class, count FROM counter ORDER BY object_class ASC",
                )
                .fetch_all(&mut **conn)
                .await?
            }
            Some([]) => return Ok(Vec::new()),
            Some(classes) => {
                let placeholders = (1..=classes.len())
                    .map(|i| format!("${i}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                let sql = format!(
                    "SELECT object_class, count FROM counter WHERE object_class IN ({placeholders}) ORDER BY object_class ASC"
                );
                let mut query = sqlx::query_as::<Any, (String, i64)>(&sql);
                for class in classes {
                    query = query.bind(class.clone());
                }
                query.fetch_all(&mut **conn).await?
            }
        };
        debug!(rows = rows.len(), "read cumulative counts");

        rows.into_iter()
            .map(|(object_class, count)| ObjectCount::try_from(CounterRow { object_class, count }))
            .collect()
    }

    async fn update_values(&self, deltas: &[ObjectCount]) -> Result<(), StoreError> {
        let rows = deltas
            .iter()
            .map(CounterRow::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let mut conn = self.state.conn().await?;
        let mut tx = conn.begin().await?;
        for row in rows {
            debug!(object_class = %row.object_class, delta = row.count, "merging count");
            sqlx::query(
                r#"INSERT INTO counter (object_class, count) VALUES ($1, $2)
                ON CONFLICT (object_class) DO UPDATE SET count = counter.count + EXCLUDED.count"#,
            )
            .bind(row.object_class)
            .bind(row.count)
            .execute(&mut *tx)
            .await?;
        }
        // Dropping the transaction on an early return rolls it back.
        tx.commit().await?;
        Ok(())
    }
}
