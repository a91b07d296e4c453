use crate::error::StoreError;
use crate::models::ObjectCount;

/// Database engine behind a connection url.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    Postgres,
}

impl TryFrom<&str> for Backend {
    type Error = StoreError;

    fn try_from(url: &str) -> Result<Self, Self::Error> {
        if url.starts_with("sqlite:") {
            Ok(Backend::Sqlite)
        } else if url.starts_with("postgres:") || url.starts_with("postgresql:") {
            Ok(Backend::Postgres)
        } else {
            Err(StoreError::UnsupportedUrl(url.to_string()))
        }
    }
}

/// Row of the `counter` table.
#[derive(Debug, Clone)]
pub(super) struct CounterRow {
    pub object_class: String,
    pub count: i64,
}

impl TryFrom<CounterRow> for ObjectCount {
    type Error = StoreError;

    fn try_from(row: CounterRow) -> Result<Self, Self::Error> {
        let count = u64::try_from(row.count).map_err(|_| StoreError::CountOutOfRange {
            object_class: row.object_class.clone(),
        })?;
        Ok(ObjectCount {
            object_class: row.object_class,
            count,
        })
    }
}

impl TryFrom<&ObjectCount> for CounterRow {
    type Error = StoreError;

    fn try_from(value: &ObjectCount) -> Result<Self, Self::Error> {
        let count = i64::try_from(value.count).map_err(|_| StoreError::CountOutOfRange {
            object_class: value.object_class.clone(),
        })?;
        Ok(CounterRow {
            object_class: value.object_class.clone(),
            count,
        })
    }
}
