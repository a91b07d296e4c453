use std::collections::BTreeMap;
use std::sync::Mutex;

use super::counter::CountRepository;
use crate::error::StoreError;
use crate::models::ObjectCount;

/// Process-local count store. A batch is applied under a single lock.
#[derive(Debug, Default)]
pub struct InMemoryCountRepo {
    counts: Mutex<BTreeMap<String, u64>>,
}

impl InMemoryCountRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_counts(initial: impl IntoIterator<Item = ObjectCount>) -> Self {
        let counts = initial
            .into_iter()
            .map(|c| (c.object_class, c.count))
            .collect();
        Self {
            counts: Mutex::new(counts),
        }
    }
}

impl CountRepository for InMemoryCountRepo {
    async fn read_values(&self, classes: Option<&[String]>) -> Result<Vec<ObjectCount>, StoreError> {
        let counts = self.counts.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(counts
            .iter()
            .filter(|(class, _)| classes.is_none_or(|wanted| wanted.contains(*class)))
            .map(|(class, count)| ObjectCount::new(class.clone(), *count))
            .collect())
    }

    async fn update_values(&self, deltas: &[ObjectCount]) -> Result<(), StoreError> {
        let mut counts = self.counts.lock().map_err(|_| StoreError::Poisoned)?;

        // Compute every new total first so an overflow leaves the map untouched.
        let mut staged = BTreeMap::new();
        for delta in deltas {
            let current = staged
                .get(&delta.object_class)
                .or_else(|| counts.get(&delta.object_class))
                .copied()
                .unwrap_or(0);
            let total = current
                .checked_add(delta.count)
                .filter(|total| i64::try_from(*total).is_ok())
                .ok_or_else(|| StoreError::CountOutOfRange {
                    object_class: delta.object_class.clone(),
                })?;
            staged.insert(delta.object_class.clone(), total);
        }
        counts.extend(staged);
        Ok(())
    }
}
