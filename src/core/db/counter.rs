use std::future::Future;

use crate::error::StoreError;
use crate::models::ObjectCount;

/// Persisted cumulative counts, one row per object class.
pub trait CountRepository {
    /// Read cumulative counts, restricted to `classes` when given.
    fn read_values(
        &self,
        classes: Option<&[String]>,
    ) -> impl Future<Output = Result<Vec<ObjectCount>, StoreError>>;

    /// Add every delta to its class's stored count, inserting missing classes.
    ///
    /// All deltas are applied or none are. Increments are additive, so
    /// concurrent updates of the same class are never lost.
    fn update_values(
        &self,
        deltas: &[ObjectCount],
    ) -> impl Future<Output = Result<(), StoreError>>;
}
