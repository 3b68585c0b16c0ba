//! Publication of the current index generation.

use std::sync::{Arc, PoisonError, RwLock};

use super::index::TimetableIndex;

/// One published index together with its generation number.
#[derive(Debug, Clone)]
pub struct Published {
    /// Starts at 1 and increases with every publish.
    pub generation: u64,
    pub index: Arc<TimetableIndex>,
}

/// Holder of the currently served [`TimetableIndex`].
///
/// Readers take a cheap `Arc` clone and query it without holding any
/// lock, so a concurrent [`IndexHandle::publish`] never disturbs a query
/// already in progress: it keeps the generation it started with.
#[derive(Debug)]
pub struct IndexHandle {
    slot: RwLock<Published>,
}

impl IndexHandle {
    /// Create a handle serving `index` as generation 1.
    pub fn new(index: TimetableIndex) -> Self {
        Self {
            slot: RwLock::new(Published {
                generation: 1,
                index: Arc::new(index),
            }),
        }
    }

    /// The index currently served.
    pub fn current(&self) -> Arc<TimetableIndex> {
        Arc::clone(&self.snapshot_ref().index)
    }

    /// The index currently served with its generation number.
    pub fn snapshot(&self) -> Published {
        self.snapshot_ref().clone()
    }

    /// Generation number of the index currently served.
    pub fn generation(&self) -> u64 {
        self.snapshot_ref().generation
    }

    /// Replace the served index, returning the new generation number.
    pub fn publish(&self, index: TimetableIndex) -> u64 {
        let index = Arc::new(index);
        // A panicking writer cannot leave the slot half-written
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        let generation = slot.generation + 1;
        *slot = Published { generation, index };
        generation
    }

    fn snapshot_ref(&self) -> std::sync::RwLockReadGuard<'_, Published> {
        self.slot.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gtfs::{Feed, LOCATION_TYPE_STATION, Stop};

    fn index_with_station(name: &str) -> TimetableIndex {
        TimetableIndex::build(&Feed {
            stops: vec![Stop {
                id: "S".into(),
                name: name.into(),
                location_type: LOCATION_TYPE_STATION,
                ..Default::default()
            }],
            ..Default::default()
        })
    }

    #[test]
    fn publish_replaces_and_bumps_generation() {
        let handle = IndexHandle::new(index_with_station("Old"));
        assert_eq!(handle.generation(), 1);
        assert_eq!(handle.current().stop_name("S"), Some("Old"));

        let generation = handle.publish(index_with_station("New"));
        assert_eq!(generation, 2);
        assert_eq!(handle.generation(), 2);
        assert_eq!(handle.current().stop_name("S"), Some("New"));
    }

    #[test]
    fn held_reference_keeps_its_generation() {
        let handle = IndexHandle::new(index_with_station("Old"));
        let held = handle.current();

        handle.publish(index_with_station("New"));

        assert_eq!(held.stop_name("S"), Some("Old"));
        assert_eq!(handle.current().stop_name("S"), Some("New"));
    }

    #[test]
    fn independent_handles_do_not_interfere() {
        let a = IndexHandle::new(index_with_station("A"));
        let b = IndexHandle::new(index_with_station("B"));
        a.publish(index_with_station("A2"));

        assert_eq!(a.generation(), 2);
        assert_eq!(b.generation(), 1);
        assert_eq!(b.current().stop_name("S"), Some("B"));
    }

    #[test]
    fn concurrent_readers_see_whole_generations() {
        let handle = Arc::new(IndexHandle::new(index_with_station("Gen1")));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let handle = Arc::clone(&handle);
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        let snap = handle.snapshot();
                        let name = snap.index.stop_name("S").unwrap().to_string();
                        assert_eq!(name, format!("Gen{}", snap.generation));
                    }
                })
            })
            .collect();

        for g in 2..=20 {
            handle.publish(index_with_station(&format!("Gen{g}")));
        }

        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(handle.generation(), 20);
    }
}
