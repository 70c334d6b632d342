use std::sync::{Arc, Mutex};

use crate::notification::domain::face_snapshot::FaceSnapshot;

/// Latest published snapshot, swapped atomically as a whole.
///
/// Readers get a cheap `Arc` clone and never observe a half-updated
/// snapshot.
#[derive(Default)]
pub struct SnapshotCell {
    current: Mutex<Arc<FaceSnapshot>>,
}

impl SnapshotCell {
    pub fn new(initial: FaceSnapshot) -> Self {
        Self {
            current: Mutex::new(Arc::new(initial)),
        }
    }

    pub fn load(&self) -> Arc<FaceSnapshot> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn store(&self, snapshot: Arc<FaceSnapshot>) {
        *self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = snapshot;
    }
}
