// Per-listing guard so a second verify/retry submit does not start another backend run

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard},
};

#[derive(Debug, Default)]
pub struct InFlight {
    ids: Mutex<HashSet<i64>>,
}

impl InFlight {
    /// Claims `id`, or returns `None` while another request holds it.
    /// The claim is released when the returned guard is dropped.
    pub fn try_begin(self: &Arc<Self>, id: i64) -> Option<InFlightGuard> {
        if !self.lock().insert(id) {
            tracing::debug!("Verification for listing {} already running", id);
            return None;
        }
        Some(InFlightGuard { owner: Arc::clone(self), id })
    }

    pub fn is_running(&self, id: i64) -> bool {
        self.lock().contains(&id)
    }

    // A panic while holding the lock leaves the set itself consistent
    fn lock(&self) -> MutexGuard<'_, HashSet<i64>> {
        self.ids.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug)]
pub struct InFlightGuard {
    owner: Arc<InFlight>,
    id: i64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.owner.lock().remove(&self.id);
    }
}
