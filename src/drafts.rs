use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::forms::flow::FormFlow;

pub type DraftHandle = Arc<Mutex<FormFlow>>;

struct DraftEntry {
    flow: DraftHandle,
    touched: Instant,
}

/// Drafts of visitors currently filling in a form, each behind its own lock.
pub struct DraftStore {
    drafts: DashMap<Uuid, DraftEntry>,
    ttl: Duration,
}

impl DraftStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            drafts: DashMap::new(),
            ttl,
        }
    }

    pub fn insert(&self, flow: FormFlow) -> (Uuid, DraftHandle) {
        let id = Uuid::now_v7();
        let handle = Arc::new(Mutex::new(flow));
        self.drafts.insert(
            id,
            DraftEntry {
                flow: handle.clone(),
                touched: Instant::now(),
            },
        );
        (id, handle)
    }

    /// Look up a draft and mark it as recently used.
    pub fn get(&self, id: Uuid) -> Option<DraftHandle> {
        let mut entry = self.drafts.get_mut(&id)?;
        entry.touched = Instant::now();
        Some(entry.flow.clone())
    }

    pub fn remove(&self, id: Uuid) -> bool {
        self.drafts.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    /// Drop drafts untouched for longer than the TTL. A request still holding
    /// a handle keeps working on its copy of the `Arc`.
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.drafts.len();
        self.drafts
            .retain(|_, entry| now.duration_since(entry.touched) < self.ttl);
        before.saturating_sub(self.drafts.len())
    }
}
