use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Short-lived id → name table for customers or suppliers, used to fill in
/// names the backend left out of a listing.
pub struct NameCache {
    names: HashMap<i64, String>,
    cached_at: Option<Instant>,
    ttl: Duration,
}

impl NameCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            names: HashMap::new(),
            cached_at: None,
            ttl,
        }
    }

    /// Replace the whole table.
    pub fn fill<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (i64, String)>,
    {
        self.names = entries.into_iter().collect();
        self.cached_at = Some(Instant::now());
    }

    /// Name for `id`, only while the table is within TTL.
    pub fn name(&self, id: i64) -> Option<&str> {
        if self.is_fresh() {
            self.names.get(&id).map(String::as_str)
        } else {
            None
        }
    }

    pub fn invalidate(&mut self) {
        self.names.clear();
        self.cached_at = None;
    }

    pub fn is_fresh(&self) -> bool {
        match self.cached_at {
            Some(cached_at) => cached_at.elapsed() <= self.ttl,
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
