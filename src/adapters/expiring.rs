//! TTL wrapper shared by the in-memory stores.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use crate::domain::foundation::Timestamp;

#[derive(Debug, Clone)]
pub struct Expiring<T> {
    value: T,
    expires_at: Timestamp,
}

impl<T> Expiring<T> {
    pub fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Timestamp::now().plus(ttl),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.has_passed()
    }

    /// The value, unless it has expired.
    pub fn live(&self) -> Option<&T> {
        (!self.is_expired()).then_some(&self.value)
    }

    pub fn live_mut(&mut self) -> Option<&mut T> {
        if self.is_expired() {
            None
        } else {
            Some(&mut self.value)
        }
    }

    pub fn into_live(self) -> Option<T> {
        (!self.is_expired()).then_some(self.value)
    }

    /// Pushes the expiry out to `ttl` from now.
    pub fn refresh(&mut self, ttl: Duration) {
        self.expires_at = Timestamp::now().plus(ttl);
    }
}

/// Drops every expired entry of `map`.
pub fn evict_expired<K: Eq + Hash, T>(map: &mut HashMap<K, Expiring<T>>) {
    map.retain(|_, entry| !entry.is_expired());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_entry_is_live() {
        let entry = Expiring::new(3, Duration::from_secs(60));
        assert_eq!(entry.live(), Some(&3));
    }

    #[test]
    fn zero_ttl_expires() {
        let entry = Expiring::new(3, Duration::ZERO);
        std::thread::sleep(Duration::from_millis(2));
        assert!(entry.is_expired());
        assert_eq!(entry.into_live(), None);
    }

    #[test]
    fn evict_expired_keeps_live_entries() {
        let mut map = HashMap::new();
        map.insert("stale", Expiring::new(1, Duration::ZERO));
        map.insert("live", Expiring::new(2, Duration::from_secs(60)));
        std::thread::sleep(Duration::from_millis(2));

        evict_expired(&mut map);

        assert_eq!(map.len(), 1);
        assert!(map.contains_key("live"));
    }

    #[test]
    fn refresh_revives_entry() {
        let mut entry = Expiring::new(3, Duration::ZERO);
        std::thread::sleep(Duration::from_millis(2));
        entry.refresh(Duration::from_secs(60));
        assert_eq!(entry.live_mut().copied(), Some(3));
    }
}
