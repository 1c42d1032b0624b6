/*!

The `index` module keeps a lookup table from instance name to the clients that track an instance of
that name. The agent matcher uses it instead of scanning every instance of every profile.

!*/

use cloud_model::ProfileId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

/// Identifies one `CloudClient` within an index. A profile that is reloaded gets a new client with
/// a new token, so the old client can be disposed without touching the new client's entries.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ClientToken(u64);

#[derive(Clone, Debug, Eq, PartialEq)]
struct Entry {
    profile_id: ProfileId,
    token: ClientToken,
}

/// Instance name → owning (profile, client) entries, in the order the instances were added.
#[derive(Debug, Default)]
pub struct InstanceIndex {
    next_token: AtomicU64,
    entries: RwLock<HashMap<String, Vec<Entry>>>,
}

impl InstanceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out a token for a new client.
    pub fn register_client(&self) -> ClientToken {
        ClientToken(self.next_token.fetch_add(1, Ordering::Relaxed))
    }

    pub fn insert(&self, name: &str, profile_id: &str, token: ClientToken) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let owners = entries.entry(name.to_string()).or_default();
        if !owners.iter().any(|e| e.token == token) {
            owners.push(Entry {
                profile_id: profile_id.to_string(),
                token,
            });
        }
    }

    pub fn remove(&self, name: &str, token: ClientToken) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(owners) = entries.get_mut(name) {
            owners.retain(|e| e.token != token);
            if owners.is_empty() {
                entries.remove(name);
            }
        }
    }

    /// Drop every entry that belongs to the client holding `token`.
    pub fn remove_client(&self, token: ClientToken) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, owners| {
            owners.retain(|e| e.token != token);
            !owners.is_empty()
        });
    }

    /// The profiles that track an instance called `name`, without duplicates, oldest first.
    pub fn lookup(&self, name: &str) -> Vec<ProfileId> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut profiles: Vec<ProfileId> = Vec::new();
        for entry in entries.get(name).into_iter().flatten() {
            if !profiles.contains(&entry.profile_id) {
                profiles.push(entry.profile_id.clone());
            }
        }
        profiles
    }

    /// The number of distinct instance names in the index.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lookup_in_insertion_order() {
        let index = InstanceIndex::new();
        let a = index.register_client();
        let b = index.register_client();
        index.insert("vm-1", "p2", b);
        index.insert("vm-1", "p1", a);
        index.insert("vm-2", "p1", a);
        assert_eq!(index.lookup("vm-1"), vec!["p2", "p1"]);
        assert_eq!(index.lookup("vm-3"), Vec::<String>::new());
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn reloaded_profile_keeps_new_entries() {
        let index = InstanceIndex::new();
        let old = index.register_client();
        let new = index.register_client();
        index.insert("vm-1", "p1", old);
        index.insert("vm-1", "p1", new);
        assert_eq!(index.lookup("vm-1"), vec!["p1"]);
        index.remove_client(old);
        assert_eq!(index.lookup("vm-1"), vec!["p1"]);
        index.remove("vm-1", new);
        assert!(index.is_empty());
    }
}
