use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::FlagError;
use crate::models::{FeatureFlag, FlagStats, FlagUpdate};
use crate::observer::FlagObserver;

/// Query options for `list`.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub limit: Option<usize>,
    pub offset: usize,
    pub search: Option<String>,
}

/// Primary store plus secondary index. Invariant: `names` holds exactly the
/// names of the flags in `flags`, each mapped to its owner's id. No stale
/// entries, no missing ones.
#[derive(Default)]
struct Store {
    flags: IndexMap<Uuid, FeatureFlag>,
    names: HashMap<String, Uuid>,
}

/// In-memory flag store, reachable by id and by name.
///
/// One insertion-ordered primary map keyed by id carries the flags; a
/// secondary name→id index makes name lookups O(1). Every mutation updates
/// both inside a single write-lock scope, so readers either see a flag under
/// both keys or under neither.
pub struct FlagRepository {
    store: RwLock<Store>,
    observer: Option<Arc<dyn FlagObserver>>,
}

impl Default for FlagRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl FlagRepository {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(Store::default()),
            observer: None,
        }
    }

    pub fn with_observer(observer: Arc<dyn FlagObserver>) -> Self {
        Self {
            store: RwLock::new(Store::default()),
            observer: Some(observer),
        }
    }

    /// Insert a new flag under both keys. Fails with Conflict if the id or
    /// the name is already taken, leaving the store untouched.
    pub fn create(&self, flag: FeatureFlag) -> Result<FeatureFlag, FlagError> {
        {
            let mut guard = self.store.write();

            if guard.flags.contains_key(&flag.id) {
                return Err(FlagError::Conflict(format!(
                    "flag id {} already exists",
                    flag.id
                )));
            }
            if guard.names.contains_key(&flag.name) {
                return Err(FlagError::Conflict(format!(
                    "flag name '{}' already exists",
                    flag.name
                )));
            }

            guard.names.insert(flag.name.clone(), flag.id);
            guard.flags.insert(flag.id, flag.clone());
        }

        if let Some(observer) = &self.observer {
            observer.flag_created(&flag);
        }

        Ok(flag)
    }

    pub fn find_by_id(&self, id: Uuid) -> Option<FeatureFlag> {
        self.store.read().flags.get(&id).cloned()
    }

    pub fn find_by_name(&self, name: &str) -> Option<FeatureFlag> {
        let guard = self.store.read();
        let id = guard.names.get(name)?;
        guard.flags.get(id).cloned()
    }

    /// Apply a partial update. A name change first checks the new name for
    /// collision, then retargets the name index together with the field
    /// updates and the `updated_at` bump, all under one write lock. No
    /// reader can observe the index pointing one way and the flag another.
    pub fn update(
        &self,
        id: Uuid,
        update: FlagUpdate,
        now: DateTime<Utc>,
    ) -> Result<FeatureFlag, FlagError> {
        let updated = {
            let mut guard = self.store.write();
            let store = &mut *guard;

            let Some(flag) = store.flags.get_mut(&id) else {
                return Err(FlagError::NotFound(id));
            };

            if let Some(new_name) = update.name {
                if new_name != flag.name {
                    if store.names.contains_key(&new_name) {
                        return Err(FlagError::Conflict(format!(
                            "flag name '{}' already exists",
                            new_name
                        )));
                    }
                    store.names.remove(&flag.name);
                    store.names.insert(new_name.clone(), id);
                    flag.name = new_name;
                }
            }
            if let Some(description) = update.description {
                flag.description = Some(description);
            }
            if let Some(enabled) = update.enabled {
                flag.enabled = enabled;
            }
            if let Some(rules) = update.rules {
                flag.rules = rules;
            }
            flag.updated_at = now;

            flag.clone()
        };

        if let Some(observer) = &self.observer {
            observer.flag_updated(&updated);
        }

        Ok(updated)
    }

    /// Flip the flag's global default.
    pub fn toggle(&self, id: Uuid, now: DateTime<Utc>) -> Result<FeatureFlag, FlagError> {
        let updated = {
            let mut guard = self.store.write();

            let Some(flag) = guard.flags.get_mut(&id) else {
                return Err(FlagError::NotFound(id));
            };
            flag.enabled = !flag.enabled;
            flag.updated_at = now;

            flag.clone()
        };

        if let Some(observer) = &self.observer {
            observer.flag_updated(&updated);
        }

        Ok(updated)
    }

    /// Remove a flag under both keys. Returns whether anything was deleted.
    pub fn delete(&self, id: Uuid) -> bool {
        let removed = {
            let mut guard = self.store.write();

            // shift_remove keeps the remaining flags in insertion order
            let Some(flag) = guard.flags.shift_remove(&id) else {
                return false;
            };
            guard.names.remove(&flag.name);
            flag
        };

        if let Some(observer) = &self.observer {
            observer.flag_deleted(removed.id);
        }

        true
    }

    /// List flags in insertion order. Search is a case-insensitive substring
    /// match over name and description; pagination applies after filtering.
    pub fn list(&self, options: &ListOptions) -> Vec<FeatureFlag> {
        let guard = self.store.read();

        let filtered = guard
            .flags
            .values()
            .filter(|flag| matches_search(flag, options.search.as_deref()))
            .skip(options.offset);

        match options.limit {
            Some(limit) => filtered.take(limit).cloned().collect(),
            None => filtered.cloned().collect(),
        }
    }

    /// Count of flags matching the search filter, independent of pagination.
    pub fn count(&self, search: Option<&str>) -> usize {
        self.store
            .read()
            .flags
            .values()
            .filter(|flag| matches_search(flag, search))
            .count()
    }

    pub fn exists(&self, id: Uuid) -> bool {
        self.store.read().flags.contains_key(&id)
    }

    pub fn stats(&self) -> FlagStats {
        let guard = self.store.read();

        let total = guard.flags.len();
        let enabled = guard.flags.values().filter(|flag| flag.enabled).count();
        let rules = guard.flags.values().map(|flag| flag.rules.len()).sum();

        FlagStats {
            total,
            enabled,
            disabled: total - enabled,
            rules,
        }
    }
}

// HELPER FUNCTIONS

fn matches_search(flag: &FeatureFlag, search: Option<&str>) -> bool {
    let Some(term) = search else {
        return true;
    };
    let term = term.to_lowercase();
    if term.is_empty() {
        return true;
    }

    flag.name.to_lowercase().contains(&term)
        || flag
            .description
            .as_deref()
            .is_some_and(|description| description.to_lowercase().contains(&term))
}
