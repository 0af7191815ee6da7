//! Pools
//!
//! Named, ordered lists of entity handles. Names are interned once into
//! [`PoolId`]s so the per-tick passes index plain vectors.
//!
//! A pool id can exist (interned) while its list has never been created.
//! Removal and clearing on such a pool are no-ops.

use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use super::entity::EntityId;

/// Interned pool name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PoolId(u32);

impl PoolId {
    /// Dense index of this pool.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool#{}", self.0)
    }
}

/// Pool registry and membership lists.
#[derive(Debug, Default)]
pub struct Pools {
    /// Name → id (BTreeMap for deterministic iteration)
    ids: BTreeMap<String, PoolId>,
    /// Id → name
    names: Vec<String>,
    /// Id → members; `None` until first insertion
    lists: Vec<Option<Vec<EntityId>>>,
}

impl Pools {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a name, returning its id.
    pub fn intern(&mut self, name: &str) -> PoolId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }

        let id = PoolId(self.names.len() as u32);
        self.ids.insert(name.to_string(), id);
        self.names.push(name.to_string());
        self.lists.push(None);
        debug!(pool = name, %id, "Pool interned");
        id
    }

    /// Look up an interned name.
    pub fn id(&self, name: &str) -> Option<PoolId> {
        self.ids.get(name).copied()
    }

    /// Name of an interned pool.
    pub fn name(&self, id: PoolId) -> Option<&str> {
        self.names.get(id.index()).map(String::as_str)
    }

    /// Number of interned pools.
    pub fn count(&self) -> usize {
        self.names.len()
    }

    /// All interned ids, in interning order.
    pub fn ids(&self) -> impl Iterator<Item = PoolId> {
        (0..self.names.len() as u32).map(PoolId)
    }

    /// Check if the pool's list has been created.
    pub fn is_created(&self, id: PoolId) -> bool {
        matches!(self.lists.get(id.index()), Some(Some(_)))
    }

    /// Members of a pool (empty if never created).
    pub fn members(&self, id: PoolId) -> &[EntityId] {
        match self.lists.get(id.index()) {
            Some(Some(list)) => list,
            _ => &[],
        }
    }

    /// Member at `index`.
    #[inline]
    pub fn get(&self, id: PoolId, index: usize) -> Option<EntityId> {
        self.members(id).get(index).copied()
    }

    /// Number of members.
    #[inline]
    pub fn len_of(&self, id: PoolId) -> usize {
        self.members(id).len()
    }

    /// Append an entity, creating the list on first use.
    pub fn add(&mut self, id: PoolId, entity: EntityId) {
        let Some(slot) = self.lists.get_mut(id.index()) else {
            return;
        };
        slot.get_or_insert_with(Vec::new).push(entity);
    }

    /// Remove the first occurrence of an entity. Returns true if found.
    pub fn remove(&mut self, id: PoolId, entity: EntityId) -> bool {
        let Some(Some(list)) = self.lists.get_mut(id.index()) else {
            return false;
        };

        match list.iter().position(|&e| e == entity) {
            Some(index) => {
                list.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove the member at `index`, preserving order.
    pub fn remove_at(&mut self, id: PoolId, index: usize) -> Option<EntityId> {
        match self.lists.get_mut(id.index()) {
            Some(Some(list)) if index < list.len() => Some(list.remove(index)),
            _ => None,
        }
    }

    /// Empty a pool's list. No-op on pools never created.
    pub fn clear(&mut self, id: PoolId) {
        if let Some(Some(list)) = self.lists.get_mut(id.index()) {
            list.clear();
        }
    }

    /// Drop every list. Interned ids stay valid.
    pub fn clear_all(&mut self) {
        for slot in &mut self.lists {
            *slot = None;
        }
    }

    /// Keep only members satisfying `keep`, in every pool.
    pub fn retain_all(&mut self, mut keep: impl FnMut(EntityId) -> bool) -> usize {
        let mut removed = 0;
        for list in self.lists.iter_mut().flatten() {
            let before = list.len();
            list.retain(|&e| keep(e));
            removed += before - list.len();
        }
        removed
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn ids(n: usize) -> Vec<EntityId> {
        let mut arena: SlotMap<EntityId, ()> = SlotMap::with_key();
        (0..n).map(|_| arena.insert(())).collect()
    }

    #[test]
    fn test_intern_is_stable() {
        let mut pools = Pools::new();
        let a = pools.intern("walls");
        let b = pools.intern("units");
        assert_ne!(a, b);
        assert_eq!(pools.intern("walls"), a);
        assert_eq!(pools.id("units"), Some(b));
        assert_eq!(pools.id("ghosts"), None);
        assert_eq!(pools.name(b), Some("units"));
        assert_eq!(pools.count(), 2);
    }

    #[test]
    fn test_lists_created_lazily() {
        let mut pools = Pools::new();
        let walls = pools.intern("walls");
        let e = ids(1);

        assert!(!pools.is_created(walls));
        assert!(!pools.remove(walls, e[0]));
        pools.clear(walls);
        assert!(!pools.is_created(walls));

        pools.add(walls, e[0]);
        assert!(pools.is_created(walls));
        assert_eq!(pools.members(walls), &[e[0]]);
    }

    #[test]
    fn test_remove_first_occurrence() {
        let mut pools = Pools::new();
        let p = pools.intern("p");
        let e = ids(2);

        pools.add(p, e[0]);
        pools.add(p, e[1]);
        pools.add(p, e[0]);

        assert!(pools.remove(p, e[0]));
        assert_eq!(pools.members(p), &[e[1], e[0]]);
    }

    #[test]
    fn test_clear_all_keeps_ids() {
        let mut pools = Pools::new();
        let p = pools.intern("p");
        let e = ids(1);
        pools.add(p, e[0]);

        pools.clear_all();
        assert!(!pools.is_created(p));
        assert_eq!(pools.id("p"), Some(p));
    }

    #[test]
    fn test_retain_all() {
        let mut pools = Pools::new();
        let a = pools.intern("a");
        let b = pools.intern("b");
        let e = ids(3);

        pools.add(a, e[0]);
        pools.add(a, e[1]);
        pools.add(b, e[1]);
        pools.add(b, e[2]);

        let removed = pools.retain_all(|id| id != e[1]);
        assert_eq!(removed, 2);
        assert_eq!(pools.members(a), &[e[0]]);
        assert_eq!(pools.members(b), &[e[2]]);
    }
}
