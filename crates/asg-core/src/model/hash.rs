//! Structural node hashes.
//!
//! A node's hash covers its kind name, its attribute values (strings by
//! content, not by key), and the hashes of its edge targets in layout order.
//! Node ids do not contribute, so equal structures hash equally across
//! graphs and across save/load.

use rustc_hash::{FxHashMap, FxHashSet};
use sha2::{Digest, Sha256};

use crate::error::AsgError;
use crate::model::factory::Factory;
use crate::model::id::NodeId;
use crate::model::node::{AttrValue, EdgeSlot};

impl Factory {
    /// Hashes the structure owned by `id`.
    ///
    /// An edge leading back to a node whose hash is still being computed
    /// contributes `0`, so cycles terminate. Each node is hashed once per
    /// call; shared targets reuse the first result.
    pub fn node_hash(&self, id: NodeId) -> Result<u64, AsgError> {
        self.node(id)?;
        let mut done: FxHashMap<NodeId, u64> = FxHashMap::default();
        let mut entered: FxHashSet<NodeId> = FxHashSet::default();
        let mut stack = vec![(id, false)];

        while let Some((cur, children_done)) = stack.pop() {
            if done.contains_key(&cur) {
                continue;
            }
            let node = self.node(cur)?;
            if !children_done {
                if !entered.insert(cur) {
                    continue;
                }
                stack.push((cur, true));
                for (_, slot) in node.edges() {
                    for &target in slot.targets().iter().rev() {
                        if !done.contains_key(&target) && !entered.contains(&target) {
                            stack.push((target, false));
                        }
                    }
                }
                continue;
            }

            let mut hasher = Sha256::new();
            hasher.update(node.kind().name().as_bytes());
            for value in node.attributes() {
                match *value {
                    AttrValue::Bool(b) => hasher.update([b as u8]),
                    AttrValue::UByte(b) => hasher.update([b]),
                    AttrValue::UInt(n) => hasher.update(n.to_le_bytes()),
                    AttrValue::Str(key) => {
                        let s = self.strings().lookup(key)?;
                        hasher.update((s.len() as u32).to_le_bytes());
                        hasher.update(s.as_bytes());
                    }
                }
            }
            for (_, slot) in node.edges() {
                match slot {
                    EdgeSlot::Single(t) if t.is_none() => hasher.update([0u8]),
                    EdgeSlot::Single(_) => hasher.update([1u8]),
                    EdgeSlot::Multi(ids) => hasher.update((ids.len() as u32).to_le_bytes()),
                }
                for target in slot.targets() {
                    let h = done.get(target).copied().unwrap_or(0);
                    hasher.update(h.to_le_bytes());
                }
            }
            let digest = hasher.finalize();
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&digest[..8]);
            done.insert(cur, u64::from_le_bytes(bytes));
        }

        Ok(done.get(&id).copied().unwrap_or(0))
    }
}
