//! Consistent-hash server selection with virtual nodes

use super::NodeSelector;
use super::hash::ring_hash;

/// Ring positions contributed by each physical node
pub const VIRTUAL_NODES: usize = 32;

/// One position on the ring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualNode {
    pub hash: u32,
    /// Index into the physical node list
    pub node: usize,
}

/// Maps a key to the first virtual node at or after its ring coordinate.
///
/// Each physical node is placed at [`VIRTUAL_NODES`] positions derived from
/// `host:port:index`, so adding a node only takes over the keys that fall
/// just before its new positions.
#[derive(Debug)]
pub struct HashRing<T> {
    nodes: Vec<T>,
    ring: Vec<VirtualNode>,
}

impl<T> HashRing<T> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            ring: Vec::new(),
        }
    }

    /// Virtual nodes sorted ascending by coordinate
    pub fn points(&self) -> &[VirtualNode] {
        &self.ring
    }

    /// Index of the physical node owning coordinate `hash`
    fn owner(&self, hash: u32) -> Option<usize> {
        let last = self.ring.last()?;
        if hash >= last.hash {
            // wrap around to the smallest coordinate
            return Some(self.ring[0].node);
        }
        let idx = self.ring.partition_point(|v| v.hash < hash);
        Some(self.ring[idx].node)
    }
}

impl<T> Default for HashRing<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync> NodeSelector<T> for HashRing<T> {
    fn add(&mut self, host: &str, port: u16, node: T) {
        let index = self.nodes.len();
        self.nodes.push(node);
        self.ring.extend((0..VIRTUAL_NODES).map(|i| VirtualNode {
            hash: ring_hash(format!("{host}:{port}:{i}").as_bytes()),
            node: index,
        }));
        self.ring.sort_by_key(|v| v.hash);
    }

    fn get(&self, key: &[u8]) -> Option<&T> {
        let owner = self.owner(ring_hash(key))?;
        self.nodes.get(owner)
    }

    fn list(&self) -> &[T] {
        &self.nodes
    }
}
