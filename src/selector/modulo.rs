//! Checksum-modulo server selection

use super::NodeSelector;
use super::hash::adler32;

/// Picks `adler32(key) % node_count`.
///
/// Cheap and even, but changing the node count remaps almost every key.
#[derive(Debug)]
pub struct ModSelector<T> {
    nodes: Vec<T>,
}

impl<T> ModSelector<T> {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }
}

impl<T> Default for ModSelector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync> NodeSelector<T> for ModSelector<T> {
    fn add(&mut self, _host: &str, _port: u16, node: T) {
        self.nodes.push(node);
    }

    fn get(&self, key: &[u8]) -> Option<&T> {
        if self.nodes.is_empty() {
            return None;
        }
        let slot = adler32(key) as usize % self.nodes.len();
        self.nodes.get(slot)
    }

    fn list(&self) -> &[T] {
        &self.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector(count: usize) -> ModSelector<String> {
        let mut selector = ModSelector::new();
        for i in 0..count {
            selector.add("10.0.0.1", 11211 + i as u16, format!("node-{i}"));
        }
        selector
    }

    #[test]
    fn test_empty_returns_none() {
        let selector: ModSelector<String> = ModSelector::new();
        assert!(selector.get(b"id").is_none());
        assert!(selector.list().is_empty());
    }

    #[test]
    fn test_deterministic() {
        for count in 1..=5 {
            let selector = selector(count);
            for i in 0..200 {
                let key = format!("key-{i}");
                assert_eq!(selector.get(key.as_bytes()), selector.get(key.as_bytes()));
            }
        }
    }

    #[test]
    fn test_checksum_modulo() {
        let selector = selector(3);
        // adler32("a") = 0x00620062 = 6422626, 6422626 % 3 = 1
        assert_eq!(selector.get(b"a").map(String::as_str), Some("node-1"));
        // adler32("") = 1
        assert_eq!(selector.get(b"").map(String::as_str), Some("node-1"));
    }

    #[test]
    fn test_single_node_takes_everything() {
        let selector = selector(1);
        for i in 0..50 {
            let key = format!("key-{i}");
            assert_eq!(selector.get(key.as_bytes()).map(String::as_str), Some("node-0"));
        }
    }

    #[test]
    fn test_list_keeps_insertion_order() {
        let selector = selector(3);
        assert_eq!(selector.list(), ["node-0", "node-1", "node-2"]);
    }
}
