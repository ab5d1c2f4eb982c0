use quill_lang_ast::HashMap;

/// The execution engine's map from generated symbols to runtime
/// addresses. Entries for removed symbols must be invalidated, otherwise
/// a later lookup would hand out a stale address.
#[derive(Debug, Default)]
pub struct ExecutionEngine {
    addresses: HashMap<String, u64>,
    next_slot: u64,
}

impl ExecutionEngine {
    /// Assign (or return) the address backing a generated symbol.
    pub fn map_symbol(&mut self, name: &str) -> u64 {
        if let Some(&addr) = self.addresses.get(name) {
            return addr;
        }
        self.next_slot += 1;
        let addr = 0x1000 + 0x10 * self.next_slot;
        self.addresses.insert(name.to_owned(), addr);
        addr
    }

    pub fn address_of(&self, name: &str) -> Option<u64> {
        self.addresses.get(name).copied()
    }

    /// Forget the mapping for a removed symbol. Returns whether a mapping
    /// existed.
    pub fn invalidate(&mut self, name: &str) -> bool {
        self.addresses.remove(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_is_stable_until_invalidated() {
        let mut engine = ExecutionEngine::default();
        let a = engine.map_symbol("f");
        assert_eq!(engine.map_symbol("f"), a);
        assert_eq!(engine.address_of("f"), Some(a));

        assert!(engine.invalidate("f"));
        assert_eq!(engine.address_of("f"), None);
        assert!(!engine.invalidate("f"));

        // a re-mapped symbol gets a fresh slot
        assert_ne!(engine.map_symbol("f"), a);
    }
}
