use quill_lang_ast::DeclId;

use super::reverter::DeclReverter;

impl DeclReverter<'_> {
    /// Remove `node` from its redeclaration chain, rebuilding the chain
    /// and retargeting the container's lookup entry if it pointed at the
    /// removed node.
    ///
    /// Must run while the node's own links are still intact, and before
    /// the named-declaration cleanup erases the (possibly stale) lookup
    /// entry: detecting the dangling case needs the current table state.
    pub(super) fn repair_chain(&mut self, node: DeclId, container: Option<DeclId>) -> bool {
        let graph = &mut self.sess.graph;

        // Collect the redeclarations, without the one we remove, newest
        // first.
        let mut survivors: Vec<DeclId> = Vec::new();
        let mut cur = Some(graph.most_recent(node));
        while let Some(member) = cur {
            if member != node {
                survivors.push(member);
            }
            cur = graph.arena.get(member).and_then(|decl| decl.previous);
        }
        if survivors.is_empty() {
            // singleton chain, nothing to relink
            return true;
        }

        // The lookup entry may still point at the node about to go away;
        // promote the surviving chain head in its place.
        let name = graph.arena[node].name.clone();
        if let (Some(name), Some(container)) = (name, container) {
            if let Some(data) = graph.arena.get_mut(container).and_then(|d| d.container_mut()) {
                data.lookup.retarget(&name, node, survivors[0]);
            }
        }

        // Relink so that each survivor's `previous` targets the next
        // older one, and re-cache the new chain head on every member.
        for i in 0..survivors.len() {
            let older = survivors.get(i + 1).copied();
            if let Some(decl) = graph.arena.get_mut(survivors[i]) {
                decl.previous = older;
            }
        }
        let head = survivors[0];
        for &member in &survivors {
            if let Some(decl) = graph.arena.get_mut(member) {
                decl.most_recent = head;
            }
        }
        true
    }
}
