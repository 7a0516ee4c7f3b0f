/// Component dependency graph
///
/// Tracks which glyphs each glyph uses as components (`made_of`) and the
/// reverse lookup (`used_by`). Traversals keep a visited set, so glyphs that
/// reference each other do not send them into a loop.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    /// Glyph -> glyphs it uses as components
    made_of: HashMap<String, BTreeSet<String>>,

    /// Reverse lookup: glyph -> glyphs that use it
    used_by: HashMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the component set of `glyph_name`.
    pub fn update(&mut self, glyph_name: &str, component_names: BTreeSet<String>) {
        let old_names = self.made_of.remove(glyph_name).unwrap_or_default();

        for removed in old_names.difference(&component_names) {
            if let Some(users) = self.used_by.get_mut(removed) {
                users.remove(glyph_name);
                if users.is_empty() {
                    self.used_by.remove(removed);
                }
            }
        }

        for added in component_names.difference(&old_names) {
            self.used_by
                .entry(added.clone())
                .or_default()
                .insert(glyph_name.to_string());
        }

        if !component_names.is_empty() {
            self.made_of.insert(glyph_name.to_string(), component_names);
        }
    }

    /// Direct components of `glyph_name`
    pub fn made_of(&self, glyph_name: &str) -> Option<&BTreeSet<String>> {
        self.made_of.get(glyph_name)
    }

    /// Glyphs that use `glyph_name` directly
    pub fn used_by(&self, glyph_name: &str) -> Option<&BTreeSet<String>> {
        self.used_by.get(glyph_name)
    }

    /// All glyphs `glyph_name` is built from, nearest first.
    pub fn iter_made_of(&self, glyph_name: &str) -> Vec<String> {
        traverse(&self.made_of, glyph_name)
    }

    /// All glyphs that use `glyph_name`, directly or through other glyphs.
    pub fn iter_used_by(&self, glyph_name: &str) -> Vec<String> {
        traverse(&self.used_by, glyph_name)
    }
}

/// Breadth-first walk, excluding the start glyph
fn traverse(edges: &HashMap<String, BTreeSet<String>>, start: &str) -> Vec<String> {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    let mut result = Vec::new();

    visited.insert(start);
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        if let Some(neighbors) = edges.get(current) {
            for neighbor in neighbors {
                if visited.insert(neighbor.as_str()) {
                    result.push(neighbor.clone());
                    queue.push_back(neighbor.as_str());
                }
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_update_maintains_reverse_lookup() {
        let mut graph = DependencyGraph::new();
        graph.update("Aacute", names(&["A", "acute"]));
        graph.update("Agrave", names(&["A", "grave"]));

        assert_eq!(graph.used_by("A"), Some(&names(&["Aacute", "Agrave"])));

        graph.update("Aacute", names(&["A", "acute.case"]));
        assert_eq!(graph.used_by("acute"), None);
        assert_eq!(graph.used_by("acute.case"), Some(&names(&["Aacute"])));

        graph.update("Agrave", BTreeSet::new());
        assert_eq!(graph.used_by("A"), Some(&names(&["Aacute"])));
        assert_eq!(graph.made_of("Agrave"), None);
    }

    #[test]
    fn test_transitive_traversal() {
        let mut graph = DependencyGraph::new();
        graph.update("Aringacute", names(&["Aring", "acute"]));
        graph.update("Aring", names(&["A", "ring"]));

        assert_eq!(graph.iter_made_of("Aringacute"), vec!["Aring", "acute", "A", "ring"]);
        assert_eq!(graph.iter_used_by("A"), vec!["Aring", "Aringacute"]);
        assert!(graph.iter_made_of("A").is_empty());
    }

    #[test]
    fn test_cycles_terminate() {
        let mut graph = DependencyGraph::new();
        graph.update("a", names(&["b"]));
        graph.update("b", names(&["c"]));
        graph.update("c", names(&["a"]));

        assert_eq!(graph.iter_made_of("a"), vec!["b", "c"]);
        assert_eq!(graph.iter_used_by("a"), vec!["c", "b"]);

        graph.update("self", names(&["self"]));
        assert!(graph.iter_made_of("self").is_empty());
    }
}
