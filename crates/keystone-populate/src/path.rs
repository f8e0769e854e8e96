//! Populate-path compilation.
//!
//! A dotted path string like `"user.company"` compiles into one node per
//! depth level: `"user"` at level 0, `"user.company"` at level 1.
//! Overlapping requests merge into the same node, and each node records
//! which child fields must survive projection; intermediate nodes always
//! keep at least the next segment so descent can continue.

/// Select entry meaning "all fields".
pub const WILDCARD: &str = "*";

/// One populate target: a full dotted path and the fields to keep when its
/// reference resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathNode {
    pub path: String,
    pub select: Vec<String>,
}

impl PathNode {
    /// True when projection should keep every field.
    pub fn selects_all(&self) -> bool {
        self.select.is_empty() || self.select.iter().any(|field| field == WILDCARD)
    }
}

/// The accumulated populate request: path nodes grouped by depth level.
///
/// Level `n` holds paths `n` reference hops from the root entity. A node at
/// level `n` is only useful if its prefix exists at a shallower level; the
/// resolver does not validate that eagerly; it simply finds nothing to
/// fetch if the prefix never resolved.
#[derive(Debug, Clone, Default)]
pub struct PopulateTree {
    levels: Vec<Vec<PathNode>>,
}

impl PopulateTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn levels(&self) -> &[Vec<PathNode>] {
        &self.levels
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.iter().all(Vec::is_empty)
    }

    /// Compile one dotted path into the tree, union-merging with whatever is
    /// already there.
    ///
    /// `select` applies to the terminal segment only; empty means all
    /// fields. Intermediate segments select just the next segment, appending
    /// it when the node already exists. A node whose select already carries
    /// the wildcard absorbs later terminal selections.
    pub fn add_path(&mut self, path: &str, select: &[String]) {
        let segments: Vec<&str> = path.split('.').collect();
        let mut prefix = String::new();

        for (level, segment) in segments.iter().enumerate() {
            let current = if prefix.is_empty() {
                (*segment).to_string()
            } else {
                format!("{prefix}.{segment}")
            };
            let next_segment = segments.get(level + 1).copied();

            if self.levels.len() <= level {
                self.levels.push(Vec::new());
            }
            let nodes = &mut self.levels[level];

            match nodes.iter_mut().find(|node| node.path == current) {
                None => {
                    let node_select = match next_segment {
                        Some(next) => vec![next.to_string()],
                        None if select.is_empty() => vec![WILDCARD.to_string()],
                        None => dedup(select),
                    };
                    nodes.push(PathNode {
                        path: current.clone(),
                        select: node_select,
                    });
                }
                Some(node) => match next_segment {
                    Some(next) => {
                        if !node.select.iter().any(|field| field == next) {
                            node.select.push(next.to_string());
                        }
                    }
                    None => {
                        if !node.selects_all() {
                            let terminal: Vec<String> = if select.is_empty() {
                                vec![WILDCARD.to_string()]
                            } else {
                                select.to_vec()
                            };
                            for field in terminal {
                                if !node.select.contains(&field) {
                                    node.select.push(field);
                                }
                            }
                        }
                    }
                },
            }

            prefix = current;
        }
    }
}

fn dedup(fields: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(fields.len());
    for field in fields {
        if !out.contains(field) {
            out.push(field.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_single_segment_defaults_to_wildcard() {
        let mut tree = PopulateTree::new();
        tree.add_path("user", &[]);

        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.levels()[0][0].path, "user");
        assert_eq!(tree.levels()[0][0].select, select(&["*"]));
    }

    #[test]
    fn test_single_segment_with_fields() {
        let mut tree = PopulateTree::new();
        tree.add_path("user", &select(&["name", "email"]));

        assert_eq!(tree.levels()[0][0].select, select(&["name", "email"]));
    }

    #[test]
    fn test_deep_path_builds_one_node_per_level() {
        let mut tree = PopulateTree::new();
        tree.add_path("user.company.country", &[]);

        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.levels()[0][0].path, "user");
        assert_eq!(tree.levels()[0][0].select, select(&["company"]));
        assert_eq!(tree.levels()[1][0].path, "user.company");
        assert_eq!(tree.levels()[1][0].select, select(&["country"]));
        assert_eq!(tree.levels()[2][0].path, "user.company.country");
        assert_eq!(tree.levels()[2][0].select, select(&["*"]));
    }

    #[test]
    fn test_overlapping_paths_merge_into_existing_nodes() {
        let mut tree = PopulateTree::new();
        tree.add_path("user.company", &[]);
        tree.add_path("user.address", &[]);

        assert_eq!(tree.levels()[0].len(), 1);
        assert_eq!(tree.levels()[0][0].select, select(&["company", "address"]));
        assert_eq!(tree.levels()[1].len(), 2);
    }

    #[test]
    fn test_terminal_request_widens_intermediate_node() {
        let mut tree = PopulateTree::new();
        tree.add_path("user.company", &[]);
        tree.add_path("user", &[]);

        // "user" was created as an intermediate node selecting only
        // "company"; the later terminal request adds the wildcard.
        assert_eq!(tree.levels()[0][0].select, select(&["company", "*"]));
        assert!(tree.levels()[0][0].selects_all());
    }

    #[test]
    fn test_terminal_fields_union_merge() {
        let mut tree = PopulateTree::new();
        tree.add_path("user", &select(&["name"]));
        tree.add_path("user", &select(&["email", "name"]));

        assert_eq!(tree.levels()[0][0].select, select(&["name", "email"]));
    }

    #[test]
    fn test_wildcard_absorbs_later_fields() {
        let mut tree = PopulateTree::new();
        tree.add_path("user", &[]);
        tree.add_path("user", &select(&["name"]));

        assert_eq!(tree.levels()[0][0].select, select(&["*"]));
    }

    #[test]
    fn test_repeated_identical_path_is_idempotent() {
        let mut tree = PopulateTree::new();
        tree.add_path("user.company", &[]);
        let once = tree.clone();
        tree.add_path("user.company", &[]);

        assert_eq!(tree.levels(), once.levels());
    }

    #[test]
    fn test_duplicate_caller_fields_dedup() {
        let mut tree = PopulateTree::new();
        tree.add_path("user", &select(&["name", "name"]));

        assert_eq!(tree.levels()[0][0].select, select(&["name"]));
    }

    #[test]
    fn test_is_empty() {
        let mut tree = PopulateTree::new();
        assert!(tree.is_empty());
        tree.add_path("user", &[]);
        assert!(!tree.is_empty());
    }
}
