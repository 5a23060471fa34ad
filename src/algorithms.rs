use std::collections::{HashMap, HashSet, VecDeque};

use crate::models::{CategoryId, CategoryNode, CategoryRow, NewCategory};

/// Parent id to child ids, children in the order they appear in `categories`.
pub fn adjacency_map(categories: &[NewCategory]) -> HashMap<CategoryId, Vec<CategoryId>> {
    let known: HashSet<CategoryId> = categories.iter().map(|category| category.id).collect();
    let mut adjacency: HashMap<CategoryId, Vec<CategoryId>> =
        HashMap::with_capacity(categories.len());
    for category in categories {
        adjacency.entry(category.id).or_default();
    }
    for category in categories {
        let Some(parent_id) = category.parent_id else {
            continue;
        };
        if !known.contains(&parent_id) {
            // Best-effort behavior: a category whose parent is missing is unreachable.
            continue;
        }
        adjacency.entry(parent_id).or_default().push(category.id);
    }
    adjacency
}

/// Breadth-first walk from `root_id`, at most `max_depth` levels below it.
///
/// Every parent row precedes its children. The root row reports depth 0 and
/// keeps its stored `parent_id`. A category reachable twice (a cycle in the
/// store) is emitted once.
pub fn breadth_first_rows(
    categories: &[NewCategory],
    root_id: CategoryId,
    max_depth: u32,
) -> Vec<CategoryRow> {
    let lookup: HashMap<CategoryId, &NewCategory> = categories
        .iter()
        .map(|category| (category.id, category))
        .collect();
    let Some(root) = lookup.get(&root_id) else {
        return Vec::new();
    };
    let adjacency = adjacency_map(categories);

    let mut rows = Vec::new();
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(root.id);
    queue.push_back((*root, 0u32));

    while let Some((category, depth)) = queue.pop_front() {
        rows.push(CategoryRow {
            id: category.id,
            parent_id: category.parent_id,
            department_id: category.department_id,
            name: category.name.clone(),
            depth,
        });

        if depth >= max_depth {
            continue;
        }
        if let Some(children) = adjacency.get(&category.id) {
            for child_id in children {
                if !visited.insert(*child_id) {
                    continue;
                }
                if let Some(child) = lookup.get(child_id) {
                    queue.push_back((*child, depth + 1));
                }
            }
        }
    }

    rows
}

/// Pre-order rows for an assembled tree, carrying effective departments.
pub fn flatten_tree(root: &CategoryNode) -> Vec<CategoryRow> {
    root.iter()
        .map(|node| CategoryRow {
            id: node.id,
            parent_id: node.parent_id,
            department_id: node.department_id,
            name: node.name.clone(),
            depth: node.depth,
        })
        .collect()
}
