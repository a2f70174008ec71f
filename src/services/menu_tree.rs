use std::collections::{HashMap, HashSet};

use serde::Serialize;
use thiserror::Error;

use crate::db::Store;
use crate::entities::menus;

#[derive(Debug, Error)]
pub enum MenuTreeError {
    #[error("menu {0} references a parent key that does not exist")]
    DanglingParent(i32),
    #[error("menu forest contains a cycle through key {0}")]
    Cycle(i32),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// One node of the assembled navigation forest.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MenuNode {
    pub id: i32,
    pub menu_key: i32,
    pub parent_key: Option<i32>,
    pub label: String,
    pub path: Option<String>,
    pub sort_order: i32,
    pub children: Vec<MenuNode>,
}

impl MenuNode {
    fn from_model(model: &menus::Model) -> Self {
        Self {
            id: model.id,
            menu_key: model.menu_key,
            parent_key: model.parent_key,
            label: model.label.clone(),
            path: model.path.clone(),
            sort_order: model.sort_order,
            children: Vec::new(),
        }
    }
}

pub struct MenuTreeService {
    store: Store,
}

impl MenuTreeService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// The full forest: every menu, roots first, siblings ordered by
    /// sort order then key.
    pub async fn full_forest(&self) -> Result<Vec<MenuNode>, MenuTreeError> {
        let rows = self.store.menus().load_all().await?;
        assemble_forest(&rows)
    }

    /// The forest reshaped for one user: only leaves reachable through
    /// the user's roles survive, plus every ancestor needed to keep the
    /// result connected. Runs in two passes — a flat permitted-id query,
    /// then a pure recursive projection — so the recursion never issues
    /// database calls.
    pub async fn forest_for_user(&self, user_id: i32) -> Result<Vec<MenuNode>, MenuTreeError> {
        let permitted = self.store.permissions().permitted_menu_ids(user_id).await?;
        let forest = self.full_forest().await?;
        Ok(project_forest(&forest, &permitted))
    }
}

/// Materialize parent→children links over a flat, sibling-ordered menu
/// list. Parent links come from the database and can in principle dangle
/// or cycle; both are data-integrity failures, detected here rather than
/// looped over.
pub fn assemble_forest(rows: &[menus::Model]) -> Result<Vec<MenuNode>, MenuTreeError> {
    let index_by_key: HashMap<i32, usize> =
        rows.iter().enumerate().map(|(i, m)| (m.menu_key, i)).collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); rows.len()];
    let mut roots: Vec<usize> = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        match row.parent_key {
            None => roots.push(i),
            Some(parent_key) => {
                let Some(&parent_idx) = index_by_key.get(&parent_key) else {
                    return Err(MenuTreeError::DanglingParent(row.menu_key));
                };
                children[parent_idx].push(i);
            }
        }
    }

    // Every node whose parent chain terminates at a root is reachable by
    // the walk below; anything left over sits on a cycle.
    let mut visited = vec![false; rows.len()];
    let mut forest = Vec::with_capacity(roots.len());
    for &root in &roots {
        forest.push(build_subtree(root, rows, &children, &mut visited));
    }

    if let Some(unvisited) = visited.iter().position(|v| !v) {
        return Err(MenuTreeError::Cycle(rows[unvisited].menu_key));
    }

    Ok(forest)
}

fn build_subtree(
    idx: usize,
    rows: &[menus::Model],
    children: &[Vec<usize>],
    visited: &mut [bool],
) -> MenuNode {
    visited[idx] = true;
    let mut node = MenuNode::from_model(&rows[idx]);
    for &child in &children[idx] {
        node.children.push(build_subtree(child, rows, children, visited));
    }
    node
}

/// Keep a node when it is permitted itself or when anything in its
/// subtree is; groups with no reachable descendant are pruned.
pub fn project_forest(forest: &[MenuNode], permitted: &HashSet<i32>) -> Vec<MenuNode> {
    forest
        .iter()
        .filter_map(|node| project_node(node, permitted))
        .collect()
}

fn project_node(node: &MenuNode, permitted: &HashSet<i32>) -> Option<MenuNode> {
    let children: Vec<MenuNode> = node
        .children
        .iter()
        .filter_map(|child| project_node(child, permitted))
        .collect();

    if children.is_empty() && !permitted.contains(&node.id) {
        return None;
    }

    let mut kept = node.clone();
    kept.children = children;
    Some(kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu(id: i32, key: i32, parent: Option<i32>, label: &str, path: Option<&str>) -> menus::Model {
        menus::Model {
            id,
            menu_key: key,
            parent_key: parent,
            label: label.to_string(),
            path: path.map(str::to_string),
            sort_order: key,
            created_at: String::new(),
            updated_at: String::new(),
            created_by: None,
            updated_by: None,
        }
    }

    #[test]
    fn assembles_roots_and_children() {
        let rows = vec![
            menu(1, 1, None, "Admin", None),
            menu(2, 2, Some(1), "Users", Some("/users")),
            menu(3, 3, Some(1), "Roles", Some("/roles")),
        ];

        let forest = assemble_forest(&rows).unwrap();
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].label, "Admin");
        assert_eq!(forest[0].children.len(), 2);
        assert_eq!(forest[0].children[0].label, "Users");
    }

    #[test]
    fn detects_cycles() {
        let rows = vec![
            menu(1, 1, Some(2), "A", None),
            menu(2, 2, Some(1), "B", None),
        ];

        assert!(matches!(
            assemble_forest(&rows),
            Err(MenuTreeError::Cycle(_))
        ));
    }

    #[test]
    fn detects_dangling_parent() {
        let rows = vec![menu(1, 1, Some(99), "Orphan", None)];

        assert!(matches!(
            assemble_forest(&rows),
            Err(MenuTreeError::DanglingParent(1))
        ));
    }

    #[test]
    fn projection_keeps_ancestors_and_prunes_siblings() {
        let rows = vec![
            menu(1, 1, None, "Admin", None),
            menu(2, 2, Some(1), "Users", Some("/users")),
            menu(3, 3, Some(1), "Roles", Some("/roles")),
        ];
        let forest = assemble_forest(&rows).unwrap();

        let permitted: HashSet<i32> = [2].into_iter().collect();
        let projected = project_forest(&forest, &permitted);

        assert_eq!(projected.len(), 1);
        assert_eq!(projected[0].label, "Admin");
        assert_eq!(projected[0].children.len(), 1);
        assert_eq!(projected[0].children[0].label, "Users");
    }

    #[test]
    fn projection_is_idempotent() {
        let rows = vec![
            menu(1, 1, None, "Admin", None),
            menu(2, 2, Some(1), "Users", Some("/users")),
            menu(3, 3, Some(1), "Roles", Some("/roles")),
        ];
        let forest = assemble_forest(&rows).unwrap();
        let permitted: HashSet<i32> = [2].into_iter().collect();

        let once = project_forest(&forest, &permitted);
        let twice = project_forest(&once, &permitted);
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_permitted_set_projects_to_empty_forest() {
        let rows = vec![
            menu(1, 1, None, "Admin", None),
            menu(2, 2, Some(1), "Users", Some("/users")),
        ];
        let forest = assemble_forest(&rows).unwrap();

        assert!(project_forest(&forest, &HashSet::new()).is_empty());
    }
}
