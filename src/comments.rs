//! Lazily expanded comment threads.
//!
//! Every story and comment shown in the feed is a node addressed by its item
//! id. A node's children are fetched on its first expansion and kept for the
//! rest of the category session, so collapsing and re-expanding never goes
//! back to the network.

use std::collections::HashMap;

use tracing::debug;

use crate::data::ItemSource;
use crate::hackernews::{FetchError, Item, ItemKind};

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    NotLoaded,
    Loading,
    Loaded(Vec<i64>),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub item: Item,
    /// Nesting level; top-level comments of a story sit at 0.
    pub depth: usize,
    pub state: LoadState,
    pub expanded: bool,
}

impl Node {
    fn is_story(&self) -> bool {
        self.item.kind != ItemKind::Comment
    }

    /// Whether the node exposes an expand/collapse control at all.
    pub fn has_toggle(&self) -> bool {
        self.is_story() || self.item.has_kids()
    }

    pub fn toggle_label(&self) -> String {
        match (self.is_story(), self.expanded, &self.state) {
            (_, _, LoadState::Loading) => "Loading...".to_string(),
            (true, true, _) => "Hide Comments".to_string(),
            (true, false, _) => {
                format!("Show Comments ({})", self.item.descendants.unwrap_or(0))
            }
            (false, true, _) => "Hide Replies".to_string(),
            (false, false, _) => format!("Show Replies ({})", self.item.kids().len()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    /// Children have to be fetched before anything can be shown.
    Fetch(i64),
    /// A fetch for this node is already running.
    Pending,
    Expanded,
    Collapsed,
    Ignored,
}

/// A visible comment in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleComment {
    pub id: i64,
    pub depth: usize,
}

#[derive(Debug, Default)]
pub struct CommentTree {
    nodes: HashMap<i64, Node>,
}

impl CommentTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn node(&self, id: i64) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn is_expanded(&self, id: i64) -> bool {
        self.nodes.get(&id).map(|node| node.expanded).unwrap_or(false)
    }

    /// Registers a rendered post as the root of a thread.
    pub fn track_story(&mut self, item: Item) {
        self.nodes.entry(item.id).or_insert(Node {
            item,
            depth: 0,
            state: LoadState::NotLoaded,
            expanded: false,
        });
    }

    pub fn toggle(&mut self, id: i64) -> Toggle {
        let Some(node) = self.nodes.get_mut(&id) else {
            return Toggle::Ignored;
        };
        if !node.has_toggle() {
            return Toggle::Ignored;
        }
        match node.state {
            LoadState::NotLoaded => {
                node.state = LoadState::Loading;
                Toggle::Fetch(id)
            }
            LoadState::Loading => Toggle::Pending,
            LoadState::Loaded(_) => {
                node.expanded = !node.expanded;
                if node.expanded {
                    Toggle::Expanded
                } else {
                    Toggle::Collapsed
                }
            }
        }
    }

    /// Stores the result of a [`load_children`] call for `id`.
    ///
    /// Returns false when the node is not waiting on a fetch (it was cleared
    /// or already resolved), in which case the children are dropped.
    pub fn finish_load(&mut self, id: i64, result: Result<Vec<Item>, FetchError>) -> bool {
        let Some(parent) = self.nodes.get(&id) else {
            debug!(id, "dropping children for unknown comment node");
            return false;
        };
        if parent.state != LoadState::Loading {
            return false;
        }
        let child_depth = if parent.is_story() { 0 } else { parent.depth + 1 };

        let children = match result {
            Ok(children) => children,
            Err(_) => {
                if let Some(parent) = self.nodes.get_mut(&id) {
                    parent.state = LoadState::NotLoaded;
                }
                return false;
            }
        };

        let mut ids = Vec::with_capacity(children.len());
        for child in children {
            ids.push(child.id);
            self.nodes.entry(child.id).or_insert(Node {
                item: child,
                depth: child_depth,
                state: LoadState::NotLoaded,
                expanded: false,
            });
        }
        if let Some(parent) = self.nodes.get_mut(&id) {
            parent.state = LoadState::Loaded(ids);
            parent.expanded = true;
        }
        true
    }

    /// Children of `id` that are currently shown, depth first. Deleted and
    /// dead comments are kept in the tree but never listed.
    pub fn visible(&self, id: i64) -> Vec<VisibleComment> {
        let mut out = Vec::new();
        self.collect_visible(id, &mut out);
        out
    }

    fn collect_visible(&self, id: i64, out: &mut Vec<VisibleComment>) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        if !node.expanded {
            return;
        }
        let LoadState::Loaded(children) = &node.state else {
            return;
        };
        for child_id in children {
            let Some(child) = self.nodes.get(child_id) else {
                continue;
            };
            if child.item.is_hidden() {
                continue;
            }
            out.push(VisibleComment {
                id: *child_id,
                depth: child.depth,
            });
            self.collect_visible(*child_id, out);
        }
    }
}

/// Fetches `id` and then all of its direct children in parallel, in kid
/// order. Items without kids yield an empty list.
pub fn load_children(source: &dyn ItemSource, id: i64) -> Result<Vec<Item>, FetchError> {
    let item = source.item(id)?;
    if !item.has_kids() {
        return Ok(Vec::new());
    }
    source.items(item.kids())
}
