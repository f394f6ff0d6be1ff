//! Tab groups and tree flattening.
//!
//! The tab forest is an ordered tree. Traversal is depth-first in
//! declaration order, which defines both the UI layout and the route
//! registration order.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::tab::derive_key;
use crate::Tab;

pub const GROUP_TYPE: &str = "tab_group";

/// A composite node grouping tabs and nested groups for navigation.
pub struct TabGroup {
    name: String,
    key: Option<String>,
    children: Vec<TabNode>,
}

impl TabGroup {
    pub fn new(name: &str, children: Vec<TabNode>) -> Self {
        Self {
            name: name.to_string(),
            key: None,
            children,
        }
    }

    pub fn with_key(mut self, key: &str) -> Self {
        self.key = Some(key.to_string());
        self
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_key(&self) -> String {
        match &self.key {
            Some(key) => key.clone(),
            None => derive_key(&self.name),
        }
    }

    pub fn children(&self) -> &[TabNode] {
        &self.children
    }
}

pub enum TabNode {
    Tab(Arc<dyn Tab>),
    Group(TabGroup),
}

impl TabNode {
    pub fn tab(tab: impl Tab) -> Self {
        TabNode::Tab(Arc::new(tab))
    }

    pub fn group(name: &str, children: Vec<TabNode>) -> Self {
        TabNode::Group(TabGroup::new(name, children))
    }

    pub fn get_name(&self) -> &str {
        match self {
            TabNode::Tab(tab) => tab.get_name(),
            TabNode::Group(group) => group.get_name(),
        }
    }

    pub fn get_key(&self) -> String {
        match self {
            TabNode::Tab(tab) => tab.get_key(),
            TabNode::Group(group) => group.get_key(),
        }
    }

    /// Serialize this node (and its subtree) for the UI.
    pub fn to_entry(&self) -> TabEntry {
        match self {
            TabNode::Tab(tab) => TabEntry {
                name: tab.get_name().to_string(),
                key: tab.get_key(),
                tab_type: tab.get_type().to_string(),
                description: Some(tab.description().to_string()),
                items: Vec::new(),
            },
            TabNode::Group(group) => TabEntry {
                name: group.get_name().to_string(),
                key: group.get_key(),
                tab_type: GROUP_TYPE.to_string(),
                description: None,
                items: group.children.iter().map(TabNode::to_entry).collect(),
            },
        }
    }
}

impl From<TabGroup> for TabNode {
    fn from(group: TabGroup) -> Self {
        TabNode::Group(group)
    }
}

/// One node of the serialized tab tree served at `GET /api/tabs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabEntry {
    pub name: String,
    pub key: String,
    #[serde(rename = "type")]
    pub tab_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub items: Vec<TabEntry>,
}

/// Serialize a whole forest, preserving declaration order.
pub fn tab_tree(forest: &[TabNode]) -> Vec<TabEntry> {
    forest.iter().map(TabNode::to_entry).collect()
}

/// Every leaf tab reachable from the forest, depth-first in declaration order.
pub fn leaves(forest: &[TabNode]) -> Vec<Arc<dyn Tab>> {
    fn walk(nodes: &[TabNode], out: &mut Vec<Arc<dyn Tab>>) {
        for node in nodes {
            match node {
                TabNode::Tab(tab) => out.push(Arc::clone(tab)),
                TabNode::Group(group) => walk(&group.children, out),
            }
        }
    }

    let mut out = Vec::new();
    walk(forest, &mut out);
    out
}
