//! The compiled tree: every type and prefix reference replaced by what it denotes.

use crate::ast::{Bit, BuiltinType, EnumValue, Status};
use crate::context::ModuleId;
use crate::utils::split_prefixed;
use serde::Serialize;
use std::any::Any;

#[derive(Debug, Serialize)]
pub struct CompiledModule {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    pub prefix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip)]
    pub id: ModuleId,
    pub imports: Vec<CompiledImport>,
    pub data: Vec<CompiledNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rpcs: Vec<CompiledNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notifications: Vec<CompiledNode>,
}

impl CompiledModule {
    /// Maps a prefix to the module it denotes, the module's own prefix included.
    #[must_use]
    pub fn find_prefix(&self, prefix: &str) -> Option<ModuleId> {
        if self.prefix == prefix {
            return Some(self.id);
        }
        self.imports
            .iter()
            .find(|import| import.prefix == prefix)
            .map(|import| import.module)
    }

    /// Looks up a node by a `/`-separated schema path. Prefixes on the path segments
    /// are ignored; top-level data, rpcs and notifications are all searched.
    pub fn find_path_mut(&mut self, path: &str) -> Option<&mut CompiledNode> {
        let segments = path_segments(path);
        let first = *segments.first()?;
        find_in(self.top_level_mut(first), &segments)
    }

    /// Detaches the node at `path` together with everything below it.
    pub fn remove_path(&mut self, path: &str) -> Option<CompiledNode> {
        let segments = path_segments(path);
        let (last, parents) = segments.split_last()?;
        let list = match parents.first() {
            None => self.top_level_mut(last),
            Some(first) => find_in(self.top_level_mut(first), parents)?.list_holding_mut(last)?,
        };
        let pos = list.iter().position(|n| n.name == *last)?;
        Some(list.remove(pos))
    }

    fn top_level_mut(&mut self, name: &str) -> &mut Vec<CompiledNode> {
        if self.data.iter().any(|n| n.name == name) {
            &mut self.data
        } else if self.rpcs.iter().any(|n| n.name == name) {
            &mut self.rpcs
        } else {
            &mut self.notifications
        }
    }

    /// Shared counterpart of [`CompiledModule::find_path_mut`].
    #[must_use]
    pub fn find_path(&self, path: &str) -> Option<&CompiledNode> {
        let mut segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| split_prefixed(s).1);
        let first = segments.next()?;
        let mut node = self
            .data
            .iter()
            .chain(&self.rpcs)
            .chain(&self.notifications)
            .find(|n| n.name == first)?;
        for segment in segments {
            node = node
                .children()
                .into_iter()
                .chain(node.actions())
                .chain(node.notifications())
                .flatten()
                .find(|n| n.name == segment)?;
        }
        Some(node)
    }

    /// Every compiled node, depth first.
    pub fn for_each_node_mut(&mut self, f: &mut dyn FnMut(&mut CompiledNode)) {
        for node in self
            .data
            .iter_mut()
            .chain(self.rpcs.iter_mut())
            .chain(self.notifications.iter_mut())
        {
            node.walk_mut(f);
        }
    }
}

/// Descends through `nodes` following `segments`.
pub fn find_in<'n>(nodes: &'n mut [CompiledNode], segments: &[&str]) -> Option<&'n mut CompiledNode> {
    let (first, rest) = segments.split_first()?;
    let node = nodes.iter_mut().find(|n| n.name == *first)?;
    if rest.is_empty() {
        return Some(node);
    }
    find_in(node.list_holding_mut(rest[0])?, rest)
}

/// Path segments with their prefixes stripped.
pub(crate) fn path_segments(path: &str) -> Vec<&str> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| split_prefixed(s).1)
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct CompiledImport {
    pub name: String,
    pub prefix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(skip)]
    pub module: ModuleId,
}

/// A resolved schema node. Nodes expanded from groupings or added by augments belong to
/// the module that uses or augments, recorded in `module`.
#[derive(Debug, Serialize)]
pub struct CompiledNode {
    pub name: String,
    #[serde(skip)]
    pub module: ModuleId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub config: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub mandatory: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub if_features: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub musts: Vec<String>,
    /// `config` is written on the node (or set by refine or deviation), not inherited.
    #[serde(skip)]
    pub config_set: bool,
    #[serde(skip)]
    pub mandatory_set: bool,
    #[serde(flatten)]
    pub kind: CompiledNodeKind,
    /// Opaque data attached by the caller. Handed back through the destructor passed to
    /// [`crate::context::Context::free`].
    #[serde(skip)]
    pub private: Option<Box<dyn Any>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CompiledNodeKind {
    Container {
        #[serde(skip_serializing_if = "Option::is_none")]
        presence: Option<String>,
        children: Vec<CompiledNode>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        actions: Vec<CompiledNode>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        notifications: Vec<CompiledNode>,
    },
    Leaf {
        #[serde(rename = "type")]
        type_: CompiledType,
        #[serde(skip_serializing_if = "Option::is_none")]
        units: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },
    LeafList {
        #[serde(rename = "type")]
        type_: CompiledType,
        #[serde(skip_serializing_if = "Option::is_none")]
        units: Option<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        defaults: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        min_elements: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max_elements: Option<u32>,
        ordered_by_user: bool,
    },
    List {
        keys: Vec<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        uniques: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        min_elements: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max_elements: Option<u32>,
        ordered_by_user: bool,
        children: Vec<CompiledNode>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        actions: Vec<CompiledNode>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        notifications: Vec<CompiledNode>,
    },
    Choice {
        #[serde(skip_serializing_if = "Option::is_none")]
        default: Option<String>,
        children: Vec<CompiledNode>,
    },
    Case {
        children: Vec<CompiledNode>,
    },
    AnyData {
        xml: bool,
    },
    /// An rpc or action; its children are the input and output nodes.
    Action {
        rpc: bool,
        children: Vec<CompiledNode>,
    },
    Input {
        children: Vec<CompiledNode>,
    },
    Output {
        children: Vec<CompiledNode>,
    },
    Notification {
        children: Vec<CompiledNode>,
    },
}

impl CompiledNodeKind {
    #[must_use]
    pub fn keyword(&self) -> &'static str {
        match self {
            CompiledNodeKind::Container { .. } => "container",
            CompiledNodeKind::Leaf { .. } => "leaf",
            CompiledNodeKind::LeafList { .. } => "leaf-list",
            CompiledNodeKind::List { .. } => "list",
            CompiledNodeKind::Choice { .. } => "choice",
            CompiledNodeKind::Case { .. } => "case",
            CompiledNodeKind::AnyData { xml: true } => "anyxml",
            CompiledNodeKind::AnyData { xml: false } => "anydata",
            CompiledNodeKind::Action { rpc: true, .. } => "rpc",
            CompiledNodeKind::Action { rpc: false, .. } => "action",
            CompiledNodeKind::Input { .. } => "input",
            CompiledNodeKind::Output { .. } => "output",
            CompiledNodeKind::Notification { .. } => "notification",
        }
    }
}

impl CompiledNode {
    /// The node's child list, if its kind has one.
    #[must_use]
    pub fn children(&self) -> Option<&Vec<CompiledNode>> {
        match &self.kind {
            CompiledNodeKind::Container { children, .. }
            | CompiledNodeKind::List { children, .. }
            | CompiledNodeKind::Choice { children, .. }
            | CompiledNodeKind::Case { children }
            | CompiledNodeKind::Action { children, .. }
            | CompiledNodeKind::Input { children }
            | CompiledNodeKind::Output { children }
            | CompiledNodeKind::Notification { children } => Some(children),
            CompiledNodeKind::Leaf { .. }
            | CompiledNodeKind::LeafList { .. }
            | CompiledNodeKind::AnyData { .. } => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<CompiledNode>> {
        match &mut self.kind {
            CompiledNodeKind::Container { children, .. }
            | CompiledNodeKind::List { children, .. }
            | CompiledNodeKind::Choice { children, .. }
            | CompiledNodeKind::Case { children }
            | CompiledNodeKind::Action { children, .. }
            | CompiledNodeKind::Input { children }
            | CompiledNodeKind::Output { children }
            | CompiledNodeKind::Notification { children } => Some(children),
            CompiledNodeKind::Leaf { .. }
            | CompiledNodeKind::LeafList { .. }
            | CompiledNodeKind::AnyData { .. } => None,
        }
    }

    #[must_use]
    pub fn actions(&self) -> Option<&Vec<CompiledNode>> {
        match &self.kind {
            CompiledNodeKind::Container { actions, .. } | CompiledNodeKind::List { actions, .. } => {
                Some(actions)
            }
            _ => None,
        }
    }

    pub fn actions_mut(&mut self) -> Option<&mut Vec<CompiledNode>> {
        match &mut self.kind {
            CompiledNodeKind::Container { actions, .. } | CompiledNodeKind::List { actions, .. } => {
                Some(actions)
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn notifications(&self) -> Option<&Vec<CompiledNode>> {
        match &self.kind {
            CompiledNodeKind::Container { notifications, .. }
            | CompiledNodeKind::List { notifications, .. } => Some(notifications),
            _ => None,
        }
    }

    pub fn notifications_mut(&mut self) -> Option<&mut Vec<CompiledNode>> {
        match &mut self.kind {
            CompiledNodeKind::Container { notifications, .. }
            | CompiledNodeKind::List { notifications, .. } => Some(notifications),
            _ => None,
        }
    }

    /// The resolved type of a leaf or leaf-list.
    #[must_use]
    pub fn type_(&self) -> Option<&CompiledType> {
        match &self.kind {
            CompiledNodeKind::Leaf { type_, .. } | CompiledNodeKind::LeafList { type_, .. } => {
                Some(type_)
            }
            _ => None,
        }
    }

    /// Whether [`CompiledNode::adopt`] would take `node`. Actions and notifications need
    /// their own lists, input and output only go into an action, cases only into a choice.
    #[must_use]
    pub fn accepts(&self, node: &CompiledNode) -> bool {
        let action = matches!(self.kind, CompiledNodeKind::Action { .. });
        match node.kind {
            CompiledNodeKind::Action { rpc: false, .. } => self.actions().is_some(),
            CompiledNodeKind::Action { rpc: true, .. } => false,
            CompiledNodeKind::Notification { .. } => self.notifications().is_some(),
            CompiledNodeKind::Input { .. } | CompiledNodeKind::Output { .. } => action,
            CompiledNodeKind::Case { .. } => matches!(self.kind, CompiledNodeKind::Choice { .. }),
            _ => !action && self.children().is_some(),
        }
    }

    /// Adds `node` to the slot that takes its kind. The node comes back when there is none.
    pub(crate) fn adopt(&mut self, node: CompiledNode) -> Result<(), CompiledNode> {
        if !self.accepts(&node) {
            return Err(node);
        }
        let slot = match node.kind {
            CompiledNodeKind::Action { .. } => self.actions_mut(),
            CompiledNodeKind::Notification { .. } => self.notifications_mut(),
            _ => self.children_mut(),
        };
        match slot {
            Some(list) => {
                list.push(node);
                Ok(())
            }
            None => Err(node),
        }
    }

    /// The list among children, actions and notifications that holds `name`; the
    /// children when none does.
    fn list_holding_mut(&mut self, name: &str) -> Option<&mut Vec<CompiledNode>> {
        if self.actions().is_some_and(|a| a.iter().any(|n| n.name == name)) {
            return self.actions_mut();
        }
        if self.notifications().is_some_and(|a| a.iter().any(|n| n.name == name)) {
            return self.notifications_mut();
        }
        self.children_mut()
    }

    /// Sets `config` false on this node and everything below it.
    pub(crate) fn clear_config(&mut self) {
        self.walk_mut(&mut |node: &mut CompiledNode| node.config = false);
    }

    /// Sets `config` true on this node and on the descendants that inherit it.
    pub(crate) fn enable_config(&mut self) {
        self.config = true;
        if let Some(children) = self.children_mut() {
            for child in children.iter_mut().filter(|c| c.config || !c.config_set) {
                child.enable_config();
            }
        }
    }

    fn walk_mut(&mut self, f: &mut dyn FnMut(&mut CompiledNode)) {
        f(self);
        match &mut self.kind {
            CompiledNodeKind::Container {
                children,
                actions,
                notifications,
                ..
            }
            | CompiledNodeKind::List {
                children,
                actions,
                notifications,
                ..
            } => {
                for node in children
                    .iter_mut()
                    .chain(actions.iter_mut())
                    .chain(notifications.iter_mut())
                {
                    node.walk_mut(f);
                }
            }
            CompiledNodeKind::Choice { children, .. }
            | CompiledNodeKind::Case { children }
            | CompiledNodeKind::Action { children, .. }
            | CompiledNodeKind::Input { children }
            | CompiledNodeKind::Output { children }
            | CompiledNodeKind::Notification { children } => {
                for node in children {
                    node.walk_mut(f);
                }
            }
            CompiledNodeKind::Leaf { .. }
            | CompiledNodeKind::LeafList { .. }
            | CompiledNodeKind::AnyData { .. } => {}
        }
    }
}

/// A type with its typedef chain resolved down to a built-in type.
#[derive(Debug, Clone, Serialize)]
pub struct CompiledType {
    /// The name as written at the use site.
    pub name: String,
    pub base: BuiltinType,
    /// Typedefs passed through on the way to `base`, nearest first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub derived_from: Vec<TypedefOrigin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enums: Vec<EnumValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bits: Vec<Bit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_instance: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fraction_digits: Option<u8>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bases: Vec<String>,
    /// Member types of a union.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<CompiledType>,
}

/// One typedef in a resolved chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypedefOrigin {
    pub name: String,
    /// The module that defines the typedef.
    pub module: String,
    /// The node owning the typedef; `None` for a top-level typedef.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    pub line: usize,
}
