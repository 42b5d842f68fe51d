use crate::context::ModuleId;
use serde::Serialize;
use std::fmt::{self, Display};

/// Surface syntax of a schema source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaFormat {
    /// The native, brace-delimited syntax.
    #[default]
    Yang,
    /// The XML encoding of the same statements.
    Yin,
}

impl SchemaFormat {
    /// Picks the format from a file extension (`yang` or `yin`).
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "yang" => Some(SchemaFormat::Yang),
            "yin" => Some(SchemaFormat::Yin),
            _ => None,
        }
    }

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            SchemaFormat::Yang => "yang",
            SchemaFormat::Yin => "yin",
        }
    }
}

/// Types defined by the language itself, usable without any typedef.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuiltinType {
    Binary,
    Bits,
    Boolean,
    Decimal64,
    Empty,
    Enumeration,
    Identityref,
    InstanceIdentifier,
    Int8,
    Int16,
    Int32,
    Int64,
    Leafref,
    String,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Union,
}

impl BuiltinType {
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let ty = match name {
            "binary" => BuiltinType::Binary,
            "bits" => BuiltinType::Bits,
            "boolean" => BuiltinType::Boolean,
            "decimal64" => BuiltinType::Decimal64,
            "empty" => BuiltinType::Empty,
            "enumeration" => BuiltinType::Enumeration,
            "identityref" => BuiltinType::Identityref,
            "instance-identifier" => BuiltinType::InstanceIdentifier,
            "int8" => BuiltinType::Int8,
            "int16" => BuiltinType::Int16,
            "int32" => BuiltinType::Int32,
            "int64" => BuiltinType::Int64,
            "leafref" => BuiltinType::Leafref,
            "string" => BuiltinType::String,
            "uint8" => BuiltinType::Uint8,
            "uint16" => BuiltinType::Uint16,
            "uint32" => BuiltinType::Uint32,
            "uint64" => BuiltinType::Uint64,
            "union" => BuiltinType::Union,
            _ => return None,
        };
        Some(ty)
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            BuiltinType::Binary => "binary",
            BuiltinType::Bits => "bits",
            BuiltinType::Boolean => "boolean",
            BuiltinType::Decimal64 => "decimal64",
            BuiltinType::Empty => "empty",
            BuiltinType::Enumeration => "enumeration",
            BuiltinType::Identityref => "identityref",
            BuiltinType::InstanceIdentifier => "instance-identifier",
            BuiltinType::Int8 => "int8",
            BuiltinType::Int16 => "int16",
            BuiltinType::Int32 => "int32",
            BuiltinType::Int64 => "int64",
            BuiltinType::Leafref => "leafref",
            BuiltinType::String => "string",
            BuiltinType::Uint8 => "uint8",
            BuiltinType::Uint16 => "uint16",
            BuiltinType::Uint32 => "uint32",
            BuiltinType::Uint64 => "uint64",
            BuiltinType::Union => "union",
        }
    }
}

impl Display for BuiltinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Current,
    Deprecated,
    Obsolete,
}

// --- Module header and linkage ---

/// A parsed module or submodule. Submodules carry `belongs_to`.
#[derive(Debug, Clone, Default)]
pub struct ParsedModule {
    pub name: String,
    /// Name of the owning module; `Some` only for submodules.
    pub belongs_to: Option<String>,
    /// The module's own prefix, or the belongs-to prefix of a submodule.
    pub prefix: String,
    pub namespace: Option<String>,
    pub yang_version: Option<String>,
    pub organization: Option<String>,
    pub contact: Option<String>,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub revisions: Vec<Revision>,
    pub imports: Vec<Import>,
    pub includes: Vec<Include>,
    pub features: Vec<Feature>,
    pub identities: Vec<Identity>,
    pub extensions: Vec<Extension>,
    pub typedefs: Vec<Typedef>,
    pub groupings: Vec<Node>,
    pub data: Vec<Node>,
    pub augments: Vec<Node>,
    pub deviations: Vec<Deviation>,
    pub rpcs: Vec<Node>,
    pub notifications: Vec<Node>,
    pub line: usize,
}

impl ParsedModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_submodule(&self) -> bool {
        self.belongs_to.is_some()
    }

    /// The newest revision. Only meaningful once the revisions are sorted.
    #[must_use]
    pub fn revision(&self) -> Option<&str> {
        self.revisions.first().map(|rev| rev.date.as_str())
    }

    /// Every loaded submodule reachable through includes, depth first.
    #[must_use]
    pub fn submodules(&self) -> Vec<&ParsedModule> {
        let mut out = Vec::new();
        collect_submodules(self, &mut out);
        out
    }
}

fn collect_submodules<'a>(module: &'a ParsedModule, out: &mut Vec<&'a ParsedModule>) {
    for include in &module.includes {
        if let Some(sub) = include.submodule.as_deref() {
            out.push(sub);
            collect_submodules(sub, out);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Revision {
    pub date: String,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub struct Import {
    pub name: String,
    pub prefix: String,
    pub revision: Option<String>,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub line: usize,
    /// The registered module this import was resolved to.
    pub module: Option<ModuleId>,
}

#[derive(Debug, Clone)]
pub struct Include {
    pub name: String,
    pub revision: Option<String>,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub line: usize,
    /// The parsed submodule. Stays empty when the same submodule is already
    /// included through another path of the include tree.
    pub submodule: Option<Box<ParsedModule>>,
}

#[derive(Debug, Clone)]
pub struct Feature {
    pub name: String,
    pub if_features: Vec<String>,
    pub description: Option<String>,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub struct Identity {
    pub name: String,
    pub bases: Vec<String>,
    pub description: Option<String>,
    pub line: usize,
}

/// Extension definitions are recorded but never executed.
#[derive(Debug, Clone)]
pub struct Extension {
    pub name: String,
    pub argument: Option<String>,
    pub line: usize,
}

// --- Types ---

#[derive(Debug, Clone)]
pub struct Typedef {
    pub name: String,
    pub type_ref: TypeRef,
    pub units: Option<String>,
    pub default: Option<String>,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub status: Option<Status>,
    pub line: usize,
}

/// A `type` statement as written: the (possibly prefixed) name plus its restrictions.
#[derive(Debug, Clone, Default)]
pub struct TypeRef {
    pub name: String,
    pub line: usize,
    pub range: Option<String>,
    pub length: Option<String>,
    pub patterns: Vec<String>,
    pub enums: Vec<EnumValue>,
    pub bits: Vec<Bit>,
    pub path: Option<String>,
    pub require_instance: Option<bool>,
    pub fraction_digits: Option<u8>,
    pub bases: Vec<String>,
    /// Member types of a union.
    pub types: Vec<TypeRef>,
}

impl TypeRef {
    pub fn new(name: impl Into<String>, line: usize) -> Self {
        Self {
            name: name.into(),
            line,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumValue {
    pub name: String,
    pub value: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bit {
    pub name: String,
    pub position: Option<u32>,
}

// --- Schema nodes ---

/// A schema node of any kind. The kind-specific substatements live in [`NodeKind`].
#[derive(Debug, Clone)]
pub struct Node {
    /// Node identifier; the grouping reference for `uses`, the target path for `augment`.
    pub name: String,
    pub line: usize,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub status: Option<Status>,
    pub when: Option<String>,
    pub if_features: Vec<String>,
    pub kind: NodeKind,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Container(Container),
    Leaf(Leaf),
    LeafList(LeafList),
    List(List),
    Choice(Choice),
    Case(Case),
    AnyData(AnyData),
    Uses(Uses),
    Augment(Augment),
    Grouping(Grouping),
    Action(Action),
    Input(InOut),
    Output(InOut),
    Notification(Notification),
}

impl NodeKind {
    /// The keyword that introduces this kind of node.
    #[must_use]
    pub fn keyword(&self) -> &'static str {
        match self {
            NodeKind::Container(_) => "container",
            NodeKind::Leaf(_) => "leaf",
            NodeKind::LeafList(_) => "leaf-list",
            NodeKind::List(_) => "list",
            NodeKind::Choice(_) => "choice",
            NodeKind::Case(_) => "case",
            NodeKind::AnyData(any) if any.xml => "anyxml",
            NodeKind::AnyData(_) => "anydata",
            NodeKind::Uses(_) => "uses",
            NodeKind::Augment(_) => "augment",
            NodeKind::Grouping(_) => "grouping",
            NodeKind::Action(action) if action.rpc => "rpc",
            NodeKind::Action(_) => "action",
            NodeKind::Input(_) => "input",
            NodeKind::Output(_) => "output",
            NodeKind::Notification(_) => "notification",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Container {
    pub presence: Option<String>,
    pub config: Option<bool>,
    pub musts: Vec<String>,
    pub typedefs: Vec<Typedef>,
    pub groupings: Vec<Node>,
    pub children: Vec<Node>,
    pub actions: Vec<Node>,
    pub notifications: Vec<Node>,
}

#[derive(Debug, Clone, Default)]
pub struct Leaf {
    pub type_ref: TypeRef,
    pub units: Option<String>,
    pub default: Option<String>,
    pub config: Option<bool>,
    pub mandatory: Option<bool>,
    pub musts: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LeafList {
    pub type_ref: TypeRef,
    pub units: Option<String>,
    pub defaults: Vec<String>,
    pub config: Option<bool>,
    pub min_elements: Option<u32>,
    pub max_elements: Option<u32>,
    pub ordered_by_user: bool,
    pub musts: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct List {
    pub keys: Vec<String>,
    pub uniques: Vec<String>,
    pub config: Option<bool>,
    pub min_elements: Option<u32>,
    pub max_elements: Option<u32>,
    pub ordered_by_user: bool,
    pub musts: Vec<String>,
    pub typedefs: Vec<Typedef>,
    pub groupings: Vec<Node>,
    pub children: Vec<Node>,
    pub actions: Vec<Node>,
    pub notifications: Vec<Node>,
}

#[derive(Debug, Clone, Default)]
pub struct Choice {
    pub default: Option<String>,
    pub config: Option<bool>,
    pub mandatory: Option<bool>,
    /// Cases, or shorthand data nodes that stand for an implicit case.
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, Default)]
pub struct Case {
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, Default)]
pub struct AnyData {
    /// `anyxml` rather than `anydata`.
    pub xml: bool,
    pub config: Option<bool>,
    pub mandatory: Option<bool>,
    pub musts: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Uses {
    pub refines: Vec<Refine>,
    pub augments: Vec<Node>,
}

#[derive(Debug, Clone, Default)]
pub struct Refine {
    pub target: String,
    pub line: usize,
    pub description: Option<String>,
    pub defaults: Vec<String>,
    pub config: Option<bool>,
    pub mandatory: Option<bool>,
    pub presence: Option<String>,
    pub min_elements: Option<u32>,
    pub max_elements: Option<u32>,
}

/// A `deviation`: changes this module declares to a node of an implemented module.
#[derive(Debug, Clone)]
pub struct Deviation {
    /// Absolute schema path of the deviated node.
    pub target: String,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub deviates: Vec<Deviate>,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviateKind {
    NotSupported,
    Add,
    Replace,
    Delete,
}

impl DeviateKind {
    #[must_use]
    pub fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "not-supported" => Some(DeviateKind::NotSupported),
            "add" => Some(DeviateKind::Add),
            "replace" => Some(DeviateKind::Replace),
            "delete" => Some(DeviateKind::Delete),
            _ => None,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            DeviateKind::NotSupported => "not-supported",
            DeviateKind::Add => "add",
            DeviateKind::Replace => "replace",
            DeviateKind::Delete => "delete",
        }
    }
}

/// One `deviate` of a deviation with the properties it adds, replaces or deletes.
#[derive(Debug, Clone)]
pub struct Deviate {
    pub kind: DeviateKind,
    pub line: usize,
    pub type_ref: Option<TypeRef>,
    pub units: Option<String>,
    pub defaults: Vec<String>,
    pub config: Option<bool>,
    pub mandatory: Option<bool>,
    pub min_elements: Option<u32>,
    /// `Some(None)` stands for `max-elements unbounded`.
    pub max_elements: Option<Option<u32>>,
    pub musts: Vec<String>,
    pub uniques: Vec<String>,
}

impl Deviate {
    pub fn new(kind: DeviateKind, line: usize) -> Self {
        Self {
            kind,
            line,
            type_ref: None,
            units: None,
            defaults: Vec::new(),
            config: None,
            mandatory: None,
            min_elements: None,
            max_elements: None,
            musts: Vec::new(),
            uniques: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Augment {
    pub children: Vec<Node>,
    pub actions: Vec<Node>,
    pub notifications: Vec<Node>,
}

#[derive(Debug, Clone, Default)]
pub struct Grouping {
    pub typedefs: Vec<Typedef>,
    pub groupings: Vec<Node>,
    pub children: Vec<Node>,
    pub actions: Vec<Node>,
    pub notifications: Vec<Node>,
}

/// An `rpc` or an `action`. Its children are the `input`/`output` nodes.
#[derive(Debug, Clone, Default)]
pub struct Action {
    pub rpc: bool,
    pub typedefs: Vec<Typedef>,
    pub groupings: Vec<Node>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, Default)]
pub struct InOut {
    pub musts: Vec<String>,
    pub typedefs: Vec<Typedef>,
    pub groupings: Vec<Node>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, Default)]
pub struct Notification {
    pub musts: Vec<String>,
    pub typedefs: Vec<Typedef>,
    pub groupings: Vec<Node>,
    pub children: Vec<Node>,
}

// --- Structural accessors ---

/// The substatement lists a node kind owns. A `None` slot means the kind has no such list.
#[derive(Debug, Default)]
struct Slots<'a> {
    typedefs: Option<&'a Vec<Typedef>>,
    groupings: Option<&'a Vec<Node>>,
    actions: Option<&'a Vec<Node>>,
    notifications: Option<&'a Vec<Node>>,
    children: Option<&'a Vec<Node>>,
}

#[derive(Debug, Default)]
struct SlotsMut<'a> {
    typedefs: Option<&'a mut Vec<Typedef>>,
    groupings: Option<&'a mut Vec<Node>>,
    actions: Option<&'a mut Vec<Node>>,
    notifications: Option<&'a mut Vec<Node>>,
    children: Option<&'a mut Vec<Node>>,
}

impl Node {
    pub fn new(name: impl Into<String>, line: usize, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            line,
            description: None,
            reference: None,
            status: None,
            when: None,
            if_features: Vec::new(),
            kind,
        }
    }

    fn slots(&self) -> Slots<'_> {
        match &self.kind {
            NodeKind::Container(c) => Slots {
                typedefs: Some(&c.typedefs),
                groupings: Some(&c.groupings),
                actions: Some(&c.actions),
                notifications: Some(&c.notifications),
                children: Some(&c.children),
            },
            NodeKind::List(l) => Slots {
                typedefs: Some(&l.typedefs),
                groupings: Some(&l.groupings),
                actions: Some(&l.actions),
                notifications: Some(&l.notifications),
                children: Some(&l.children),
            },
            NodeKind::Grouping(g) => Slots {
                typedefs: Some(&g.typedefs),
                groupings: Some(&g.groupings),
                actions: Some(&g.actions),
                notifications: Some(&g.notifications),
                children: Some(&g.children),
            },
            NodeKind::Augment(a) => Slots {
                actions: Some(&a.actions),
                notifications: Some(&a.notifications),
                children: Some(&a.children),
                ..Slots::default()
            },
            NodeKind::Action(a) => Slots {
                typedefs: Some(&a.typedefs),
                groupings: Some(&a.groupings),
                children: Some(&a.children),
                ..Slots::default()
            },
            NodeKind::Input(io) | NodeKind::Output(io) => Slots {
                typedefs: Some(&io.typedefs),
                groupings: Some(&io.groupings),
                children: Some(&io.children),
                ..Slots::default()
            },
            NodeKind::Notification(n) => Slots {
                typedefs: Some(&n.typedefs),
                groupings: Some(&n.groupings),
                children: Some(&n.children),
                ..Slots::default()
            },
            NodeKind::Choice(c) => Slots {
                children: Some(&c.children),
                ..Slots::default()
            },
            NodeKind::Case(c) => Slots {
                children: Some(&c.children),
                ..Slots::default()
            },
            NodeKind::Leaf(_) | NodeKind::LeafList(_) | NodeKind::AnyData(_) | NodeKind::Uses(_) => {
                Slots::default()
            }
        }
    }

    fn slots_mut(&mut self) -> SlotsMut<'_> {
        match &mut self.kind {
            NodeKind::Container(c) => SlotsMut {
                typedefs: Some(&mut c.typedefs),
                groupings: Some(&mut c.groupings),
                actions: Some(&mut c.actions),
                notifications: Some(&mut c.notifications),
                children: Some(&mut c.children),
            },
            NodeKind::List(l) => SlotsMut {
                typedefs: Some(&mut l.typedefs),
                groupings: Some(&mut l.groupings),
                actions: Some(&mut l.actions),
                notifications: Some(&mut l.notifications),
                children: Some(&mut l.children),
            },
            NodeKind::Grouping(g) => SlotsMut {
                typedefs: Some(&mut g.typedefs),
                groupings: Some(&mut g.groupings),
                actions: Some(&mut g.actions),
                notifications: Some(&mut g.notifications),
                children: Some(&mut g.children),
            },
            NodeKind::Augment(a) => SlotsMut {
                actions: Some(&mut a.actions),
                notifications: Some(&mut a.notifications),
                children: Some(&mut a.children),
                ..SlotsMut::default()
            },
            NodeKind::Action(a) => SlotsMut {
                typedefs: Some(&mut a.typedefs),
                groupings: Some(&mut a.groupings),
                children: Some(&mut a.children),
                ..SlotsMut::default()
            },
            NodeKind::Input(io) | NodeKind::Output(io) => SlotsMut {
                typedefs: Some(&mut io.typedefs),
                groupings: Some(&mut io.groupings),
                children: Some(&mut io.children),
                ..SlotsMut::default()
            },
            NodeKind::Notification(n) => SlotsMut {
                typedefs: Some(&mut n.typedefs),
                groupings: Some(&mut n.groupings),
                children: Some(&mut n.children),
                ..SlotsMut::default()
            },
            NodeKind::Choice(c) => SlotsMut {
                children: Some(&mut c.children),
                ..SlotsMut::default()
            },
            NodeKind::Case(c) => SlotsMut {
                children: Some(&mut c.children),
                ..SlotsMut::default()
            },
            NodeKind::Leaf(_) | NodeKind::LeafList(_) | NodeKind::AnyData(_) | NodeKind::Uses(_) => {
                SlotsMut::default()
            }
        }
    }

    /// The node's local typedef list, if its kind can hold one.
    #[must_use]
    pub fn typedefs(&self) -> Option<&Vec<Typedef>> {
        self.slots().typedefs
    }

    pub fn typedefs_mut(&mut self) -> Option<&mut Vec<Typedef>> {
        self.slots_mut().typedefs
    }

    #[must_use]
    pub fn groupings(&self) -> Option<&Vec<Node>> {
        self.slots().groupings
    }

    pub fn groupings_mut(&mut self) -> Option<&mut Vec<Node>> {
        self.slots_mut().groupings
    }

    #[must_use]
    pub fn actions(&self) -> Option<&Vec<Node>> {
        self.slots().actions
    }

    pub fn actions_mut(&mut self) -> Option<&mut Vec<Node>> {
        self.slots_mut().actions
    }

    #[must_use]
    pub fn notifications(&self) -> Option<&Vec<Node>> {
        self.slots().notifications
    }

    pub fn notifications_mut(&mut self) -> Option<&mut Vec<Node>> {
        self.slots_mut().notifications
    }

    #[must_use]
    pub fn children(&self) -> Option<&Vec<Node>> {
        self.slots().children
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        self.slots_mut().children
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str) -> Node {
        Node::new(
            name,
            1,
            NodeKind::Leaf(Leaf {
                type_ref: TypeRef::new("string", 1),
                ..Leaf::default()
            }),
        )
    }

    #[test]
    fn test_leaf_has_no_slots() {
        let node = leaf("name");
        assert!(node.children().is_none());
        assert!(node.typedefs().is_none());
        assert!(node.actions().is_none());
        assert!(node.notifications().is_none());
    }

    #[test]
    fn test_notification_has_no_nested_notifications() {
        let node = Node::new("event", 1, NodeKind::Notification(Notification::default()));
        assert!(node.notifications().is_none());
        assert!(node.typedefs().is_some());
        assert!(node.children().is_some());
    }

    #[test]
    fn test_children_mut_reaches_container_slot() {
        let mut node = Node::new("top", 1, NodeKind::Container(Container::default()));
        node.children_mut().unwrap().push(leaf("inner"));
        assert_eq!(node.children().map(Vec::len), Some(1));
    }

    #[test]
    fn test_augment_has_no_typedefs() {
        let node = Node::new("/a:top", 1, NodeKind::Augment(Augment::default()));
        assert!(node.typedefs().is_none());
        assert!(node.actions().is_some());
    }

    #[test]
    fn test_builtin_names_round_trip() {
        for name in ["int8", "instance-identifier", "union", "string"] {
            assert_eq!(BuiltinType::from_name(name).map(BuiltinType::name), Some(name));
        }
        assert!(BuiltinType::from_name("String").is_none());
    }

    #[test]
    fn test_submodules_depth_first() {
        let mut inner = ParsedModule::new("sub-b");
        inner.belongs_to = Some("main".into());
        let mut outer = ParsedModule::new("sub-a");
        outer.belongs_to = Some("main".into());
        outer.includes.push(Include {
            name: "sub-b".into(),
            revision: None,
            description: None,
            reference: None,
            line: 1,
            submodule: Some(Box::new(inner)),
        });
        let mut main = ParsedModule::new("main");
        main.includes.push(Include {
            name: "sub-a".into(),
            revision: None,
            description: None,
            reference: None,
            line: 1,
            submodule: Some(Box::new(outer)),
        });

        let names: Vec<_> = main.submodules().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["sub-a", "sub-b"]);
    }
}
