//! Turns a generic [`Statement`] tree into a [`ParsedModule`].
//!
//! The builder knows which substatements every keyword accepts. Anything it does not
//! know is an error, except prefixed keywords (extension instances), which are skipped.

use crate::ast::{
    Action, AnyData, Augment, Bit, Case, Choice, Container, Deviate, DeviateKind, Deviation,
    EnumValue, Extension, Feature, Grouping, Identity, Import, InOut, Include, Leaf, LeafList, List, Node, NodeKind,
    Notification, ParsedModule, Refine, Revision, Status, TypeRef, Typedef, Uses,
};
use crate::error::{ParserError, YangError};
use crate::parser::{is_identifier, ParserContext, PendingScope, Statement};
use crate::validate::{check_date, check_prefix};
use log::debug;
use miette::NamedSource;
use std::str::FromStr;

/// Substatements that may appear at most once in their parent.
const SINGLETONS: &[&str] = &[
    "argument",
    "belongs-to",
    "config",
    "contact",
    "description",
    "fraction-digits",
    "input",
    "key",
    "length",
    "mandatory",
    "max-elements",
    "min-elements",
    "namespace",
    "ordered-by",
    "organization",
    "output",
    "path",
    "position",
    "prefix",
    "presence",
    "range",
    "reference",
    "require-instance",
    "revision-date",
    "status",
    "type",
    "units",
    "value",
    "when",
    "yang-version",
];

/// Keywords that define data nodes in a body.
const DATA_KEYWORDS: &[&str] = &[
    "anydata",
    "anyxml",
    "choice",
    "container",
    "leaf",
    "leaf-list",
    "list",
    "uses",
];

/// Builds `root` into `pctx.module`, recording every scope that owns typedefs or
/// groupings in the pending sets of `pctx`.
pub fn build(pctx: &mut ParserContext, root: &Statement, data: &str) -> Result<(), YangError> {
    let mut builder = Builder { pctx, text: data };
    let module = builder.module(root)?;
    builder.pctx.module = module;
    Ok(())
}

struct Builder<'a> {
    pctx: &'a mut ParserContext,
    text: &'a str,
}

impl Builder<'_> {
    fn module(&mut self, root: &Statement) -> Result<ParsedModule, YangError> {
        self.enter(root);
        let submodule = match root.keyword.as_str() {
            "module" => false,
            "submodule" => true,
            _ => return Err(self.unexpected(root, "document")),
        };

        let mut module = ParsedModule::new(self.identifier(root)?);
        module.line = root.line;
        let mut seen = Vec::new();

        for stmt in &root.children {
            self.enter(stmt);
            if stmt.is_extension() {
                debug!("Skipping extension instance \"{}\" on line {}", stmt.keyword, stmt.line);
                continue;
            }
            self.once(&mut seen, stmt)?;
            match stmt.keyword.as_str() {
                "yang-version" => {
                    let version = self.arg(stmt)?;
                    if version != "1" && version != "1.1" {
                        return Err(self.invalid(stmt, "expected \"1\" or \"1.1\""));
                    }
                    module.yang_version = Some(version.to_string());
                }
                "namespace" if !submodule => module.namespace = Some(self.arg(stmt)?.to_string()),
                "prefix" if !submodule => {
                    let prefix = self.identifier(stmt)?;
                    check_prefix(&module, &prefix, None, stmt.line)?;
                    module.prefix = prefix;
                }
                "belongs-to" if submodule => {
                    module.belongs_to = Some(self.identifier(stmt)?);
                    let prefix = self.belongs_to_prefix(stmt)?;
                    check_prefix(&module, &prefix, None, stmt.line)?;
                    module.prefix = prefix;
                }
                "organization" => module.organization = Some(self.arg(stmt)?.to_string()),
                "contact" => module.contact = Some(self.arg(stmt)?.to_string()),
                "description" => module.description = Some(self.arg(stmt)?.to_string()),
                "reference" => module.reference = Some(self.arg(stmt)?.to_string()),
                "revision" => module.revisions.push(self.revision(stmt)?),
                "import" => {
                    let import = self.import(stmt)?;
                    if import.name == module.name {
                        return Err(self.invalid(stmt, "a module cannot import itself"));
                    }
                    module.imports.push(import);
                    let slot = module.imports.len() - 1;
                    check_prefix(&module, &module.imports[slot].prefix, Some(slot), stmt.line)?;
                }
                "include" => module.includes.push(self.include(stmt)?),
                "feature" => module.features.push(self.feature(stmt)?),
                "identity" => module.identities.push(self.identity(stmt)?),
                "extension" => module.extensions.push(self.extension(stmt)?),
                "typedef" => module.typedefs.push(self.typedef(stmt)?),
                "grouping" => module.groupings.push(self.node(stmt)?),
                "augment" => module.augments.push(self.node(stmt)?),
                "rpc" => module.rpcs.push(self.node(stmt)?),
                "notification" => module.notifications.push(self.node(stmt)?),
                "deviation" => module.deviations.push(self.deviation(stmt)?),
                keyword if DATA_KEYWORDS.contains(&keyword) => module.data.push(self.node(stmt)?),
                _ => return Err(self.unexpected(stmt, &root.keyword)),
            }
        }

        if submodule {
            if module.belongs_to.is_none() {
                return Err(self.missing("belongs-to", root));
            }
        } else {
            if module.namespace.is_none() {
                return Err(self.missing("namespace", root));
            }
            if module.prefix.is_empty() {
                return Err(self.missing("prefix", root));
            }
        }
        Ok(module)
    }

    fn belongs_to_prefix(&mut self, stmt: &Statement) -> Result<String, YangError> {
        let mut prefix = None;
        for child in stmt.children.iter().filter(|c| !c.is_extension()) {
            self.enter(child);
            match child.keyword.as_str() {
                "prefix" if prefix.is_none() => prefix = Some(self.identifier(child)?),
                "prefix" => return Err(self.duplicate(child)),
                _ => return Err(self.unexpected(child, &stmt.keyword)),
            }
        }
        prefix.ok_or_else(|| self.missing("prefix", stmt))
    }

    // --- Linkage and meta statements ---

    fn revision(&mut self, stmt: &Statement) -> Result<Revision, YangError> {
        let date = self.arg(stmt)?.to_string();
        check_date(&date, "revision", stmt.line)?;
        let mut revision = Revision {
            date,
            description: None,
            reference: None,
            line: stmt.line,
        };
        let mut seen = Vec::new();
        for child in stmt.children.iter().filter(|c| !c.is_extension()) {
            self.enter(child);
            self.once(&mut seen, child)?;
            match child.keyword.as_str() {
                "description" => revision.description = Some(self.arg(child)?.to_string()),
                "reference" => revision.reference = Some(self.arg(child)?.to_string()),
                _ => return Err(self.unexpected(child, "revision")),
            }
        }
        Ok(revision)
    }

    fn revision_date(&self, stmt: &Statement) -> Result<String, YangError> {
        let date = self.arg(stmt)?.to_string();
        check_date(&date, "revision-date", stmt.line)?;
        Ok(date)
    }

    fn import(&mut self, stmt: &Statement) -> Result<Import, YangError> {
        let mut import = Import {
            name: self.identifier(stmt)?,
            prefix: String::new(),
            revision: None,
            description: None,
            reference: None,
            line: stmt.line,
            module: None,
        };
        let mut seen = Vec::new();
        for child in stmt.children.iter().filter(|c| !c.is_extension()) {
            self.enter(child);
            self.once(&mut seen, child)?;
            match child.keyword.as_str() {
                "prefix" => import.prefix = self.identifier(child)?,
                "revision-date" => import.revision = Some(self.revision_date(child)?),
                "description" => import.description = Some(self.arg(child)?.to_string()),
                "reference" => import.reference = Some(self.arg(child)?.to_string()),
                _ => return Err(self.unexpected(child, "import")),
            }
        }
        if import.prefix.is_empty() {
            return Err(self.missing("prefix", stmt));
        }
        Ok(import)
    }

    fn include(&mut self, stmt: &Statement) -> Result<Include, YangError> {
        let mut include = Include {
            name: self.identifier(stmt)?,
            revision: None,
            description: None,
            reference: None,
            line: stmt.line,
            submodule: None,
        };
        let mut seen = Vec::new();
        for child in stmt.children.iter().filter(|c| !c.is_extension()) {
            self.enter(child);
            self.once(&mut seen, child)?;
            match child.keyword.as_str() {
                "revision-date" => include.revision = Some(self.revision_date(child)?),
                "description" => include.description = Some(self.arg(child)?.to_string()),
                "reference" => include.reference = Some(self.arg(child)?.to_string()),
                _ => return Err(self.unexpected(child, "include")),
            }
        }
        Ok(include)
    }

    fn feature(&mut self, stmt: &Statement) -> Result<Feature, YangError> {
        let mut feature = Feature {
            name: self.identifier(stmt)?,
            if_features: Vec::new(),
            description: None,
            line: stmt.line,
        };
        let mut seen = Vec::new();
        for child in stmt.children.iter().filter(|c| !c.is_extension()) {
            self.enter(child);
            self.once(&mut seen, child)?;
            match child.keyword.as_str() {
                "if-feature" => feature.if_features.push(self.arg(child)?.to_string()),
                "description" => feature.description = Some(self.arg(child)?.to_string()),
                "reference" | "status" => {}
                _ => return Err(self.unexpected(child, "feature")),
            }
        }
        Ok(feature)
    }

    fn identity(&mut self, stmt: &Statement) -> Result<Identity, YangError> {
        let mut identity = Identity {
            name: self.identifier(stmt)?,
            bases: Vec::new(),
            description: None,
            line: stmt.line,
        };
        let mut seen = Vec::new();
        for child in stmt.children.iter().filter(|c| !c.is_extension()) {
            self.enter(child);
            self.once(&mut seen, child)?;
            match child.keyword.as_str() {
                "base" => identity.bases.push(self.qualified(child)?),
                "description" => identity.description = Some(self.arg(child)?.to_string()),
                "reference" | "status" | "if-feature" => {}
                _ => return Err(self.unexpected(child, "identity")),
            }
        }
        Ok(identity)
    }

    fn extension(&mut self, stmt: &Statement) -> Result<Extension, YangError> {
        let mut extension = Extension {
            name: self.identifier(stmt)?,
            argument: None,
            line: stmt.line,
        };
        let mut seen = Vec::new();
        for child in stmt.children.iter().filter(|c| !c.is_extension()) {
            self.enter(child);
            self.once(&mut seen, child)?;
            match child.keyword.as_str() {
                // yin-element under argument only matters for the XML encoding.
                "argument" => extension.argument = Some(self.identifier(child)?),
                "description" | "reference" | "status" => {}
                _ => return Err(self.unexpected(child, "extension")),
            }
        }
        Ok(extension)
    }

    // --- Types ---

    fn typedef(&mut self, stmt: &Statement) -> Result<Typedef, YangError> {
        let name = self.identifier(stmt)?;
        let mut type_ref = None;
        let mut typedef = Typedef {
            name,
            type_ref: TypeRef::default(),
            units: None,
            default: None,
            description: None,
            reference: None,
            status: None,
            line: stmt.line,
        };
        let mut seen = Vec::new();
        for child in stmt.children.iter().filter(|c| !c.is_extension()) {
            self.enter(child);
            self.once(&mut seen, child)?;
            match child.keyword.as_str() {
                "type" => type_ref = Some(self.type_ref(child)?),
                "units" => typedef.units = Some(self.arg(child)?.to_string()),
                "default" => {
                    if typedef.default.is_some() {
                        return Err(self.duplicate(child));
                    }
                    typedef.default = Some(self.arg(child)?.to_string());
                }
                "description" => typedef.description = Some(self.arg(child)?.to_string()),
                "reference" => typedef.reference = Some(self.arg(child)?.to_string()),
                "status" => typedef.status = Some(self.status(child)?),
                _ => return Err(self.unexpected(child, "typedef")),
            }
        }
        typedef.type_ref = type_ref.ok_or_else(|| self.missing("type", stmt))?;
        Ok(typedef)
    }

    fn type_ref(&mut self, stmt: &Statement) -> Result<TypeRef, YangError> {
        let mut type_ref = TypeRef::new(self.qualified(stmt)?, stmt.line);
        let mut seen = Vec::new();
        for child in stmt.children.iter().filter(|c| !c.is_extension()) {
            self.enter(child);
            if child.keyword != "type" {
                self.once(&mut seen, child)?;
            }
            // Restriction substatements (error-message, modifier...) are not kept.
            match child.keyword.as_str() {
                "range" => type_ref.range = Some(self.arg(child)?.to_string()),
                "length" => type_ref.length = Some(self.arg(child)?.to_string()),
                "pattern" => type_ref.patterns.push(self.arg(child)?.to_string()),
                "path" => type_ref.path = Some(self.arg(child)?.to_string()),
                "require-instance" => type_ref.require_instance = Some(self.boolean(child)?),
                "fraction-digits" => {
                    let digits: u8 = self.number(child)?;
                    if !(1..=18).contains(&digits) {
                        return Err(self.invalid(child, "fraction-digits must be between 1 and 18"));
                    }
                    type_ref.fraction_digits = Some(digits);
                }
                "base" => type_ref.bases.push(self.qualified(child)?),
                "enum" => type_ref.enums.push(self.enum_value(child)?),
                "bit" => type_ref.bits.push(self.bit(child)?),
                "type" => type_ref.types.push(self.type_ref(child)?),
                _ => return Err(self.unexpected(child, "type")),
            }
        }
        Ok(type_ref)
    }

    fn enum_value(&mut self, stmt: &Statement) -> Result<EnumValue, YangError> {
        let mut value = EnumValue {
            name: self.arg(stmt)?.to_string(),
            value: None,
        };
        let mut seen = Vec::new();
        for child in stmt.children.iter().filter(|c| !c.is_extension()) {
            self.enter(child);
            self.once(&mut seen, child)?;
            match child.keyword.as_str() {
                "value" => value.value = Some(self.number(child)?),
                "description" | "reference" | "status" | "if-feature" => {}
                _ => return Err(self.unexpected(child, "enum")),
            }
        }
        Ok(value)
    }

    fn bit(&mut self, stmt: &Statement) -> Result<Bit, YangError> {
        let mut bit = Bit {
            name: self.identifier(stmt)?,
            position: None,
        };
        let mut seen = Vec::new();
        for child in stmt.children.iter().filter(|c| !c.is_extension()) {
            self.enter(child);
            self.once(&mut seen, child)?;
            match child.keyword.as_str() {
                "position" => bit.position = Some(self.number(child)?),
                "description" | "reference" | "status" | "if-feature" => {}
                _ => return Err(self.unexpected(child, "bit")),
            }
        }
        Ok(bit)
    }

    // --- Schema nodes ---

    fn node(&mut self, stmt: &Statement) -> Result<Node, YangError> {
        let kind = match stmt.keyword.as_str() {
            "container" => NodeKind::Container(Container::default()),
            "leaf" => NodeKind::Leaf(Leaf::default()),
            "leaf-list" => NodeKind::LeafList(LeafList::default()),
            "list" => NodeKind::List(List::default()),
            "choice" => NodeKind::Choice(Choice::default()),
            "case" => NodeKind::Case(Case::default()),
            "anydata" => NodeKind::AnyData(AnyData::default()),
            "anyxml" => NodeKind::AnyData(AnyData {
                xml: true,
                ..AnyData::default()
            }),
            "uses" => NodeKind::Uses(Uses::default()),
            "augment" => NodeKind::Augment(Augment::default()),
            "grouping" => NodeKind::Grouping(Grouping::default()),
            "rpc" => NodeKind::Action(Action {
                rpc: true,
                ..Action::default()
            }),
            "action" => NodeKind::Action(Action::default()),
            "input" => NodeKind::Input(InOut::default()),
            "output" => NodeKind::Output(InOut::default()),
            "notification" => NodeKind::Notification(Notification::default()),
            _ => return Err(self.unexpected(stmt, "body")),
        };
        let name = match &kind {
            NodeKind::Input(_) | NodeKind::Output(_) => stmt.keyword.clone(),
            NodeKind::Uses(_) => self.qualified(stmt)?,
            NodeKind::Augment(_) => self.arg(stmt)?.to_string(),
            _ => self.identifier(stmt)?,
        };
        let mut node = Node::new(name, stmt.line, kind);
        let mut seen = Vec::new();

        for child in &stmt.children {
            self.enter(child);
            if child.is_extension() {
                debug!("Skipping extension instance \"{}\" on line {}", child.keyword, child.line);
                continue;
            }
            self.once(&mut seen, child)?;
            match child.keyword.as_str() {
                "description" => node.description = Some(self.arg(child)?.to_string()),
                "reference" => node.reference = Some(self.arg(child)?.to_string()),
                "status" => node.status = Some(self.status(child)?),
                "when" => node.when = Some(self.arg(child)?.to_string()),
                "if-feature" => node.if_features.push(self.arg(child)?.to_string()),
                "typedef" => {
                    let typedef = self.typedef(child)?;
                    match node.typedefs_mut() {
                        Some(slot) => slot.push(typedef),
                        None => return Err(self.unexpected(child, &stmt.keyword)),
                    }
                }
                "grouping" => {
                    let grouping = self.node(child)?;
                    match node.groupings_mut() {
                        Some(slot) => slot.push(grouping),
                        None => return Err(self.unexpected(child, &stmt.keyword)),
                    }
                }
                "action" => {
                    let action = self.node(child)?;
                    match node.actions_mut() {
                        Some(slot) => slot.push(action),
                        None => return Err(self.unexpected(child, &stmt.keyword)),
                    }
                }
                "notification" => {
                    let notification = self.node(child)?;
                    match node.notifications_mut() {
                        Some(slot) => slot.push(notification),
                        None => return Err(self.unexpected(child, &stmt.keyword)),
                    }
                }
                "input" | "output" => {
                    if !matches!(node.kind, NodeKind::Action(_)) {
                        return Err(self.unexpected(child, &stmt.keyword));
                    }
                    let io = self.node(child)?;
                    self.push_child(&mut node, io, child, &stmt.keyword)?;
                }
                "case" => {
                    if !matches!(node.kind, NodeKind::Choice(_) | NodeKind::Augment(_)) {
                        return Err(self.unexpected(child, &stmt.keyword));
                    }
                    let case = self.node(child)?;
                    self.push_child(&mut node, case, child, &stmt.keyword)?;
                }
                keyword if DATA_KEYWORDS.contains(&keyword) => {
                    if matches!(node.kind, NodeKind::Action(_)) {
                        return Err(self.unexpected(child, &stmt.keyword));
                    }
                    let data = self.node(child)?;
                    self.push_child(&mut node, data, child, &stmt.keyword)?;
                }
                _ => self.property(&mut node.kind, child, &stmt.keyword)?,
            }
        }

        match &node.kind {
            NodeKind::Leaf(leaf) if leaf.type_ref.name.is_empty() => {
                return Err(self.missing("type", stmt));
            }
            NodeKind::LeafList(list) if list.type_ref.name.is_empty() => {
                return Err(self.missing("type", stmt));
            }
            _ => {}
        }

        let owner = format!("{} \"{}\"", node.kind.keyword(), node.name);
        if let Some(typedefs) = node.typedefs().filter(|t| !t.is_empty()) {
            self.pctx.tpdfs_nodes.push(PendingScope {
                owner: owner.clone(),
                line: node.line,
                names: typedefs.iter().map(|t| (t.name.clone(), t.line)).collect(),
            });
        }
        if let Some(groupings) = node.groupings().filter(|g| !g.is_empty()) {
            self.pctx.grps_nodes.push(PendingScope {
                owner,
                line: node.line,
                names: groupings.iter().map(|g| (g.name.clone(), g.line)).collect(),
            });
        }
        Ok(node)
    }

    fn push_child(
        &self,
        node: &mut Node,
        child: Node,
        stmt: &Statement,
        parent: &str,
    ) -> Result<(), YangError> {
        match node.children_mut() {
            Some(children) => {
                children.push(child);
                Ok(())
            }
            None => Err(self.unexpected(stmt, parent)),
        }
    }

    /// Kind-specific substatements that are not themselves nodes.
    fn property(
        &mut self,
        kind: &mut NodeKind,
        stmt: &Statement,
        parent: &str,
    ) -> Result<(), YangError> {
        match stmt.keyword.as_str() {
            "config" => {
                let value = self.boolean(stmt)?;
                let slot = config_slot(kind).ok_or_else(|| self.unexpected(stmt, parent))?;
                *slot = Some(value);
                return Ok(());
            }
            "mandatory" => {
                let value = self.boolean(stmt)?;
                let slot = mandatory_slot(kind).ok_or_else(|| self.unexpected(stmt, parent))?;
                *slot = Some(value);
                return Ok(());
            }
            "must" => {
                let value = self.arg(stmt)?.to_string();
                let slot = musts_slot(kind).ok_or_else(|| self.unexpected(stmt, parent))?;
                slot.push(value);
                return Ok(());
            }
            _ => {}
        }

        match (kind, stmt.keyword.as_str()) {
            (NodeKind::Container(c), "presence") => c.presence = Some(self.arg(stmt)?.to_string()),
            (NodeKind::Leaf(l), "type") => l.type_ref = self.type_ref(stmt)?,
            (NodeKind::Leaf(l), "units") => l.units = Some(self.arg(stmt)?.to_string()),
            (NodeKind::Leaf(l), "default") => {
                if l.default.is_some() {
                    return Err(self.duplicate(stmt));
                }
                l.default = Some(self.arg(stmt)?.to_string());
            }
            (NodeKind::LeafList(l), "type") => l.type_ref = self.type_ref(stmt)?,
            (NodeKind::LeafList(l), "units") => l.units = Some(self.arg(stmt)?.to_string()),
            (NodeKind::LeafList(l), "default") => l.defaults.push(self.arg(stmt)?.to_string()),
            (NodeKind::LeafList(l), "min-elements") => l.min_elements = Some(self.number(stmt)?),
            (NodeKind::LeafList(l), "max-elements") => l.max_elements = self.max_elements(stmt)?,
            (NodeKind::LeafList(l), "ordered-by") => l.ordered_by_user = self.ordered_by(stmt)?,
            (NodeKind::List(l), "key") => {
                l.keys = self.arg(stmt)?.split_whitespace().map(str::to_string).collect();
            }
            (NodeKind::List(l), "unique") => l.uniques.push(self.arg(stmt)?.to_string()),
            (NodeKind::List(l), "min-elements") => l.min_elements = Some(self.number(stmt)?),
            (NodeKind::List(l), "max-elements") => l.max_elements = self.max_elements(stmt)?,
            (NodeKind::List(l), "ordered-by") => l.ordered_by_user = self.ordered_by(stmt)?,
            (NodeKind::Choice(c), "default") => {
                if c.default.is_some() {
                    return Err(self.duplicate(stmt));
                }
                c.default = Some(self.identifier(stmt)?);
            }
            (NodeKind::Uses(u), "refine") => u.refines.push(self.refine(stmt)?),
            (NodeKind::Uses(u), "augment") => u.augments.push(self.node(stmt)?),
            _ => return Err(self.unexpected(stmt, parent)),
        }
        Ok(())
    }

    fn refine(&mut self, stmt: &Statement) -> Result<Refine, YangError> {
        let mut refine = Refine {
            target: self.arg(stmt)?.to_string(),
            line: stmt.line,
            ..Refine::default()
        };
        let mut seen = Vec::new();
        for child in stmt.children.iter().filter(|c| !c.is_extension()) {
            self.enter(child);
            self.once(&mut seen, child)?;
            match child.keyword.as_str() {
                "description" => refine.description = Some(self.arg(child)?.to_string()),
                "default" => refine.defaults.push(self.arg(child)?.to_string()),
                "config" => refine.config = Some(self.boolean(child)?),
                "mandatory" => refine.mandatory = Some(self.boolean(child)?),
                "presence" => refine.presence = Some(self.arg(child)?.to_string()),
                "min-elements" => refine.min_elements = Some(self.number(child)?),
                "max-elements" => refine.max_elements = self.max_elements(child)?,
                "reference" | "must" | "if-feature" => {}
                _ => return Err(self.unexpected(child, "refine")),
            }
        }
        Ok(refine)
    }

    fn deviation(&mut self, stmt: &Statement) -> Result<Deviation, YangError> {
        let target = self.arg(stmt)?.to_string();
        if !target.starts_with('/') {
            return Err(self.invalid(stmt, "the target must be an absolute schema path"));
        }
        let mut deviation = Deviation {
            target,
            description: None,
            reference: None,
            deviates: Vec::new(),
            line: stmt.line,
        };
        let mut seen = Vec::new();
        for child in stmt.children.iter().filter(|c| !c.is_extension()) {
            self.enter(child);
            self.once(&mut seen, child)?;
            match child.keyword.as_str() {
                "description" => deviation.description = Some(self.arg(child)?.to_string()),
                "reference" => deviation.reference = Some(self.arg(child)?.to_string()),
                "deviate" => deviation.deviates.push(self.deviate(child)?),
                _ => return Err(self.unexpected(child, "deviation")),
            }
        }
        if deviation.deviates.is_empty() {
            return Err(self.missing("deviate", stmt));
        }
        if deviation.deviates.len() > 1
            && deviation.deviates.iter().any(|d| d.kind == DeviateKind::NotSupported)
        {
            return Err(self.invalid(stmt, "\"not-supported\" cannot be combined with other deviates"));
        }
        Ok(deviation)
    }

    fn deviate(&mut self, stmt: &Statement) -> Result<Deviate, YangError> {
        let kind = DeviateKind::from_arg(self.arg(stmt)?).ok_or_else(|| {
            self.invalid(stmt, "expected \"not-supported\", \"add\", \"replace\" or \"delete\"")
        })?;
        let allowed: &[&str] = match kind {
            DeviateKind::NotSupported => &[],
            DeviateKind::Add => &[
                "units",
                "must",
                "unique",
                "default",
                "config",
                "mandatory",
                "min-elements",
                "max-elements",
            ],
            DeviateKind::Replace => &[
                "type",
                "units",
                "default",
                "config",
                "mandatory",
                "min-elements",
                "max-elements",
            ],
            DeviateKind::Delete => &["units", "must", "unique", "default"],
        };
        let parent = format!("deviate {}", kind.name());

        let mut deviate = Deviate::new(kind, stmt.line);
        let mut seen = Vec::new();
        for child in stmt.children.iter().filter(|c| !c.is_extension()) {
            self.enter(child);
            self.once(&mut seen, child)?;
            if !allowed.contains(&child.keyword.as_str()) {
                return Err(self.unexpected(child, &parent));
            }
            match child.keyword.as_str() {
                "type" => deviate.type_ref = Some(self.type_ref(child)?),
                "units" => deviate.units = Some(self.arg(child)?.to_string()),
                "must" => deviate.musts.push(self.arg(child)?.to_string()),
                "unique" => deviate.uniques.push(self.arg(child)?.to_string()),
                "default" => deviate.defaults.push(self.arg(child)?.to_string()),
                "config" => deviate.config = Some(self.boolean(child)?),
                "mandatory" => deviate.mandatory = Some(self.boolean(child)?),
                "min-elements" => deviate.min_elements = Some(self.number(child)?),
                "max-elements" => deviate.max_elements = Some(self.max_elements(child)?),
                _ => return Err(self.unexpected(child, &parent)),
            }
        }
        Ok(deviate)
    }

    // --- Arguments ---

    fn enter(&mut self, stmt: &Statement) {
        self.pctx.line = stmt.line;
    }

    fn once<'s>(&self, seen: &mut Vec<&'s str>, stmt: &'s Statement) -> Result<(), YangError> {
        let keyword = stmt.keyword.as_str();
        if SINGLETONS.contains(&keyword) {
            if seen.contains(&keyword) {
                return Err(self.duplicate(stmt));
            }
            seen.push(keyword);
        }
        Ok(())
    }

    fn arg<'s>(&self, stmt: &'s Statement) -> Result<&'s str, YangError> {
        stmt.arg
            .as_deref()
            .ok_or_else(|| self.invalid(stmt, "missing argument"))
    }

    fn identifier(&self, stmt: &Statement) -> Result<String, YangError> {
        let arg = self.arg(stmt)?;
        if is_identifier(arg) {
            Ok(arg.to_string())
        } else {
            Err(self.invalid(stmt, "not a valid identifier"))
        }
    }

    /// An identifier with an optional `prefix:` qualifier.
    fn qualified(&self, stmt: &Statement) -> Result<String, YangError> {
        let arg = self.arg(stmt)?;
        let valid = match arg.split_once(':') {
            Some((prefix, name)) => is_identifier(prefix) && is_identifier(name),
            None => is_identifier(arg),
        };
        if valid {
            Ok(arg.to_string())
        } else {
            Err(self.invalid(stmt, "not a valid identifier reference"))
        }
    }

    fn boolean(&self, stmt: &Statement) -> Result<bool, YangError> {
        match self.arg(stmt)? {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(self.invalid(stmt, "expected \"true\" or \"false\"")),
        }
    }

    fn number<T: FromStr>(&self, stmt: &Statement) -> Result<T, YangError> {
        self.arg(stmt)?
            .parse()
            .map_err(|_| self.invalid(stmt, "not a valid number"))
    }

    fn max_elements(&self, stmt: &Statement) -> Result<Option<u32>, YangError> {
        if self.arg(stmt)? == "unbounded" {
            Ok(None)
        } else {
            self.number(stmt).map(Some)
        }
    }

    fn ordered_by(&self, stmt: &Statement) -> Result<bool, YangError> {
        match self.arg(stmt)? {
            "user" => Ok(true),
            "system" => Ok(false),
            _ => Err(self.invalid(stmt, "expected \"user\" or \"system\"")),
        }
    }

    fn status(&self, stmt: &Statement) -> Result<Status, YangError> {
        match self.arg(stmt)? {
            "current" => Ok(Status::Current),
            "deprecated" => Ok(Status::Deprecated),
            "obsolete" => Ok(Status::Obsolete),
            _ => Err(self.invalid(stmt, "expected \"current\", \"deprecated\" or \"obsolete\"")),
        }
    }

    // --- Errors ---

    fn src(&self) -> NamedSource<String> {
        NamedSource::new(self.pctx.source_name.clone(), self.text.to_string())
    }

    fn unexpected(&self, stmt: &Statement, parent: &str) -> YangError {
        ParserError::UnexpectedStatement {
            src: self.src(),
            span: stmt.span,
            keyword: stmt.keyword.clone(),
            parent: parent.to_string(),
            line: stmt.line,
        }
        .into()
    }

    fn missing(&self, keyword: &str, parent: &Statement) -> YangError {
        ParserError::MissingStatement {
            src: self.src(),
            span: parent.span,
            keyword: keyword.to_string(),
            parent: parent.keyword.clone(),
            line: parent.line,
        }
        .into()
    }

    fn duplicate(&self, stmt: &Statement) -> YangError {
        ParserError::DuplicateStatement {
            src: self.src(),
            span: stmt.span,
            keyword: stmt.keyword.clone(),
            line: stmt.line,
        }
        .into()
    }

    fn invalid(&self, stmt: &Statement, reason: &str) -> YangError {
        ParserError::InvalidArgument {
            src: self.src(),
            span: stmt.span,
            keyword: stmt.keyword.clone(),
            reason: reason.to_string(),
            line: stmt.line,
        }
        .into()
    }
}

fn config_slot(kind: &mut NodeKind) -> Option<&mut Option<bool>> {
    match kind {
        NodeKind::Container(c) => Some(&mut c.config),
        NodeKind::Leaf(l) => Some(&mut l.config),
        NodeKind::LeafList(l) => Some(&mut l.config),
        NodeKind::List(l) => Some(&mut l.config),
        NodeKind::Choice(c) => Some(&mut c.config),
        NodeKind::AnyData(a) => Some(&mut a.config),
        _ => None,
    }
}

fn mandatory_slot(kind: &mut NodeKind) -> Option<&mut Option<bool>> {
    match kind {
        NodeKind::Leaf(l) => Some(&mut l.mandatory),
        NodeKind::Choice(c) => Some(&mut c.mandatory),
        NodeKind::AnyData(a) => Some(&mut a.mandatory),
        _ => None,
    }
}

fn musts_slot(kind: &mut NodeKind) -> Option<&mut Vec<String>> {
    match kind {
        NodeKind::Container(c) => Some(&mut c.musts),
        NodeKind::Leaf(l) => Some(&mut l.musts),
        NodeKind::LeafList(l) => Some(&mut l.musts),
        NodeKind::List(l) => Some(&mut l.musts),
        NodeKind::AnyData(a) => Some(&mut a.musts),
        NodeKind::Input(io) | NodeKind::Output(io) => Some(&mut io.musts),
        NodeKind::Notification(n) => Some(&mut n.musts),
        _ => None,
    }
}
