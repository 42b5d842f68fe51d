//! Turns a parsed module into its compiled tree: `uses` expanded, typedef chains
//! followed down to built-in types, `refine`, `augment` and `deviation` applied, and
//! the effective `config` computed for every node.

use crate::ast::{
    BuiltinType, Deviate, DeviateKind, Deviation, Node, NodeKind, ParsedModule, Refine, TypeRef,
    Typedef,
};
use crate::context::{Context, ModuleId};
use crate::deviation::{self, DeviationEffect, Step};
use crate::error::{ResolverError, YangError};
use crate::resolver::{grouping_find, resolve_prefix, type_find, PrefixTarget, Scope, TypeTarget};
use crate::schema::{
    find_in, path_segments, CompiledImport, CompiledModule, CompiledNode, CompiledNodeKind,
    CompiledType, TypedefOrigin,
};
use crate::utils::split_prefixed;
use log::{debug, trace};
use std::iter::once;
use std::ptr;

/// Nodes an `augment` adds to a tree of another module. They are grafted right
/// before the augmenting module is registered.
#[derive(Debug)]
pub struct ForeignAugment {
    pub target: ModuleId,
    pub path: String,
    pub nodes: Vec<CompiledNode>,
    pub line: usize,
}

/// What the deviations of a module do to one node of another module.
#[derive(Debug)]
pub struct ForeignDeviation {
    pub target: ModuleId,
    /// The node's schema path, without prefixes.
    pub path: String,
    pub effect: DeviationEffect,
}

/// The output of [`compile`].
#[derive(Debug)]
pub struct Compilation {
    pub module: CompiledModule,
    pub foreign_augments: Vec<ForeignAugment>,
    pub foreign_deviations: Vec<ForeignDeviation>,
}

/// Every `deviate` aimed at one node, in the order they were written.
struct DeviationGroup<'a> {
    /// `None` for a node of the module being compiled.
    target: Option<ModuleId>,
    path: String,
    line: usize,
    steps: Vec<(&'a Deviate, Option<CompiledType>)>,
}

/// What a node inherits from its parent.
#[derive(Debug, Clone, Copy)]
struct Inherit {
    config: bool,
    in_operation: bool,
}

const DATA: Inherit = Inherit {
    config: true,
    in_operation: false,
};

const OPERATION: Inherit = Inherit {
    config: false,
    in_operation: true,
};

struct ResolvedType {
    compiled: CompiledType,
    units: Option<String>,
    default: Option<String>,
}

/// Compiles `module`, which will be registered as `id`. Its imports must already be
/// linked to registered modules.
pub fn compile(ctx: &Context, module: &ParsedModule, id: ModuleId) -> Result<Compilation, YangError> {
    debug!("Compiling module \"{}\" as {id}", module.name);
    let mut compiler = Compiler {
        ctx,
        id,
        expanding: Vec::new(),
    };

    let mut compiled = CompiledModule {
        name: module.name.clone(),
        revision: module.revision().map(str::to_string),
        prefix: module.prefix.clone(),
        namespace: module.namespace.clone(),
        id,
        imports: compile_imports(ctx, module)?,
        data: Vec::new(),
        rpcs: Vec::new(),
        notifications: Vec::new(),
    };

    let sources: Vec<&ParsedModule> = once(module).chain(module.submodules()).collect();
    for &source in &sources {
        let scope = Scope {
            module,
            source,
            nodes: Vec::new(),
        };
        compiled.data.extend(compiler.nodes(&source.data, &scope, DATA)?);
        compiled.rpcs.extend(compiler.nodes(&source.rpcs, &scope, OPERATION)?);
        compiled
            .notifications
            .extend(compiler.nodes(&source.notifications, &scope, OPERATION)?);
    }

    let mut foreign_augments = Vec::new();
    for &source in &sources {
        let scope = Scope {
            module,
            source,
            nodes: Vec::new(),
        };
        for augment in &source.augments {
            if let Some(foreign) = compiler.augment(augment, &scope, &mut compiled)? {
                foreign_augments.push(foreign);
            }
        }
    }

    let foreign_deviations = compiler.deviations(module, &sources, &mut compiled)?;

    Ok(Compilation {
        module: compiled,
        foreign_augments,
        foreign_deviations,
    })
}

fn compile_imports(ctx: &Context, module: &ParsedModule) -> Result<Vec<CompiledImport>, ResolverError> {
    module
        .imports
        .iter()
        .map(|import| {
            let scope = Scope::top(module);
            let PrefixTarget::Foreign(target) =
                resolve_prefix(ctx, &scope, Some(&import.prefix), import.line)?
            else {
                return Err(ResolverError::UnknownPrefix {
                    prefix: import.prefix.clone(),
                    module: module.name.clone(),
                    line: import.line,
                });
            };
            Ok(CompiledImport {
                name: import.name.clone(),
                prefix: import.prefix.clone(),
                revision: ctx.module(target).revision.clone(),
                module: target,
            })
        })
        .collect()
}

struct Compiler<'a> {
    ctx: &'a Context,
    id: ModuleId,
    /// Groupings being expanded, outermost first.
    expanding: Vec<&'a Node>,
}

impl<'a> Compiler<'a> {
    fn nodes(
        &mut self,
        nodes: &'a [Node],
        scope: &Scope<'a>,
        parent: Inherit,
    ) -> Result<Vec<CompiledNode>, ResolverError> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            if let NodeKind::Uses(_) = node.kind {
                out.extend(self.uses(node, scope, parent)?);
            } else if let Some(compiled) = self.node(node, scope, parent)? {
                out.push(compiled);
            }
        }
        Ok(out)
    }

    /// Compiles one data or operation node. Groupings and augments yield nothing
    /// here: groupings only exist through `uses`, augments are applied afterwards.
    fn node(
        &mut self,
        node: &'a Node,
        scope: &Scope<'a>,
        parent: Inherit,
    ) -> Result<Option<CompiledNode>, ResolverError> {
        let inner = scope.with(node);
        let config = !parent.in_operation && parent.config && explicit_config(&node.kind).unwrap_or(true);
        let below = Inherit {
            config,
            in_operation: parent.in_operation,
        };

        let mut mandatory = false;
        let kind = match &node.kind {
            NodeKind::Container(c) => {
                let (children, mut actions, mut notifications) =
                    split_operations(self.nodes(&c.children, &inner, below)?);
                actions.extend(self.nodes(&c.actions, &inner, OPERATION)?);
                notifications.extend(self.nodes(&c.notifications, &inner, OPERATION)?);
                CompiledNodeKind::Container {
                    presence: c.presence.clone(),
                    children,
                    actions,
                    notifications,
                }
            }
            NodeKind::Leaf(l) => {
                let ty = self.resolve_type(&l.type_ref, &inner)?;
                mandatory = l.mandatory.unwrap_or(false);
                CompiledNodeKind::Leaf {
                    units: l.units.clone().or(ty.units),
                    default: l.default.clone().or(ty.default),
                    type_: ty.compiled,
                }
            }
            NodeKind::LeafList(l) => {
                let ty = self.resolve_type(&l.type_ref, &inner)?;
                let defaults = if l.defaults.is_empty() {
                    ty.default.into_iter().collect()
                } else {
                    l.defaults.clone()
                };
                CompiledNodeKind::LeafList {
                    units: l.units.clone().or(ty.units),
                    defaults,
                    min_elements: l.min_elements,
                    max_elements: l.max_elements,
                    ordered_by_user: l.ordered_by_user,
                    type_: ty.compiled,
                }
            }
            NodeKind::List(l) => {
                let (children, mut actions, mut notifications) =
                    split_operations(self.nodes(&l.children, &inner, below)?);
                actions.extend(self.nodes(&l.actions, &inner, OPERATION)?);
                notifications.extend(self.nodes(&l.notifications, &inner, OPERATION)?);
                CompiledNodeKind::List {
                    keys: l.keys.clone(),
                    uniques: l.uniques.clone(),
                    min_elements: l.min_elements,
                    max_elements: l.max_elements,
                    ordered_by_user: l.ordered_by_user,
                    children,
                    actions,
                    notifications,
                }
            }
            NodeKind::Choice(c) => {
                mandatory = c.mandatory.unwrap_or(false);
                CompiledNodeKind::Choice {
                    default: c.default.clone(),
                    children: self.nodes(&c.children, &inner, below)?,
                }
            }
            NodeKind::Case(c) => CompiledNodeKind::Case {
                children: self.nodes(&c.children, &inner, below)?,
            },
            NodeKind::AnyData(a) => {
                mandatory = a.mandatory.unwrap_or(false);
                CompiledNodeKind::AnyData { xml: a.xml }
            }
            NodeKind::Action(a) => CompiledNodeKind::Action {
                rpc: a.rpc,
                children: self.nodes(&a.children, &inner, OPERATION)?,
            },
            NodeKind::Input(io) => CompiledNodeKind::Input {
                children: self.nodes(&io.children, &inner, OPERATION)?,
            },
            NodeKind::Output(io) => CompiledNodeKind::Output {
                children: self.nodes(&io.children, &inner, OPERATION)?,
            },
            NodeKind::Notification(n) => CompiledNodeKind::Notification {
                children: self.nodes(&n.children, &inner, OPERATION)?,
            },
            NodeKind::Uses(_) | NodeKind::Grouping(_) | NodeKind::Augment(_) => return Ok(None),
        };

        trace!("Compiled {} \"{}\"", node.kind.keyword(), node.name);
        Ok(Some(CompiledNode {
            name: node.name.clone(),
            module: self.id,
            description: node.description.clone(),
            config,
            mandatory,
            status: node.status,
            when: node.when.clone(),
            if_features: node.if_features.clone(),
            musts: node_musts(&node.kind).to_vec(),
            config_set: explicit_config(&node.kind).is_some(),
            mandatory_set: explicit_mandatory(&node.kind).is_some(),
            kind,
            private: None,
        }))
    }

    /// Expands a `uses` into copies of the grouping's nodes, then applies its
    /// refines and augments to the copies.
    fn uses(
        &mut self,
        node: &'a Node,
        scope: &Scope<'a>,
        parent: Inherit,
    ) -> Result<Vec<CompiledNode>, ResolverError> {
        let NodeKind::Uses(uses) = &node.kind else {
            return Ok(Vec::new());
        };
        let found = grouping_find(self.ctx, scope, &node.name, node.line)?;
        if self.expanding.iter().any(|g| ptr::eq(*g, found.item)) {
            return Err(ResolverError::CircularReference {
                what: "groupings",
                name: node.name.clone(),
                line: node.line,
            });
        }

        let grouping = found.item;
        let inner = found.definition_scope(scope).with(grouping);
        self.expanding.push(grouping);
        let expanded = self.grouping_body(grouping, &inner, parent);
        self.expanding.pop();
        let mut expanded = expanded?;

        for compiled in &mut expanded {
            if compiled.when.is_none() {
                compiled.when.clone_from(&node.when);
            }
            compiled.if_features.extend(node.if_features.iter().cloned());
        }

        for refine in &uses.refines {
            let segments = relative_segments(&refine.target);
            let target = find_in(&mut expanded, &segments).ok_or_else(|| ResolverError::TargetNotFound {
                target: refine.target.clone(),
                line: refine.line,
            })?;
            apply_refine(target, refine);
        }

        let uses_scope = scope.with(node);
        for augment in &uses.augments {
            let segments = relative_segments(&augment.name);
            let not_found = || ResolverError::TargetNotFound {
                target: augment.name.clone(),
                line: augment.line,
            };
            let config = find_in(&mut expanded, &segments).ok_or_else(not_found)?.config;
            let nodes = self.augment_body(augment, &uses_scope, config && !parent.in_operation)?;
            let target = find_in(&mut expanded, &segments).ok_or_else(not_found)?;
            for child in nodes {
                target
                    .adopt(child)
                    .map_err(|child| slot_mismatch(&augment.name, &child, augment.line))?;
            }
        }
        Ok(expanded)
    }

    fn grouping_body(
        &mut self,
        grouping: &'a Node,
        scope: &Scope<'a>,
        parent: Inherit,
    ) -> Result<Vec<CompiledNode>, ResolverError> {
        let mut out = self.nodes(slot(grouping.children()), scope, parent)?;
        out.extend(self.nodes(slot(grouping.actions()), scope, OPERATION)?);
        out.extend(self.nodes(slot(grouping.notifications()), scope, OPERATION)?);
        Ok(out)
    }

    fn augment_body(
        &mut self,
        augment: &'a Node,
        scope: &Scope<'a>,
        target_config: bool,
    ) -> Result<Vec<CompiledNode>, ResolverError> {
        // Below a non-config target everything is non-config, operations included.
        let inner = scope.with(augment);
        let below = Inherit {
            config: target_config,
            in_operation: false,
        };
        let mut out = self.nodes(slot(augment.children()), &inner, below)?;
        out.extend(self.nodes(slot(augment.actions()), &inner, OPERATION)?);
        out.extend(self.nodes(slot(augment.notifications()), &inner, OPERATION)?);
        Ok(out)
    }

    /// Applies a top-level `augment`. A target in this module is grafted right away;
    /// one in another module is returned for the caller to graft.
    fn augment(
        &mut self,
        augment: &'a Node,
        scope: &Scope<'a>,
        compiled: &mut CompiledModule,
    ) -> Result<Option<ForeignAugment>, ResolverError> {
        let path = augment.name.as_str();
        let not_found = || ResolverError::TargetNotFound {
            target: path.to_string(),
            line: augment.line,
        };
        let first = path
            .split('/')
            .find(|s| !s.is_empty())
            .filter(|_| path.starts_with('/'))
            .ok_or_else(not_found)?;
        let (prefix, _) = split_prefixed(first);

        match resolve_prefix(self.ctx, scope, prefix, augment.line)? {
            PrefixTarget::Foreign(target) if target != self.id => {
                let ctx = self.ctx;
                let module = ctx.module(target);
                if !module.implemented {
                    return Err(ResolverError::TargetNotImplemented {
                        target: path.to_string(),
                        module: module.name.clone(),
                        line: augment.line,
                    });
                }
                let node = module
                    .compiled
                    .as_ref()
                    .and_then(|m| m.find_path(path))
                    .filter(|n| n.children().is_some())
                    .ok_or_else(not_found)?;
                let nodes = self.augment_body(augment, scope, node.config)?;
                if let Some(child) = nodes.iter().find(|n| !node.accepts(n)) {
                    return Err(slot_mismatch(path, child, augment.line));
                }
                debug!(
                    "Augment \"{path}\" adds {} node(s) to module \"{}\"",
                    nodes.len(),
                    module.name
                );
                Ok(Some(ForeignAugment {
                    target,
                    path: path.to_string(),
                    nodes,
                    line: augment.line,
                }))
            }
            _ => {
                let node = compiled.find_path_mut(path).ok_or_else(not_found)?;
                let config = node.config;
                let nodes = self.augment_body(augment, scope, config)?;
                let node = compiled.find_path_mut(path).ok_or_else(not_found)?;
                for child in nodes {
                    node.adopt(child)
                        .map_err(|child| slot_mismatch(path, &child, augment.line))?;
                }
                Ok(None)
            }
        }
    }

    /// Applies the `deviation` statements of `module` and its submodules. Nodes of this
    /// module are changed in place; changes to other modules are returned.
    fn deviations(
        &self,
        module: &'a ParsedModule,
        sources: &[&'a ParsedModule],
        compiled: &mut CompiledModule,
    ) -> Result<Vec<ForeignDeviation>, ResolverError> {
        let mut groups: Vec<DeviationGroup<'a>> = Vec::new();
        for &source in sources {
            let scope = Scope {
                module,
                source,
                nodes: Vec::new(),
            };
            for deviation in &source.deviations {
                let target = self.deviation_target(deviation, &scope)?;
                let path = format!("/{}", path_segments(&deviation.target).join("/"));
                let pos = match groups.iter().position(|g| g.target == target && g.path == path) {
                    Some(pos) => pos,
                    None => {
                        groups.push(DeviationGroup {
                            target,
                            path,
                            line: deviation.line,
                            steps: Vec::new(),
                        });
                        groups.len() - 1
                    }
                };
                for deviate in &deviation.deviates {
                    let type_ = match &deviate.type_ref {
                        Some(type_ref) => Some(self.resolve_type(type_ref, &scope)?.compiled),
                        None => None,
                    };
                    groups[pos].steps.push((deviate, type_));
                }
            }
        }

        for group in &groups {
            let removed = groups.iter().find(|other| {
                other.target == group.target
                    && group.path.starts_with(&format!("{}/", other.path))
                    && other
                        .steps
                        .iter()
                        .any(|(d, _)| d.kind == DeviateKind::NotSupported)
            });
            if let Some(other) = removed {
                return Err(ResolverError::InvalidDeviation {
                    target: group.path.clone(),
                    reason: format!("\"{}\" is not supported", other.path),
                    line: group.line,
                });
            }
        }

        let ctx = self.ctx;
        let mut foreign = Vec::new();
        for group in groups {
            let not_found = || ResolverError::TargetNotFound {
                target: group.path.clone(),
                line: group.line,
            };
            let steps: Vec<Step<'_>> = group
                .steps
                .iter()
                .map(|(deviate, type_)| Step {
                    deviate: *deviate,
                    type_: type_.as_ref(),
                })
                .collect();
            let tree = match group.target {
                Some(target) => ctx.module(target).compiled.as_ref().ok_or_else(not_found)?,
                None => &*compiled,
            };
            let node = tree.find_path(&group.path).ok_or_else(not_found)?;
            let effect = deviation::effect(node, &group.path, &steps)?;
            if let DeviationEffect::Patch(props) = &effect {
                if props.config && !node.config && !parent_config(tree, &group.path) {
                    return Err(ResolverError::InvalidDeviation {
                        target: group.path.clone(),
                        reason: "config true below a config false node".to_string(),
                        line: group.line,
                    });
                }
            }

            match group.target {
                Some(target) => foreign.push(ForeignDeviation {
                    target,
                    path: group.path,
                    effect,
                }),
                None => match effect {
                    DeviationEffect::Remove => {
                        compiled.remove_path(&group.path).ok_or_else(not_found)?;
                    }
                    DeviationEffect::Patch(props) => {
                        props.write(compiled.find_path_mut(&group.path).ok_or_else(not_found)?);
                    }
                },
            }
        }
        Ok(foreign)
    }

    /// The module a deviation points into: `None` for this one. Another module must
    /// be implemented.
    fn deviation_target(
        &self,
        deviation: &Deviation,
        scope: &Scope<'a>,
    ) -> Result<Option<ModuleId>, ResolverError> {
        let first = deviation
            .target
            .split('/')
            .find(|s| !s.is_empty())
            .ok_or_else(|| ResolverError::TargetNotFound {
                target: deviation.target.clone(),
                line: deviation.line,
            })?;
        let (prefix, _) = split_prefixed(first);
        match resolve_prefix(self.ctx, scope, prefix, deviation.line)? {
            PrefixTarget::Foreign(target) if target != self.id => {
                let module = self.ctx.module(target);
                if !module.implemented {
                    return Err(ResolverError::TargetNotImplemented {
                        target: deviation.target.clone(),
                        module: module.name.clone(),
                        line: deviation.line,
                    });
                }
                Ok(Some(target))
            }
            _ => Ok(None),
        }
    }

    /// Follows the typedef chain of `type_ref` down to a built-in type. Each typedef's
    /// own `type` resolves in the scope the typedef is defined in, not where it is used.
    fn resolve_type(&self, type_ref: &'a TypeRef, scope: &Scope<'a>) -> Result<ResolvedType, ResolverError> {
        let mut chain: Vec<(&'a TypeRef, Scope<'a>)> = Vec::new();
        let mut visited: Vec<&'a Typedef> = Vec::new();
        let mut derived_from = Vec::new();
        let mut units = None;
        let mut default = None;

        let mut current = type_ref;
        let mut current_scope = scope.clone();
        let base = loop {
            chain.push((current, current_scope.clone()));
            match type_find(self.ctx, &current_scope, &current.name, current.line)? {
                TypeTarget::Builtin(builtin) => break builtin,
                TypeTarget::Typedef(found) => {
                    let typedef = found.item;
                    if visited.iter().any(|t| ptr::eq(*t, typedef)) {
                        return Err(ResolverError::CircularReference {
                            what: "typedefs",
                            name: typedef.name.clone(),
                            line: typedef.line,
                        });
                    }
                    visited.push(typedef);
                    derived_from.push(TypedefOrigin {
                        name: typedef.name.clone(),
                        module: found.module.name.clone(),
                        node: found.node.map(|n| n.name.clone()),
                        line: typedef.line,
                    });
                    if units.is_none() {
                        units.clone_from(&typedef.units);
                    }
                    if default.is_none() {
                        default.clone_from(&typedef.default);
                    }
                    current_scope = found.definition_scope(&current_scope);
                    current = &typedef.type_ref;
                }
            }
        };

        let mut compiled = CompiledType {
            name: type_ref.name.clone(),
            base,
            derived_from,
            range: None,
            length: None,
            patterns: Vec::new(),
            enums: Vec::new(),
            bits: Vec::new(),
            path: None,
            require_instance: None,
            fraction_digits: None,
            bases: Vec::new(),
            types: Vec::new(),
        };
        // The use site comes first, so the most specific restriction wins.
        for (step, _) in &chain {
            compiled.range = compiled.range.take().or_else(|| step.range.clone());
            compiled.length = compiled.length.take().or_else(|| step.length.clone());
            compiled.path = compiled.path.take().or_else(|| step.path.clone());
            compiled.require_instance = compiled.require_instance.or(step.require_instance);
            compiled.fraction_digits = compiled.fraction_digits.or(step.fraction_digits);
            compiled.patterns.extend(step.patterns.iter().cloned());
            if compiled.enums.is_empty() {
                compiled.enums.clone_from(&step.enums);
            }
            if compiled.bits.is_empty() {
                compiled.bits.clone_from(&step.bits);
            }
            if compiled.bases.is_empty() {
                compiled.bases.clone_from(&step.bases);
            }
        }

        if base == BuiltinType::Union {
            let members = chain
                .iter()
                .find(|(step, _)| !step.types.is_empty())
                .map(|(step, s)| (*step, s.clone()));
            if let Some((declaring, member_scope)) = members {
                for member in &declaring.types {
                    compiled.types.push(self.resolve_type(member, &member_scope)?.compiled);
                }
            }
        }

        check_restrictions(type_ref, &compiled)?;
        Ok(ResolvedType {
            compiled,
            units,
            default,
        })
    }
}

/// Built-in types that cannot be used without a given substatement.
fn check_restrictions(type_ref: &TypeRef, compiled: &CompiledType) -> Result<(), ResolverError> {
    let missing = match compiled.base {
        BuiltinType::Enumeration if compiled.enums.is_empty() => Some("enum"),
        BuiltinType::Bits if compiled.bits.is_empty() => Some("bit"),
        BuiltinType::Union if compiled.types.is_empty() => Some("type"),
        BuiltinType::Leafref if compiled.path.is_none() => Some("path"),
        BuiltinType::Decimal64 if compiled.fraction_digits.is_none() => Some("fraction-digits"),
        BuiltinType::Identityref if compiled.bases.is_empty() => Some("base"),
        _ => None,
    };
    match missing {
        Some(restriction) => Err(ResolverError::MissingRestriction {
            name: type_ref.name.clone(),
            base: compiled.base.to_string(),
            restriction,
            line: type_ref.line,
        }),
        None => Ok(()),
    }
}

fn explicit_config(kind: &NodeKind) -> Option<bool> {
    match kind {
        NodeKind::Container(c) => c.config,
        NodeKind::Leaf(l) => l.config,
        NodeKind::LeafList(l) => l.config,
        NodeKind::List(l) => l.config,
        NodeKind::Choice(c) => c.config,
        NodeKind::AnyData(a) => a.config,
        _ => None,
    }
}

fn explicit_mandatory(kind: &NodeKind) -> Option<bool> {
    match kind {
        NodeKind::Leaf(l) => l.mandatory,
        NodeKind::Choice(c) => c.mandatory,
        NodeKind::AnyData(a) => a.mandatory,
        _ => None,
    }
}

fn node_musts(kind: &NodeKind) -> &[String] {
    match kind {
        NodeKind::Container(c) => &c.musts,
        NodeKind::Leaf(l) => &l.musts,
        NodeKind::LeafList(l) => &l.musts,
        NodeKind::List(l) => &l.musts,
        NodeKind::AnyData(a) => &a.musts,
        NodeKind::Input(io) | NodeKind::Output(io) => &io.musts,
        NodeKind::Notification(n) => &n.musts,
        _ => &[],
    }
}

fn slot_mismatch(target: &str, node: &CompiledNode, line: usize) -> ResolverError {
    ResolverError::AugmentSlotMismatch {
        target: target.to_string(),
        kind: node.kind.keyword(),
        node: node.name.clone(),
        line,
    }
}

/// Effective `config` of the parent of the node at `path`; true at the top level.
fn parent_config(tree: &CompiledModule, path: &str) -> bool {
    match path.rsplit_once('/') {
        Some((parent, _)) if !parent.is_empty() => tree.find_path(parent).map_or(true, |p| p.config),
        _ => true,
    }
}

fn slot(list: Option<&Vec<Node>>) -> &[Node] {
    list.map(Vec::as_slice).unwrap_or_default()
}

/// Splits expanded nodes into plain children, actions and notifications.
fn split_operations(
    nodes: Vec<CompiledNode>,
) -> (Vec<CompiledNode>, Vec<CompiledNode>, Vec<CompiledNode>) {
    let mut children = Vec::new();
    let mut actions = Vec::new();
    let mut notifications = Vec::new();
    for node in nodes {
        match node.kind {
            CompiledNodeKind::Action { rpc: false, .. } => actions.push(node),
            CompiledNodeKind::Notification { .. } => notifications.push(node),
            _ => children.push(node),
        }
    }
    (children, actions, notifications)
}

/// Segments of a descendant path as written in `refine` or a `uses` augment.
fn relative_segments(path: &str) -> Vec<&str> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| split_prefixed(s).1)
        .collect()
}

fn apply_refine(node: &mut CompiledNode, refine: &Refine) {
    if refine.description.is_some() {
        node.description.clone_from(&refine.description);
    }
    if let Some(config) = refine.config {
        node.config_set = true;
        if config {
            node.config = true;
        } else {
            node.clear_config();
        }
    }
    if let Some(mandatory) = refine.mandatory {
        node.mandatory = mandatory;
        node.mandatory_set = true;
    }
    match &mut node.kind {
        CompiledNodeKind::Container { presence, .. } => {
            if refine.presence.is_some() {
                presence.clone_from(&refine.presence);
            }
        }
        CompiledNodeKind::Leaf { default, .. } | CompiledNodeKind::Choice { default, .. } => {
            if let Some(first) = refine.defaults.first() {
                *default = Some(first.clone());
            }
        }
        CompiledNodeKind::LeafList {
            defaults,
            min_elements,
            max_elements,
            ..
        } => {
            if !refine.defaults.is_empty() {
                defaults.clone_from(&refine.defaults);
            }
            *min_elements = refine.min_elements.or(*min_elements);
            *max_elements = refine.max_elements.or(*max_elements);
        }
        CompiledNodeKind::List {
            min_elements,
            max_elements,
            ..
        } => {
            *min_elements = refine.min_elements.or(*min_elements);
            *max_elements = refine.max_elements.or(*max_elements);
        }
        _ => {}
    }
}
