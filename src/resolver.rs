//! Reference resolution: prefixes to modules, and type or grouping names to their
//! definitions along the scope chain.
//!
//! The precedence is fixed. A prefix naming a foreign module restricts the search to that
//! module's top-level definitions (its submodules' top levels included). An unprefixed
//! name, or one carrying the module's own prefix, is looked up in the enclosing nodes,
//! innermost first, and then at the top level of the module and its submodules.

use crate::ast::{BuiltinType, Import, Node, ParsedModule, Typedef};
use crate::context::{Context, ModuleId};
use crate::error::ResolverError;
use crate::utils::split_prefixed;

/// What a prefix means inside one parsed (sub)module.
#[derive(Debug, Clone, Copy)]
pub enum PrefixMatch<'a> {
    /// The module's own prefix, or the belongs-to prefix of a submodule.
    Local,
    Import(&'a Import),
}

impl PrefixMatch<'_> {
    /// The module id the prefix denotes, given the id of the module it was looked up in.
    #[must_use]
    pub fn module_id(self, own: ModuleId) -> Option<ModuleId> {
        match self {
            PrefixMatch::Local => Some(own),
            PrefixMatch::Import(import) => import.module,
        }
    }
}

impl ParsedModule {
    /// Maps a prefix to what it denotes in this (sub)module. References are usually
    /// slices of a longer identifier, hence the `&str` rather than an owned key.
    #[must_use]
    pub fn find_prefix(&self, prefix: &str) -> Option<PrefixMatch<'_>> {
        if self.prefix == prefix {
            return Some(PrefixMatch::Local);
        }
        self.imports
            .iter()
            .find(|import| import.prefix == prefix)
            .map(PrefixMatch::Import)
    }
}

/// The place a reference is written.
#[derive(Debug, Clone)]
pub struct Scope<'a> {
    /// The main module the reference belongs to.
    pub module: &'a ParsedModule,
    /// The module or submodule whose text holds the reference; its imports define
    /// the prefixes in use.
    pub source: &'a ParsedModule,
    /// Enclosing nodes, outermost first.
    pub nodes: Vec<&'a Node>,
}

impl<'a> Scope<'a> {
    /// The top level of `module`.
    #[must_use]
    pub fn top(module: &'a ParsedModule) -> Self {
        Self {
            module,
            source: module,
            nodes: Vec::new(),
        }
    }

    /// This scope extended by one enclosing node.
    #[must_use]
    pub fn with(&self, node: &'a Node) -> Self {
        let mut nodes = self.nodes.clone();
        nodes.push(node);
        Self {
            module: self.module,
            source: self.source,
            nodes,
        }
    }
}

/// A definition found by [`type_find`] or [`grouping_find`].
#[derive(Debug)]
pub struct Found<'a, T> {
    pub item: &'a T,
    /// The node owning the definition; `None` when it is a top-level one.
    pub node: Option<&'a Node>,
    /// The main module owning the definition.
    pub module: &'a ParsedModule,
    /// The (sub)module whose text holds the definition.
    pub source: &'a ParsedModule,
    /// Set when the definition lives in another registered module.
    pub foreign: Option<ModuleId>,
}

impl<'a, T> Found<'a, T> {
    /// The scope that references written inside the definition resolve in. `from` is
    /// the scope the definition was found from.
    #[must_use]
    pub fn definition_scope(&self, from: &Scope<'a>) -> Scope<'a> {
        let nodes = match self.node {
            Some(owner) if self.foreign.is_none() => {
                let end = from
                    .nodes
                    .iter()
                    .position(|n| std::ptr::eq(*n, owner))
                    .map_or(0, |i| i + 1);
                from.nodes[..end].to_vec()
            }
            _ => Vec::new(),
        };
        Scope {
            module: self.module,
            source: self.source,
            nodes,
        }
    }
}

#[derive(Debug)]
pub enum TypeTarget<'a> {
    Builtin(BuiltinType),
    Typedef(Found<'a, Typedef>),
}

/// Definitions that live in named, scoped lists.
trait Named {
    fn name(&self) -> &str;
}

impl Named for Typedef {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Node {
    fn name(&self) -> &str {
        &self.name
    }
}

fn module_typedefs(module: &ParsedModule) -> &[Typedef] {
    &module.typedefs
}

fn module_groupings(module: &ParsedModule) -> &[Node] {
    &module.groupings
}

fn node_typedefs(node: &Node) -> Option<&Vec<Typedef>> {
    node.typedefs()
}

fn node_groupings(node: &Node) -> Option<&Vec<Node>> {
    node.groupings()
}

pub(crate) enum PrefixTarget {
    Local,
    Foreign(ModuleId),
}

/// Resolves the prefix of a reference written in `scope`.
pub(crate) fn resolve_prefix(
    ctx: &Context,
    scope: &Scope<'_>,
    prefix: Option<&str>,
    line: usize,
) -> Result<PrefixTarget, ResolverError> {
    let Some(prefix) = prefix else {
        return Ok(PrefixTarget::Local);
    };
    let unknown = || ResolverError::UnknownPrefix {
        prefix: prefix.to_string(),
        module: scope.source.name.clone(),
        line,
    };
    match scope.source.find_prefix(prefix) {
        Some(PrefixMatch::Local) => Ok(PrefixTarget::Local),
        Some(PrefixMatch::Import(import)) => import
            .module
            .or_else(|| {
                // Imports of a module not yet linked: fall back to what is registered.
                match import.revision.as_deref() {
                    Some(rev) => ctx.get_module(&import.name, Some(rev)),
                    None => ctx
                        .get_module_implemented(&import.name)
                        .or_else(|| ctx.get_module_latest(&import.name)),
                }
            })
            .map(PrefixTarget::Foreign)
            .ok_or_else(unknown),
        None => Err(unknown()),
    }
}

/// Searches the top level of `module` and of every submodule it includes.
fn find_top_level<'a, T: Named>(
    module: &'a ParsedModule,
    list: fn(&ParsedModule) -> &[T],
    name: &str,
) -> Option<(&'a T, &'a ParsedModule)> {
    std::iter::once(module)
        .chain(module.submodules())
        .find_map(|m| list(m).iter().find(|item| item.name() == name).map(|item| (item, m)))
}

fn find_definition<'a, T: Named>(
    ctx: &'a Context,
    scope: &Scope<'a>,
    prefix: Option<&str>,
    name: &str,
    line: usize,
    local: fn(&Node) -> Option<&Vec<T>>,
    top: fn(&ParsedModule) -> &[T],
) -> Result<Option<Found<'a, T>>, ResolverError> {
    match resolve_prefix(ctx, scope, prefix, line)? {
        PrefixTarget::Local => {
            for &node in scope.nodes.iter().rev() {
                if let Some(item) = local(node).and_then(|l| l.iter().find(|i| i.name() == name)) {
                    return Ok(Some(Found {
                        item,
                        node: Some(node),
                        module: scope.module,
                        source: scope.source,
                        foreign: None,
                    }));
                }
            }
            Ok(find_top_level(scope.module, top, name).map(|(item, source)| Found {
                item,
                node: None,
                module: scope.module,
                source,
                foreign: None,
            }))
        }
        PrefixTarget::Foreign(id) => {
            let module = ctx.parsed(id)?;
            Ok(find_top_level(module, top, name).map(|(item, source)| Found {
                item,
                node: None,
                module,
                source,
                foreign: Some(id),
            }))
        }
    }
}

/// Resolves a type name written in `scope`.
///
/// Built-in type names only match unprefixed. A typedef named like a built-in type is
/// rejected when it is defined, so the built-in check never hides a user typedef.
pub fn type_find<'a>(
    ctx: &'a Context,
    scope: &Scope<'a>,
    name: &str,
    line: usize,
) -> Result<TypeTarget<'a>, ResolverError> {
    let (prefix, local) = split_prefixed(name);
    if prefix.is_none() {
        if let Some(builtin) = BuiltinType::from_name(local) {
            return Ok(TypeTarget::Builtin(builtin));
        }
    }
    find_definition(ctx, scope, prefix, local, line, node_typedefs, module_typedefs)?
        .map(TypeTarget::Typedef)
        .ok_or_else(|| ResolverError::TypeNotFound {
            name: name.to_string(),
            module: scope.source.name.clone(),
            line,
        })
}

/// Resolves the grouping named by a `uses` written in `scope`.
pub fn grouping_find<'a>(
    ctx: &'a Context,
    scope: &Scope<'a>,
    name: &str,
    line: usize,
) -> Result<Found<'a, Node>, ResolverError> {
    let (prefix, local) = split_prefixed(name);
    find_definition(ctx, scope, prefix, local, line, node_groupings, module_groupings)?.ok_or_else(
        || ResolverError::GroupingNotFound {
            name: name.to_string(),
            module: scope.source.name.clone(),
            line,
        },
    )
}
