//! The shared context: every module loaded so far, addressed by [`ModuleId`].

use crate::ast::ParsedModule;
use crate::compiler::{ForeignAugment, ForeignDeviation};
use crate::deviation::DeviationEffect;
use crate::error::{ResolverError, YangError};
use crate::schema::{CompiledModule, CompiledNode};
use crate::source::ModuleSource;
use crate::utils::compare_revisions;
use log::debug;
use std::any::Any;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Index of a module in its [`Context`]. Only meaningful for the context that issued it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub(crate) usize);

impl ModuleId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where and how modules are searched for.
#[derive(Debug, Clone, Default)]
pub struct ContextOptions {
    /// Directories searched for `name.yang`, `name@revision.yang` and their `.yin` forms.
    pub search_dirs: Vec<PathBuf>,
    /// Never consult the filesystem; only registered sources are used.
    pub disable_searchdirs: bool,
    /// Search the current working directory after the configured directories.
    pub search_cwd: bool,
    /// Descend into subdirectories of every search directory.
    pub recursive_search: bool,
}

/// A registered module. Submodules are never registered on their own; they hang off
/// the includes of their module's parsed form.
#[derive(Debug)]
pub struct Module {
    pub name: String,
    pub revision: Option<String>,
    pub prefix: String,
    pub namespace: Option<String>,
    pub parsed: Option<ParsedModule>,
    /// Present only for implemented modules.
    pub compiled: Option<CompiledModule>,
    pub implemented: bool,
    /// Set on the newest registered revision of this name.
    pub latest_revision: bool,
    pub filepath: Option<PathBuf>,
}

impl Module {
    pub(crate) fn new(parsed: ParsedModule, filepath: Option<PathBuf>) -> Self {
        Self {
            name: parsed.name.clone(),
            revision: parsed.revision().map(str::to_string),
            prefix: parsed.prefix.clone(),
            namespace: parsed.namespace.clone(),
            parsed: Some(parsed),
            compiled: None,
            implemented: false,
            latest_revision: false,
            filepath,
        }
    }

    /// Hands every piece of private node data to `destructor`, once each.
    pub fn free(&mut self, destructor: &mut dyn FnMut(&CompiledNode, Box<dyn Any>)) {
        if let Some(compiled) = self.compiled.as_mut() {
            compiled.for_each_node_mut(&mut |node: &mut CompiledNode| {
                if let Some(data) = node.private.take() {
                    destructor(node, data);
                }
            });
        }
    }
}

pub struct Context {
    modules: Vec<Module>,
    by_name: HashMap<String, Vec<ModuleId>>,
    pub(crate) sources: Vec<Box<dyn ModuleSource>>,
    pub(crate) options: ContextOptions,
    /// Modules whose loading is in progress, outermost first.
    pub(crate) loading: Vec<String>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("modules", &self.modules.len())
            .field("sources", &self.sources)
            .field("options", &self.options)
            .finish()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(ContextOptions::default())
    }
}

impl Context {
    #[must_use]
    pub fn new(options: ContextOptions) -> Self {
        Self {
            modules: Vec::new(),
            by_name: HashMap::new(),
            sources: Vec::new(),
            options,
            loading: Vec::new(),
        }
    }

    #[must_use]
    pub fn options(&self) -> &ContextOptions {
        &self.options
    }

    /// Appends a search directory.
    pub fn set_searchdir(&mut self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        if !self.options.search_dirs.contains(&dir) {
            debug!("Adding search directory {}", dir.display());
            self.options.search_dirs.push(dir);
        }
    }

    /// Registers another module source. Sources are consulted in registration order,
    /// before any search directory.
    pub fn add_source(&mut self, source: impl ModuleSource + 'static) {
        self.sources.push(Box::new(source));
    }

    /// The directories the filesystem search walks, in order.
    #[must_use]
    pub fn search_paths(&self) -> Vec<PathBuf> {
        let mut dirs = self.options.search_dirs.clone();
        if self.options.search_cwd {
            match std::env::current_dir() {
                Ok(cwd) if !dirs.contains(&cwd) => dirs.push(cwd),
                Ok(_) => {}
                Err(err) => debug!("Current directory unavailable: {err}"),
            }
        }
        dirs
    }

    // --- Lookup ---

    #[must_use]
    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.0]
    }

    pub(crate) fn module_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.0]
    }

    pub fn modules(&self) -> impl Iterator<Item = (ModuleId, &Module)> {
        self.modules.iter().enumerate().map(|(i, m)| (ModuleId(i), m))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    fn ids(&self, name: &str) -> &[ModuleId] {
        self.by_name
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The module with exactly this name and revision. `None` as the revision matches
    /// only a module that declares no revision at all.
    #[must_use]
    pub fn get_module(&self, name: &str, revision: Option<&str>) -> Option<ModuleId> {
        self.ids(name)
            .iter()
            .copied()
            .find(|id| self.module(*id).revision.as_deref() == revision)
    }

    #[must_use]
    pub fn get_module_latest(&self, name: &str) -> Option<ModuleId> {
        self.ids(name)
            .iter()
            .copied()
            .find(|id| self.module(*id).latest_revision)
    }

    #[must_use]
    pub fn get_module_implemented(&self, name: &str) -> Option<ModuleId> {
        self.ids(name)
            .iter()
            .copied()
            .find(|id| self.module(*id).implemented)
    }

    /// Every registered revision of `name`, in registration order.
    #[must_use]
    pub fn get_revisions(&self, name: &str) -> Vec<ModuleId> {
        self.ids(name).to_vec()
    }

    pub fn parsed(&self, id: ModuleId) -> Result<&ParsedModule, ResolverError> {
        let module = self.module(id);
        module
            .parsed
            .as_ref()
            .ok_or_else(|| ResolverError::ParsedFormMissing {
                module: module.name.clone(),
            })
    }

    /// Drops the parsed form of a module, keeping the compiled one. The loader
    /// rebuilds it from the sources when a later import needs it.
    pub fn release_parsed(&mut self, id: ModuleId) -> Option<ParsedModule> {
        self.module_mut(id).parsed.take()
    }

    /// Maps `prefix` as used inside module `id` to the module it denotes.
    #[must_use]
    pub fn module_by_prefix(&self, id: ModuleId, prefix: &str) -> Option<ModuleId> {
        let module = self.module(id);
        if module.prefix == prefix {
            return Some(id);
        }
        if let Some(parsed) = &module.parsed {
            return parsed.find_prefix(prefix).and_then(|found| found.module_id(id));
        }
        module.compiled.as_ref().and_then(|c| c.find_prefix(prefix))
    }

    // --- Registration ---

    /// The id the next registered module will get.
    pub(crate) fn next_id(&self) -> ModuleId {
        ModuleId(self.modules.len())
    }

    /// Adds a fully built module and refreshes the latest-revision flags of its name.
    pub(crate) fn register(&mut self, module: Module) -> ModuleId {
        let id = self.next_id();
        debug!(
            "Registering module \"{}\"{} as {id}",
            module.name,
            module
                .revision
                .as_deref()
                .map(|r| format!("@{r}"))
                .unwrap_or_default()
        );
        let name = module.name.clone();
        self.modules.push(module);

        let ids = self.by_name.entry(name).or_default();
        ids.push(id);
        let modules = &mut self.modules;
        let newest = ids.iter().copied().reduce(|a, b| {
            match compare_revisions(
                modules[b.0].revision.as_deref(),
                modules[a.0].revision.as_deref(),
            ) {
                Ordering::Greater => b,
                _ => a,
            }
        });
        for other in ids.iter() {
            modules[other.0].latest_revision = Some(*other) == newest;
        }
        id
    }

    // --- Private data ---

    /// Attaches opaque data to the compiled node at `path` (names separated by `/`,
    /// prefixes optional). Returns the data previously attached there.
    pub fn set_private(
        &mut self,
        id: ModuleId,
        path: &str,
        data: Box<dyn Any>,
    ) -> Result<Option<Box<dyn Any>>, YangError> {
        let module = self.module_mut(id);
        let name = module.name.clone();
        let not_found = || ResolverError::PathNotFound {
            path: path.to_string(),
            module: name.clone(),
        };
        let Some(compiled) = module.compiled.as_mut() else {
            return Err(not_found().into());
        };
        match compiled.find_path_mut(path) {
            Some(node) => Ok(node.private.replace(data)),
            None => Err(not_found().into()),
        }
    }

    /// Borrows the private data at `path`, if any.
    #[must_use]
    pub fn private(&self, id: ModuleId, path: &str) -> Option<&dyn Any> {
        let compiled = self.module(id).compiled.as_ref()?;
        compiled.find_path(path)?.private.as_deref()
    }

    /// Frees the whole context, handing every piece of private node data to `destructor`.
    pub fn free(mut self, mut destructor: impl FnMut(&CompiledNode, Box<dyn Any>)) {
        for module in &mut self.modules {
            module.free(&mut destructor);
        }
    }

    /// Grafts the augments and applies the deviations one module makes to others.
    /// Every target is checked before anything changes.
    pub(crate) fn amend(
        &mut self,
        augments: Vec<ForeignAugment>,
        deviations: Vec<ForeignDeviation>,
    ) -> Result<(), YangError> {
        for augment in &augments {
            let node = self.target_node(augment.target, &augment.path)?;
            if let Some(child) = augment.nodes.iter().find(|n| !node.accepts(n)) {
                return Err(ResolverError::AugmentSlotMismatch {
                    target: augment.path.clone(),
                    kind: child.kind.keyword(),
                    node: child.name.clone(),
                    line: augment.line,
                }
                .into());
            }
        }
        for deviation in &deviations {
            self.target_node(deviation.target, &deviation.path)?;
        }

        for augment in augments {
            let module = self.module(augment.target).name.clone();
            let not_found = || ResolverError::PathNotFound {
                path: augment.path.clone(),
                module: module.clone(),
            };
            let node = self
                .module_mut(augment.target)
                .compiled
                .as_mut()
                .and_then(|m| m.find_path_mut(&augment.path))
                .ok_or_else(not_found)?;
            for child in augment.nodes {
                node.adopt(child).map_err(|_| not_found())?;
            }
        }
        for deviation in deviations {
            let module = self.module(deviation.target).name.clone();
            let not_found = || ResolverError::PathNotFound {
                path: deviation.path.clone(),
                module: module.clone(),
            };
            let compiled = self
                .module_mut(deviation.target)
                .compiled
                .as_mut()
                .ok_or_else(not_found)?;
            match deviation.effect {
                DeviationEffect::Remove => {
                    compiled.remove_path(&deviation.path).ok_or_else(not_found)?;
                }
                DeviationEffect::Patch(props) => {
                    props.write(compiled.find_path_mut(&deviation.path).ok_or_else(not_found)?);
                }
            }
            debug!("Deviated \"{}\" in module \"{module}\"", deviation.path);
        }
        Ok(())
    }

    fn target_node(&self, target: ModuleId, path: &str) -> Result<&CompiledNode, ResolverError> {
        self.module(target)
            .compiled
            .as_ref()
            .and_then(|m| m.find_path(path))
            .ok_or_else(|| ResolverError::PathNotFound {
                path: path.to_string(),
                module: self.module(target).name.clone(),
            })
    }
}

/// Warns when a file name does not match the module it holds.
pub(crate) fn check_file_name(path: &Path, name: &str, revision: Option<&str>) {
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return;
    };
    let (file_name, file_rev) = match stem.split_once('@') {
        Some((n, r)) => (n, Some(r)),
        None => (stem, None),
    };
    if file_name != name {
        log::warn!(
            "File name \"{}\" does not match module name \"{name}\"",
            path.display()
        );
    } else if file_rev.is_some() && file_rev != revision {
        log::warn!(
            "File name \"{}\" does not match module revision \"{}\"",
            path.display(),
            revision.unwrap_or("none")
        );
    }
}
