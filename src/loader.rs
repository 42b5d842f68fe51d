//! Module loading: the parse entry points, import and include resolution, and the
//! implement bookkeeping. Every path funnels into [`Context::finish`], which registers
//! a module only after it parsed, validated and (when implemented) compiled.

use crate::ast::{ParsedModule, SchemaFormat};
use crate::compiler::compile;
use crate::context::{check_file_name, Context, Module, ModuleId};
use crate::error::{LoadError, ResolverError, YangError};
use crate::parser::{parse_module, ParserContext};
use crate::source::{FetchedModule, ModuleSource, SearchDirs};
use crate::utils::compare_revisions;
use crate::validate::{check_groupings, check_typedefs, sort_revisions};
use log::{debug, info, warn};
use std::cmp::Ordering;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Caller-supplied validation run on a fully parsed module right before it is
/// registered. An `Err` carries the reason and aborts the load.
pub type CustomCheck = dyn Fn(&Context, &ParsedModule) -> Result<(), String>;

/// How a module handed to one of the parse entry points is treated.
#[derive(Clone, Copy, Default)]
pub struct ParseOptions<'c> {
    /// Format of the text. [`Context::parse_path`] prefers the file extension.
    pub format: SchemaFormat,
    /// Make the module the implemented revision of its name.
    pub implement: bool,
    pub custom_check: Option<&'c CustomCheck>,
}

impl fmt::Debug for ParseOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseOptions")
            .field("format", &self.format)
            .field("implement", &self.implement)
            .field("custom_check", &self.custom_check.is_some())
            .finish()
    }
}

impl<'c> ParseOptions<'c> {
    #[must_use]
    pub fn new(format: SchemaFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn implement(mut self, implement: bool) -> Self {
        self.implement = implement;
        self
    }

    #[must_use]
    pub fn custom_check(mut self, check: &'c CustomCheck) -> Self {
        self.custom_check = Some(check);
        self
    }
}

/// Outcome of [`Context::locate_module`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Located {
    /// The module was parsed and registered by this call.
    Parsed(ModuleId),
    /// The sources hold a module that was already registered.
    Present(ModuleId),
}

impl Located {
    #[must_use]
    pub fn id(self) -> ModuleId {
        match self {
            Located::Parsed(id) | Located::Present(id) => id,
        }
    }
}

impl Context {
    /// Parses a module from memory and registers it.
    pub fn parse_mem(&mut self, data: &str, opts: &ParseOptions<'_>) -> Result<ModuleId, YangError> {
        self.parse_mem_as(data, "<memory>", opts)
    }

    /// Like [`Context::parse_mem`], naming the source `source_name` in diagnostics.
    pub fn parse_mem_as(
        &mut self,
        data: &str,
        source_name: &str,
        opts: &ParseOptions<'_>,
    ) -> Result<ModuleId, YangError> {
        self.parse_source(data, source_name, None, opts)
    }

    /// Parses the module stored at `path`. A `.yang` or `.yin` extension overrides
    /// the format in `opts`.
    pub fn parse_path(
        &mut self,
        path: impl AsRef<Path>,
        opts: &ParseOptions<'_>,
    ) -> Result<ModuleId, YangError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|err| LoadError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(SchemaFormat::from_extension)
            .unwrap_or(opts.format);
        let opts = ParseOptions { format, ..*opts };
        self.parse_source(&data, &path.display().to_string(), Some(path.to_path_buf()), &opts)
    }

    /// Parses a module from an open file. Only regular files are accepted.
    pub fn parse_file(&mut self, file: &mut File, opts: &ParseOptions<'_>) -> Result<ModuleId, YangError> {
        let io_error = |err: std::io::Error| LoadError::Io {
            path: "<file>".to_string(),
            message: err.to_string(),
        };
        let metadata = file.metadata().map_err(io_error)?;
        if !metadata.is_file() {
            return Err(LoadError::UnsupportedInput {
                reason: "only regular files can be parsed".to_string(),
            }
            .into());
        }
        let mut data = String::new();
        file.read_to_string(&mut data).map_err(io_error)?;
        self.parse_source(&data, "<file>", None, opts)
    }

    fn parse_source(
        &mut self,
        data: &str,
        source_name: &str,
        path: Option<PathBuf>,
        opts: &ParseOptions<'_>,
    ) -> Result<ModuleId, YangError> {
        let mut pctx = ParserContext::new(source_name);
        parse_module(&mut pctx, data, opts.format)?;
        if pctx.module.is_submodule() {
            return Err(LoadError::SubmoduleStandalone {
                name: pctx.module.name,
            }
            .into());
        }
        prepare_revisions(&mut pctx.module);
        if let Some(path) = &path {
            check_file_name(path, &pctx.module.name, pctx.module.revision());
        }
        self.finish(pctx, path, opts)
    }

    /// Loads `name`, reusing a registered module when one fits.
    ///
    /// Without a revision the implemented module is preferred, then the newest of what
    /// the sources offer and what is registered; a tie goes to the registered module.
    /// With `implement` the result
    /// becomes the implemented revision of its name; with `require_parsed` its parsed
    /// form is rebuilt if it was released.
    pub fn load_module(
        &mut self,
        name: &str,
        revision: Option<&str>,
        implement: bool,
        require_parsed: bool,
    ) -> Result<ModuleId, YangError> {
        if let Some(pos) = self.loading.iter().position(|n| n == name) {
            let mut cycle = self.loading[pos..].to_vec();
            cycle.push(name.to_string());
            return Err(LoadError::CircularImport {
                cycle: cycle.join(" -> "),
            }
            .into());
        }

        let existing = match revision {
            Some(rev) => self.get_module(name, Some(rev)),
            None => self.get_module_implemented(name),
        };
        let id = match existing {
            Some(id) => {
                debug!("Reusing module \"{name}\" ({id})");
                id
            }
            None if revision.is_some() => self.locate_module(name, revision, implement)?.id(),
            None => self.load_newest(name, implement)?,
        };

        if implement && !self.module(id).implemented {
            self.set_implemented(id)?;
        }
        if require_parsed {
            self.ensure_parsed(id)?;
        }
        Ok(id)
    }

    /// Finds `name` through the sources and the search path, then parses and registers
    /// it unless the same name and revision is already registered.
    pub fn locate_module(
        &mut self,
        name: &str,
        revision: Option<&str>,
        implement: bool,
    ) -> Result<Located, YangError> {
        let (pctx, fetched) = self.read_module(name, revision)?;
        if let Some(id) = self.get_module(name, pctx.module.revision()) {
            debug!("Module \"{name}\" from the sources is already registered as {id}");
            return Ok(Located::Present(id));
        }

        let opts = ParseOptions::new(fetched.format).implement(implement);
        self.finish(pctx, fetched.path, &opts).map(Located::Parsed)
    }

    /// Loads the newer of the revision the sources offer and the newest registered one.
    fn load_newest(&mut self, name: &str, implement: bool) -> Result<ModuleId, YangError> {
        let latest = self.get_module_latest(name);
        let (pctx, fetched) = match self.read_module(name, None) {
            Ok(read) => read,
            Err(YangError::Load(LoadError::ModuleNotFound { .. })) => {
                return latest.ok_or_else(|| {
                    YangError::from(LoadError::ModuleNotFound {
                        name: name.to_string(),
                        revision: None,
                    })
                });
            }
            Err(err) => return Err(err),
        };

        if let Some(id) = latest {
            let registered = self.module(id).revision.as_deref();
            if compare_revisions(registered, pctx.module.revision()) != Ordering::Less {
                debug!("Reusing module \"{name}\" ({id}), the sources offer nothing newer");
                return Ok(id);
            }
        }
        let opts = ParseOptions::new(fetched.format).implement(implement);
        self.finish(pctx, fetched.path, &opts)
    }

    /// Fetches `name` and parses it, checking it is the main module asked for.
    fn read_module(
        &self,
        name: &str,
        revision: Option<&str>,
    ) -> Result<(ParserContext, FetchedModule), YangError> {
        let fetched = self
            .fetch(name, revision)?
            .ok_or_else(|| LoadError::ModuleNotFound {
                name: name.to_string(),
                revision: revision.map(str::to_string),
            })?;

        let mut pctx = ParserContext::new(source_name(&fetched, name));
        parse_module(&mut pctx, &fetched.data, fetched.format)?;
        if pctx.module.is_submodule() {
            return Err(LoadError::SubmoduleStandalone {
                name: pctx.module.name,
            }
            .into());
        }
        if pctx.module.name != name {
            return Err(LoadError::NameMismatch {
                name: name.to_string(),
                found: pctx.module.name,
            }
            .into());
        }
        prepare_revisions(&mut pctx.module);
        check_revision(&pctx.module, revision)?;
        if let Some(path) = &fetched.path {
            check_file_name(path, name, pctx.module.revision());
        }
        Ok((pctx, fetched))
    }

    /// Loads the submodule named by include `idx` of the module in `pctx` and attaches it
    /// to that include.
    pub fn load_submodule(&mut self, pctx: &mut ParserContext, idx: usize) -> Result<(), YangError> {
        let Some(include) = pctx.module.includes.get(idx) else {
            return Ok(());
        };
        let name = include.name.clone();
        let revision = include.revision.clone();
        let main = pctx.main_module_name().to_string();

        if name == main {
            return Err(LoadError::SelfInclude { name }.into());
        }
        if pctx.include_stack.contains(&name) {
            let cycle: Vec<&str> = std::iter::once(main.as_str())
                .chain(pctx.include_stack.iter().map(String::as_str))
                .chain(std::iter::once(name.as_str()))
                .collect();
            return Err(LoadError::CircularInclude {
                cycle: cycle.join(" -> "),
            }
            .into());
        }
        if pctx.included.contains(&name) {
            debug!("Submodule \"{name}\" is already included in \"{main}\"");
            return Ok(());
        }

        let fetched = self
            .fetch(&name, revision.as_deref())?
            .ok_or_else(|| LoadError::SubmoduleNotFound {
                name: name.clone(),
                revision: revision.clone(),
            })?;
        let mut child = ParserContext::for_submodule(pctx, &name, source_name(&fetched, &name));
        parse_module(&mut child, &fetched.data, fetched.format)?;

        match &child.module.belongs_to {
            None => {
                return Err(LoadError::ExpectedSubmodule {
                    expected: name,
                    found: child.module.name,
                }
                .into())
            }
            Some(owner) if *owner != main => {
                return Err(LoadError::BelongsToMismatch {
                    submodule: child.module.name.clone(),
                    expected: main,
                    found: owner.clone(),
                }
                .into())
            }
            Some(_) => {}
        }
        if child.module.name != name {
            return Err(LoadError::NameMismatch {
                name,
                found: child.module.name,
            }
            .into());
        }
        prepare_revisions(&mut child.module);
        check_revision(&child.module, revision.as_deref())?;
        if let Some(path) = &fetched.path {
            check_file_name(path, &name, child.module.revision());
        }

        for sub in 0..child.module.includes.len() {
            self.load_submodule(&mut child, sub)?;
        }
        self.load_imports(&mut child.module)?;

        debug!("Included submodule \"{name}\" into \"{main}\"");
        pctx.tpdfs_nodes.append(&mut child.tpdfs_nodes);
        pctx.grps_nodes.append(&mut child.grps_nodes);
        pctx.included = std::mem::take(&mut child.included);
        pctx.included.push(name);
        if let Some(include) = pctx.module.includes.get_mut(idx) {
            include.submodule = Some(Box::new(child.into_module()));
        }
        Ok(())
    }

    /// Flips the implemented flag of `id`.
    ///
    /// No check is made that another revision of the same name is already
    /// implemented; the caller must have ruled that out. [`Context::set_implemented`]
    /// is the checked counterpart.
    pub fn mark_implemented(&mut self, id: ModuleId) {
        let module = self.module_mut(id);
        module.implemented = true;
        info!(
            "Module \"{}\"{} is now implemented",
            module.name,
            module
                .revision
                .as_deref()
                .map(|r| format!("@{r}"))
                .unwrap_or_default()
        );
    }

    /// Makes an already registered module the implemented revision of its name,
    /// compiling it if needed.
    pub fn set_implemented(&mut self, id: ModuleId) -> Result<(), YangError> {
        if self.module(id).implemented {
            return Ok(());
        }
        let module = self.module(id);
        self.check_implement(&module.name, module.revision.as_deref())?;
        self.ensure_parsed(id)?;

        let compilation = compile(self, self.parsed(id)?, id)?;
        self.amend(compilation.foreign_augments, compilation.foreign_deviations)?;
        self.module_mut(id).compiled = Some(compilation.module);
        self.mark_implemented(id);
        Ok(())
    }

    /// Rebuilds the parsed form of a registered module from the sources.
    pub fn ensure_parsed(&mut self, id: ModuleId) -> Result<(), YangError> {
        if self.module(id).parsed.is_some() {
            return Ok(());
        }
        let name = self.module(id).name.clone();
        let revision = self.module(id).revision.clone();
        let missing = || ResolverError::ParsedFormMissing { module: name.clone() };

        let fetched = self.fetch(&name, revision.as_deref())?.ok_or_else(missing)?;
        let mut pctx = ParserContext::new(source_name(&fetched, &name));
        parse_module(&mut pctx, &fetched.data, fetched.format)?;
        prepare_revisions(&mut pctx.module);
        if pctx.module.name != name
            || pctx.module.is_submodule()
            || pctx.module.revision() != revision.as_deref()
        {
            return Err(missing().into());
        }

        self.loading.push(name.clone());
        let linked = self.link(&mut pctx);
        self.loading.pop();
        linked?;

        debug!("Rebuilt the parsed form of \"{name}\"");
        self.module_mut(id).parsed = Some(pctx.into_module());
        Ok(())
    }

    /// Registers a parsed main module once its includes and imports are loaded and
    /// it passes validation.
    fn finish(
        &mut self,
        mut pctx: ParserContext,
        path: Option<PathBuf>,
        opts: &ParseOptions<'_>,
    ) -> Result<ModuleId, YangError> {
        let name = pctx.module.name.clone();
        let revision = pctx.module.revision().map(str::to_string);
        if self.get_module(&name, revision.as_deref()).is_some() {
            return Err(LoadError::AlreadyPresent { name, revision }.into());
        }
        if opts.implement {
            self.check_implement(&name, revision.as_deref())?;
        }

        self.loading.push(name.clone());
        let linked = self.link(&mut pctx);
        self.loading.pop();
        linked?;

        check_typedefs(&mut pctx)?;
        check_groupings(&mut pctx)?;
        if let Some(check) = opts.custom_check {
            check(self, &pctx.module).map_err(|reason| LoadError::CustomCheck {
                module: name.clone(),
                reason,
            })?;
        }

        let parsed = pctx.into_module();
        let compiled = if opts.implement {
            let compilation = compile(self, &parsed, self.next_id())?;
            self.amend(compilation.foreign_augments, compilation.foreign_deviations)?;
            Some(compilation.module)
        } else {
            None
        };

        let mut module = Module::new(parsed, path);
        module.compiled = compiled;
        let id = self.register(module);
        if opts.implement {
            self.mark_implemented(id);
        }
        Ok(id)
    }

    /// Loads the includes and imports of a main module being parsed.
    fn link(&mut self, pctx: &mut ParserContext) -> Result<(), YangError> {
        for idx in 0..pctx.module.includes.len() {
            self.load_submodule(pctx, idx)?;
        }
        self.load_imports(&mut pctx.module)
    }

    fn load_imports(&mut self, module: &mut ParsedModule) -> Result<(), YangError> {
        for import in &mut module.imports {
            let id = self.load_module(&import.name, import.revision.as_deref(), false, true)?;
            import.module = Some(id);
        }
        Ok(())
    }

    /// Fails when another revision of `name` is already implemented.
    fn check_implement(&self, name: &str, revision: Option<&str>) -> Result<(), LoadError> {
        let Some(other) = self.get_module_implemented(name) else {
            return Ok(());
        };
        let implemented = self.module(other).revision.clone();
        if implemented.as_deref() == revision {
            return Ok(());
        }
        Err(LoadError::AlreadyImplemented {
            name: name.to_string(),
            implemented,
            requested: revision.map(str::to_string),
        })
    }

    /// Asks the registered sources in order, then the search path.
    fn fetch(&self, name: &str, revision: Option<&str>) -> Result<Option<FetchedModule>, YangError> {
        for source in &self.sources {
            if let Some(fetched) = source.fetch(name, revision)? {
                return Ok(Some(fetched));
            }
        }
        if self.options.disable_searchdirs {
            return Ok(None);
        }
        SearchDirs::new(self.search_paths(), self.options.recursive_search).fetch(name, revision)
    }
}

/// Puts the newest revision first and reports repeated dates.
fn prepare_revisions(module: &mut ParsedModule) {
    sort_revisions(&mut module.revisions);
    for (i, rev) in module.revisions.iter().enumerate() {
        if module.revisions[..i].iter().any(|r| r.date == rev.date) {
            warn!(
                "Module \"{}\" lists revision {} more than once (line {})",
                module.name, rev.date, rev.line
            );
        }
    }
}

fn check_revision(module: &ParsedModule, requested: Option<&str>) -> Result<(), LoadError> {
    match requested {
        Some(rev) if module.revision() != Some(rev) => Err(LoadError::RevisionMismatch {
            name: module.name.clone(),
            expected: rev.to_string(),
            found: module.revision().map(str::to_string),
        }),
        _ => Ok(()),
    }
}

fn source_name(fetched: &FetchedModule, name: &str) -> String {
    fetched
        .path
        .as_ref()
        .map_or_else(|| name.to_string(), |p| p.display().to_string())
}
