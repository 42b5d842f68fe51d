//! Where module text comes from: the [`ModuleSource`] capability and its two stock
//! implementations.

use crate::ast::SchemaFormat;
use crate::error::{LoadError, YangError};
use crate::utils::compare_revisions;
use log::trace;
use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Text of one module or submodule, as handed to the parser.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedModule {
    pub data: String,
    pub format: SchemaFormat,
    /// The file the text was read from, when there is one.
    pub path: Option<PathBuf>,
}

/// Fetches module text by name and optional revision.
///
/// `Ok(None)` means the source does not know the module. When no revision is
/// requested the source should return the newest it has. A source may hand back a
/// different revision than requested; the loader checks and rejects that.
pub trait ModuleSource: Debug {
    fn fetch(&self, name: &str, revision: Option<&str>) -> Result<Option<FetchedModule>, YangError>;
}

/// Filesystem search over a list of directories.
#[derive(Debug, Clone)]
pub struct SearchDirs {
    dirs: Vec<PathBuf>,
    recursive: bool,
}

/// A file that may hold the requested module, judged by its name.
#[derive(Debug)]
struct Candidate {
    path: PathBuf,
    revision: Option<String>,
    format: SchemaFormat,
}

impl SearchDirs {
    #[must_use]
    pub fn new(dirs: Vec<PathBuf>, recursive: bool) -> Self {
        Self { dirs, recursive }
    }

    fn collect(&self, dir: &Path, name: &str, out: &mut Vec<Candidate>) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                trace!("Skipping search directory {}: {err}", dir.display());
                return;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                if self.recursive {
                    self.collect(&path, name, out);
                }
                continue;
            }
            let Some(format) = path
                .extension()
                .and_then(|e| e.to_str())
                .and_then(SchemaFormat::from_extension)
            else {
                continue;
            };
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let (file_name, revision) = match stem.split_once('@') {
                Some((n, r)) => (n, Some(r.to_string())),
                None => (stem, None),
            };
            if file_name == name {
                trace!("Found candidate {}", path.display());
                out.push(Candidate {
                    path,
                    revision,
                    format,
                });
            }
        }
    }
}

impl ModuleSource for SearchDirs {
    fn fetch(&self, name: &str, revision: Option<&str>) -> Result<Option<FetchedModule>, YangError> {
        let mut candidates = Vec::new();
        for dir in &self.dirs {
            trace!("Searching {} for \"{name}\"", dir.display());
            self.collect(dir, name, &mut candidates);
        }

        let chosen = match revision {
            // An exact file name match wins; a file without a revision in its name
            // may still hold the revision, which the loader verifies after parsing.
            Some(rev) => candidates
                .iter()
                .find(|c| c.revision.as_deref() == Some(rev))
                .or_else(|| candidates.iter().find(|c| c.revision.is_none())),
            None => candidates.iter().reduce(|best, c| {
                if compare_revisions(c.revision.as_deref(), best.revision.as_deref()).is_gt() {
                    c
                } else {
                    best
                }
            }),
        };
        let Some(chosen) = chosen else {
            return Ok(None);
        };

        let data = fs::read_to_string(&chosen.path).map_err(|err| LoadError::Io {
            path: chosen.path.display().to_string(),
            message: err.to_string(),
        })?;
        Ok(Some(FetchedModule {
            data,
            format: chosen.format,
            path: Some(chosen.path.clone()),
        }))
    }
}

/// Module texts registered up front, keyed by name and revision.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    entries: Vec<(String, Option<String>, FetchedModule)>,
}

impl MemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers native-syntax text for `name` at `revision`.
    pub fn add(&mut self, name: &str, revision: Option<&str>, data: impl Into<String>) -> &mut Self {
        self.add_format(name, revision, data, SchemaFormat::Yang)
    }

    pub fn add_format(
        &mut self,
        name: &str,
        revision: Option<&str>,
        data: impl Into<String>,
        format: SchemaFormat,
    ) -> &mut Self {
        self.entries.push((
            name.to_string(),
            revision.map(str::to_string),
            FetchedModule {
                data: data.into(),
                format,
                path: None,
            },
        ));
        self
    }
}

impl ModuleSource for MemorySource {
    fn fetch(&self, name: &str, revision: Option<&str>) -> Result<Option<FetchedModule>, YangError> {
        let matching = self.entries.iter().filter(|(n, _, _)| n == name);
        let found = match revision {
            Some(rev) => matching
                .clone()
                .find(|(_, r, _)| r.as_deref() == Some(rev))
                .or_else(|| matching.clone().find(|(_, r, _)| r.is_none())),
            None => matching.reduce(|best, entry| {
                if compare_revisions(entry.1.as_deref(), best.1.as_deref()).is_gt() {
                    entry
                } else {
                    best
                }
            }),
        };
        Ok(found.map(|(_, _, module)| module.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_search_dirs_picks_newest_without_revision() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a@2019-01-01.yang"), "old").unwrap();
        fs::write(dir.path().join("a@2021-01-01.yang"), "new").unwrap();
        fs::write(dir.path().join("ab.yang"), "other").unwrap();

        let source = SearchDirs::new(vec![dir.path().to_path_buf()], false);
        let found = source.fetch("a", None).unwrap().unwrap();
        assert_eq!(found.data, "new");
        assert_eq!(source.fetch("a", Some("2019-01-01")).unwrap().unwrap().data, "old");
        assert!(source.fetch("a", Some("2020-01-01")).unwrap().is_none());
        assert!(source.fetch("missing", None).unwrap().is_none());
    }

    #[test]
    fn test_search_dirs_recursion_and_yin() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("b.yin"), "<module/>").unwrap();

        let flat = SearchDirs::new(vec![dir.path().to_path_buf()], false);
        assert!(flat.fetch("b", None).unwrap().is_none());

        let deep = SearchDirs::new(vec![dir.path().to_path_buf()], true);
        let found = deep.fetch("b", None).unwrap().unwrap();
        assert_eq!(found.format, SchemaFormat::Yin);
        assert_eq!(found.path.as_deref(), Some(nested.join("b.yin").as_path()));
    }

    #[test]
    fn test_memory_source_revisions() {
        let mut source = MemorySource::new();
        source
            .add("a", Some("2020-01-01"), "first")
            .add("a", Some("2022-01-01"), "second");
        assert_eq!(source.fetch("a", None).unwrap().unwrap().data, "second");
        assert_eq!(source.fetch("a", Some("2020-01-01")).unwrap().unwrap().data, "first");
        assert!(source.fetch("a", Some("2021-01-01")).unwrap().is_none());
    }
}
