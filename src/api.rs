use crate::ast::{ParsedModule, SchemaFormat};
use crate::context::{Context, ContextOptions, ModuleId};
use crate::error::YangError;
use crate::loader::ParseOptions;
use crate::schema::CompiledModule;
use serde::{Serialize, Serializer};
use std::path::Path;

/// The result of a successful analysis of a module source.
/// It owns the context the module was loaded into, so imported modules stay
/// reachable for further inspection.
#[derive(Debug)]
pub struct AnalysisResult {
    pub context: Context,
    pub module: ModuleId,
}

impl Serialize for AnalysisResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.compiled().serialize(serializer)
    }
}

impl AnalysisResult {
    /// The compiled tree of the analyzed module.
    #[must_use]
    pub fn compiled(&self) -> Option<&CompiledModule> {
        self.context.module(self.module).compiled.as_ref()
    }

    #[must_use]
    pub fn parsed(&self) -> Option<&ParsedModule> {
        self.context.module(self.module).parsed.as_ref()
    }

    /// Serializes the compiled tree into a pretty-printed JSON string.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self)
    }

    /// Serializes the compiled tree into a YAML string.
    ///
    /// # Errors
    /// Returns a `serde_yaml::Error` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self)
    }
}

/// Analyzes a module source: parses it, loads what it imports and includes, and
/// compiles it as the implemented module of a fresh context.
///
/// Imports and includes are searched for in the directory of `file_name` when it
/// names an existing directory. The extension of `file_name` picks the format;
/// anything but `.yin` is read as native syntax.
///
/// # Errors
///
/// Returns a `YangError` if parsing, loading, validation or compilation fails.
pub fn analyze(source: &str, file_name: &str) -> Result<AnalysisResult, YangError> {
    let path = Path::new(file_name);
    let mut options = ContextOptions::default();
    if let Some(dir) = path.parent().filter(|dir| dir.is_dir()) {
        options.search_dirs.push(dir.to_path_buf());
    }
    let format = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(SchemaFormat::from_extension)
        .unwrap_or_default();

    let mut context = Context::new(options);
    let module = context.parse_mem_as(source, file_name, &ParseOptions::new(format).implement(true))?;
    Ok(AnalysisResult { context, module })
}

#[cfg(test)]
mod tests {
    use crate::analyze;

    #[test]
    fn test_simple_module_to_json() {
        let source = r#"
        module example {
          namespace "urn:example";
          prefix ex;
          container system {
            leaf hostname { type string; }
          }
        }
    "#;

        let expected_json = serde_json::json!({
            "name": "example",
            "prefix": "ex",
            "namespace": "urn:example",
            "imports": [],
            "data": [{
                "name": "system",
                "config": true,
                "kind": "container",
                "children": [{
                    "name": "hostname",
                    "config": true,
                    "kind": "leaf",
                    "type": {
                        "name": "string",
                        "base": "string"
                    }
                }]
            }]
        });

        let analysis_result = analyze(source, "example.yang").unwrap();
        let result = analysis_result.to_json().unwrap();
        let result_json: serde_json::Value = serde_json::from_str(&result).unwrap();

        assert_eq!(result_json, expected_json);
    }

    #[test]
    fn test_simple_module_to_yaml() {
        let source = r"
        module tiny {
          namespace tiny-ns;
          prefix t;
        }
    ";

        let expected_yaml = "name: tiny\nprefix: t\nnamespace: tiny-ns\nimports: []\ndata: []\n";

        let analysis_result = analyze(source, "tiny.yang").unwrap();
        let result = analysis_result.to_yaml().unwrap();

        assert_eq!(result, expected_yaml);
    }

    #[test]
    fn test_analyze_keeps_parsed_form() {
        let source = "module a { namespace urn:a; prefix a; typedef t { type int8; } }";
        let analysis_result = analyze(source, "a.yang").unwrap();
        assert_eq!(analysis_result.parsed().unwrap().typedefs.len(), 1);
        assert!(analysis_result.context.module(analysis_result.module).implemented);
    }
}
