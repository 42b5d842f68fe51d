//! XML-encoded (YIN) front end. Produces the same [`Statement`] tree as the native parser.

use crate::error::ParserError;
use crate::parser::Statement;
use roxmltree::{Document, Node};

pub const YIN_NAMESPACE: &str = "urn:ietf:params:xml:ns:yang:yin:1";

/// Where a keyword keeps its argument in the XML encoding.
enum YinArg {
    None,
    Attribute(&'static str),
    Element(&'static str),
}

fn yin_argument(keyword: &str) -> YinArg {
    match keyword {
        "input" | "output" => YinArg::None,
        "contact" | "description" | "organization" | "reference" => YinArg::Element("text"),
        "error-message" => YinArg::Element("value"),
        "augment" | "deviation" | "refine" => YinArg::Attribute("target-node"),
        "belongs-to" | "import" | "include" => YinArg::Attribute("module"),
        "must" | "when" => YinArg::Attribute("condition"),
        "namespace" => YinArg::Attribute("uri"),
        "revision" | "revision-date" => YinArg::Attribute("date"),
        "unique" => YinArg::Attribute("tag"),
        "action" | "anydata" | "anyxml" | "argument" | "base" | "bit" | "case" | "choice"
        | "container" | "enum" | "extension" | "feature" | "grouping" | "identity"
        | "if-feature" | "leaf" | "leaf-list" | "list" | "module" | "notification" | "rpc"
        | "submodule" | "type" | "typedef" | "units" | "uses" => YinArg::Attribute("name"),
        _ => YinArg::Attribute("value"),
    }
}

/// Parses a YIN document into its root statement.
pub fn parse_document(data: &str) -> Result<Statement, ParserError> {
    let doc = Document::parse(data).map_err(|err| ParserError::Xml {
        message: err.to_string(),
        line: err.pos().row as usize,
    })?;
    let root = doc.root_element();
    if root.tag_name().namespace() != Some(YIN_NAMESPACE) {
        return Err(ParserError::Xml {
            message: format!(
                "root element \"{}\" is not in the YIN namespace",
                root.tag_name().name()
            ),
            line: line_of(&doc, root),
        });
    }
    convert(&doc, root)
}

fn line_of(doc: &Document<'_>, node: Node<'_, '_>) -> usize {
    doc.text_pos_at(node.range().start).row as usize
}

fn convert(doc: &Document<'_>, node: Node<'_, '_>) -> Result<Statement, ParserError> {
    let line = line_of(doc, node);
    let name = node.tag_name().name();
    let namespace = node.tag_name().namespace();

    // Elements outside the YIN namespace are extension instances; keep them
    // prefixed so the builder recognizes and skips them.
    if namespace != Some(YIN_NAMESPACE) {
        let prefix = namespace
            .and_then(|ns| node.lookup_prefix(ns))
            .unwrap_or("ext");
        return Ok(Statement {
            keyword: format!("{prefix}:{name}"),
            arg: None,
            line,
            span: (node.range().start, node.range().len()).into(),
            children: Vec::new(),
        });
    }

    let mut arg = None;
    let mut arg_element = None;
    match yin_argument(name) {
        YinArg::None => {}
        YinArg::Attribute(attr) => arg = node.attribute(attr).map(str::to_string),
        YinArg::Element(element) => arg_element = Some(element),
    }

    let mut children = Vec::new();
    for child in node.children().filter(Node::is_element) {
        if let Some(element) = arg_element {
            if child.tag_name().name() == element
                && child.tag_name().namespace() == Some(YIN_NAMESPACE)
            {
                arg = Some(child.text().unwrap_or_default().to_string());
                continue;
            }
        }
        children.push(convert(doc, child)?);
    }

    Ok(Statement {
        keyword: name.to_string(),
        arg,
        line,
        span: (node.range().start, node.range().len()).into(),
        children,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODULE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<module name="a"
        xmlns="urn:ietf:params:xml:ns:yang:yin:1"
        xmlns:a="urn:a">
  <namespace uri="urn:a"/>
  <prefix value="a"/>
  <description>
    <text>Example module.</text>
  </description>
  <container name="c">
    <leaf name="l">
      <type name="string"/>
    </leaf>
  </container>
  <a:note/>
</module>"#;

    #[test]
    fn test_yin_to_statements() {
        let root = parse_document(MODULE).unwrap();
        assert_eq!(root.keyword, "module");
        assert_eq!(root.arg.as_deref(), Some("a"));
        assert_eq!(root.line, 2);

        let keywords: Vec<_> = root.children.iter().map(|s| s.keyword.as_str()).collect();
        assert_eq!(
            keywords,
            vec!["namespace", "prefix", "description", "container", "a:note"]
        );
        assert_eq!(root.children[0].arg.as_deref(), Some("urn:a"));
        assert_eq!(root.children[2].arg.as_deref(), Some("Example module."));
        let leaf = &root.children[3].children[0];
        assert_eq!(leaf.children[0].arg.as_deref(), Some("string"));
        assert_eq!(leaf.line, 11);
        assert!(root.children[4].is_extension());
    }

    #[test]
    fn test_wrong_namespace() {
        let err = parse_document("<module name=\"a\"/>").unwrap_err();
        assert!(matches!(err, ParserError::Xml { line: 1, .. }));
    }

    #[test]
    fn test_malformed_xml() {
        assert!(matches!(
            parse_document("<module name=\"a\">"),
            Err(ParserError::Xml { .. })
        ));
    }
}
