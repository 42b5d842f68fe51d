use crate::ast::{ParsedModule, SchemaFormat};
use crate::builder;
use crate::error::{ParserError, YangError};
use crate::lexer::{Lexer, Token, TokenType};
use crate::yin;
use miette::{NamedSource, SourceSpan};

/// One generic statement: `keyword [argument] ( ";" | "{" substatements "}" )`.
///
/// Both surface syntaxes are first turned into a tree of these, then a single
/// builder turns the tree into a [`ParsedModule`].
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub keyword: String,
    pub arg: Option<String>,
    pub line: usize,
    pub span: SourceSpan,
    pub children: Vec<Statement>,
}

impl Statement {
    /// Extension instances are written with a prefixed keyword.
    #[must_use]
    pub fn is_extension(&self) -> bool {
        self.keyword.contains(':')
    }
}

/// Names collected from one scope that owns typedefs or groupings, kept until
/// the whole module is parsed so collisions can be checked in one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingScope {
    /// Human readable owner, e.g. `container "interfaces"`.
    pub owner: String,
    pub line: usize,
    pub names: Vec<(String, usize)>,
}

/// Per-parse state. Created for one (sub)module, discarded once it is registered
/// or attached to its including module.
#[derive(Debug)]
pub struct ParserContext {
    /// The module under construction.
    pub module: ParsedModule,
    /// Node scopes with local typedefs, waiting for the collision check.
    pub tpdfs_nodes: Vec<PendingScope>,
    /// Node scopes with local groupings, waiting for the collision check.
    pub grps_nodes: Vec<PendingScope>,
    /// Line of the statement being processed.
    pub line: usize,
    pub(crate) source_name: String,
    /// Name and prefix of the main module when this context parses a submodule.
    pub(crate) main_module: Option<(String, String)>,
    /// Submodules currently being included, outermost first.
    pub(crate) include_stack: Vec<String>,
    /// Every submodule already loaded anywhere in the include tree.
    pub(crate) included: Vec<String>,
}

impl ParserContext {
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            module: ParsedModule::default(),
            tpdfs_nodes: Vec::new(),
            grps_nodes: Vec::new(),
            line: 1,
            source_name: source_name.into(),
            main_module: None,
            include_stack: Vec::new(),
            included: Vec::new(),
        }
    }

    /// A context for a submodule included (directly or not) by `main`.
    pub(crate) fn for_submodule(main: &ParserContext, name: &str, source_name: String) -> Self {
        let main_module = main.main_module.clone().unwrap_or_else(|| {
            (main.module.name.clone(), main.module.prefix.clone())
        });
        let mut include_stack = main.include_stack.clone();
        include_stack.push(name.to_string());
        Self {
            main_module: Some(main_module),
            include_stack,
            included: main.included.clone(),
            ..Self::new(source_name)
        }
    }

    /// Name of the module the parsed tree belongs to: itself, or the main module of a submodule.
    #[must_use]
    pub fn main_module_name(&self) -> &str {
        self.main_module
            .as_ref()
            .map_or(self.module.name.as_str(), |(name, _)| name.as_str())
    }

    #[must_use]
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn into_module(self) -> ParsedModule {
        self.module
    }
}

/// Parses `data` in the given format into `pctx.module`.
pub fn parse_module(
    pctx: &mut ParserContext,
    data: &str,
    format: SchemaFormat,
) -> Result<(), YangError> {
    let root = match format {
        SchemaFormat::Yang => {
            Parser::new_with_name(data, pctx.source_name.clone()).parse_document()?
        }
        SchemaFormat::Yin => yin::parse_document(data)?,
    };
    builder::build(pctx, &root, data)
}

/// A recursive descent parser for the native statement syntax.
#[derive(Debug)]
pub struct Parser<'a> {
    name: String,
    tokens: Vec<Token>,
    position: usize,
    source_text: &'a str,
}

impl<'a> Parser<'a> {
    pub fn new(source_text: &'a str) -> Self {
        Self::new_with_name(source_text, "source.yang".to_string())
    }

    pub fn new_with_name(source_text: &'a str, name: String) -> Self {
        let mut lexer = Lexer::new(source_text);
        let tokens: Vec<Token> = lexer
            .lex()
            .into_iter()
            .filter(|t| !matches!(t.ttype, TokenType::Whitespace | TokenType::Comment(_)))
            .collect();

        Self {
            name,
            tokens,
            position: 0,
            source_text,
        }
    }

    ///    Document ::= Statement EOF
    pub fn parse_document(&mut self) -> Result<Statement, ParserError> {
        let root = self.parse_statement()?;
        self.expect(TokenType::Eof)?;
        Ok(root)
    }

    /// Statement ::= Keyword [ Argument ] ( ";" | "{" { Statement } "}" )
    fn parse_statement(&mut self) -> Result<Statement, ParserError> {
        let start_token = self.current_token()?.clone();
        let keyword = match &start_token.ttype {
            TokenType::Word(word) => word.clone(),
            _ => return self.err_unexpected("a statement keyword"),
        };
        if !is_keyword(&keyword) {
            return Err(ParserError::InvalidKeyword {
                src: self.src(),
                span: span_of(&start_token),
                keyword,
                line: start_token.line,
            });
        }
        self.advance();

        let arg = self.parse_argument()?;

        let mut children = Vec::new();
        let end_token = self.current_token()?.clone();
        match end_token.ttype {
            TokenType::Semicolon => self.advance(),
            TokenType::LBrace => {
                self.advance();
                while !self.check(TokenType::RBrace) {
                    if self.check(TokenType::Eof) {
                        return self.err_eof();
                    }
                    children.push(self.parse_statement()?);
                }
                self.advance();
            }
            _ => return self.err_unexpected("';' or '{'"),
        }

        let end = self.current_token_before_advance()?.pos_end;
        Ok(Statement {
            keyword,
            arg,
            line: start_token.line,
            span: (start_token.pos_start, end - start_token.pos_start).into(),
            children,
        })
    }

    /// Argument ::= Word | Quoted { "+" Quoted }
    fn parse_argument(&mut self) -> Result<Option<String>, ParserError> {
        let token = self.current_token()?.clone();
        match token.ttype {
            TokenType::Word(word) => {
                self.advance();
                Ok(Some(word))
            }
            TokenType::Quoted(first) => {
                self.advance();
                let mut value = first;
                while self.check_word("+") {
                    self.advance();
                    let next = match &self.current_token()?.ttype {
                        TokenType::Quoted(next) => next.clone(),
                        _ => return self.err_unexpected("a quoted string after '+'"),
                    };
                    value.push_str(&next);
                    self.advance();
                }
                Ok(Some(value))
            }
            _ => Ok(None),
        }
    }

    // === Tokenizer Helper Methods ===

    fn src(&self) -> NamedSource<String> {
        NamedSource::new(self.name.clone(), self.source_text.to_string())
    }

    fn current_token(&self) -> Result<&Token, ParserError> {
        self.tokens.get(self.position).ok_or_else(|| {
            let pos = self.source_text.len().saturating_sub(1);
            ParserError::UnexpectedEof {
                src: self.src(),
                span: (pos, 0).into(),
                line: self.tokens.last().map_or(1, |t| t.line),
            }
        })
    }

    fn current_token_before_advance(&self) -> Result<&Token, ParserError> {
        self.tokens
            .get(self.position.saturating_sub(1))
            .ok_or_else(|| ParserError::UnexpectedEof {
                src: self.src(),
                span: (0, 0).into(),
                line: 1,
            })
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn expect(&mut self, expected: TokenType) -> Result<(), ParserError> {
        if self.check(expected.clone()) {
            self.advance();
            Ok(())
        } else {
            self.err_unexpected(&format!("{:?}", expected))
        }
    }

    fn check(&self, ttype: TokenType) -> bool {
        if let Ok(token) = self.current_token() {
            std::mem::discriminant(&token.ttype) == std::mem::discriminant(&ttype)
        } else {
            false
        }
    }

    fn check_word(&self, word: &str) -> bool {
        matches!(self.current_token(), Ok(Token { ttype: TokenType::Word(w), .. }) if w == word)
    }

    fn err_eof<T>(&self) -> Result<T, ParserError> {
        let token = self.current_token()?;
        Err(ParserError::UnexpectedEof {
            src: self.src(),
            span: (token.pos_start, 0).into(),
            line: token.line,
        })
    }

    fn err_unexpected<T>(&self, expected: &str) -> Result<T, ParserError> {
        let token = self.current_token()?;
        let text = &self.source_text[token.pos_start..token.pos_end];
        if token.ttype == TokenType::Unknown
            && (text.starts_with('"') || text.starts_with('\'') || text.starts_with("/*"))
        {
            return Err(ParserError::Unterminated {
                src: self.src(),
                span: (token.pos_start, 1).into(),
                line: token.line,
            });
        }
        if token.ttype == TokenType::Eof {
            return self.err_eof();
        }
        Err(ParserError::UnexpectedToken {
            src: self.src(),
            span: span_of(token),
            expected: expected.to_string(),
            line: token.line,
        })
    }
}

fn span_of(token: &Token) -> SourceSpan {
    (token.pos_start, token.pos_end - token.pos_start).into()
}

/// Keyword ::= [ Identifier ":" ] Identifier
fn is_keyword(word: &str) -> bool {
    match word.split_once(':') {
        Some((prefix, name)) => is_identifier(prefix) && is_identifier(name),
        None => is_identifier(word),
    }
}

/// Identifier ::= ( ALPHA | "_" ) { ALPHA | DIGIT | "_" | "-" | "." }
pub fn is_identifier(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Report;

    fn parse_ok(source: &str) -> Statement {
        let mut parser = Parser::new_with_name(source, "test.yang".to_string());
        match parser.parse_document() {
            Ok(stmt) => stmt,
            Err(err) => {
                let report = Report::from(err);
                panic!("{:?}", report);
            }
        }
    }

    #[test]
    fn test_empty_module() {
        let stmt = parse_ok("module a { }");
        assert_eq!(stmt.keyword, "module");
        assert_eq!(stmt.arg.as_deref(), Some("a"));
        assert!(stmt.children.is_empty());
    }

    #[test]
    fn test_nested_statements_and_lines() {
        let stmt = parse_ok("module a {\n  prefix a;\n  container c {\n    leaf l { type string; }\n  }\n}");
        assert_eq!(stmt.children.len(), 2);
        let container = &stmt.children[1];
        assert_eq!(container.keyword, "container");
        assert_eq!(container.line, 3);
        assert_eq!(container.children[0].children[0].keyword, "type");
        assert_eq!(container.children[0].children[0].line, 4);
    }

    #[test]
    fn test_string_concatenation() {
        let stmt = parse_ok(r#"module a { description "one " + 'two' + "three"; }"#);
        assert_eq!(stmt.children[0].arg.as_deref(), Some("one twothree"));
    }

    #[test]
    fn test_statement_without_argument() {
        let stmt = parse_ok("rpc r { input { leaf x { type int8; } } }");
        assert_eq!(stmt.children[0].keyword, "input");
        assert!(stmt.children[0].arg.is_none());
    }

    #[test]
    fn test_extension_keyword() {
        let stmt = parse_ok("module a { ex:annotation \"x\"; }");
        assert!(stmt.children[0].is_extension());
    }

    #[test]
    fn test_missing_closing_brace() {
        let mut parser = Parser::new("module a { prefix a;");
        assert!(matches!(
            parser.parse_document(),
            Err(ParserError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_missing_semicolon() {
        let mut parser = Parser::new("module a { prefix a }");
        let err = parser.parse_document().unwrap_err();
        assert!(matches!(err, ParserError::UnexpectedToken { line: 1, .. }));
    }

    #[test]
    fn test_invalid_keyword() {
        let mut parser = Parser::new("module a { 9lives x; }");
        assert!(matches!(
            parser.parse_document(),
            Err(ParserError::InvalidKeyword { .. })
        ));
    }

    #[test]
    fn test_unterminated_string() {
        let mut parser = Parser::new("module a {\n description \"never closed; }");
        let err = parser.parse_document().unwrap_err();
        assert!(matches!(err, ParserError::Unterminated { line: 2, .. }));
    }

    #[test]
    fn test_trailing_statement_rejected() {
        let mut parser = Parser::new("module a { } module b { }");
        assert!(parser.parse_document().is_err());
    }

    #[test]
    fn test_identifier_rules() {
        assert!(is_identifier("ietf-interfaces"));
        assert!(is_identifier("_x.y"));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier(""));
    }
}
