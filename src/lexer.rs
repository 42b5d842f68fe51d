/// Represents the different kinds of tokens that the lexer can produce
/// from the native schema syntax.
#[derive(Debug, PartialEq, Clone)]
pub enum TokenType {
    // == Special Tokens ==
    /// Represents the end of the input.
    Eof,
    /// Represents a sequence of one or more whitespace characters.
    Whitespace,
    /// A `//` line comment or a `/* */` block comment, without its delimiters.
    Comment(String),
    /// Represents input the lexer could not make sense of, such as an unterminated string.
    Unknown,

    // == Arguments and keywords ==
    /// An unquoted string. Keywords, identifiers and unquoted arguments all lex as words.
    Word(String),
    /// A single- or double-quoted string, with escapes and indentation already processed.
    Quoted(String),

    // == Punctuation ==
    /// Left Brace: `{`
    LBrace,
    /// Right Brace: `}`
    RBrace,
    /// Semicolon: `;`
    Semicolon,
}

/// A token with its type, byte range and the line it starts on.
#[derive(Debug, Clone)]
pub struct Token {
    pub ttype: TokenType,
    pub pos_start: usize,
    pub pos_end: usize,
    pub line: usize,
}

impl Token {
    pub fn new(ttype: TokenType, pos_start: usize, pos_end: usize, line: usize) -> Token {
        Token {
            ttype,
            pos_start,
            pos_end,
            line,
        }
    }
}

const TAB_WIDTH: usize = 8;

pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            position: 0,
            line: 1,
            column: 0,
        }
    }

    pub fn lex(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            if token.ttype == TokenType::Eof {
                tokens.push(token);
                break;
            }
            tokens.push(token);
        }
        tokens
    }

    pub fn next_token(&mut self) -> Token {
        let start_pos = self.position;
        let start_line = self.line;

        let ttype = if let Some(char) = self.peek() {
            match char {
                '{' => {
                    self.advance();
                    TokenType::LBrace
                }
                '}' => {
                    self.advance();
                    TokenType::RBrace
                }
                ';' => {
                    self.advance();
                    TokenType::Semicolon
                }
                '"' => self.read_double_quoted(),
                '\'' => self.read_single_quoted(),
                c if c.is_whitespace() => self.read_whitespace(),
                '/' if self.rest().starts_with("//") => self.read_line_comment(),
                '/' if self.rest().starts_with("/*") => self.read_block_comment(),
                _ => self.read_word(),
            }
        } else {
            TokenType::Eof
        };

        Token::new(ttype, start_pos, self.position, start_line)
    }

    fn rest(&self) -> &'a str {
        &self.input[self.position..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += c.len_utf8();
        match c {
            '\n' => {
                self.line += 1;
                self.column = 0;
            }
            '\t' => self.column += TAB_WIDTH,
            _ => self.column += 1,
        }
        Some(c)
    }

    fn read_whitespace(&mut self) -> TokenType {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
        TokenType::Whitespace
    }

    fn read_line_comment(&mut self) -> TokenType {
        self.advance();
        self.advance();
        let mut comment_text = String::new();
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            comment_text.push(c);
            self.advance();
        }
        TokenType::Comment(comment_text.trim().to_string())
    }

    fn read_block_comment(&mut self) -> TokenType {
        self.advance();
        self.advance();
        let mut comment_text = String::new();
        while self.peek().is_some() {
            if self.rest().starts_with("*/") {
                self.advance();
                self.advance();
                return TokenType::Comment(comment_text.trim().to_string());
            }
            if let Some(c) = self.advance() {
                comment_text.push(c);
            }
        }
        TokenType::Unknown // Unclosed comment
    }

    fn read_single_quoted(&mut self) -> TokenType {
        self.advance();
        let mut value = String::new();
        while let Some(c) = self.advance() {
            if c == '\'' {
                return TokenType::Quoted(value);
            }
            value.push(c);
        }
        TokenType::Unknown // Unclosed string
    }

    /// Reads a double-quoted string. Escapes are processed, whitespace before a line
    /// break is dropped, and continuation lines lose their indentation up to the
    /// column just past the opening quote.
    fn read_double_quoted(&mut self) -> TokenType {
        let indent_limit = self.column + 1;
        self.advance();
        let mut value = String::new();

        while let Some(c) = self.advance() {
            match c {
                '"' => return TokenType::Quoted(value),
                '\\' => match self.advance() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('"') => value.push('"'),
                    Some('\\') => value.push('\\'),
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => return TokenType::Unknown, // Unclosed escape sequence
                },
                '\n' => {
                    let trimmed = value.trim_end_matches([' ', '\t']).len();
                    value.truncate(trimmed);
                    value.push('\n');
                    self.skip_indentation(indent_limit, &mut value);
                }
                _ => value.push(c),
            }
        }
        TokenType::Unknown // Unclosed string
    }

    fn skip_indentation(&mut self, limit: usize, value: &mut String) {
        let mut skipped = 0;
        while skipped < limit {
            match self.peek() {
                Some(' ') => {
                    self.advance();
                    skipped += 1;
                }
                Some('\t') => {
                    self.advance();
                    skipped += TAB_WIDTH;
                    // A tab that crosses the limit leaves its excess as spaces.
                    for _ in limit..skipped {
                        value.push(' ');
                    }
                }
                _ => break,
            }
        }
    }

    fn read_word(&mut self) -> TokenType {
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if c.is_whitespace()
                || matches!(c, ';' | '{' | '}' | '"' | '\'')
                || self.rest().starts_with("//")
                || self.rest().starts_with("/*")
            {
                break;
            }
            word.push(c);
            self.advance();
        }
        TokenType::Word(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_tokens(input: &str, expected: Vec<TokenType>) {
        let mut lexer = Lexer::new(input);
        let tokens = lexer.lex();
        let token_types: Vec<TokenType> = tokens.into_iter().map(|t| t.ttype).collect();

        // Filter out whitespace and comments for most tests
        let filtered_tokens: Vec<TokenType> = token_types
            .into_iter()
            .filter(|t| !matches!(t, TokenType::Whitespace | TokenType::Comment(_)))
            .collect();

        assert_eq!(filtered_tokens, expected);
    }

    fn word(s: &str) -> TokenType {
        TokenType::Word(s.to_string())
    }

    #[test]
    fn test_eof() {
        assert_tokens("", vec![TokenType::Eof]);
    }

    #[test]
    fn test_punctuation() {
        let input = "leaf a { type string; }";
        let expected = vec![
            word("leaf"),
            word("a"),
            TokenType::LBrace,
            word("type"),
            word("string"),
            TokenType::Semicolon,
            TokenType::RBrace,
            TokenType::Eof,
        ];
        assert_tokens(input, expected);
    }

    #[test]
    fn test_unquoted_paths_keep_slashes() {
        let input = "augment /if:interfaces/if:interface;";
        let expected = vec![
            word("augment"),
            word("/if:interfaces/if:interface"),
            TokenType::Semicolon,
            TokenType::Eof,
        ];
        assert_tokens(input, expected);
    }

    #[test]
    fn test_quoted_strings() {
        let input = r#"pattern '[a-z]+\d'; description "say \"hi\"";"#;
        let expected = vec![
            word("pattern"),
            TokenType::Quoted("[a-z]+\\d".to_string()),
            TokenType::Semicolon,
            word("description"),
            TokenType::Quoted("say \"hi\"".to_string()),
            TokenType::Semicolon,
            TokenType::Eof,
        ];
        assert_tokens(input, expected);
    }

    #[test]
    fn test_concatenation_operator_is_a_word() {
        let input = r#""a" + "b""#;
        let expected = vec![
            TokenType::Quoted("a".to_string()),
            word("+"),
            TokenType::Quoted("b".to_string()),
            TokenType::Eof,
        ];
        assert_tokens(input, expected);
    }

    #[test]
    fn test_double_quoted_indentation_is_trimmed() {
        let input = "description \"first   \n             second\";";
        let expected = vec![
            word("description"),
            TokenType::Quoted("first\nsecond".to_string()),
            TokenType::Semicolon,
            TokenType::Eof,
        ];
        assert_tokens(input, expected);
    }

    #[test]
    fn test_comments_and_lines() {
        let input = "// header\nmodule a { /* block\n comment */ prefix a; }";
        let mut lexer = Lexer::new(input);
        let tokens: Vec<Token> = lexer
            .lex()
            .into_iter()
            .filter(|t| !matches!(t.ttype, TokenType::Whitespace))
            .collect();

        assert_eq!(tokens[0].ttype, TokenType::Comment("header".to_string()));
        assert_eq!(tokens[1].ttype, word("module"));
        assert_eq!(tokens[1].line, 2);
        assert_eq!(
            tokens[4].ttype,
            TokenType::Comment("block\n comment".to_string())
        );
        assert_eq!(tokens[5].ttype, word("prefix"));
        assert_eq!(tokens[5].line, 3);
    }

    #[test]
    fn test_unterminated_string() {
        assert_tokens(
            "description \"open",
            vec![word("description"), TokenType::Unknown, TokenType::Eof],
        );
    }
}
