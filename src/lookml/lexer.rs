//! Lexer for LookML-style model sources.
//!
//! Tokenizes nested key/value block syntax. The grammar is context-sensitive
//! in one place: the value of an expression key (`sql`, `sql_*`, `*_sql`,
//! `html`) is raw text running to the `;;` terminator, so the lexer switches
//! into raw mode after seeing such a key and its colon.

use super::ParseError;

/// A token in a LookML source file.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // ========================================================================
    // Literals
    // ========================================================================
    /// An identifier or bareword value (`view`, `yes`, `left_outer`).
    Ident(String),
    /// A quoted string (contents without quotes).
    StringLit(String),
    /// A numeric literal, kept as source text.
    Number(String),
    /// Raw expression text terminated by `;;` (terminator not included).
    ExprBlock(String),

    // ========================================================================
    // Symbols
    // ========================================================================
    /// `:`
    Colon,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `,`
    Comma,
}

/// A token together with the 1-based line it started on.
pub type SpannedToken = (Token, usize);

/// True for keys whose value is raw SQL/HTML text up to `;;`.
fn is_expression_key(key: &str) -> bool {
    key == "sql" || key == "html" || key.starts_with("sql_") || key.ends_with("_sql")
}

/// Tokenize a LookML source string.
pub fn lex(source: &str) -> Result<Vec<SpannedToken>, ParseError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = source.chars().collect();
    let mut pos = 0;
    let mut line = 1;
    // Set when the previous two tokens were an expression key and its colon.
    let mut expr_pending = false;

    while pos < chars.len() {
        let c = chars[pos];

        match c {
            '\n' => {
                line += 1;
                pos += 1;
            }
            c if c.is_whitespace() => {
                pos += 1;
            }
            '#' => {
                // Comment to end of line
                while pos < chars.len() && chars[pos] != '\n' {
                    pos += 1;
                }
            }
            _ if expr_pending => {
                // Raw expression text up to the ;; terminator
                let start_line = line;
                let start = pos;
                let mut end = None;
                while pos < chars.len() {
                    if chars[pos] == ';' && pos + 1 < chars.len() && chars[pos + 1] == ';' {
                        end = Some(pos);
                        pos += 2;
                        break;
                    }
                    if chars[pos] == '\n' {
                        line += 1;
                    }
                    pos += 1;
                }
                let end = end.ok_or(ParseError::UnterminatedExpression { line: start_line })?;
                let text: String = chars[start..end].iter().collect();
                tokens.push((Token::ExprBlock(text.trim().to_string()), start_line));
                expr_pending = false;
            }
            ':' => {
                tokens.push((Token::Colon, line));
                pos += 1;
                // Check whether the key before this colon demands raw mode
                if tokens.len() >= 2 {
                    if let (Token::Ident(key), _) = &tokens[tokens.len() - 2] {
                        if is_expression_key(key) {
                            expr_pending = true;
                        }
                    }
                }
            }
            '{' => {
                tokens.push((Token::LBrace, line));
                pos += 1;
            }
            '}' => {
                tokens.push((Token::RBrace, line));
                pos += 1;
            }
            '[' => {
                tokens.push((Token::LBracket, line));
                pos += 1;
            }
            ']' => {
                tokens.push((Token::RBracket, line));
                pos += 1;
            }
            ',' => {
                tokens.push((Token::Comma, line));
                pos += 1;
            }
            '"' | '\'' => {
                let quote = c;
                let start_line = line;
                pos += 1;
                let mut value = String::new();
                let mut closed = false;
                while pos < chars.len() {
                    let ch = chars[pos];
                    if ch == quote {
                        closed = true;
                        pos += 1;
                        break;
                    }
                    if ch == '\n' {
                        line += 1;
                    }
                    if ch == '\\' && pos + 1 < chars.len() {
                        pos += 1;
                        value.push(chars[pos]);
                    } else {
                        value.push(ch);
                    }
                    pos += 1;
                }
                if !closed {
                    return Err(ParseError::UnterminatedString { line: start_line });
                }
                tokens.push((Token::StringLit(value), start_line));
            }
            '`' => {
                // Backtick-quoted table references stay quoted in the value
                let start_line = line;
                let start = pos;
                pos += 1;
                let mut closed = false;
                while pos < chars.len() {
                    if chars[pos] == '`' {
                        pos += 1;
                        closed = true;
                        break;
                    }
                    if chars[pos] == '\n' {
                        line += 1;
                    }
                    pos += 1;
                }
                if !closed {
                    return Err(ParseError::UnterminatedString { line: start_line });
                }
                let value: String = chars[start..pos].iter().collect();
                tokens.push((Token::Ident(value), start_line));
            }
            c if c.is_ascii_digit() || c == '-' => {
                let start = pos;
                pos += 1;
                while pos < chars.len()
                    && (chars[pos].is_ascii_digit() || chars[pos] == '.' || chars[pos] == '_')
                {
                    pos += 1;
                }
                let text: String = chars[start..pos].iter().collect();
                tokens.push((Token::Number(text), line));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = pos;
                pos += 1;
                // Barewords may carry dots and wildcards (include paths,
                // qualified table names)
                while pos < chars.len()
                    && (chars[pos].is_alphanumeric()
                        || chars[pos] == '_'
                        || chars[pos] == '.'
                        || chars[pos] == '*'
                        || chars[pos] == '/')
                {
                    pos += 1;
                }
                let text: String = chars[start..pos].iter().collect();
                tokens.push((Token::Ident(text), line));
            }
            other => {
                return Err(ParseError::UnexpectedCharacter { ch: other, line });
            }
        }
    }

    Ok(tokens)
}
