/// Token types for the statement lexer
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenType {
    // Keywords (case-sensitive, upper case only)
    Create,
    Drop,
    Table,
    Insert,
    Into,
    Select,
    From,
    Where,
    Update,
    Set,
    Delete,
    Text,
    Long,
    And,
    Or,
    Not,
    Like,
    In,
    All,

    // Operators
    Eq,           // =
    Ne,           // != or <>
    Lt,           // <
    Gt,           // >
    Le,           // <=
    Ge,           // >=
    Plus,         // +
    Minus,        // -
    Star,         // *
    Slash,        // /
    Percent,      // %

    // Delimiters
    LParen,       // (
    RParen,       // )
    Comma,        // ,
    Semicolon,    // ;

    // Literals
    /// All-digit word, kept as text so range errors surface at parse time
    Number(String),
    String(String),
    Identifier(String),

    // Special
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub token_type: TokenType,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(token_type: TokenType, line: usize, column: usize) -> Self {
        Self { token_type, line, column }
    }
}

impl TokenType {
    /// Keyword for an exact word, if it is one.
    pub fn from_keyword(s: &str) -> Option<Self> {
        let keyword = match s {
            "CREATE" => TokenType::Create,
            "DROP" => TokenType::Drop,
            "TABLE" => TokenType::Table,
            "INSERT" => TokenType::Insert,
            "INTO" => TokenType::Into,
            "SELECT" => TokenType::Select,
            "FROM" => TokenType::From,
            "WHERE" => TokenType::Where,
            "UPDATE" => TokenType::Update,
            "SET" => TokenType::Set,
            "DELETE" => TokenType::Delete,
            "TEXT" => TokenType::Text,
            "LONG" => TokenType::Long,
            "AND" => TokenType::And,
            "OR" => TokenType::Or,
            "NOT" => TokenType::Not,
            "LIKE" => TokenType::Like,
            "IN" => TokenType::In,
            "ALL" => TokenType::All,
            _ => return None,
        };
        Some(keyword)
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenType::Create => "CREATE",
            TokenType::Drop => "DROP",
            TokenType::Table => "TABLE",
            TokenType::Insert => "INSERT",
            TokenType::Into => "INTO",
            TokenType::Select => "SELECT",
            TokenType::From => "FROM",
            TokenType::Where => "WHERE",
            TokenType::Update => "UPDATE",
            TokenType::Set => "SET",
            TokenType::Delete => "DELETE",
            TokenType::Text => "TEXT",
            TokenType::Long => "LONG",
            TokenType::And => "AND",
            TokenType::Or => "OR",
            TokenType::Not => "NOT",
            TokenType::Like => "LIKE",
            TokenType::In => "IN",
            TokenType::All => "ALL",
            TokenType::Eq => "=",
            TokenType::Ne => "!=",
            TokenType::Lt => "<",
            TokenType::Gt => ">",
            TokenType::Le => "<=",
            TokenType::Ge => ">=",
            TokenType::Plus => "+",
            TokenType::Minus => "-",
            TokenType::Star => "*",
            TokenType::Slash => "/",
            TokenType::Percent => "%",
            TokenType::LParen => "(",
            TokenType::RParen => ")",
            TokenType::Comma => ",",
            TokenType::Semicolon => ";",
            TokenType::Number(n) => return write!(f, "{}", n),
            TokenType::String(s) => return write!(f, "'{}'", s.replace('\'', "''")),
            TokenType::Identifier(name) => return write!(f, "{}", name),
            TokenType::Eof => "end of input",
        };
        f.write_str(text)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' at {}:{}", self.token_type, self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_are_case_sensitive() {
        assert_eq!(TokenType::from_keyword("SELECT"), Some(TokenType::Select));
        assert_eq!(TokenType::from_keyword("select"), None);
        assert_eq!(TokenType::from_keyword("Where"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(TokenType::String("it's".into()).to_string(), "'it''s'");
        assert_eq!(Token::new(TokenType::Ge, 1, 4).to_string(), "'>=' at 1:4");
    }
}
