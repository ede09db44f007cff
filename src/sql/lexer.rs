/// Statement lexer - splits a statement string into tokens

use super::token::{Token, TokenType};
use crate::error::{SqlError, SqlResult};

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn tokenize(&mut self) -> SqlResult<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let is_eof = matches!(token.token_type, TokenType::Eof);
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        Ok(tokens)
    }

    pub fn next_token(&mut self) -> SqlResult<Token> {
        self.skip_whitespace();

        let line = self.line;
        let column = self.column;

        if self.is_eof() {
            return Ok(Token::new(TokenType::Eof, line, column));
        }

        let ch = self.current_char();

        if ch == '-' && self.peek_char() == Some('-') {
            self.skip_line_comment();
            return self.next_token();
        }

        let token_type = match ch {
            '\'' => self.read_string(line, column)?,

            c if is_word_char(c) => self.read_word(),

            '=' => {
                self.advance();
                TokenType::Eq
            }
            '!' => {
                self.advance();
                if self.current_char() == '=' {
                    self.advance();
                    TokenType::Ne
                } else {
                    return Err(SqlError::UnknownCommand(format!(
                        "unexpected character '!' at {}:{}",
                        line, column
                    )));
                }
            }
            '<' => {
                self.advance();
                match self.current_char() {
                    '=' => {
                        self.advance();
                        TokenType::Le
                    }
                    '>' => {
                        self.advance();
                        TokenType::Ne
                    }
                    _ => TokenType::Lt,
                }
            }
            '>' => {
                self.advance();
                if self.current_char() == '=' {
                    self.advance();
                    TokenType::Ge
                } else {
                    TokenType::Gt
                }
            }
            '+' => self.single(TokenType::Plus),
            '-' => self.single(TokenType::Minus),
            '*' => self.single(TokenType::Star),
            '/' => self.single(TokenType::Slash),
            '%' => self.single(TokenType::Percent),
            '(' => self.single(TokenType::LParen),
            ')' => self.single(TokenType::RParen),
            ',' => self.single(TokenType::Comma),
            ';' => self.single(TokenType::Semicolon),
            _ => {
                return Err(SqlError::UnknownCommand(format!(
                    "unexpected character '{}' at {}:{}",
                    ch, line, column
                )));
            }
        };

        Ok(Token::new(token_type, line, column))
    }

    fn single(&mut self, token_type: TokenType) -> TokenType {
        self.advance();
        token_type
    }

    fn current_char(&self) -> char {
        if self.is_eof() {
            '\0'
        } else {
            self.input[self.position]
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        if !self.is_eof() {
            if self.input[self.position] == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.position += 1;
        }
    }

    fn is_eof(&self) -> bool {
        self.position >= self.input.len()
    }

    fn skip_whitespace(&mut self) {
        while !self.is_eof() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    fn skip_line_comment(&mut self) {
        while !self.is_eof() && self.current_char() != '\n' {
            self.advance();
        }
        if !self.is_eof() {
            self.advance(); // skip newline
        }
    }

    /// Single-quoted string; `''` stands for one quote. No other escapes,
    /// so LIKE patterns keep their backslashes.
    fn read_string(&mut self, line: usize, column: usize) -> SqlResult<TokenType> {
        self.advance(); // skip opening quote
        let mut value = String::new();

        loop {
            if self.is_eof() {
                return Err(SqlError::UnterminatedString { line, column });
            }
            let ch = self.current_char();
            self.advance();
            if ch == '\'' {
                if self.current_char() == '\'' && !self.is_eof() {
                    value.push('\'');
                    self.advance();
                } else {
                    break;
                }
            } else {
                value.push(ch);
            }
        }

        Ok(TokenType::String(value))
    }

    /// Keyword, all-digit number or identifier. A word mixing digits and
    /// letters (`12ab`) is an identifier.
    fn read_word(&mut self) -> TokenType {
        let mut value = String::new();

        while !self.is_eof() && is_word_char(self.current_char()) {
            value.push(self.current_char());
            self.advance();
        }

        if value.chars().all(|c| c.is_ascii_digit()) {
            return TokenType::Number(value);
        }
        TokenType::from_keyword(&value).unwrap_or(TokenType::Identifier(value))
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Tokenize a whole statement.
pub fn tokenize(input: &str) -> SqlResult<Vec<Token>> {
    Lexer::new(input).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(input: &str) -> Vec<TokenType> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.token_type)
            .collect()
    }

    #[test]
    fn test_lexer_simple_select() {
        let tokens = tokenize("SELECT * FROM users WHERE ALL").unwrap();

        assert_eq!(tokens.len(), 7); // SELECT, *, FROM, users, WHERE, ALL, EOF
        assert!(matches!(tokens[0].token_type, TokenType::Select));
        assert!(matches!(tokens[1].token_type, TokenType::Star));
        assert!(matches!(tokens[3].token_type, TokenType::Identifier(ref s) if s == "users"));
        assert!(matches!(tokens[5].token_type, TokenType::All));
        assert!(matches!(tokens[6].token_type, TokenType::Eof));
    }

    #[test]
    fn test_lexer_operators_need_no_spaces() {
        assert_eq!(
            types("(a+1)*2>=b%3"),
            vec![
                TokenType::LParen,
                TokenType::Identifier("a".into()),
                TokenType::Plus,
                TokenType::Number("1".into()),
                TokenType::RParen,
                TokenType::Star,
                TokenType::Number("2".into()),
                TokenType::Ge,
                TokenType::Identifier("b".into()),
                TokenType::Percent,
                TokenType::Number("3".into()),
                TokenType::Eof,
            ]
        );
        assert_eq!(
            types("!= <> <"),
            vec![TokenType::Ne, TokenType::Ne, TokenType::Lt, TokenType::Eof]
        );
    }

    #[test]
    fn test_lexer_string_literal() {
        let tokens = types("INSERT INTO t ('John Smith', 'it''s')");
        assert_eq!(tokens[4], TokenType::String("John Smith".into()));
        assert_eq!(tokens[6], TokenType::String("it's".into()));
        assert_eq!(types(r"'\d+'")[0], TokenType::String(r"\d+".into()));
    }

    #[test]
    fn test_lexer_unterminated_string() {
        let err = tokenize("INSERT INTO t ('abc)").unwrap_err();
        assert_eq!(err, SqlError::UnterminatedString { line: 1, column: 16 });
    }

    #[test]
    fn test_lexer_words() {
        assert_eq!(types("12ab")[0], TokenType::Identifier("12ab".into()));
        assert_eq!(types("0042")[0], TokenType::Number("0042".into()));
        assert_eq!(types("select")[0], TokenType::Identifier("select".into()));
        assert_eq!(types("LONG")[0], TokenType::Long);
    }

    #[test]
    fn test_lexer_comment() {
        let tokens = types("SELECT * -- this is a comment\nFROM users");
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[2], TokenType::From);
    }

    #[test]
    fn test_lexer_rejects_stray_characters() {
        assert!(matches!(tokenize("a ! b"), Err(SqlError::UnknownCommand(_))));
        assert!(matches!(tokenize("a.b"), Err(SqlError::UnknownCommand(_))));
    }
}
