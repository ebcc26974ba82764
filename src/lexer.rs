use crate::ast::Token;
use crate::error::{CompileError, CompileErrorKind};

pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Offset of the next unread character.
    pub fn position(&self) -> usize {
        self.position
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn error(&self, kind: CompileErrorKind, offset: usize) -> CompileError {
        CompileError::new(kind, offset)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if is_identifier_char(ch) {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_string(&mut self, quote: char) -> Result<String, CompileError> {
        let (value, next) = read_quoted(&self.input, self.position, quote)?;
        self.position = next;
        Ok(value)
    }

    fn read_number(&mut self) -> Result<Token, CompileError> {
        let start = self.position;
        let mut number = String::new();
        let mut is_float = false;

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.'
                && !is_float
                && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                is_float = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        // exponent: 1e3, 2.5E-2
        if matches!(self.current_char(), Some('e' | 'E')) {
            let sign = matches!(self.peek_char(1), Some('+' | '-'));
            let digit_at = if sign { 2 } else { 1 };
            if self.peek_char(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                for _ in 0..digit_at {
                    number.push(self.input[self.position]);
                    self.advance();
                }
                while let Some(ch) = self.current_char().filter(char::is_ascii_digit) {
                    number.push(ch);
                    self.advance();
                }
            }
        }

        let invalid = |number: String| CompileError::new(CompileErrorKind::InvalidNumber(number), start);
        if is_float {
            number
                .parse::<f64>()
                .map(Token::Float)
                .map_err(|_| invalid(number))
        } else {
            number
                .parse::<i64>()
                .map(Token::Integer)
                .map_err(|_| invalid(number))
        }
    }

    /// Next token, without its offset.
    pub fn next_token(&mut self) -> Result<Token, CompileError> {
        self.next_spanned().map(|(token, _)| token)
    }

    /// Next token together with the offset of its first character.
    pub fn next_spanned(&mut self) -> Result<(Token, usize), CompileError> {
        self.skip_whitespace();
        let start = self.position;

        let token = match self.current_char() {
            None => Token::Eof,
            Some('$') => {
                self.advance();
                Token::Dollar
            }
            Some('@') => {
                self.advance();
                Token::At
            }
            Some('.') => {
                if self.peek_char(1) == Some('.') {
                    self.advance();
                    self.advance();
                    Token::DotDot
                } else {
                    self.advance();
                    Token::Dot
                }
            }
            Some('*') => {
                self.advance();
                Token::Star
            }
            Some('?') => {
                self.advance();
                Token::Question
            }
            Some('[') => {
                self.advance();
                Token::LBracket
            }
            Some(']') => {
                self.advance();
                Token::RBracket
            }
            Some('(') => {
                self.advance();
                Token::LParen
            }
            Some(')') => {
                self.advance();
                Token::RParen
            }
            Some(',') => {
                self.advance();
                Token::Comma
            }
            Some(':') => {
                self.advance();
                Token::Colon
            }
            Some('+') => {
                self.advance();
                Token::Plus
            }
            Some('-') => {
                self.advance();
                Token::Minus
            }
            Some('/') => {
                self.advance();
                Token::Slash
            }
            Some('%') => {
                self.advance();
                Token::Percent
            }
            Some('=') => match self.peek_char(1) {
                Some('=') => {
                    self.advance();
                    self.advance();
                    Token::EqEq
                }
                Some('~') => {
                    self.advance();
                    self.advance();
                    Token::Match
                }
                _ => return Err(self.error(CompileErrorKind::UnexpectedCharacter('='), start)),
            },
            Some('!') => {
                if self.peek_char(1) == Some('=') {
                    self.advance();
                    self.advance();
                    Token::NotEq
                } else {
                    self.advance();
                    Token::Not
                }
            }
            Some('<') => {
                if self.peek_char(1) == Some('=') {
                    self.advance();
                    self.advance();
                    Token::LtEq
                } else {
                    self.advance();
                    Token::Lt
                }
            }
            Some('>') => {
                if self.peek_char(1) == Some('=') {
                    self.advance();
                    self.advance();
                    Token::GtEq
                } else {
                    self.advance();
                    Token::Gt
                }
            }
            Some('&') => {
                if self.peek_char(1) != Some('&') {
                    return Err(self.error(CompileErrorKind::UnexpectedCharacter('&'), start));
                }
                self.advance();
                self.advance();
                Token::And
            }
            Some('|') => {
                if self.peek_char(1) != Some('|') {
                    return Err(self.error(CompileErrorKind::UnexpectedCharacter('|'), start));
                }
                self.advance();
                self.advance();
                Token::Or
            }
            Some(q @ ('"' | '\'')) => Token::String(self.read_string(q)?),
            Some(ch) if is_identifier_start(ch) => {
                let ident = self.read_identifier();

                match ident.as_str() {
                    "true" => Token::Boolean(true),
                    "false" => Token::Boolean(false),
                    "null" => Token::Null,
                    _ => Token::Identifier(ident),
                }
            }
            Some(ch) if ch.is_ascii_digit() => self.read_number()?,
            Some(ch) => return Err(self.error(CompileErrorKind::UnexpectedCharacter(ch), start)),
        };

        Ok((token, start))
    }

    /// Read a `/pattern/flags` literal. Called by the parser right after `=~`,
    /// since `/` is otherwise division.
    ///
    /// Inside the pattern only `\/` is unescaped; every other backslash
    /// sequence is passed through to the regex engine untouched.
    pub fn next_regex(&mut self) -> Result<(Token, usize), CompileError> {
        self.skip_whitespace();
        let start = self.position;

        match self.current_char() {
            Some('/') => self.advance(),
            Some(_) => {
                let (found, _) = self.next_spanned()?;
                return Err(self.error(
                    CompileErrorKind::UnexpectedToken {
                        found: found.to_string(),
                        expected: "regular expression",
                    },
                    start,
                ));
            }
            None => {
                return Err(self.error(
                    CompileErrorKind::UnexpectedEnd {
                        expected: "regular expression",
                    },
                    start,
                ));
            }
        }

        let mut pattern = String::new();
        loop {
            match self.current_char() {
                None => return Err(self.error(CompileErrorKind::UnterminatedRegex, start)),
                Some('/') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.current_char() {
                        Some('/') => pattern.push('/'),
                        Some(ch) => {
                            pattern.push('\\');
                            pattern.push(ch);
                        }
                        None => return Err(self.error(CompileErrorKind::UnterminatedRegex, start)),
                    }
                    self.advance();
                }
                Some(ch) => {
                    pattern.push(ch);
                    self.advance();
                }
            }
        }

        let mut flags = String::new();
        while let Some(ch) = self.current_char().filter(char::is_ascii_alphabetic) {
            flags.push(ch);
            self.advance();
        }

        Ok((Token::Regex { pattern, flags }, start))
    }
}

pub(crate) fn is_identifier_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

pub(crate) fn is_identifier_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Read a quoted string starting at the opening `quote` in `input`.
///
/// Returns the unescaped text and the position just past the closing quote.
/// Shared by the expression lexer and the normalized path parser.
pub(crate) fn read_quoted(
    input: &[char],
    start: usize,
    quote: char,
) -> Result<(String, usize), CompileError> {
    let unterminated = || CompileError::new(CompileErrorKind::UnterminatedString, start);
    let mut result = String::new();
    let mut position = start + 1; // opening quote

    while let Some(&ch) = input.get(position) {
        match ch {
            c if c == quote => return Ok((result, position + 1)),
            '\\' => {
                let escape_at = position;
                position += 1;
                let Some(&escaped) = input.get(position) else {
                    return Err(unterminated());
                };
                match escaped {
                    '\'' | '"' | '\\' | '/' => result.push(escaped),
                    'b' => result.push('\u{8}'),
                    'f' => result.push('\u{c}'),
                    'n' => result.push('\n'),
                    'r' => result.push('\r'),
                    't' => result.push('\t'),
                    'u' => {
                        let (decoded, next) = read_unicode_escape(input, position + 1)
                            .ok_or_else(|| {
                                CompileError::new(CompileErrorKind::InvalidEscape('u'), escape_at)
                            })?;
                        result.push(decoded);
                        position = next;
                        continue;
                    }
                    other => {
                        return Err(CompileError::new(
                            CompileErrorKind::InvalidEscape(other),
                            escape_at,
                        ));
                    }
                }
                position += 1;
            }
            _ => {
                result.push(ch);
                position += 1;
            }
        }
    }

    Err(unterminated())
}

fn read_hex4(input: &[char], at: usize) -> Option<u32> {
    let digits: String = input.get(at..at + 4)?.iter().collect();
    if digits.chars().all(|c| c.is_ascii_hexdigit()) {
        u32::from_str_radix(&digits, 16).ok()
    } else {
        None
    }
}

/// Decode the `XXXX` after `\u`, joining surrogate pairs written as two
/// escapes.
fn read_unicode_escape(input: &[char], at: usize) -> Option<(char, usize)> {
    let high = read_hex4(input, at)?;
    if !(0xD800..0xDC00).contains(&high) {
        return char::from_u32(high).map(|c| (c, at + 4));
    }
    if input.get(at + 4) != Some(&'\\') || input.get(at + 5) != Some(&'u') {
        return None;
    }
    let low = read_hex4(input, at + 6)?;
    if !(0xDC00..0xE000).contains(&low) {
        return None;
    }
    let combined = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
    char::from_u32(combined).map(|c| (c, at + 10))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token().unwrap();
            if token == Token::Eof {
                return out;
            }
            out.push(token);
        }
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            tokens("true false null nullable"),
            vec![
                Token::Boolean(true),
                Token::Boolean(false),
                Token::Null,
                Token::Identifier("nullable".to_string()),
            ]
        );
    }

    #[test]
    fn test_dot_versus_recursive_descent() {
        assert_eq!(
            tokens("$..a.b"),
            vec![
                Token::Dollar,
                Token::DotDot,
                Token::Identifier("a".to_string()),
                Token::Dot,
                Token::Identifier("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_exponent_numbers() {
        assert_eq!(tokens("1e3 2.5E-1"), vec![Token::Float(1000.0), Token::Float(0.25)]);
        // a trailing 'e' without digits is left for the identifier rule
        assert_eq!(
            tokens("2e"),
            vec![Token::Integer(2), Token::Identifier("e".to_string())]
        );
    }

    #[test]
    fn test_unicode_escapes() {
        assert_eq!(tokens(r"'\u00e9'"), vec![Token::String("é".to_string())]);
        assert_eq!(tokens(r"'\ud83d\ude00'"), vec![Token::String("😀".to_string())]);

        let err = Lexer::new(r"'\ud83d'").next_token().unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::InvalidEscape('u'));
        assert_eq!(err.offset, 1);
    }

    #[test]
    fn test_regex_literal() {
        let mut lexer = Lexer::new(r"=~ /a\/b\d/i)");
        assert_eq!(lexer.next_token().unwrap(), Token::Match);
        let (token, offset) = lexer.next_regex().unwrap();
        assert_eq!(offset, 3);
        assert_eq!(
            token,
            Token::Regex {
                pattern: r"a/b\d".to_string(),
                flags: "i".to_string()
            }
        );
        assert_eq!(lexer.next_token().unwrap(), Token::RParen);
    }

    #[test]
    fn test_single_operator_characters_are_rejected() {
        let mut lexer = Lexer::new("@ = 1");
        lexer.next_token().unwrap();
        let err = lexer.next_token().unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::UnexpectedCharacter('='));
        assert_eq!(err.offset, 2);
    }
}
