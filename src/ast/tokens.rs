use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Floating-point number
    ///
    /// # Examples
    /// ```text
    /// 3.14
    /// 1e3
    /// ```
    Float(f64),

    /// Non-negative integer; signs are handled by the parser
    ///
    /// # Examples
    /// ```text
    /// 0
    /// 42
    /// ```
    Integer(i64),

    /// String literal in single or double quotes, escapes already resolved
    ///
    /// # Examples
    /// ```text
    /// 'fiction'
    /// "it's"
    /// ```
    String(String),

    /// `true` / `false`
    Boolean(bool),

    /// `null`
    Null,

    /// Member name or function name
    ///
    /// Starts with a letter or underscore, followed by letters, digits or
    /// underscores.
    Identifier(String),

    /// Regular expression literal, only produced after `=~`
    ///
    /// # Examples
    /// ```text
    /// /Evelyn.*?/
    /// /^fic/i
    /// ```
    Regex { pattern: String, flags: String },

    // References
    /// Root node (`$`)
    Dollar,

    /// Current node inside filters (`@`)
    At,

    // Path punctuation
    /// Child segment (`.`)
    Dot,

    /// Recursive descent (`..`)
    DotDot,

    /// Wildcard, or multiplication inside filters
    Star,

    /// Filter selector (`?`)
    Question,

    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,

    /// Slice separator
    Colon,

    // Comparison
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    /// Regex match (`=~`)
    Match,

    // Logical
    /// `&&`
    And,

    /// `||`
    Or,

    /// `!`
    Not,

    // Arithmetic
    Plus,
    Minus,
    Slash,
    Percent,

    /// End of input
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Float(n) => write!(f, "number {n}"),
            Token::Integer(n) => write!(f, "number {n}"),
            Token::String(s) => write!(f, "string '{s}'"),
            Token::Boolean(b) => write!(f, "'{b}'"),
            Token::Null => f.write_str("'null'"),
            Token::Identifier(name) => write!(f, "identifier '{name}'"),
            Token::Regex { pattern, flags } => write!(f, "regex /{pattern}/{flags}"),
            Token::Dollar => f.write_str("'$'"),
            Token::At => f.write_str("'@'"),
            Token::Dot => f.write_str("'.'"),
            Token::DotDot => f.write_str("'..'"),
            Token::Star => f.write_str("'*'"),
            Token::Question => f.write_str("'?'"),
            Token::LBracket => f.write_str("'['"),
            Token::RBracket => f.write_str("']'"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::Comma => f.write_str("','"),
            Token::Colon => f.write_str("':'"),
            Token::EqEq => f.write_str("'=='"),
            Token::NotEq => f.write_str("'!='"),
            Token::Lt => f.write_str("'<'"),
            Token::LtEq => f.write_str("'<='"),
            Token::Gt => f.write_str("'>'"),
            Token::GtEq => f.write_str("'>='"),
            Token::Match => f.write_str("'=~'"),
            Token::And => f.write_str("'&&'"),
            Token::Or => f.write_str("'||'"),
            Token::Not => f.write_str("'!'"),
            Token::Plus => f.write_str("'+'"),
            Token::Minus => f.write_str("'-'"),
            Token::Slash => f.write_str("'/'"),
            Token::Percent => f.write_str("'%'"),
            Token::Eof => f.write_str("end of expression"),
        }
    }
}
