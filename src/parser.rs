use crate::{
    ast::{ArithOp, CompareOp, Predicate, RegexPattern, Selector, Slice, Token},
    error::{CompileError, CompileErrorKind},
    functions::{Function, FunctionRegistry},
    lexer::Lexer,
    value::Value,
};
use log::trace;
use regex::RegexBuilder;
use std::mem;

/// Deepest nesting of brackets, parentheses, unary operators and chained
/// binary operators an expression may have.
pub const MAX_NESTING: usize = 64;

pub struct Parser {
    lexer: Lexer,
    current_token: Token,
    current_offset: usize,
    functions: FunctionRegistry,
    depth: usize,
}

/// Compile expression text into its selector chain.
pub fn parse(text: &str) -> Result<Vec<Selector>, CompileError> {
    Parser::new(Lexer::new(text))?.parse_path()
}

/// Like [`parse`], also resolving the functions in `functions`.
pub fn parse_with(text: &str, functions: &FunctionRegistry) -> Result<Vec<Selector>, CompileError> {
    Parser::new(Lexer::new(text))?
        .with_functions(functions)
        .parse_path()
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, CompileError> {
        let (current_token, current_offset) = lexer.next_spanned()?;
        Ok(Parser {
            lexer,
            current_token,
            current_offset,
            functions: FunctionRegistry::default(),
            depth: 0,
        })
    }

    pub fn with_functions(mut self, functions: &FunctionRegistry) -> Self {
        self.functions = functions.clone();
        self
    }

    fn enter(&mut self) -> Result<(), CompileError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error(CompileErrorKind::NestingTooDeep { limit: MAX_NESTING }));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self, levels: usize) {
        self.depth = self.depth.saturating_sub(levels);
    }

    fn resolve(&self, name: &str, offset: usize) -> Result<Function, CompileError> {
        self.functions.resolve(name).ok_or_else(|| {
            CompileError::new(CompileErrorKind::UnknownFunction(name.to_string()), offset)
        })
    }

    fn advance(&mut self) -> Result<(), CompileError> {
        let (token, offset) = self.lexer.next_spanned()?;
        self.current_token = token;
        self.current_offset = offset;
        Ok(())
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current_token) == mem::discriminant(token)
    }

    fn error(&self, kind: CompileErrorKind) -> CompileError {
        CompileError::new(kind, self.current_offset)
    }

    fn unexpected(&self, expected: &'static str) -> CompileError {
        match &self.current_token {
            Token::Eof => self.error(CompileErrorKind::UnexpectedEnd { expected }),
            token => self.error(CompileErrorKind::UnexpectedToken {
                found: token.to_string(),
                expected,
            }),
        }
    }

    fn expect(&mut self, expected: Token, description: &'static str) -> Result<(), CompileError> {
        if !self.check(&expected) {
            return Err(self.unexpected(description));
        }
        self.advance()
    }

    /// Consume a closing `)` or `]`. Running out of input reports the opening
    /// bracket instead of the end of input.
    fn expect_closing(
        &mut self,
        close: Token,
        open: char,
        open_offset: usize,
    ) -> Result<(), CompileError> {
        if self.check(&Token::Eof) {
            return Err(CompileError::new(
                CompileErrorKind::UnbalancedBracket(open),
                open_offset,
            ));
        }
        let description = if close == Token::RParen { "')'" } else { "']'" };
        self.expect(close, description)
    }

    /// Parse a complete expression: `$` followed by segments, then end of
    /// input.
    pub fn parse_path(&mut self) -> Result<Vec<Selector>, CompileError> {
        self.expect(Token::Dollar, "'$'")?;
        let selectors = self.parse_segments()?;

        match &self.current_token {
            Token::Eof => {}
            Token::RBracket => return Err(self.error(CompileErrorKind::UnbalancedBracket(']'))),
            Token::RParen => return Err(self.error(CompileErrorKind::UnbalancedBracket(')'))),
            _ => return Err(self.unexpected("'.', '..', '[' or end of expression")),
        }

        trace!("parsed {} selector(s)", selectors.len());
        Ok(selectors)
    }

    /// Parse a standalone filter predicate, then end of input.
    pub fn parse_predicate(&mut self) -> Result<Predicate, CompileError> {
        let predicate = self.parse_or()?;
        self.expect(Token::Eof, "end of expression")?;
        Ok(predicate)
    }

    /// Segments after `$` or `@`, until a token that cannot continue a path.
    fn parse_segments(&mut self) -> Result<Vec<Selector>, CompileError> {
        let mut chain = Vec::new();

        loop {
            match &self.current_token {
                Token::Dot => {
                    self.advance()?;
                    chain.push(self.parse_dot_member()?);
                }
                Token::DotDot => {
                    self.advance()?;
                    chain.push(Selector::RecursiveDescent);

                    // `..name` and `..*` apply to every visited node; `..[`
                    // is picked up by the next iteration
                    if self.check(&Token::Star) {
                        self.advance()?;
                        chain.push(Selector::WildcardMember);
                    } else if let Some(name) = member_name(&self.current_token) {
                        self.advance()?;
                        chain.push(Selector::Identifier(name));
                    }
                }
                Token::LBracket => chain.push(self.parse_bracket()?),
                _ => return Ok(chain),
            }
        }
    }

    fn parse_dot_member(&mut self) -> Result<Selector, CompileError> {
        let offset = self.current_offset;

        match &self.current_token {
            Token::Star => {
                self.advance()?;
                Ok(Selector::WildcardMember)
            }
            // `.2` is shorthand for `[2]`
            Token::Integer(n) => {
                let index = *n;
                self.advance()?;
                Ok(Selector::Index(index))
            }
            token => {
                let Some(name) = member_name(token) else {
                    return Err(self.unexpected("member name"));
                };
                self.advance()?;
                if self.check(&Token::LParen) {
                    return self.parse_selector_function(name, offset);
                }
                Ok(Selector::Identifier(name))
            }
        }
    }

    /// `.name(args)`: the input node is the implicit first argument.
    fn parse_selector_function(
        &mut self,
        name: String,
        offset: usize,
    ) -> Result<Selector, CompileError> {
        let function = self.resolve(&name, offset)?;

        let open = self.current_offset;
        self.advance()?; // '('
        let args = self.parse_arguments(open)?;

        if let Some(arity) = function.arity()
            && args.len() + 1 != arity
        {
            // a nullary function has no room for the input node
            let (expected, found) = match arity.checked_sub(1) {
                Some(expected) => (expected, args.len()),
                None => (0, args.len() + 1),
            };
            return Err(CompileError::new(
                CompileErrorKind::ArityMismatch {
                    name,
                    expected,
                    found,
                },
                offset,
            ));
        }

        Ok(Selector::Function { function, args })
    }

    fn parse_bracket(&mut self) -> Result<Selector, CompileError> {
        self.enter()?;
        let open = self.current_offset;
        self.advance()?; // '['

        let mut items = vec![self.parse_bracket_item()?];
        while self.check(&Token::Comma) {
            self.advance()?;
            items.push(self.parse_bracket_item()?);
        }
        self.expect_closing(Token::RBracket, '[', open)?;
        self.leave(1);

        if items.len() == 1 && items[0].len() == 1 {
            if let Some(selector) = items.pop().and_then(|mut chain| chain.pop()) {
                return Ok(selector);
            }
        }
        Ok(Selector::Union(items))
    }

    /// One comma-separated item inside brackets, as a selector chain.
    fn parse_bracket_item(&mut self) -> Result<Vec<Selector>, CompileError> {
        match &self.current_token {
            Token::String(name) => {
                let name = name.clone();
                self.advance()?;
                Ok(vec![Selector::Identifier(name)])
            }
            Token::Star => {
                self.advance()?;
                Ok(vec![Selector::WildcardIndex])
            }
            Token::Question => {
                self.advance()?;
                Ok(vec![Selector::Filter(self.parse_or()?)])
            }
            Token::LParen => {
                let open = self.current_offset;
                self.advance()?;
                let predicate = self.parse_or()?;
                self.expect_closing(Token::RParen, '(', open)?;
                Ok(vec![Selector::Computed(predicate)])
            }
            Token::At => {
                self.advance()?;
                self.parse_segments()
            }
            Token::Integer(_) | Token::Minus | Token::Colon => {
                Ok(vec![self.parse_index_or_slice()?])
            }
            token => match member_name(token) {
                Some(name) => {
                    self.advance()?;
                    Ok(vec![Selector::Identifier(name)])
                }
                None => Err(self.unexpected("selector")),
            },
        }
    }

    fn parse_index_or_slice(&mut self) -> Result<Selector, CompileError> {
        let start = self.parse_signed()?;
        if !self.check(&Token::Colon) {
            return match start {
                Some(index) => Ok(Selector::Index(index)),
                None => Err(self.unexpected("index")),
            };
        }
        self.advance()?;

        let end = self.parse_signed()?;
        let mut step = None;
        if self.check(&Token::Colon) {
            self.advance()?;
            let step_offset = self.current_offset;
            step = self.parse_signed()?;
            if step == Some(0) {
                return Err(CompileError::new(
                    CompileErrorKind::ZeroSliceStep,
                    step_offset,
                ));
            }
        }

        Ok(Selector::Slice(Slice::new(start, end, step)))
    }

    fn parse_signed(&mut self) -> Result<Option<i64>, CompileError> {
        let negative = self.check(&Token::Minus);
        if negative {
            self.advance()?;
        }
        match self.current_token {
            Token::Integer(n) => {
                self.advance()?;
                Ok(Some(if negative { -n } else { n }))
            }
            _ if negative => Err(self.unexpected("integer")),
            _ => Ok(None),
        }
    }

    /// Comma-separated predicates up to the closing `)`.
    fn parse_arguments(&mut self, open: usize) -> Result<Vec<Predicate>, CompileError> {
        let mut args = vec![];

        if !self.check(&Token::RParen) && !self.check(&Token::Eof) {
            args.push(self.parse_or()?);
            while self.check(&Token::Comma) {
                self.advance()?;
                args.push(self.parse_or()?);
            }
        }

        self.expect_closing(Token::RParen, '(', open)?;
        Ok(args)
    }

    /// Parse primary expressions (atoms): literals, `@` and `$` paths,
    /// parenthesized predicates and function calls
    fn parse_primary(&mut self) -> Result<Predicate, CompileError> {
        let offset = self.current_offset;

        match mem::replace(&mut self.current_token, Token::Eof) {
            // Literals
            Token::Float(n) => {
                self.advance()?;
                Ok(Predicate::Literal(Value::Float(n)))
            }
            Token::Integer(n) => {
                self.advance()?;
                Ok(Predicate::Literal(Value::Integer(n)))
            }
            Token::String(s) => {
                self.advance()?;
                Ok(Predicate::Literal(Value::String(s)))
            }
            Token::Boolean(b) => {
                self.advance()?;
                Ok(Predicate::Literal(Value::Boolean(b)))
            }
            Token::Null => {
                self.advance()?;
                Ok(Predicate::Literal(Value::Null))
            }

            // References
            Token::At => {
                self.advance()?;
                let chain = self.parse_segments()?;
                Ok(if chain.is_empty() {
                    Predicate::CurrentNode
                } else {
                    Predicate::RelativePath(chain)
                })
            }
            Token::Dollar => {
                self.advance()?;
                let chain = self.parse_segments()?;
                Ok(if chain.is_empty() {
                    Predicate::RootNode
                } else {
                    Predicate::AbsolutePath(chain)
                })
            }

            Token::LParen => {
                self.advance()?;
                let predicate = self.parse_or()?;
                self.expect_closing(Token::RParen, '(', offset)?;
                Ok(predicate)
            }

            Token::Identifier(name) => {
                self.advance()?;
                self.parse_function_call(name, offset)
            }

            token => {
                self.current_token = token;
                Err(self.unexpected("operand"))
            }
        }
    }

    fn parse_function_call(&mut self, name: String, offset: usize) -> Result<Predicate, CompileError> {
        let function = self.resolve(&name, offset)?;

        let open = self.current_offset;
        self.expect(Token::LParen, "'(' after function name")?;
        let args = self.parse_arguments(open)?;

        if let Some(expected) = function.arity()
            && args.len() != expected
        {
            return Err(CompileError::new(
                CompileErrorKind::ArityMismatch {
                    name,
                    expected,
                    found: args.len(),
                },
                offset,
            ));
        }

        Ok(Predicate::FunctionCall { function, args })
    }

    fn parse_unary(&mut self) -> Result<Predicate, CompileError> {
        match self.current_token {
            Token::Not => {
                self.enter()?;
                self.advance()?;
                let operand = self.parse_unary()?;
                self.leave(1);
                Ok(Predicate::Not(Box::new(operand)))
            }
            Token::Minus => {
                self.enter()?;
                self.advance()?;
                let operand = self.parse_unary()?;
                self.leave(1);
                // fold negative literals
                Ok(match operand {
                    Predicate::Literal(Value::Integer(n)) => Predicate::Literal(Value::Integer(-n)),
                    Predicate::Literal(Value::Float(n)) => Predicate::Literal(Value::Float(-n)),
                    operand => Predicate::Negate(Box::new(operand)),
                })
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Predicate, CompileError> {
        let mut left = self.parse_unary()?;
        let mut chained = 0;

        loop {
            let op = match &self.current_token {
                Token::Star => ArithOp::Multiply,
                Token::Slash => ArithOp::Divide,
                Token::Percent => ArithOp::Modulo,
                _ => break,
            };

            self.enter()?;
            chained += 1;
            self.advance()?;
            let right = self.parse_unary()?;

            left = Predicate::Arithmetic {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.leave(chained);
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Predicate, CompileError> {
        let mut left = self.parse_multiplicative()?;
        let mut chained = 0;

        loop {
            let op = match &self.current_token {
                Token::Plus => ArithOp::Add,
                Token::Minus => ArithOp::Subtract,
                _ => break,
            };

            self.enter()?;
            chained += 1;
            self.advance()?;
            let right = self.parse_multiplicative()?;

            left = Predicate::Arithmetic {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.leave(chained);
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Predicate, CompileError> {
        let left = self.parse_additive()?;

        if self.check(&Token::Match) {
            // the lexer cannot tell a regex from division on its own
            let (token, offset) = self.lexer.next_regex()?;
            let pattern = match token {
                Token::Regex { pattern, flags } => compile_regex(pattern, flags, offset)?,
                other => {
                    return Err(CompileError::new(
                        CompileErrorKind::UnexpectedToken {
                            found: other.to_string(),
                            expected: "regular expression",
                        },
                        offset,
                    ));
                }
            };
            self.advance()?;

            return Ok(Predicate::Matches {
                operand: Box::new(left),
                pattern,
            });
        }

        let op = match &self.current_token {
            Token::EqEq => CompareOp::Equal,
            Token::NotEq => CompareOp::NotEqual,
            Token::Lt => CompareOp::LessThan,
            Token::Gt => CompareOp::GreaterThan,
            Token::LtEq => CompareOp::LessEqual,
            Token::GtEq => CompareOp::GreaterEqual,
            _ => return Ok(left),
        };

        self.advance()?;
        let right = self.parse_additive()?;

        Ok(Predicate::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_and(&mut self) -> Result<Predicate, CompileError> {
        let mut left = self.parse_comparison()?;
        let mut chained = 0;

        while self.check(&Token::And) {
            self.enter()?;
            chained += 1;
            self.advance()?;
            let right = self.parse_comparison()?;
            left = Predicate::And(Box::new(left), Box::new(right));
        }
        self.leave(chained);
        Ok(left)
    }

    /// Entry point for every nested predicate, so each one counts as a
    /// level.
    fn parse_or(&mut self) -> Result<Predicate, CompileError> {
        self.enter()?;
        let mut left = self.parse_and()?;
        let mut chained = 0;

        while self.check(&Token::Or) {
            self.enter()?;
            chained += 1;
            self.advance()?;
            let right = self.parse_and()?;
            left = Predicate::Or(Box::new(left), Box::new(right));
        }
        self.leave(chained + 1);
        Ok(left)
    }
}

/// Tokens usable as a member name: identifiers, plus the keywords
/// `true`, `false` and `null`.
fn member_name(token: &Token) -> Option<String> {
    match token {
        Token::Identifier(name) => Some(name.clone()),
        Token::Boolean(b) => Some(b.to_string()),
        Token::Null => Some("null".to_string()),
        _ => None,
    }
}

fn compile_regex(pattern: String, flags: String, offset: usize) -> Result<RegexPattern, CompileError> {
    let invalid = |message: String| CompileError::new(CompileErrorKind::InvalidRegex(message), offset);

    let mut builder = RegexBuilder::new(&pattern);
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            other => return Err(invalid(format!("unsupported flag '{other}'"))),
        };
    }

    let regex = builder.build().map_err(|e| invalid(e.to_string()))?;
    Ok(RegexPattern::new(pattern, flags, regex))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn predicate(text: &str) -> Predicate {
        Parser::new(Lexer::new(text))
            .and_then(|mut p| p.parse_predicate())
            .unwrap()
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let parsed = predicate("@.a || @.b && @.c");
        let Predicate::Or(_, right) = parsed else {
            panic!("expected Or at the top, got {parsed:?}");
        };
        assert!(matches!(*right, Predicate::And(_, _)));
    }

    #[test]
    fn arithmetic_precedence() {
        let parsed = predicate("1 + 2 * 3");
        let Predicate::Arithmetic { op, right, .. } = parsed else {
            panic!("expected arithmetic");
        };
        assert_eq!(op, ArithOp::Add);
        assert!(matches!(*right, Predicate::Arithmetic { op: ArithOp::Multiply, .. }));
    }

    #[test]
    fn negative_literals_fold() {
        assert_eq!(predicate("-3"), Predicate::Literal(Value::Integer(-3)));
        assert_eq!(predicate("-(1)"), Predicate::Literal(Value::Integer(-1)));
        assert!(matches!(predicate("-@.a"), Predicate::Negate(_)));
    }

    #[test]
    fn regex_flags_are_checked() {
        let err = Parser::new(Lexer::new("@ =~ /a/x"))
            .and_then(|mut p| p.parse_predicate())
            .unwrap_err();
        assert!(matches!(err.kind, CompileErrorKind::InvalidRegex(_)));
        assert_eq!(err.offset, 5);
    }
}
