//! Normalized paths: canonical locations of nodes inside a document.
//!
//! A [`NormalizedPath`] is a flat, owned list of [`PathElement`]s that always
//! starts with [`PathElement::Root`]. Paths are snapshots: they do not borrow
//! the document and stay valid as values after it changes, but they may no
//! longer point at the same node.
//!
//! # Ordering
//!
//! Paths compare element by element. Elements compare by kind first
//! (`Root < Index < Name`), then by index or by name, and a path sorts
//! before any of its extensions. Sorting descending therefore visits later
//! array elements before earlier ones and children before their parents,
//! which is the order removal needs.
//!
//! # Examples
//!
//! ```
//! use jpq::NormalizedPath;
//!
//! let path = NormalizedPath::root().child_name("books").child_index(0);
//! assert_eq!(path.to_string(), "$['books'][0]");
//!
//! let parsed: NormalizedPath = "$.books[0]".parse().unwrap();
//! assert_eq!(parsed, path);
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{CompileError, CompileErrorKind};
use crate::lexer::{is_identifier_char, is_identifier_start, read_quoted};

/// One step of a normalized path.
///
/// Variant order defines the kind order used by [`Ord`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathElement {
    /// The document root (`$`)
    Root,

    /// Array element by position
    Index(usize),

    /// Object member by name
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NormalizedPath {
    elements: Vec<PathElement>,
}

impl NormalizedPath {
    /// The path `$`.
    pub fn root() -> Self {
        NormalizedPath {
            elements: vec![PathElement::Root],
        }
    }

    /// Build a path from the elements below the root.
    pub fn from_elements(elements: impl IntoIterator<Item = PathElement>) -> Self {
        let mut path = NormalizedPath::root();
        path.elements.extend(
            elements
                .into_iter()
                .filter(|e| !matches!(e, PathElement::Root)),
        );
        path
    }

    pub fn child(&self, element: PathElement) -> Self {
        let mut elements = Vec::with_capacity(self.elements.len() + 1);
        elements.extend_from_slice(&self.elements);
        elements.push(element);
        NormalizedPath { elements }
    }

    pub fn child_name(&self, name: impl Into<String>) -> Self {
        self.child(PathElement::Name(name.into()))
    }

    pub fn child_index(&self, index: usize) -> Self {
        self.child(PathElement::Index(index))
    }

    pub fn push(&mut self, element: PathElement) {
        self.elements.push(element);
    }

    /// All elements, starting with `Root`.
    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    /// Elements below the root.
    pub fn steps(&self) -> &[PathElement] {
        &self.elements[1..]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathElement> {
        self.elements.iter()
    }

    /// Number of elements, counting the root.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_root(&self) -> bool {
        self.elements.len() == 1
    }

    pub fn last(&self) -> &PathElement {
        // never empty: constructors always start with Root
        &self.elements[self.elements.len() - 1]
    }

    pub fn parent(&self) -> Option<NormalizedPath> {
        if self.is_root() {
            return None;
        }
        Some(NormalizedPath {
            elements: self.elements[..self.elements.len() - 1].to_vec(),
        })
    }

    /// Parse canonical bracket notation (`$['a'][0]`) or the dot shorthand
    /// (`$.a[0]`).
    pub fn parse(text: &str) -> Result<Self, CompileError> {
        PathParser::new(text).parse()
    }
}

impl<'a> IntoIterator for &'a NormalizedPath {
    type Item = &'a PathElement;
    type IntoIter = std::slice::Iter<'a, PathElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl FromStr for NormalizedPath {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NormalizedPath::parse(s)
    }
}

impl fmt::Display for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathElement::Root => f.write_str("$"),
            PathElement::Index(i) => write!(f, "[{i}]"),
            PathElement::Name(name) => {
                f.write_str("['")?;
                write_escaped(f, name)?;
                f.write_str("']")
            }
        }
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for element in &self.elements {
            write!(f, "{element}")?;
        }
        Ok(())
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    for c in name.chars() {
        match c {
            '\'' => f.write_str("\\'")?,
            '\\' => f.write_str("\\\\")?,
            '\u{8}' => f.write_str("\\b")?,
            '\u{c}' => f.write_str("\\f")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if (c as u32) < 0x20 => write!(f, "\\u{:04x}", c as u32)?,
            c => write!(f, "{c}")?,
        }
    }
    Ok(())
}

struct PathParser {
    input: Vec<char>,
    position: usize,
}

impl PathParser {
    fn new(text: &str) -> Self {
        PathParser {
            input: text.chars().collect(),
            position: 0,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn error(&self, kind: CompileErrorKind) -> CompileError {
        CompileError::new(kind, self.position)
    }

    fn unexpected(&self, expected: &'static str) -> CompileError {
        match self.current_char() {
            Some(c) => self.error(CompileErrorKind::UnexpectedToken {
                found: format!("'{c}'"),
                expected,
            }),
            None => self.error(CompileErrorKind::UnexpectedEnd { expected }),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.current_char().is_some_and(char::is_whitespace) {
            self.position += 1;
        }
    }

    fn parse(mut self) -> Result<NormalizedPath, CompileError> {
        if self.current_char() != Some('$') {
            return Err(self.unexpected("'$'"));
        }
        self.position += 1;

        let mut path = NormalizedPath::root();
        while let Some(c) = self.current_char() {
            match c {
                '.' => {
                    self.position += 1;
                    path.push(PathElement::Name(self.read_name()?));
                }
                '[' => {
                    self.position += 1;
                    self.skip_whitespace();
                    let element = match self.current_char() {
                        Some(q @ ('\'' | '"')) => {
                            let (name, next) = read_quoted(&self.input, self.position, q)?;
                            self.position = next;
                            PathElement::Name(name)
                        }
                        Some(d) if d.is_ascii_digit() => PathElement::Index(self.read_index()?),
                        _ => return Err(self.unexpected("name or index")),
                    };
                    self.skip_whitespace();
                    if self.current_char() != Some(']') {
                        return Err(match self.current_char() {
                            None => self.error(CompileErrorKind::UnbalancedBracket('[')),
                            Some(_) => self.unexpected("']'"),
                        });
                    }
                    self.position += 1;
                    path.push(element);
                }
                _ => return Err(self.unexpected("'.' or '['")),
            }
        }
        Ok(path)
    }

    fn read_name(&mut self) -> Result<String, CompileError> {
        if !self.current_char().is_some_and(is_identifier_start) {
            return Err(self.unexpected("member name"));
        }
        let mut name = String::new();
        while let Some(c) = self.current_char().filter(|c| is_identifier_char(*c)) {
            name.push(c);
            self.position += 1;
        }
        Ok(name)
    }

    fn read_index(&mut self) -> Result<usize, CompileError> {
        let start = self.position;
        let mut digits = String::new();
        while let Some(c) = self.current_char().filter(char::is_ascii_digit) {
            digits.push(c);
            self.position += 1;
        }
        digits
            .parse::<usize>()
            .map_err(|_| CompileError::new(CompileErrorKind::InvalidNumber(digits.clone()), start))
    }
}
