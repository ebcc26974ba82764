use std::fmt;

use super::predicates::Predicate;
use crate::functions::Function;
use crate::path::PathElement;

/// One stage of a compiled path. Each selector maps a node list to a new
/// node list.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Member by name: `.name`, `['name']`
    ///
    /// Also yields the length of an array that has no such member when the
    /// name is `length`.
    Identifier(String),

    /// `.*`
    WildcardMember,

    /// `[*]`
    WildcardIndex,

    /// Array element, negative counts from the end: `[0]`, `[-1]`, `.2`
    Index(i64),

    /// `[start:end:step]`
    Slice(Slice),

    /// `..`: the input node and all of its descendants
    RecursiveDescent,

    /// `[a,b,...]`: every member is a selector chain applied to the same
    /// input node, results concatenated in listed order
    Union(Vec<Vec<Selector>>),

    /// `[?(predicate)]`: children of the input node for which the predicate
    /// holds
    Filter(Predicate),

    /// `.name(args)`: a function applied to the input node
    Function { function: Function, args: Vec<Predicate> },

    /// `[(predicate)]`: an index or name computed per input node
    Computed(Predicate),
}

/// Python-style slice bounds. The parser rejects a zero step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Slice {
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub step: Option<i64>,
}

impl Slice {
    pub fn new(start: Option<i64>, end: Option<i64>, step: Option<i64>) -> Self {
        Slice { start, end, step }
    }

    /// Positions selected from an array of `len` elements, in selection
    /// order.
    ///
    /// ```
    /// use jpq::ast::Slice;
    ///
    /// assert_eq!(Slice::new(Some(1), None, None).indices(4), vec![1, 2, 3]);
    /// assert_eq!(Slice::new(None, None, Some(-2)).indices(5), vec![4, 2, 0]);
    /// ```
    pub fn indices(&self, len: usize) -> Vec<usize> {
        let len = len as i64;
        let step = self.step.unwrap_or(1);
        if step == 0 || len == 0 {
            return Vec::new();
        }

        let normalize = |bound: i64| if bound < 0 { bound + len } else { bound };

        if step > 0 {
            let start = self.start.map(normalize).unwrap_or(0).clamp(0, len);
            let end = self.end.map(normalize).unwrap_or(len).clamp(0, len);
            (start..end)
                .step_by(step as usize)
                .map(|i| i as usize)
                .collect()
        } else {
            let start = self.start.map(normalize).unwrap_or(len - 1).clamp(-1, len - 1);
            let end = self.end.map(normalize).unwrap_or(-1).clamp(-1, len - 1);
            let mut out = Vec::new();
            let mut i = start;
            while i > end {
                out.push(i as usize);
                i += step;
            }
            out
        }
    }
}

impl Selector {
    /// The single path step this selector stands for, if it is a plain
    /// non-negative index or a name.
    pub fn as_path_element(&self) -> Option<PathElement> {
        match self {
            Selector::Identifier(name) => Some(PathElement::Name(name.clone())),
            Selector::Index(i) if *i >= 0 => Some(PathElement::Index(*i as usize)),
            _ => None,
        }
    }

    /// Write the selector as it appears between `[` and `]`, when it has such
    /// a form.
    fn fmt_bracket_item(&self, f: &mut fmt::Formatter<'_>) -> Option<fmt::Result> {
        Some(match self {
            Selector::Identifier(name) => write_quoted(f, name),
            Selector::WildcardMember | Selector::WildcardIndex => f.write_str("*"),
            Selector::Index(i) => write!(f, "{i}"),
            Selector::Slice(slice) => write!(f, "{slice}"),
            Selector::Filter(predicate) => write!(f, "?({predicate})"),
            Selector::Computed(predicate) => write!(f, "({predicate})"),
            _ => return None,
        })
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    f.write_str("'")?;
    for c in text.chars() {
        match c {
            '\'' => f.write_str("\\'")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("'")
}

/// Write a selector chain the way it would be typed after `$` or `@`.
pub fn fmt_chain(f: &mut fmt::Formatter<'_>, chain: &[Selector]) -> fmt::Result {
    for selector in chain {
        write!(f, "{selector}")?;
    }
    Ok(())
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(start) = self.start {
            write!(f, "{start}")?;
        }
        f.write_str(":")?;
        if let Some(end) = self.end {
            write!(f, "{end}")?;
        }
        if let Some(step) = self.step {
            write!(f, ":{step}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::WildcardMember => f.write_str(".*"),
            Selector::RecursiveDescent => f.write_str(".."),
            Selector::Function { function, args } => {
                write!(f, ".{}(", function.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Selector::Union(members) => {
                f.write_str("[")?;
                for (i, chain) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    let simple = match chain.as_slice() {
                        [single] => single.fmt_bracket_item(f),
                        _ => None,
                    };
                    match simple {
                        Some(result) => result?,
                        None => {
                            f.write_str("@")?;
                            fmt_chain(f, chain)?;
                        }
                    }
                }
                f.write_str("]")
            }
            other => {
                f.write_str("[")?;
                if let Some(result) = other.fmt_bracket_item(f) {
                    result?;
                }
                f.write_str("]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_slices() {
        assert_eq!(Slice::new(None, Some(2), None).indices(4), vec![0, 1]);
        assert_eq!(Slice::new(Some(-2), None, None).indices(4), vec![2, 3]);
        assert_eq!(Slice::new(Some(0), Some(10), Some(3)).indices(7), vec![0, 3, 6]);
        assert!(Slice::new(Some(3), Some(1), None).indices(4).is_empty());
    }

    #[test]
    fn backward_slices() {
        assert_eq!(Slice::new(None, None, Some(-1)).indices(3), vec![2, 1, 0]);
        assert_eq!(Slice::new(Some(2), Some(0), Some(-1)).indices(4), vec![2, 1]);
        assert_eq!(Slice::new(Some(-1), Some(-3), Some(-1)).indices(4), vec![3, 2]);
        assert_eq!(Slice::new(Some(10), None, Some(-4)).indices(5), vec![4, 0]);
    }

    #[test]
    fn out_of_range_bounds_clamp() {
        assert_eq!(Slice::new(Some(-10), Some(10), None).indices(2), vec![0, 1]);
        assert!(Slice::default().indices(0).is_empty());
    }

    #[test]
    fn display_uses_bracket_forms() {
        assert_eq!(Selector::Identifier("a'b".into()).to_string(), r"['a\'b']");
        assert_eq!(Selector::Index(-1).to_string(), "[-1]");
        assert_eq!(
            Selector::Slice(Slice::new(Some(1), None, Some(2))).to_string(),
            "[1::2]"
        );
        let union = Selector::Union(vec![
            vec![Selector::Index(0)],
            vec![Selector::Identifier("a".into()), Selector::Identifier("b".into())],
        ]);
        assert_eq!(union.to_string(), "[0,@['a']['b']]");
    }
}
