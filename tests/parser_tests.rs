// tests/parser_tests.rs

use jpq::ast::{ArithOp, CompareOp, Predicate, Selector, Slice};
use jpq::error::{CompileError, CompileErrorKind};
use jpq::functions::{Builtin, Function, FunctionRegistry};
use jpq::lexer::Lexer;
use jpq::parser::{MAX_NESTING, Parser, parse, parse_with};
use jpq::value::Value;

fn selectors(text: &str) -> Vec<Selector> {
    parse(text).unwrap_or_else(|e| panic!("{text}: {e}"))
}

fn error(text: &str) -> CompileError {
    match parse(text) {
        Ok(chain) => panic!("expected {text} to fail, got {chain:?}"),
        Err(e) => e,
    }
}

fn name(s: &str) -> Selector {
    Selector::Identifier(s.to_string())
}

fn relative(names: &[&str]) -> Predicate {
    Predicate::RelativePath(names.iter().map(|n| name(n)).collect())
}

/// The predicate of a lone `[?(...)]` selector.
fn filter(text: &str) -> Predicate {
    match selectors(text).as_slice() {
        [Selector::Filter(predicate)] => predicate.clone(),
        other => panic!("expected a single filter, got {other:?}"),
    }
}

// ============================================================================
// Paths
// ============================================================================

#[test]
fn test_root_only() {
    assert!(selectors("$").is_empty());
    assert!(selectors("  $  ").is_empty());
}

#[test]
fn test_dot_and_bracket_members() {
    let expected = vec![name("store"), name("book"), Selector::Index(0), name("title")];
    assert_eq!(selectors("$.store.book[0].title"), expected);
    assert_eq!(selectors("$['store'][\"book\"][0]['title']"), expected);
    assert_eq!(selectors("$[store][book].0.title"), expected);
}

#[test]
fn test_keywords_as_member_names() {
    assert_eq!(selectors("$.true.null"), vec![name("true"), name("null")]);
    assert_eq!(selectors("$[false]"), vec![name("false")]);
}

#[test]
fn test_wildcards() {
    assert_eq!(selectors("$.*"), vec![Selector::WildcardMember]);
    assert_eq!(selectors("$[*]"), vec![Selector::WildcardIndex]);
}

#[test]
fn test_recursive_descent() {
    assert_eq!(
        selectors("$..author"),
        vec![Selector::RecursiveDescent, name("author")]
    );
    assert_eq!(
        selectors("$..*"),
        vec![Selector::RecursiveDescent, Selector::WildcardMember]
    );
    assert_eq!(
        selectors("$..[1]"),
        vec![Selector::RecursiveDescent, Selector::Index(1)]
    );
    assert_eq!(selectors("$.."), vec![Selector::RecursiveDescent]);
}

#[test]
fn test_indices_and_slices() {
    assert_eq!(selectors("$[-1]"), vec![Selector::Index(-1)]);
    assert_eq!(
        selectors("$[1:3]"),
        vec![Selector::Slice(Slice::new(Some(1), Some(3), None))]
    );
    assert_eq!(
        selectors("$[-2:]"),
        vec![Selector::Slice(Slice::new(Some(-2), None, None))]
    );
    assert_eq!(
        selectors("$[::-1]"),
        vec![Selector::Slice(Slice::new(None, None, Some(-1)))]
    );
    assert_eq!(selectors("$[:]"), vec![Selector::Slice(Slice::default())]);
}

#[test]
fn test_unions() {
    assert_eq!(
        selectors("$[0, 'a', 1:2]"),
        vec![Selector::Union(vec![
            vec![Selector::Index(0)],
            vec![name("a")],
            vec![Selector::Slice(Slice::new(Some(1), Some(2), None))],
        ])]
    );
    assert_eq!(
        selectors("$[@.a.b, @[0]]"),
        vec![Selector::Union(vec![
            vec![name("a"), name("b")],
            vec![Selector::Index(0)],
        ])]
    );
}

#[test]
fn test_single_relative_path_in_brackets_is_a_union() {
    assert_eq!(
        selectors("$[@.a.b]"),
        vec![Selector::Union(vec![vec![name("a"), name("b")]])]
    );
}

#[test]
fn test_selector_functions() {
    assert_eq!(
        selectors("$.items.length()"),
        vec![
            name("items"),
            Selector::Function {
                function: Function::Builtin(Builtin::Length),
                args: vec![],
            },
        ]
    );
    assert_eq!(
        selectors("$.title.contains('x')"),
        vec![
            name("title"),
            Selector::Function {
                function: Function::Builtin(Builtin::Contains),
                args: vec![Predicate::Literal(Value::from("x"))],
            },
        ]
    );
}

#[test]
fn test_computed_selector() {
    assert_eq!(
        selectors("$[(@.length - 1)]"),
        vec![Selector::Computed(Predicate::Arithmetic {
            op: ArithOp::Subtract,
            left: Box::new(relative(&["length"])),
            right: Box::new(Predicate::Literal(Value::Integer(1))),
        })]
    );
}

// ============================================================================
// Filters
// ============================================================================

#[test]
fn test_filter_comparison() {
    assert_eq!(
        filter("$[?(@.price < 10)]"),
        Predicate::Compare {
            op: CompareOp::LessThan,
            left: Box::new(relative(&["price"])),
            right: Box::new(Predicate::Literal(Value::Integer(10))),
        }
    );
}

#[test]
fn test_filter_without_parentheses() {
    assert_eq!(filter("$[?@.isbn]"), relative(&["isbn"]));
}

#[test]
fn test_filter_references() {
    assert_eq!(filter("$[?(@)]"), Predicate::CurrentNode);
    assert_eq!(filter("$[?($)]"), Predicate::RootNode);
    assert_eq!(
        filter("$[?($.limit)]"),
        Predicate::AbsolutePath(vec![name("limit")])
    );
}

#[test]
fn test_filter_literals() {
    assert_eq!(
        filter("$[?(@.a == 'x')]"),
        Predicate::Compare {
            op: CompareOp::Equal,
            left: Box::new(relative(&["a"])),
            right: Box::new(Predicate::Literal(Value::from("x"))),
        }
    );
    let Predicate::Compare { right, .. } = filter("$[?(@.a != null)]") else {
        panic!("expected comparison");
    };
    assert_eq!(*right, Predicate::Literal(Value::Null));
    let Predicate::Compare { right, .. } = filter("$[?(@.a >= -2.5)]") else {
        panic!("expected comparison");
    };
    assert_eq!(*right, Predicate::Literal(Value::Float(-2.5)));
}

#[test]
fn test_logical_precedence() {
    let Predicate::Or(left, right) = filter("$[?(@.a && @.b || !@.c)]") else {
        panic!("expected Or at the top");
    };
    assert!(matches!(*left, Predicate::And(_, _)));
    assert!(matches!(*right, Predicate::Not(_)));
}

#[test]
fn test_parentheses_group() {
    let Predicate::And(_, right) = filter("$[?(@.a && (@.b || @.c))]") else {
        panic!("expected And at the top");
    };
    assert!(matches!(*right, Predicate::Or(_, _)));
}

#[test]
fn test_regex_filter() {
    let Predicate::Matches { operand, pattern } = filter("$[?(@.name =~ /^a.*z$/i)]") else {
        panic!("expected regex match");
    };
    assert_eq!(*operand, relative(&["name"]));
    assert_eq!(pattern.source(), "^a.*z$");
    assert_eq!(pattern.flags(), "i");
    assert!(pattern.is_match("ABCZ"));
}

#[test]
fn test_regex_then_division() {
    // the regex literal is only read right after `=~`
    let Predicate::And(left, right) = filter("$[?(@.a =~ /x/ && @.b / 2 > 1)]") else {
        panic!("expected And at the top");
    };
    assert!(matches!(*left, Predicate::Matches { .. }));
    assert!(matches!(*right, Predicate::Compare { .. }));
}

#[test]
fn test_function_calls() {
    assert_eq!(
        filter("$[?(starts_with(@.a, 'x'))]"),
        Predicate::FunctionCall {
            function: Function::Builtin(Builtin::StartsWith),
            args: vec![relative(&["a"]), Predicate::Literal(Value::from("x"))],
        }
    );
}

#[test]
fn test_nested_filter() {
    let Predicate::RelativePath(chain) = filter("$[?(@.items[?(@.n > 1)])]") else {
        panic!("expected relative path");
    };
    assert_eq!(chain.len(), 2);
    assert!(matches!(chain[1], Selector::Filter(_)));
}

#[test]
fn test_standalone_predicate() {
    let mut parser = Parser::new(Lexer::new("1 + 2 * 3 == 7")).unwrap();
    let Predicate::Compare { left, .. } = parser.parse_predicate().unwrap() else {
        panic!("expected comparison");
    };
    let Predicate::Arithmetic { op, right, .. } = *left else {
        panic!("expected arithmetic");
    };
    assert_eq!(op, ArithOp::Add);
    assert!(matches!(
        *right,
        Predicate::Arithmetic {
            op: ArithOp::Multiply,
            ..
        }
    ));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_missing_root() {
    let e = error("");
    assert_eq!(e.kind, CompileErrorKind::UnexpectedEnd { expected: "'$'" });
    assert_eq!(e.offset, 0);

    let e = error("store.book");
    assert!(matches!(e.kind, CompileErrorKind::UnexpectedToken { .. }));
    assert_eq!(e.offset, 0);
}

#[test]
fn test_unbalanced_brackets() {
    let e = error("$.a[0");
    assert_eq!(e.kind, CompileErrorKind::UnbalancedBracket('['));
    assert_eq!(e.offset, 3);
    assert_eq!(e.to_string(), "unbalanced '[' at offset 3");

    let e = error("$.a]");
    assert_eq!(e.kind, CompileErrorKind::UnbalancedBracket(']'));
    assert_eq!(e.offset, 3);

    let e = error("$[?(@.a > 1");
    assert_eq!(e.kind, CompileErrorKind::UnbalancedBracket('('));
    assert_eq!(e.offset, 3);
}

#[test]
fn test_mismatched_closing_bracket() {
    let e = error("$[?(@.a > 1]");
    assert!(matches!(e.kind, CompileErrorKind::UnexpectedToken { .. }));
    assert_eq!(e.offset, 11);
}

#[test]
fn test_empty_selectors() {
    let e = error("$.");
    assert_eq!(
        e.kind,
        CompileErrorKind::UnexpectedEnd {
            expected: "member name"
        }
    );
    assert_eq!(e.offset, 2);

    let e = error("$[]");
    assert!(matches!(e.kind, CompileErrorKind::UnexpectedToken { .. }));
    assert_eq!(e.offset, 2);

    let e = error("$[-]");
    assert!(matches!(e.kind, CompileErrorKind::UnexpectedToken { .. }));
    assert_eq!(e.offset, 3);
}

#[test]
fn test_unknown_function() {
    let e = error("$[?(nope(@))]");
    assert_eq!(e.kind, CompileErrorKind::UnknownFunction("nope".to_string()));
    assert_eq!(e.offset, 4);

    let e = error("$.a.nope()");
    assert_eq!(e.kind, CompileErrorKind::UnknownFunction("nope".to_string()));
    assert_eq!(e.offset, 4);
}

#[test]
fn test_function_arity() {
    let e = error("$[?(length(@, 1))]");
    assert_eq!(
        e.kind,
        CompileErrorKind::ArityMismatch {
            name: "length".to_string(),
            expected: 1,
            found: 2,
        }
    );
    assert_eq!(e.offset, 4);

    // the input node counts as the first argument
    let e = error("$.a.contains()");
    assert_eq!(
        e.kind,
        CompileErrorKind::ArityMismatch {
            name: "contains".to_string(),
            expected: 1,
            found: 0,
        }
    );
    assert_eq!(e.offset, 4);
}

#[test]
fn test_zero_slice_step() {
    let e = error("$[::0]");
    assert_eq!(e.kind, CompileErrorKind::ZeroSliceStep);
    assert_eq!(e.offset, 4);
}

#[test]
fn test_invalid_regex() {
    let e = error("$[?(@.a =~ /(/)]");
    assert!(matches!(e.kind, CompileErrorKind::InvalidRegex(_)));
    assert_eq!(e.offset, 11);

    let e = error("$[?(@.a =~ /x/g)]");
    assert!(matches!(e.kind, CompileErrorKind::InvalidRegex(_)));
}

#[test]
fn test_trailing_garbage() {
    let e = error("$.a 'b'");
    assert!(matches!(e.kind, CompileErrorKind::UnexpectedToken { .. }));
    assert_eq!(e.offset, 4);
}

// ============================================================================
// Registered functions
// ============================================================================

fn registry() -> FunctionRegistry {
    let mut functions = FunctionRegistry::new();
    functions
        .register("twice", Some(1), |_| Ok(Value::Null))
        .register("join", None, |_| Ok(Value::Null))
        .register("now", Some(0), |_| Ok(Value::Integer(0)));
    functions
}

fn registered_error(text: &str) -> CompileError {
    match parse_with(text, &registry()) {
        Ok(chain) => panic!("expected {text} to fail, got {chain:?}"),
        Err(e) => e,
    }
}

#[test]
fn test_registered_function_call() {
    let chain = parse_with("$[?(twice(@.a) == 2)]", &registry()).unwrap();
    let [Selector::Filter(Predicate::Compare { left, .. })] = chain.as_slice() else {
        panic!("expected a comparison filter, got {chain:?}");
    };
    let Predicate::FunctionCall { function, args } = left.as_ref() else {
        panic!("expected a call, got {left:?}");
    };
    assert!(matches!(function, Function::Custom(_)));
    assert_eq!(function.name(), "twice");
    assert_eq!(args, &vec![relative(&["a"])]);
}

#[test]
fn test_registered_function_arity() {
    assert!(parse_with("$[?(join(@.a, @.b, 'x'))]", &registry()).is_ok());
    assert!(parse_with("$.a.join()", &registry()).is_ok());
    assert!(parse_with("$.a.twice()", &registry()).is_ok());

    let e = registered_error("$[?(twice())]");
    assert_eq!(
        e.kind,
        CompileErrorKind::ArityMismatch {
            name: "twice".to_string(),
            expected: 1,
            found: 0,
        }
    );
    assert_eq!(e.offset, 4);

    // no room for the input node
    let e = registered_error("$.a.now()");
    assert_eq!(
        e.kind,
        CompileErrorKind::ArityMismatch {
            name: "now".to_string(),
            expected: 0,
            found: 1,
        }
    );
}

#[test]
fn test_builtins_shadow_registered_functions() {
    let mut functions = registry();
    functions.register("length", Some(3), |_| Ok(Value::Null));
    let chain = parse_with("$.a.length()", &functions).unwrap();
    assert_eq!(
        chain[1],
        Selector::Function {
            function: Function::Builtin(Builtin::Length),
            args: vec![],
        }
    );
}

#[test]
fn test_registered_names_are_unknown_without_registry() {
    let e = error("$[?(twice(@))]");
    assert_eq!(e.kind, CompileErrorKind::UnknownFunction("twice".to_string()));
}

// ============================================================================
// Nesting limit
// ============================================================================

fn assert_too_deep(text: &str) {
    let e = error(text);
    assert_eq!(e.kind, CompileErrorKind::NestingTooDeep { limit: MAX_NESTING });
}

#[test]
fn test_deep_nesting_is_rejected() {
    let n = 20_000;
    assert_too_deep(&format!("$[?({}@.a{})]", "(".repeat(n), ")".repeat(n)));
    assert_too_deep(&format!("$[?({}@.a)]", "!".repeat(n)));
    assert_too_deep(&format!("$[?({}1)]", "-".repeat(n)));
    assert_too_deep(&format!("${}{}", "[@".repeat(n), "]".repeat(n)));
    assert_too_deep(&format!("$[?(@.a{})]", " || @.b".repeat(n)));
    assert_too_deep(&format!("$[?(1{})]", " + 1".repeat(n)));
}

#[test]
fn test_moderate_nesting_is_accepted() {
    let text = format!("$[?({}@.a == 1{})]", "(".repeat(20), ")".repeat(20));
    assert!(parse(&text).is_ok());
    assert!(parse(&format!("$[?(@.a{})]", " && @.b".repeat(20))).is_ok());
    assert!(parse(&format!("$[?({}@.a)]", "!".repeat(20))).is_ok());
}
