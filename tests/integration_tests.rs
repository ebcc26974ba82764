use jpq::{
    CompiledExpression, EvalError, EvalErrorKind, EvalOptions, FunctionRegistry, NormalizedPath,
    Operand, Output, ResultOptions, Value, assemble, mutation, query,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn doc(text: &str) -> Value {
    Value::parse(text).unwrap()
}

fn values(expr: &str, document: &Value) -> Vec<Value> {
    CompiledExpression::compile(expr)
        .unwrap()
        .select_values(document)
        .unwrap()
}

fn paths(expr: &str, document: &Value) -> Vec<String> {
    CompiledExpression::compile(expr)
        .unwrap()
        .select_paths(document)
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn json(values: &[Value]) -> String {
    Value::Array(values.to_vec()).to_string()
}

// ============================================================================
// End-to-end scenarios
// ============================================================================

#[test]
fn test_filter_then_member() {
    let d = doc(r#"{"books":[{"category":"fiction","price":10},{"category":"ref"}]}"#);
    let out = values("$.books[?(@.category=='fiction')].price", &d);
    assert_eq!(json(&out), "[10]");
}

#[test]
fn test_recursive_descent_values_and_paths() {
    let d = doc(r#"{"a":{"b":{"c":1}}}"#);
    assert_eq!(json(&values("$..c", &d)), "[1]");
    assert_eq!(paths("$..c", &d), vec!["$['a']['b']['c']"]);
}

#[test]
fn test_slice() {
    let d = doc(r#"{"arr":[1,2,3,4,5]}"#);
    assert_eq!(json(&values("$.arr[1:4]", &d)), "[2,3,4]");
}

#[test]
fn test_remove_two_indices() {
    let mut d = doc(r#"{"a":[1,2,3]}"#);
    let targets = [
        NormalizedPath::parse("$['a'][0]").unwrap(),
        NormalizedPath::parse("$['a'][2]").unwrap(),
    ];
    assert_eq!(mutation::remove(&mut d, &targets), 2);
    assert_eq!(d.to_string(), r#"{"a":[2]}"#);
}

#[test]
fn test_replace_creates_path() {
    let mut d = doc("{}");
    let path = NormalizedPath::parse("$.x.y").unwrap();
    let (slot, ok) = mutation::replace(&mut d, &path, Value::from("v"), true);
    assert!(ok);
    assert_eq!(slot.map(|v| v.clone()), Some(Value::from("v")));
    assert_eq!(d.to_string(), r#"{"x":{"y":"v"}}"#);
}

#[test]
fn test_missing_path_is_empty_not_error() {
    let d = doc(r#"{"a":1}"#);
    let result = query(&d, "$.nonexistent", &ResultOptions::values()).unwrap();
    assert!(result.is_empty());
    assert_eq!(result, Output::Values(vec![]));
}

// ============================================================================
// Properties
// ============================================================================

const STORE: &str = r#"{
  "store": {
    "book": [
      {"category": "reference", "author": "Nigel Rees", "title": "Sayings of the Century", "price": 8.95},
      {"category": "fiction", "author": "Evelyn Waugh", "title": "Sword of Honour", "price": 12.99},
      {"category": "fiction", "author": "Herman Melville", "title": "Moby Dick", "isbn": "0-553-21311-3", "price": 8.99},
      {"category": "fiction", "author": "J. R. R. Tolkien", "title": "The Lord of the Rings", "isbn": "0-395-19395-8", "price": 22.99}
    ],
    "bicycle": {"color": "red", "price": 19.95}
  }
}"#;

const EXPRESSIONS: &[&str] = &[
    "$",
    "$.store.book[*].author",
    "$..author",
    "$.store.*",
    "$.store..price",
    "$..book[2]",
    "$..book[-1:]",
    "$..book[0,1]",
    "$..book[:2]",
    "$..book[?(@.isbn)]",
    "$..book[?(@.price < 10)]",
    "$..*",
    "$.store.book[?(@.price > 8.98 && @.category == 'fiction')].title",
    "$..book[0,0,1]",
];

#[test]
fn test_path_value_consistency() {
    let d = doc(STORE);
    for text in EXPRESSIONS {
        let expr = CompiledExpression::compile(text).unwrap();
        let nodes = expr.evaluate(&d).unwrap();
        let out = assemble(nodes.clone(), &ResultOptions::pairs());
        let Output::Pairs(pairs) = out else {
            panic!("expected pairs for {text}");
        };
        for (path, value) in pairs {
            let path = path.expect("document nodes have paths");
            assert_eq!(mutation::get(&d, &path), Some(&value), "{text} at {path}");
        }

        let from_paths: Vec<Value> = nodes
            .paths()
            .into_iter()
            .filter_map(|p| mutation::get(&d, p).cloned())
            .collect();
        assert_eq!(from_paths, expr.select_values(&d).unwrap(), "{text}");
    }
}

#[test]
fn test_dedup_is_idempotent() {
    let d = doc(STORE);
    for text in EXPRESSIONS {
        let nodes = CompiledExpression::compile(text).unwrap().evaluate(&d).unwrap();
        let once = jpq::result::arrange(nodes, &ResultOptions::paths().with_dedup());
        let twice = jpq::result::arrange(once.clone(), &ResultOptions::paths().with_dedup());
        assert_eq!(once, twice, "{text}");
    }
}

#[test]
fn test_sort_and_reverse_sort() {
    let d = doc(STORE);
    for text in EXPRESSIONS {
        let expr = CompiledExpression::compile(text).unwrap();
        let ascending = expr
            .select(&d, &ResultOptions::paths().with_sort())
            .unwrap()
            .into_paths()
            .unwrap();
        assert!(ascending.windows(2).all(|w| w[0] <= w[1]), "{text}");

        let mut descending = expr
            .select(&d, &ResultOptions::paths().with_sort_descending())
            .unwrap()
            .into_paths()
            .unwrap();
        descending.reverse();
        assert_eq!(ascending, descending, "{text}");
    }
}

#[test]
fn test_removal_leaves_contiguous_elements() {
    let mut d = doc(STORE);
    let cheap = CompiledExpression::compile("$.store.book[?(@.price < 10)]").unwrap();
    assert_eq!(cheap.remove(&mut d).unwrap(), 2);

    let titles = values("$.store.book[*].title", &d);
    assert_eq!(json(&titles), r#"["Sword of Honour","The Lord of the Rings"]"#);
    assert_eq!(
        paths("$.store.book[*]", &d),
        vec!["$['store']['book'][0]", "$['store']['book'][1]"]
    );
}

#[test]
fn test_path_round_trip() {
    let d = doc(r#"{"it's": {"a\\b": [0, {"\n": 1}]}, "plain": [[1]]}"#);
    let expr = CompiledExpression::compile("$..*").unwrap();
    for path in expr.select_paths(&d).unwrap() {
        let text = path.to_string();
        assert_eq!(NormalizedPath::parse(&text).unwrap().to_string(), text);
    }
}

// ============================================================================
// Evaluation limits and errors
// ============================================================================

#[test]
fn test_max_depth_aborts_evaluation() {
    init_logging();
    let d = doc(r#"{"a":{"b":{"c":{"d":1}}}}"#);
    let expr = CompiledExpression::compile("$..d").unwrap();

    let err = expr
        .evaluate_with(&d, &EvalOptions::default().with_max_depth(2))
        .unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::MaxDepthExceeded { limit: 2 });
    assert!(err.path.is_some());

    let ok = expr
        .evaluate_with(&d, &EvalOptions::default().with_max_depth(4))
        .unwrap();
    assert_eq!(ok.len(), 1);
}

#[test]
fn test_bad_function_argument_only_excludes_candidate() {
    init_logging();
    let d = doc(r#"{"items":[{"n":"x"},{"n":-4},{"n":2}]}"#);
    let out = values("$.items[?(abs(@.n) > 3)]", &d);
    assert_eq!(json(&out), r#"[{"n":-4}]"#);
}

#[test]
fn test_overflowing_arithmetic_is_absent() {
    let d = doc(r#"{"items":[{"a":-9223372036854775808},{"a":4}]}"#);
    assert_eq!(json(&values("$.items[?(@.a / -1 == 0)]", &d)), "[]");
    assert_eq!(json(&values("$.items[?(@.a / -1 == -4)]", &d)), r#"[{"a":4}]"#);
}

#[test]
fn test_query_reports_compile_errors() {
    let d = doc("{}");
    let err = query(&d, "$.a[", &ResultOptions::values()).unwrap_err();
    assert!(matches!(err, jpq::QueryError::Compile(_)));
}

// ============================================================================
// Registered functions
// ============================================================================

fn custom_functions() -> FunctionRegistry {
    let mut functions = FunctionRegistry::new();
    functions
        .register("upper", Some(1), |args| match args[0].single() {
            Some(Value::String(s)) => Ok(Value::from(s.to_uppercase())),
            Some(other) => Err(EvalError::invalid_argument(
                "upper",
                format!("expected a string, got {}", other.type_name()),
            )),
            None => Ok(Value::Null),
        })
        .register("total", None, |args| {
            let mut sum = 0;
            for arg in args {
                match arg {
                    Operand::Nodes(nodes) => {
                        sum += nodes.iter().filter_map(|n| n.value().as_i64()).sum::<i64>()
                    }
                    other => sum += other.single().and_then(Value::as_i64).unwrap_or(0),
                }
            }
            Ok(Value::Integer(sum))
        });
    functions
}

fn custom_values(text: &str, document: &Value) -> Vec<Value> {
    CompiledExpression::compile_with(text, &custom_functions())
        .unwrap()
        .select_values(document)
        .unwrap()
}

#[test]
fn test_registered_function_in_filter() {
    let d = doc(r#"{"people":[{"name":"ann"},{"name":"Bob"},{"name":7}]}"#);
    let out = custom_values("$.people[?(upper(@.name) == 'BOB')].name", &d);
    assert_eq!(json(&out), r#"["Bob"]"#);
}

#[test]
fn test_registered_function_as_selector() {
    init_logging();
    let d = doc(r#"{"tags":["a","b",3]}"#);
    let out = custom_values("$.tags[*].upper()", &d);
    assert_eq!(json(&out), r#"["A","B"]"#);
}

#[test]
fn test_variadic_registered_function() {
    let d = doc(r#"{"a":[1,2,3],"b":{"n":10}}"#);
    assert_eq!(custom_values("$.b[?(total($.a[*], @, 4) == 20)]", &d), vec![Value::Integer(10)]);
    let out = CompiledExpression::compile_with("$.a.total()", &custom_functions())
        .unwrap()
        .select(&d, &ResultOptions::pairs())
        .unwrap();
    assert_eq!(out.to_value().to_string(), r#"[{"path":null,"value":0}]"#);
}

#[test]
fn test_compiled_expression_reused_across_documents() {
    let expr = CompiledExpression::compile("$.n").unwrap();
    let first = doc(r#"{"n": 1}"#);
    let second = doc(r#"{"n": 2}"#);
    assert_eq!(expr.select_values(&first).unwrap(), vec![Value::Integer(1)]);
    assert_eq!(expr.select_values(&second).unwrap(), vec![Value::Integer(2)]);
}

#[test]
fn test_shared_between_threads() {
    let expr = std::sync::Arc::new(CompiledExpression::compile("$..price").unwrap());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let expr = expr.clone();
            std::thread::spawn(move || {
                let d = doc(&format!(r#"{{"a": {{"price": {i}}}}}"#));
                expr.select_values(&d).unwrap()
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), vec![Value::Integer(i as i64)]);
    }
}
