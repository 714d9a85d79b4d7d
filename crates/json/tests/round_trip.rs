use json::{parse, to_string_compact, ParseOptions, ParserErrorCode};

fn parse_default(text: &str) -> json::Value {
    parse(text, ParseOptions::default()).unwrap()
}

#[test]
fn flat_object_round_trips_exactly() {
    let v = parse_default(r#"{"key":"test"}"#);
    assert!(v.is_object());
    assert_eq!(v["key"].as_str().unwrap(), "test");
    assert_eq!(to_string_compact(&v), r#"{"key":"test"}"#);
}

#[test]
fn small_integer_array_has_u64_elements() {
    let v = parse_default("[0,1,2]");
    let arr = v.as_array().unwrap();
    assert_eq!(arr.len(), 3);
    for (i, item) in arr.iter().enumerate() {
        assert!(item.as_number().unwrap().is_u64());
        assert_eq!(item.as_u64().unwrap(), i as u64);
    }
}

#[test]
fn deeply_nested_array_exactly_at_limit_parses() {
    let depth = 64;
    let text = "[".repeat(depth) + &"]".repeat(depth);
    let options = ParseOptions { limit: depth, ..ParseOptions::default() };
    let v = parse(&text, options).unwrap();

    let mut cursor = &v;
    let mut seen = 0;
    while let Ok(arr) = cursor.as_array() {
        if arr.is_empty() {
            break;
        }
        cursor = arr.get(0).unwrap();
        seen += 1;
    }
    assert_eq!(seen, depth - 1, "innermost array holds the empty array, so depth-1 arrays are nested inside it");
}

#[test]
fn depth_one_past_limit_raises_stack_limit_reached() {
    let depth = 10;
    let text = "[".repeat(depth + 1) + &"]".repeat(depth + 1);
    let options = ParseOptions { limit: depth, ..ParseOptions::default() };
    let err = parse(&text, options).unwrap_err();
    assert_eq!(err.code, ParserErrorCode::StackLimitReached);
}

#[test]
fn i64_min_round_trips() {
    let text = format!("{}", i64::MIN);
    let v = parse_default(&text);
    assert_eq!(v.as_i64().unwrap(), i64::MIN);
    assert_eq!(to_string_compact(&v), text);
}

#[test]
fn u64_max_round_trips() {
    let text = format!("{}", u64::MAX);
    let v = parse_default(&text);
    assert_eq!(v.as_u64().unwrap(), u64::MAX);
    assert_eq!(to_string_compact(&v), text);
}

#[test]
fn truncated_true_literal_in_streaming_mode_still_fails() {
    use json::parse;
    let options = ParseOptions { streaming_mode: true, ..ParseOptions::default() };
    let err = parse("tru", options).unwrap_err();
    assert_eq!(err.code, ParserErrorCode::NotMatchTrue);
}

#[test]
fn trailing_garbage_without_streaming_mode_is_extra_character() {
    let err = parse("{}   x", ParseOptions::default()).unwrap_err();
    assert_eq!(err.code, ParserErrorCode::ExtraCharacter);
}

#[test]
fn object_with_repeated_key_keeps_last_write() {
    let v = parse_default(r#"{"a":1,"a":2,"a":3}"#);
    assert_eq!(v["a"].as_i64().unwrap(), 3);
}

#[test]
fn cloning_into_a_pool_rehomes_whole_tree() {
    use json::allocator::Pool;
    use std::sync::Arc;

    let v = parse_default(r#"{"nested":[1,2,{"deep":true}]}"#);
    let pool: json::AllocatorHandle = Arc::new(Pool::new(4096));
    let moved = v.clone_with(pool.clone());

    assert_eq!(moved, v);
    assert!(Arc::ptr_eq(moved.allocator(), &pool));
    let nested = moved.as_object().unwrap().get("nested").unwrap();
    assert!(Arc::ptr_eq(nested.allocator(), &pool));
}
