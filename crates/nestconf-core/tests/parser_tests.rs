//! Integration tests for the configuration parser

use nestconf_core::{
    parse, parse_strict, ConfigEntry, ConfigNode, ConfigValue, ParseErrorKind, Parser,
    DEFAULT_MAX_DEPTH,
};

const SITE_CONFIG: &str = r#"
server {
    listen 80;
    server_name example.com;
    location {
        path /api;
        proxy_pass http://backend;
        timeout 30s;
        headers {
            add X-Custom "value with spaces";
            add X-Another "more values";
            remove Authorization;
        }
    }
    location {
        path /static;
        root /var/www;
        expires 1d;
    }
}

upstream {
    name backend;
    server 192.168.1.1:8080;
    server 192.168.1.2:8080;
    server 192.168.1.3:8080;
}

server {
    listen 443 ssl;
    server_name secure.example.com;
    ssl_certificate /path/to/cert.pem;
}
"#;

fn str_of<'c>(config: &'c ConfigNode<'_>, name: &str) -> &'c str {
    config
        .get(name)
        .and_then(ConfigEntry::as_single)
        .and_then(ConfigValue::as_str)
        .unwrap_or_else(|| panic!("expected single string for {}", name))
}

fn strs_of<'c>(entry: &'c ConfigEntry<'_>) -> Vec<&'c str> {
    entry
        .values()
        .iter()
        .map(|v| v.as_str().expect("expected string value"))
        .collect()
}

// ============================================================================
// Merge Rule Tests
// ============================================================================

#[test]
fn test_repeated_value_directive_becomes_list() {
    let config = parse("a 1; a 2;");
    let entry = config.get("a").unwrap();
    assert!(entry.is_many());
    assert_eq!(strs_of(entry), vec!["1", "2"]);
}

#[test]
fn test_single_occurrence_stays_single() {
    let config = parse("a 1;");
    assert!(matches!(config.get("a"), Some(ConfigEntry::Single(_))));
    assert_eq!(str_of(&config, "a"), "1");
}

#[test]
fn test_three_occurrences_append_in_order() {
    let config = parse("a 1; b x; a 2; a 3;");
    assert_eq!(strs_of(config.get("a").unwrap()), vec!["1", "2", "3"]);
    assert_eq!(config.names().collect::<Vec<_>>(), vec!["a", "b"]);
}

#[test]
fn test_repeated_blocks_become_list() {
    let config = parse("b { x 1; } b { x 2; }");

    let expected: ConfigNode = [
        ("b", ConfigValue::Block([("x", ConfigValue::from("1"))].into_iter().collect())),
        ("b", ConfigValue::Block([("x", ConfigValue::from("2"))].into_iter().collect())),
    ]
    .into_iter()
    .collect();
    assert_eq!(config, expected);

    let blocks = config.get("b").unwrap().values();
    assert_eq!(blocks.len(), 2);
    assert_eq!(str_of(blocks[1].as_block().unwrap(), "x"), "2");
}

#[test]
fn test_mixed_shapes_are_preserved() {
    let config = parse("x 1; x { y 2; } x 3;");
    let values = config.get("x").unwrap().values();
    assert_eq!(values.len(), 3);
    assert_eq!(values[0].as_str(), Some("1"));
    assert!(values[1].is_block());
    assert_eq!(values[2].as_str(), Some("3"));
}

#[test]
fn test_equality_is_order_sensitive() {
    assert_ne!(parse("a 1; b 2;"), parse("b 2; a 1;"));
    assert_eq!(parse("a 1;\n\n b 2;"), parse("a 1; b 2;"));
}

// ============================================================================
// Value Directive Tests
// ============================================================================

#[test]
fn test_multiple_tokens_join_with_space() {
    let config = parse("d foo bar;");
    assert_eq!(str_of(&config, "d"), "foo bar");
}

#[test]
fn test_token_lists_keep_tokens_apart() {
    let mut parser = Parser::new().with_token_lists(true);
    let config = parser.parse("listen 443 ssl; port 80;").unwrap();

    let listen = config.get("listen").unwrap().first().unwrap();
    assert_eq!(listen.as_list().map(|l| l.len()), Some(2));
    assert_eq!(listen.as_list().unwrap()[1], "ssl");
    // A lone token is still a plain string
    assert_eq!(str_of(&config, "port"), "80");
}

#[test]
fn test_quoted_and_bare_tokens_join() {
    let config = parse(r#"add X-Custom "value with spaces";"#);
    assert_eq!(str_of(&config, "add"), "X-Custom value with spaces");
}

#[test]
fn test_information_separators_are_whitespace() {
    let config = parse_strict("a\u{1c}1;\u{1f}b 2\u{1d}3\u{1e};").unwrap();
    assert_eq!(str_of(&config, "a"), "1");
    // Only ASCII blanks end a bare token; separators inside it are kept.
    assert_eq!(str_of(&config, "b"), "2\u{1d}3");
}

#[test]
fn test_directive_without_value_is_empty_string() {
    let config = parse("flag; flag;");
    assert_eq!(strs_of(config.get("flag").unwrap()), vec!["", ""]);
}

#[test]
fn test_semicolon_is_optional() {
    let config = parse("a 1");
    assert_eq!(str_of(&config, "a"), "1");
}

#[test]
fn test_newline_does_not_end_directive() {
    // Without `;` the next line's tokens belong to the same directive
    let config = parse("a 1\nb 2");
    assert_eq!(str_of(&config, "a"), "1 b 2");
    assert!(!config.contains("b"));
}

#[test]
fn test_value_stops_at_closing_brace() {
    let config = parse("s { a 1 }");
    let s = config.get("s").unwrap().first().unwrap().as_block().unwrap();
    assert_eq!(str_of(s, "a"), "1");
}

#[test]
fn test_value_characters() {
    let config = parse("proxy_pass http://backend:8080/path?q=1; server 10.0.0.1:80;");
    assert_eq!(str_of(&config, "proxy_pass"), "http://backend:8080/path?q=1");
    assert_eq!(str_of(&config, "server"), "10.0.0.1:80");
}

#[test]
fn test_empty_quoted_first_value_is_dropped() {
    let config = parse(r#"a "" b;"#);
    assert_eq!(str_of(&config, "a"), "b");
}

#[test]
fn test_hash_is_not_a_comment() {
    let config = parse("color #fff;");
    assert_eq!(str_of(&config, "color"), "#fff");

    let result = Parser::new().parse_with_recovery("# note\na 1;");
    assert!(result.config.is_empty());
    assert_eq!(
        result.errors.first().map(|e| e.kind),
        Some(ParseErrorKind::EmptyDirectiveName)
    );
}

// ============================================================================
// Quoted String Tests
// ============================================================================

#[test]
fn test_quoted_newline_escape() {
    let config = parse(r#"c "hello\nworld";"#);
    assert_eq!(str_of(&config, "c"), "hello\nworld");
}

#[test]
fn test_quoted_escapes() {
    let config = parse(r#"a "x\ty\rz\\w"; b 'it\'s'; c "\q\"";"#);
    assert_eq!(str_of(&config, "a"), "x\ty\rz\\w");
    assert_eq!(str_of(&config, "b"), "it's");
    assert_eq!(str_of(&config, "c"), "q\"");
}

#[test]
fn test_quoted_delimiters_are_literal() {
    let config = parse(r#"a "x; { } y"; b 'say "hi"';"#);
    assert_eq!(str_of(&config, "a"), "x; { } y");
    assert_eq!(str_of(&config, "b"), "say \"hi\"");
}

#[test]
fn test_unescaped_values_borrow_from_input() {
    let config = parse(r#"a plain; b "quoted"; c "esc\n";"#);
    let value = |name: &str| match config.get(name).unwrap().first().unwrap() {
        ConfigValue::Str(s) => matches!(s, std::borrow::Cow::Borrowed(_)),
        _ => panic!("expected string"),
    };
    assert!(value("a"));
    assert!(value("b"));
    assert!(!value("c"));
}

// ============================================================================
// Nesting Tests
// ============================================================================

#[test]
fn test_site_config() {
    let mut parser = Parser::new();
    let config = parser.parse(SITE_CONFIG).unwrap();

    assert_eq!(config.names().collect::<Vec<_>>(), vec!["server", "upstream"]);

    let servers = config.get("server").unwrap().values();
    assert_eq!(servers.len(), 2);
    let first = servers[0].as_block().unwrap();
    let second = servers[1].as_block().unwrap();
    assert_eq!(str_of(first, "listen"), "80");
    assert_eq!(str_of(second, "listen"), "443 ssl");
    assert_eq!(str_of(second, "ssl_certificate"), "/path/to/cert.pem");

    let locations = first.get("location").unwrap().values();
    assert_eq!(locations.len(), 2);
    let api = locations[0].as_block().unwrap();
    assert_eq!(str_of(api, "path"), "/api");
    assert_eq!(str_of(api, "timeout"), "30s");

    let headers = api.get("headers").unwrap().first().unwrap().as_block().unwrap();
    assert_eq!(
        strs_of(headers.get("add").unwrap()),
        vec!["X-Custom value with spaces", "X-Another more values"]
    );
    assert_eq!(str_of(headers, "remove"), "Authorization");

    let upstream = config.get_path(["upstream", "server"]).unwrap();
    assert_eq!(upstream.len(), 3);
}

#[test]
fn test_site_config_stats() {
    let config = parse(SITE_CONFIG);
    let stats = config.stats();
    assert_eq!(stats.directives, 24);
    assert_eq!(stats.blocks, 6);
    assert_eq!(stats.values, 18);
    assert_eq!(stats.repeated, 4);
    assert_eq!(stats.max_depth, 3);
    assert_eq!(config.directive_count(), 24);
    assert_eq!(config.depth(), 3);
}

#[test]
fn test_get_path_uses_first_block() {
    let config = parse("s { a 1; } s { a 2; b 3; }");
    let a = config.get_path(["s", "a"]).unwrap();
    assert_eq!(a.first().unwrap().as_str(), Some("1"));
    assert!(config.get_path(["s", "b"]).is_none());
    assert!(config.get_path(Vec::<&str>::new()).is_none());
}

#[test]
fn test_get_path_skips_leading_string_values() {
    let config = parse("s off; s { a 1; }");
    assert!(config.get_path(["s", "a"]).is_some());
}

#[test]
fn test_deep_nesting_is_reachable() {
    let depth = 40;
    let mut input = String::new();
    for i in 0..depth {
        input.push_str(&format!("n{} {{ ", i));
    }
    input.push_str("leaf yes;");
    input.push_str(&" }".repeat(depth));

    let config = parse_strict(&input).unwrap();
    let mut path: Vec<String> = (0..depth).map(|i| format!("n{}", i)).collect();
    path.push("leaf".to_string());
    let leaf = config.get_path(&path).unwrap();
    assert_eq!(leaf.first().unwrap().as_str(), Some("yes"));
    assert_eq!(config.depth(), depth);
}

#[test]
fn test_block_span_covers_body() {
    let input = "s { a 1; }";
    let config = parse(input);
    let s = config.get("s").unwrap().first().unwrap().as_block().unwrap();
    assert_eq!(&input[std::ops::Range::<usize>::from(s.span)], " a 1; ");
    assert_eq!(config.span.end as usize, input.len());
}

#[test]
fn test_into_owned_outlives_input() {
    let owned = {
        let input = String::from(r#"s { a "x"; }"#);
        parse(&input).into_owned()
    };
    assert_eq!(
        owned.get_path(["s", "a"]).unwrap().first().unwrap().as_str(),
        Some("x")
    );
}

#[test]
fn test_empty_input() {
    let result = Parser::new().parse_with_recovery("  \n\t ");
    assert!(result.is_ok());
    assert!(result.config.is_empty());
}

// ============================================================================
// Error Recovery Tests
// ============================================================================

#[test]
fn test_unterminated_string_keeps_partial_value() {
    let input = r#"a "abc"#;
    let result = Parser::new().parse_with_recovery(input);
    assert_eq!(str_of(&result.config, "a"), "abc");

    let error = result.errors.first().unwrap();
    assert_eq!(error.kind, ParseErrorKind::UnterminatedString);
    assert!(error.recoverable);
    assert_eq!((error.span.start, error.span.end), (2, 6));
    assert!(!result.has_fatal_errors());
}

#[test]
fn test_unterminated_string_is_strict_error() {
    let err = parse_strict("a 'abc").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::UnterminatedString);
    assert_eq!(err.to_string(), "unterminated string, missing closing ' at bytes 2..6");
}

#[test]
fn test_unclosed_block_keeps_content() {
    let result = Parser::new().parse_with_recovery("s { a 1; t { b 2;");
    let t = result.config.get_path(["s", "t", "b"]).unwrap();
    assert_eq!(t.first().unwrap().as_str(), Some("2"));

    // Both open blocks are reported, innermost first
    let kinds: Vec<_> = result.errors.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![ParseErrorKind::UnbalancedBraces; 2]);
    assert!(result.errors.iter().all(|e| e.recoverable));
    assert!(result.errors.first().unwrap().message.contains("'t'"));
}

#[test]
fn test_stray_close_brace_truncates_top_level() {
    let input = "a 1; } b 2;";
    let result = Parser::new().parse_with_recovery(input);
    assert_eq!(str_of(&result.config, "a"), "1");
    assert!(!result.config.contains("b"));

    let error = result.errors.first().unwrap();
    assert_eq!(error.kind, ParseErrorKind::UnbalancedBraces);
    assert_eq!((error.span.start, error.span.end), (5, 6));
    assert!(result.has_fatal_errors());
}

#[test]
fn test_empty_directive_name_stops_block() {
    let result = Parser::new().parse_with_recovery("s { a 1; \"x\" 2; b 3; }");
    let s = result.config.get("s").unwrap().first().unwrap().as_block().unwrap();
    assert_eq!(str_of(s, "a"), "1");
    assert!(!s.contains("b"));

    assert_eq!(result.errors.len(), 1);
    let error = result.errors.first().unwrap();
    assert_eq!(error.kind, ParseErrorKind::EmptyDirectiveName);
    assert_eq!((error.span.start, error.span.end), (9, 10));
}

#[test]
fn test_block_arguments_are_not_supported() {
    // `location /api {` reads `/api` as a value, then `{` cannot start a directive
    let result = Parser::new().parse_with_recovery("location /api { root /srv; }");
    assert_eq!(str_of(&result.config, "location"), "/api");
    assert_eq!(
        result.errors.first().map(|e| e.kind),
        Some(ParseErrorKind::EmptyDirectiveName)
    );
}

#[test]
fn test_strict_parse_accepts_valid_input() {
    assert!(parse_strict(SITE_CONFIG).is_ok());
}

#[test]
fn test_without_recovery_stops_at_first_error() {
    let input = "a \"x\n";
    let mut parser = Parser::new().with_recovery(false);
    let result = parser.parse_with_recovery(input);
    assert_eq!(result.errors.len(), 1);

    let input = "s { a 1; t {";
    let result = Parser::new().with_recovery(false).parse_with_recovery(input);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors.first().unwrap().message.contains("'t'"));
}

#[test]
fn test_parser_is_reusable() {
    let mut parser = Parser::new();
    assert!(parser.parse("a {").is_err());
    assert!(parser.parse("a { }").is_ok());
    let result = parser.parse_with_recovery("a 1;");
    assert!(result.is_ok());
}

// ============================================================================
// Depth Limit Tests
// ============================================================================

#[test]
fn test_depth_limit_skips_too_deep_block() {
    let input = "a { b { c { d 1; } } e 2; } f 3;";
    let mut parser = Parser::new().with_max_depth(Some(2));
    let result = parser.parse_with_recovery(input);

    let b = result.config.get_path(["a", "b"]).unwrap().first().unwrap();
    assert!(b.as_block().unwrap().is_empty());
    assert_eq!(
        result.config.get_path(["a", "e"]).unwrap().first().unwrap().as_str(),
        Some("2")
    );
    assert_eq!(str_of(&result.config, "f"), "3");

    assert_eq!(result.errors.len(), 1);
    let error = result.errors.first().unwrap();
    assert_eq!(error.kind, ParseErrorKind::DepthExceeded);
    assert_eq!(&input[std::ops::Range::<usize>::from(error.span)], "c {");
}

#[test]
fn test_depth_limit_zero_rejects_any_block() {
    let mut parser = Parser::new().with_max_depth(Some(0));
    let err = parser.parse("a 1; s { b 2; }").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::DepthExceeded);
}

#[test]
fn test_skipped_block_ignores_quoted_braces() {
    let mut parser = Parser::new().with_max_depth(Some(0));
    let result = parser.parse_with_recovery(r#"s { a "}"; } b 2;"#);
    assert_eq!(str_of(&result.config, "b"), "2");
    assert_eq!(result.errors.len(), 1);
}

#[test]
fn test_default_depth_limit() {
    let nested = |depth: usize| format!("{}x 1;{}", "n { ".repeat(depth), " }".repeat(depth));

    assert!(parse_strict(&nested(DEFAULT_MAX_DEPTH)).is_ok());
    let err = parse_strict(&nested(DEFAULT_MAX_DEPTH + 1)).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::DepthExceeded);

    let mut unlimited = Parser::new().with_max_depth(None);
    let deep = nested(DEFAULT_MAX_DEPTH + 44);
    let config = unlimited.parse(&deep).unwrap();
    assert_eq!(config.depth(), DEFAULT_MAX_DEPTH + 44);
}
