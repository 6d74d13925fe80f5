//! Tests for shell command parsing and response rendering

use std::time::Duration;

use linekv::protocol::{parse_command, ttl_from_secs, Command, CommandType, Response, Status};
use linekv::LineKvError;
use serde_json::json;

// =============================================================================
// Parsing
// =============================================================================

#[test]
fn test_parse_create() {
    let command = parse_command(r#"create "user1" {"name":"Alice"}"#).unwrap();

    assert_eq!(
        command,
        Command::Create {
            key: "user1".to_string(),
            value: json!({"name": "Alice"}),
            ttl: None,
        }
    );
    assert_eq!(command.command_type(), CommandType::Create);
    assert_eq!(command.key(), "user1");
}

#[test]
fn test_parse_create_with_ttl() {
    let command = parse_command(r#"create "session" {"id":7} 0.5"#).unwrap();

    match command {
        Command::Create { ttl, .. } => assert_eq!(ttl, Some(Duration::from_millis(500))),
        other => panic!("expected create, got {:?}", other),
    }
}

#[test]
fn test_parse_create_keeps_non_object_value() {
    // Shape is checked by the engine, not the parser
    let command = parse_command(r#"create "k" [1,2]"#).unwrap();

    match command {
        Command::Create { value, .. } => assert_eq!(value, json!([1, 2])),
        other => panic!("expected create, got {:?}", other),
    }
}

#[test]
fn test_parse_read_and_delete() {
    assert_eq!(
        parse_command(r#"read "user1""#).unwrap(),
        Command::Read {
            key: "user1".to_string()
        }
    );
    assert_eq!(
        parse_command(r#"delete "user1""#).unwrap(),
        Command::Delete {
            key: "user1".to_string()
        }
    );
}

#[test]
fn test_parse_quoted_key_with_spaces() {
    let command = parse_command(r#"read "user 1""#).unwrap();
    assert_eq!(command.key(), "user 1");
}

#[test]
fn test_parse_verb_case_insensitive_and_trimmed() {
    let command = parse_command("   READ   \"k\"  \n").unwrap();
    assert_eq!(command.command_type(), CommandType::Read);
}

#[test]
fn test_command_type_as_str() {
    assert_eq!(CommandType::Create.as_str(), "create");
    assert_eq!(CommandType::Read.as_str(), "read");
    assert_eq!(CommandType::Delete.as_str(), "delete");
}

// =============================================================================
// Parse Errors
// =============================================================================

fn assert_parse_error(line: &str) {
    match parse_command(line) {
        Err(LineKvError::Parse(_)) => {}
        other => panic!("expected parse error for {:?}, got {:?}", line, other),
    }
}

#[test]
fn test_parse_rejects_malformed_lines() {
    assert_parse_error("");
    assert_parse_error("   ");
    assert_parse_error(r#"update "k" {}"#);
    assert_parse_error("read");
    assert_parse_error("read user1");
    assert_parse_error("read 42");
    assert_parse_error(r#"create "k""#);
    assert_parse_error(r#"create "k" {"a":"#);
    assert_parse_error(r#"read "k" "extra""#);
    assert_parse_error(r#"create "k" {} 1 2"#);
}

#[test]
fn test_parse_rejects_bad_ttl() {
    assert_parse_error(r#"create "k" {} "soon""#);
    assert_parse_error(r#"create "k" {} -1"#);
}

#[test]
fn test_ttl_from_secs() {
    assert_eq!(ttl_from_secs(0.0).unwrap(), Duration::ZERO);
    assert_eq!(ttl_from_secs(2.5).unwrap(), Duration::from_millis(2500));
    assert!(ttl_from_secs(-0.1).is_err());
    assert!(ttl_from_secs(f64::NAN).is_err());
    assert!(ttl_from_secs(f64::INFINITY).is_err());
}

// =============================================================================
// Responses
// =============================================================================

#[test]
fn test_response_ok_without_value() {
    let response = Response::from_result(Ok(None));

    assert_eq!(response.status, Status::Ok);
    assert_eq!(response.to_string(), "ok");
}

#[test]
fn test_response_ok_with_value() {
    let response = Response::from_result(Ok(Some(json!({"name": "Alice"}))));

    assert_eq!(response.status, Status::Ok);
    assert_eq!(response.to_string(), r#"{"name":"Alice"}"#);
}

#[test]
fn test_response_not_found() {
    let error = LineKvError::KeyNotFound {
        key: "user1".to_string(),
    };

    let response = Response::error(&error);

    assert_eq!(response.status, Status::NotFound);
    assert_eq!(response.code, Some(6));
    assert_eq!(
        response.to_string(),
        r#"error 006: Key "user1" does not exist"#
    );
}

#[test]
fn test_response_other_error() {
    let response = Response::from_result(Err(LineKvError::KeyTooLong { len: 40, max: 32 }));

    assert_eq!(response.status, Status::Error);
    assert_eq!(response.code, Some(1));
    assert!(response.to_string().starts_with("error 001: "));
}
