use super::*;
use serde_json::json;

// =========================================================================
// build_messages
// =========================================================================

#[test]
fn system_prompt_becomes_first_message() {
    let msgs = build_messages("be helpful", &[Message::user("hi")]);
    assert_eq!(msgs.len(), 2);
    assert_eq!(msgs[0].role, "system");
    assert_eq!(msgs[0].content.as_deref(), Some("be helpful"));
    assert_eq!(msgs[1].role, "user");
}

#[test]
fn empty_system_prompt_is_omitted() {
    let msgs = build_messages("  ", &[Message::user("hi")]);
    assert_eq!(msgs.len(), 1);
    assert_eq!(msgs[0].role, "user");
}

#[test]
fn tool_use_blocks_become_tool_calls() {
    let message = Message {
        role: "assistant".into(),
        content: Content::Blocks(vec![ContentBlock::ToolUse {
            id: "call-1".into(),
            name: "fetch_dataset".into(),
            input: json!({"source": "sales"}),
        }]),
    };
    let msgs = build_messages("", &[message]);
    assert_eq!(msgs.len(), 1);
    let calls = msgs[0].tool_calls.as_ref().unwrap();
    assert_eq!(calls[0].id, "call-1");
    assert_eq!(calls[0].function.name, "fetch_dataset");
    assert_eq!(calls[0].function.arguments, r#"{"source":"sales"}"#);
}

#[test]
fn tool_results_become_tool_role_messages() {
    let message = Message {
        role: "user".into(),
        content: Content::Blocks(vec![ContentBlock::ToolResult {
            tool_use_id: "call-1".into(),
            content: "{\"rows\": 3}".into(),
            is_error: None,
        }]),
    };
    let msgs = build_messages("", &[message]);
    assert_eq!(msgs.len(), 1);
    assert_eq!(msgs[0].role, "tool");
    assert_eq!(msgs[0].tool_call_id.as_deref(), Some("call-1"));
}

// =========================================================================
// parse_response
// =========================================================================

#[test]
fn parses_text_response() {
    let body = json!({
        "model": "qwen3:8b",
        "choices": [{"finish_reason": "stop", "message": {"content": "done"}}]
    })
    .to_string();

    let response = parse_response(&body).unwrap();
    assert_eq!(response.model, "qwen3:8b");
    assert_eq!(response.stop_reason, "stop");
    assert!(matches!(&response.content[0], ContentBlock::Text { text } if text == "done"));
}

#[test]
fn parses_tool_calls_and_normalizes_stop_reason() {
    let body = json!({
        "model": "qwen3:8b",
        "choices": [{
            "finish_reason": "tool_calls",
            "message": {
                "content": null,
                "tool_calls": [{
                    "id": "call-7",
                    "function": {"name": "build_table_layout", "arguments": "{\"source\":\"orders\"}"}
                }]
            }
        }]
    })
    .to_string();

    let response = parse_response(&body).unwrap();
    assert_eq!(response.stop_reason, "tool_use");
    match &response.content[0] {
        ContentBlock::ToolUse { id, name, input } => {
            assert_eq!(id, "call-7");
            assert_eq!(name, "build_table_layout");
            assert_eq!(input["source"], json!("orders"));
        }
        other => panic!("expected ToolUse, got {other:?}"),
    }
}

#[test]
fn unparseable_tool_arguments_become_empty_object() {
    let body = json!({
        "choices": [{
            "finish_reason": "tool_calls",
            "message": {"tool_calls": [{"id": "c", "function": {"name": "t", "arguments": "not json"}}]}
        }]
    })
    .to_string();

    let response = parse_response(&body).unwrap();
    match &response.content[0] {
        ContentBlock::ToolUse { input, .. } => assert_eq!(input, &json!({})),
        other => panic!("expected ToolUse, got {other:?}"),
    }
}

#[test]
fn missing_choices_is_a_parse_error() {
    let err = parse_response("{}").unwrap_err();
    assert!(matches!(err, LlmError::ApiParse(_)));
}
