use super::*;

#[test]
fn test_response_block() {
    let raw = r#"Sure.
<response>
{"reasoning": "The bookings link is in the navbar", "actions": ["header-nav-a-3"], "narration": "Open your bookings", "taskAccomplished": false}
</response>"#;
    let reply = parse_reply(raw).unwrap();
    assert_eq!(reply.next_action(), Some("header-nav-a-3"));
    assert_eq!(reply.message(), "Open your bookings");
    assert!(!reply.task_accomplished);
}

#[test]
fn test_fenced_json_inside_response_block() {
    let raw = "<response>```json\n{\"actions\": [], \"taskAccomplished\": true}\n```</response>";
    let reply = parse_reply(raw).unwrap();
    assert!(reply.task_accomplished);
    assert_eq!(reply.next_action(), None);
}

#[test]
fn test_bare_object_with_nested_braces() {
    let raw = r#"Here you go: {"reasoning": "use {braces} carefully", "actions": ["a", "b"], "extra": {"k": 1}} trailing"#;
    let reply = parse_reply(raw).unwrap();
    assert_eq!(reply.actions, vec!["a", "b"]);
    assert_eq!(reply.reasoning, "use {braces} carefully");
}

#[test]
fn test_message_fallbacks() {
    let reply = ReasoningReply {
        reasoning: "Because".to_string(),
        ..Default::default()
    };
    assert_eq!(reply.message(), "Because");
    assert_eq!(ReasoningReply::default().message(), "I'll help you with that.");
}

#[test]
fn test_no_json_is_malformed() {
    let err = parse_reply("I could not find that button.").unwrap_err();
    assert!(matches!(err, SessionError::MalformedReply(_)));
}

#[test]
fn test_invalid_json_is_malformed() {
    let err = parse_reply("<response>{not json}</response>").unwrap_err();
    assert!(matches!(err, SessionError::MalformedReply(_)));
}

#[test]
fn test_empty_first_action_is_none() {
    let reply = parse_reply(r#"{"actions": [""]}"#).unwrap();
    assert_eq!(reply.next_action(), None);
}
