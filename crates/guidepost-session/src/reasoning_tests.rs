use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

fn request() -> StepRequest {
    StepRequest {
        user_query: "show my bookings".to_string(),
        screenshot: "data:image/png;base64,AAAA".to_string(),
        dom_string: "<body></body>".to_string(),
        previous_messages: vec![json!({"role": "user", "content": "hi"})],
        sitemap: None,
    }
}

#[test]
fn test_request_wire_format() {
    let value = serde_json::to_value(request()).unwrap();
    assert_eq!(value["userQuery"], "show my bookings");
    assert_eq!(value["domString"], "<body></body>");
    assert_eq!(value["previousMessages"][0]["role"], "user");
    assert!(value.get("sitemap").is_none());
}

#[tokio::test]
async fn test_next_step_parses_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .and(body_partial_json(json!({"userQuery": "show my bookings"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": "<response>{\"actions\": [\"nav-a-2\"], \"narration\": \"Click Bookings\", \"taskAccomplished\": false}</response>",
            "messages": [{"role": "assistant", "content": "..."}]
        })))
        .mount(&server)
        .await;

    let service =
        HttpReasoningService::new(format!("{}/analyze", server.uri()), Duration::from_secs(5)).unwrap();
    let step = service.next_step(&request()).await.unwrap();
    assert_eq!(step.reply.next_action(), Some("nav-a-2"));
    assert_eq!(step.reply.message(), "Click Bookings");
    assert_eq!(step.messages.len(), 1);
}

#[tokio::test]
async fn test_server_error_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Failed to analyze query"))
        .mount(&server)
        .await;

    let service =
        HttpReasoningService::new(format!("{}/analyze", server.uri()), Duration::from_secs(5)).unwrap();
    match service.next_step(&request()).await {
        Err(SessionError::Api { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "Failed to analyze query");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_unparseable_result_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "sorry"})))
        .mount(&server)
        .await;

    let service = HttpReasoningService::new(server.uri(), Duration::from_secs(5)).unwrap();
    assert!(matches!(
        service.next_step(&request()).await,
        Err(SessionError::MalformedReply(_))
    ));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let service =
        HttpReasoningService::new("http://127.0.0.1:9/analyze", Duration::from_secs(2)).unwrap();
    assert!(matches!(
        service.next_step(&request()).await,
        Err(SessionError::Network(_))
    ));
}
