use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use guidepost_config::GuideConfig;
use guidepost_executor::Phase;
use guidepost_overlay::TickerClock;
use guidepost_protocols::testing::{FakePage, RecordingSurfaceProvider};
use guidepost_protocols::{BoundingBox, Size};
use parking_lot::Mutex;
use serde_json::json;

use super::*;
use crate::context::PageContext;
use crate::reasoning::StepReply;
use crate::reply::ReasoningReply;

struct StaticContext {
    captures: Mutex<u32>,
}

#[async_trait]
impl PageContextProvider for StaticContext {
    async fn capture(&self) -> Result<crate::context::PageContext, SessionError> {
        *self.captures.lock() += 1;
        Ok(PageContext {
            serialized_markup: r#"<body><div id="cart">Cart</div><div id="chat-widget">chat</div></body>"#
                .to_string(),
            screenshot: "data:image/png;base64,AAAA".to_string(),
            interactive_elements: Vec::new(),
        })
    }
}

#[derive(Default)]
struct ScriptedReasoning {
    replies: Mutex<VecDeque<Result<StepReply, SessionError>>>,
    requests: Mutex<Vec<StepRequest>>,
}

impl ScriptedReasoning {
    fn push(&self, reply: ReasoningReply, turn: u32) {
        self.replies.lock().push_back(Ok(StepReply {
            reply,
            messages: vec![json!({"turn": turn})],
        }));
    }
}

#[async_trait]
impl ReasoningService for ScriptedReasoning {
    async fn next_step(&self, request: &StepRequest) -> Result<StepReply, SessionError> {
        self.requests.lock().push(request.clone());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(StepReply::default()))
    }
}

fn act(identifier: &str) -> ReasoningReply {
    ReasoningReply {
        actions: vec![identifier.to_string()],
        narration: format!("Click {}", identifier),
        ..Default::default()
    }
}

fn done() -> ReasoningReply {
    ReasoningReply {
        task_accomplished: true,
        ..Default::default()
    }
}

struct Fixture {
    context: Arc<StaticContext>,
    reasoning: Arc<ScriptedReasoning>,
    session: GuidanceSession,
}

fn fixture(config: SessionConfig) -> Fixture {
    let page = FakePage::new(1024.0, 768.0);
    page.add_with_id("cart", BoundingBox::new(10.0, 10.0, 80.0, 30.0));
    let executor = Arc::new(WorkflowExecutor::new(
        Arc::new(page),
        Arc::new(RecordingSurfaceProvider::new(Size::new(1024.0, 768.0))),
        Arc::new(TickerClock::sixty_hz()),
        Arc::new(GuideConfig::default()),
    ));

    // Stand in for the user: advance every step once it is waiting.
    let user = executor.clone();
    tokio::spawn(async move {
        let mut phases = user.phases();
        while phases.wait_for(|p| *p == Phase::AwaitingInteraction).await.is_ok() {
            user.advance();
            if phases.wait_for(|p| *p == Phase::Idle).await.is_err() {
                break;
            }
        }
    });

    let context = Arc::new(StaticContext {
        captures: Mutex::new(0),
    });
    let reasoning = Arc::new(ScriptedReasoning::default());
    let session = GuidanceSession::new(context.clone(), reasoning.clone(), executor, config);
    Fixture {
        context,
        reasoning,
        session,
    }
}

#[tokio::test(start_paused = true)]
async fn test_trusts_reported_completion() {
    let f = fixture(SessionConfig::default());
    f.reasoning.push(act("cart"), 1);
    f.reasoning.push(done(), 2);
    let mut events = f.session.subscribe();

    let outcome = f.session.assist("open my cart").await.unwrap();
    assert_eq!(outcome, SessionOutcome::Accomplished { iterations: 2 });

    let requests = f.reasoning.requests.lock().clone();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].previous_messages.is_empty());
    assert_eq!(requests[1].previous_messages, vec![json!({"turn": 1})]);
    assert!(!requests[0].dom_string.contains("chat-widget"));
    assert!(requests[0].dom_string.contains(r#"id="cart""#));

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert!(seen.contains(&SessionEvent::Narration("Click cart".to_string())));
    assert!(seen.contains(&SessionEvent::StepStarted {
        identifier: "cart".to_string()
    }));
    let finished = seen.iter().find_map(|e| match e {
        SessionEvent::StepFinished(report) => Some(report.clone()),
        _ => None,
    });
    assert!(finished.unwrap().outcome.is_completed());
    assert_eq!(seen.last(), Some(&SessionEvent::Accomplished { iterations: 2 }));
}

#[tokio::test(start_paused = true)]
async fn test_confirm_policy_needs_two_consecutive_reports() {
    let f = fixture(SessionConfig {
        verification: VerificationPolicy::ConfirmWithFreshContext,
        ..Default::default()
    });
    f.reasoning.push(done(), 1);
    f.reasoning.push(act("cart"), 2);
    f.reasoning.push(done(), 3);
    f.reasoning.push(done(), 4);

    let outcome = f.session.assist("open my cart").await.unwrap();
    assert_eq!(outcome, SessionOutcome::Accomplished { iterations: 4 });
    assert_eq!(*f.context.captures.lock(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_stops_at_iteration_limit() {
    let f = fixture(SessionConfig {
        max_iterations: 3,
        ..Default::default()
    });
    let outcome = f.session.assist("do something impossible").await.unwrap();
    assert_eq!(outcome, SessionOutcome::IterationLimit { iterations: 3 });
    assert_eq!(f.reasoning.requests.lock().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_reasoning_error_ends_session() {
    let f = fixture(SessionConfig::default());
    f.reasoning
        .replies
        .lock()
        .push_back(Err(SessionError::MalformedReply("garbage".to_string())));
    let err = f.session.assist("anything").await.unwrap_err();
    assert!(matches!(err, SessionError::MalformedReply(_)));
}

#[tokio::test(start_paused = true)]
async fn test_missing_target_does_not_end_session() {
    let f = fixture(SessionConfig::default());
    f.reasoning.push(act("no-such-element"), 1);
    f.reasoning.push(done(), 2);
    let outcome = f.session.assist("open my cart").await.unwrap();
    assert_eq!(outcome, SessionOutcome::Accomplished { iterations: 2 });
}
