//! `guidepost assist`: the full guidance loop.

use std::sync::Arc;

use guidepost_browser_cdp::CdpContextProvider;
use guidepost_config::GuideConfig;
use guidepost_session::{GuidanceSession, HttpReasoningService, SessionEvent, SessionOutcome};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::browser::BrowserTab;

pub(crate) async fn handle_assist_command(
    config: GuideConfig,
    query: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Arc::new(config);
    let tab = BrowserTab::connect(&config.browser).await?;

    let context = CdpContextProvider::attach(
        tab.session().clone(),
        config.executor.automation_attribute.clone(),
        config.session.excluded_ids.clone(),
    )
    .await?;
    let reasoning =
        HttpReasoningService::new(config.session.analyze_url.clone(), config.session.request_timeout())?;
    info!(url = reasoning.url(), "Using reasoning service");

    let session = GuidanceSession::new(
        Arc::new(context),
        Arc::new(reasoning),
        Arc::new(tab.executor(config.clone())),
        config.session.clone(),
    );

    let mut events = session.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => print_event(&event),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Dropped session events"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let result = tokio::select! {
        result = session.assist(&query) => Some(result),
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, stopping guidance");
            session.executor().cancel();
            None
        }
    };

    drop(session);
    let _ = printer.await;
    tab.close().await;

    match result {
        Some(Ok(SessionOutcome::Accomplished { iterations })) => {
            println!("Done after {} step(s).", iterations);
            Ok(())
        }
        Some(Ok(SessionOutcome::IterationLimit { iterations })) => {
            Err(format!("gave up after {} iterations", iterations).into())
        }
        Some(Err(e)) => Err(e.into()),
        None => Ok(()),
    }
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::Thinking { iteration } => println!("[{}] thinking...", iteration + 1),
        SessionEvent::Narration(text) => println!("{}", text),
        SessionEvent::StepStarted { identifier } => println!("  -> {}", identifier),
        SessionEvent::StepFinished(report) => {
            if !report.outcome.is_completed() {
                println!("  step {} ended: {:?}", report.identifier, report.outcome);
            }
        }
        SessionEvent::Verifying => println!("  checking the page again..."),
        SessionEvent::Accomplished { .. } => {}
    }
}
