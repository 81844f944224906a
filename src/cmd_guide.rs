//! `guidepost guide`: one workflow run against the attached tab.

use std::sync::Arc;

use guidepost_config::GuideConfig;
use guidepost_executor::{RunOutcome, RunReport};
use guidepost_protocols::TargetDescriptor;
use tracing::info;

use crate::browser::BrowserTab;

pub(crate) struct GuideArgs {
    pub identifier: String,
    pub label: Option<String>,
    pub auto_click: bool,
    pub json: bool,
}

pub(crate) async fn handle_guide_command(
    config: GuideConfig,
    args: GuideArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Arc::new(config);
    let tab = BrowserTab::connect(&config.browser).await?;
    let executor = Arc::new(tab.executor(config.clone()));

    let mut target = TargetDescriptor::new(args.identifier);
    if let Some(label) = args.label {
        target = target.with_label(label);
    }
    if args.auto_click {
        target = target.auto_click();
    }

    let cancel = {
        let executor = executor.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupted, cancelling run");
                executor.cancel();
            }
        })
    };

    let report = executor.execute(target).await;
    cancel.abort();
    tab.close().await;
    let report = report?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    match report.outcome {
        RunOutcome::Failed { error } => Err(error.into()),
        _ => Ok(()),
    }
}

fn print_report(report: &RunReport) {
    let outcome = match &report.outcome {
        RunOutcome::Completed { trigger } => format!("completed ({:?})", trigger),
        RunOutcome::Aborted { reason } => format!("aborted ({})", reason),
        RunOutcome::Failed { error } => format!("failed: {}", error),
    };
    let phases: Vec<String> = report.phases.iter().map(|p| p.to_string()).collect();

    println!("{}: {}", report.identifier, outcome);
    println!("  phases:   {}", phases.join(" -> "));
    if let Some(strategy) = &report.strategy {
        println!("  strategy: {}", strategy.as_str());
    }
    if let Some(b) = &report.bounds {
        println!("  bounds:   {}x{} at ({}, {})", b.width, b.height, b.x, b.y);
    }
    if report.scrolled {
        let settle = if report.scroll_timed_out { " (settle timed out)" } else { "" };
        println!("  scrolled{}", settle);
    }
    println!("  elapsed:  {} ms", report.elapsed.as_millis());
}
