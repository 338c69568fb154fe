use std::path::PathBuf;

use anyhow::{Context as AnyhowContext, Result};
use keyboard_types::Key;
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use limelight::messages::PanelCommand;
use limelight::page::selection::{RangePoint, TextRange};
use limelight::session::PageSession;

/// One line of the interaction script.
#[derive(Debug, Deserialize)]
#[serde(tag = "step", rename_all = "camelCase")]
enum ScriptStep {
    Panel {
        command: PanelCommand,
    },
    Click {
        id: String,
    },
    MouseUp {
        id: String,
    },
    Key {
        key: String,
    },
    #[serde(rename_all = "camelCase")]
    Select {
        start_id: String,
        start_offset: usize,
        end_id: String,
        end_offset: usize,
    },
    ClearSelection,
}

fn main() {
    let subscriber_result = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
    if subscriber_result.is_err() {
        // tracing was already initialised; continue silently
    }

    let mut args = std::env::args().skip(1);
    let page_path = args.next().map(PathBuf::from).unwrap_or_else(|| {
        eprintln!("usage: limelight <page.html> [script.jsonl]");
        std::process::exit(1);
    });
    let script_path = args.next().map(PathBuf::from);

    let mut session = PageSession::load_file(&page_path).unwrap_or_else(|err| {
        eprintln!("Failed to load page: {err:#}");
        std::process::exit(1);
    });

    if let Some(script_path) = script_path {
        let script = std::fs::read_to_string(&script_path).unwrap_or_else(|err| {
            eprintln!("Failed to read script {}: {err}", script_path.display());
            std::process::exit(1);
        });
        if let Err(err) = replay_script(&mut session, &script) {
            eprintln!("Script failed: {err:#}");
            std::process::exit(1);
        }
    }

    match session.document_html() {
        Ok(html) => println!("{html}"),
        Err(err) => {
            eprintln!("Failed to serialize page: {err:#}");
            std::process::exit(1);
        }
    }
}

fn replay_script(session: &mut PageSession, script: &str) -> Result<()> {
    for (number, line) in script.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let step: ScriptStep = serde_json::from_str(line)
            .with_context(|| format!("bad script step on line {}", number + 1))?;
        apply_step(session, step)
            .with_context(|| format!("script step on line {} failed", number + 1))?;
    }
    Ok(())
}

fn apply_step(session: &mut PageSession, step: ScriptStep) -> Result<()> {
    match step {
        ScriptStep::Panel { command } => {
            session.apply_command(command)?;
        }
        ScriptStep::Click { id } => {
            let outcome = session.click(&id)?;
            log_outcome("click", &outcome);
        }
        ScriptStep::MouseUp { id } => {
            let outcome = session.mouse_up(&id)?;
            log_outcome("mouseUp", &outcome);
        }
        ScriptStep::Key { key } => {
            let outcome = session.press_key(parse_key(&key));
            log_outcome("key", &outcome);
        }
        ScriptStep::Select {
            start_id,
            start_offset,
            end_id,
            end_offset,
        } => {
            let start = range_point(session, &start_id, start_offset)?;
            let end = range_point(session, &end_id, end_offset)?;
            let outcome = session.set_selection(TextRange::new(start, end));
            log_outcome("select", &outcome);
        }
        ScriptStep::ClearSelection => {
            session.clear_selection();
        }
    }
    Ok(())
}

/// Endpoint for a `select` step: a char offset into the first text node of
/// the named element.
fn range_point(session: &PageSession, id: &str, offset: usize) -> Result<RangePoint> {
    let element = session
        .element_by_id(id)
        .with_context(|| format!("no element with id {id:?}"))?;
    let text = element
        .children()
        .find(|child| child.as_text().is_some())
        .with_context(|| format!("element {id:?} has no text child"))?;
    RangePoint::new(text, offset)
        .with_context(|| format!("bad offset {offset} into element {id:?}"))
}

fn parse_key(raw: &str) -> Key {
    match raw {
        "Escape" => Key::Escape,
        "Tab" => Key::Tab,
        "Enter" => Key::Enter,
        other => Key::Character(other.to_string()),
    }
}

fn log_outcome(step: &str, outcome: &limelight::DispatchOutcome) {
    if let Some(blocked) = &outcome.blocked_link {
        warn!(
            step,
            href = %blocked.href,
            resolved = blocked.resolved.as_ref().map(|url| url.as_str()).unwrap_or("-"),
            "link navigation blocked"
        );
    }
    info!(
        step,
        default_prevented = outcome.default_prevented,
        propagation_stopped = outcome.propagation_stopped,
        inline_handlers = outcome.inline_handlers.len(),
        "applied step"
    );
}
