// Library module containing testable functions behind the CLI subcommands

use crate::command::Command;
use crate::config::SessionConfig;
use crate::error::{Result, TemplateCopyError};
use crate::executor::Executor;
use crate::fixture::Fixture;
use crate::session::SessionController;
use crate::snapshot::SessionSnapshot;
use crate::test_runner::{TestResult, TestRunner};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

/// The fixture at `path`, or the built-in sample.
pub fn load_fixture(path: Option<&str>) -> Result<Fixture> {
    match path {
        Some(path) => Fixture::load_from_file(path),
        None => Ok(Fixture::default()),
    }
}

/// Start a session against the fixture's in-memory libraries.
pub fn start_session(fixture: &Fixture) -> Result<SessionController> {
    let config = fixture.session_config();
    config.validate()?;
    Ok(SessionController::start(config, Arc::new(fixture.repository())))
}

fn write_output(content: &str, output_path: Option<&str>) -> Result<()> {
    match output_path {
        Some(path) => {
            std::fs::write(path, content)?;
            println!("Output saved to: {}", path);
        }
        None => println!("{}", content),
    }
    Ok(())
}

pub async fn execute_command(
    fixture_path: Option<&str>,
    command_str: &str,
    output_path: Option<&str>,
) -> Result<SessionSnapshot> {
    let fixture = load_fixture(fixture_path)?;
    let command = Command::from_string(command_str).map_err(TemplateCopyError::Command)?;

    let mut session = start_session(&fixture)?;
    let result = Executor::execute(&mut session, command).await;
    session.settle().await?;

    if let Some(message) = &result.status_message {
        log::info!("{}", message);
    }

    let snapshot = SessionSnapshot::capture(&session);
    write_output(&snapshot.to_json()?, output_path)?;
    Ok(snapshot)
}

pub fn check_config(path: &str) -> Result<SessionConfig> {
    let config = SessionConfig::load_from_file(path)?;
    config.validate()?;
    println!("✅ {} is valid", path);
    Ok(config)
}

pub fn save_fixture(output_path: Option<&str>) -> Result<()> {
    let json = serde_json::to_string_pretty(&Fixture::default())?;
    write_output(&json, output_path)
}

pub async fn run_headless_test(
    script_path: &str,
    fixture_path: Option<&str>,
    settle_timeout: u64,
) -> Result<TestResult> {
    log::info!("🧪 Starting headless test run");
    log::info!("🧪 Script: {}", script_path);
    if let Some(fixture) = fixture_path {
        log::info!("🧪 Fixture: {}", fixture);
    }

    let fixture = load_fixture(fixture_path)?;
    let mut session = start_session(&fixture)?;

    let mut test_runner = TestRunner::from_file(script_path)?;
    test_runner.max_settle_time = Duration::from_secs(settle_timeout);
    log::info!(
        "🧪 Running test script with {} steps",
        test_runner.script.steps.len()
    );

    test_runner.run(&mut session).await
}

/// Short human-readable view of the session for the line-oriented driver.
pub fn render_summary(snapshot: &SessionSnapshot) -> String {
    let mut lines = Vec::new();
    lines.push(format!("phase: {:?}", snapshot.phase));

    let templates = &snapshot.templates.navigation;
    lines.push(format!("templates: {}", templates.current_path));
    for node in &snapshot.templates.visible {
        let marker = if node.is_container { "📁" } else { "📄" };
        lines.push(format!("  {} {}", marker, node.name));
    }

    if snapshot.selected_template.is_some() {
        let destination = &snapshot.destination;
        lines.push(format!(
            "destination: {} ({} loaded{})",
            destination.navigation.current_path,
            destination.pagination.loaded_count,
            if destination.pagination.has_more { ", more" } else { "" }
        ));
        for (index, node) in destination.navigation.listing.iter().enumerate() {
            let marker = if destination.selected_index == Some(index) { ">" } else { " " };
            lines.push(format!("  {} 📁 {}", marker, node.name));
        }
    }

    if let Some(outcome) = &snapshot.outcome {
        match outcome.url() {
            Some(url) => lines.push(format!("created: {}", url)),
            None => lines.push(format!(
                "copy failed: {}",
                outcome.error_message().unwrap_or("unknown error")
            )),
        }
    }
    if let Some(error) = &snapshot.last_error {
        lines.push(format!("error: {}", error));
    }
    lines.join("\n")
}

/// Read commands from stdin until `quit` or end of input.
pub async fn run_repl(fixture_path: Option<&str>) -> Result<()> {
    let fixture = load_fixture(fixture_path)?;
    let mut session = start_session(&fixture)?;

    let result = Executor::execute(&mut session, Command::OpenTemplates).await;
    session.settle().await?;
    if let Some(message) = result.status_message {
        println!("{}", message);
    }
    println!("{}", render_summary(&SessionSnapshot::capture(&session)));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "snapshot" {
            println!("{}", SessionSnapshot::capture(&session).to_json()?);
            continue;
        }

        let command = match Command::from_string(line) {
            Ok(command) => command,
            Err(e) => {
                println!("❌ {}", e);
                continue;
            }
        };
        let result = Executor::execute(&mut session, command).await;
        session.settle().await?;
        if let Some(message) = result.status_message {
            println!("{}", message);
        }
        if result.should_quit {
            break;
        }
        println!("{}", render_summary(&SessionSnapshot::capture(&session)));
    }
    Ok(())
}
