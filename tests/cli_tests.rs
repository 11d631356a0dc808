use assert_matches::assert_matches;
use clap::Parser;
use template_copy::cli::{Cli, Commands};
use template_copy::config::{LibraryConfig, SessionConfig};
use template_copy::error::TemplateCopyError;
use template_copy::fixture::Fixture;
use template_copy::main_lib;
use template_copy::session::SessionPhase;
use template_copy::snapshot::SessionSnapshot;
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

fn valid_config() -> SessionConfig {
    SessionConfig {
        templates: LibraryConfig {
            tree_id: "6f1c2a9e-8d3b-4c57-9e21-0b7a4d5e3f10".to_string(),
            title: "Templates".to_string(),
            host_url: "https://contoso.example/sites/hr".to_string(),
        },
        destination: LibraryConfig {
            tree_id: "a2b3c4d5-e6f7-4890-abcd-ef0123456789".to_string(),
            title: "Documents".to_string(),
            host_url: "https://contoso.example/sites/team".to_string(),
        },
        ..SessionConfig::default()
    }
}

#[test]
fn test_cli_defaults_to_no_subcommand() {
    let cli = Cli::try_parse_from(["template-copy"]).unwrap();
    assert!(cli.command.is_none());
}

#[test]
fn test_cli_parses_test_subcommand() {
    let cli = Cli::try_parse_from([
        "template-copy",
        "test",
        "--script",
        "copy.script",
        "--settle-timeout",
        "9",
        "--verbose",
    ])
    .unwrap();
    assert_matches!(
        cli.command,
        Some(Commands::Test { script, fixture: None, settle_timeout: 9, verbose: true }) if script == "copy.script"
    );
}

#[test]
fn test_cli_parses_execute_subcommand() {
    let cli = Cli::try_parse_from([
        "template-copy",
        "execute",
        "-x",
        "open_templates",
        "-o",
        "out.json",
    ])
    .unwrap();
    assert_matches!(
        cli.command,
        Some(Commands::Execute { command, output: Some(output), fixture: None })
            if command == "open_templates" && output == "out.json"
    );
}

#[tokio::test]
async fn test_execute_writes_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("snapshot.json");

    let snapshot = main_lib::execute_command(
        None,
        "sequence:[open_templates]",
        Some(&output.to_string_lossy()),
    )
    .await
    .unwrap();
    assert_eq!(snapshot.templates.visible.len(), 2);

    let written: SessionSnapshot =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written, snapshot);
    assert_eq!(written.phase, SessionPhase::Browsing);
}

#[tokio::test]
async fn test_execute_rejects_unknown_command() {
    let result = main_lib::execute_command(None, "teleport", None).await;
    assert_matches!(result, Err(TemplateCopyError::Command(_)));
}

#[test]
fn test_check_config_accepts_valid_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    valid_config().save_to_file(&path.to_string_lossy()).unwrap();

    let config = assert_ok!(main_lib::check_config(&path.to_string_lossy()));
    assert_eq!(config.destination.title, "Documents");
}

#[test]
fn test_check_config_rejects_missing_library_ids() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    std::fs::write(&path, r#"{ "page_size": 20 }"#).unwrap();

    let error = assert_err!(main_lib::check_config(&path.to_string_lossy()));
    assert!(error
        .to_string()
        .contains("templates and destination libraries"));
}

#[test]
fn test_check_config_reports_unreadable_json() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert_matches!(
        main_lib::check_config(&path.to_string_lossy()),
        Err(TemplateCopyError::Json(_))
    );
}

#[test]
fn test_saved_fixture_loads_back() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("fixture.json");
    main_lib::save_fixture(Some(&path.to_string_lossy())).unwrap();

    let loaded = main_lib::load_fixture(Some(&path.to_string_lossy())).unwrap();
    assert_eq!(loaded, Fixture::default());
}

#[tokio::test]
async fn test_summary_marks_selected_destination() {
    let snapshot = main_lib::execute_command(
        None,
        "sequence:[open_templates]",
        None,
    )
    .await
    .unwrap();
    let summary = main_lib::render_summary(&snapshot);
    assert!(summary.contains("phase: Browsing"));
    assert!(summary.contains("📁 Policies"));
    assert!(summary.contains("📄 template.docx"));
    assert!(!summary.contains("destination:"));
}
