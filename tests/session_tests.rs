use assert_matches::assert_matches;
use std::sync::Arc;
use std::time::Duration;
use template_copy::breadcrumb;
use template_copy::destination_browser::ScrollMetrics;
use template_copy::error::TemplateCopyError;
use template_copy::fetch::BrowserStatus;
use template_copy::fixture::{Fixture, GeneratedFolders};
use template_copy::memory_repository::{FailureKind, FailureRule, MemoryRepository, Operation};
use template_copy::session::{SessionController, SessionPhase};
use tokio_test::assert_ok;

const DEST_ROOT: &str = "/sites/team/Shared Documents";
const TEMPLATE_ROOT: &str = "/sites/hr/Templates";

fn start(fixture: &Fixture) -> (SessionController, Arc<MemoryRepository>) {
    let repository = Arc::new(fixture.repository());
    let session = SessionController::start(fixture.session_config(), repository.clone());
    (session, repository)
}

fn names(session: &SessionController) -> Vec<String> {
    session
        .destination()
        .navigation()
        .listing
        .iter()
        .map(|n| n.name.clone())
        .collect()
}

async fn picking(fixture: &Fixture) -> (SessionController, Arc<MemoryRepository>) {
    let (mut session, repository) = start(fixture);
    assert_ok!(session.open_template_tree().await);
    assert_ok!(session.settle().await);
    assert_ok!(session.select_template("template.docx").await);
    assert_ok!(session.settle().await);
    assert_eq!(session.phase(), SessionPhase::Picking);
    (session, repository)
}

fn paged_fixture(page_size: usize) -> Fixture {
    let mut fixture = Fixture::default();
    fixture.destination.folders.clear();
    fixture.destination.generated_folders = vec![GeneratedFolders {
        parent: String::new(),
        prefix: "Folder-".to_string(),
        count: 50,
    }];
    fixture.settings.page_size = page_size;
    fixture
}

#[tokio::test]
async fn test_template_navigation_round_trip() {
    let (mut session, _repository) = start(&Fixture::default());
    session.open_template_tree().await.unwrap();
    session.settle().await.unwrap();

    let root_listing: Vec<String> = session
        .templates()
        .current_listing()
        .iter()
        .map(|n| n.name.clone())
        .collect();
    assert_eq!(root_listing, vec!["Policies", "template.docx"]);
    assert!(session.templates().state().breadcrumb.is_empty());

    session.enter_template("Policies").await.unwrap();
    session.settle().await.unwrap();
    assert_eq!(
        session.templates().state().current_path,
        format!("{}/Policies", TEMPLATE_ROOT)
    );
    assert_eq!(
        breadcrumb::trail_text(&session.templates().state().breadcrumb),
        "Templates > Policies"
    );

    session.navigate_template(TEMPLATE_ROOT).await.unwrap();
    session.settle().await.unwrap();
    let restored: Vec<String> = session
        .templates()
        .current_listing()
        .iter()
        .map(|n| n.name.clone())
        .collect();
    assert_eq!(restored, root_listing);
    assert!(session.templates().state().breadcrumb.is_empty());
}

#[tokio::test]
async fn test_single_page_listing_has_no_more() {
    let (session, _repository) = picking(&paged_fixture(50)).await;
    let pagination = session.destination().pagination();
    assert_eq!(pagination.loaded_count, 50);
    assert!(!pagination.has_more);
}

#[tokio::test]
async fn test_load_more_appends_pages_until_exhausted() {
    let (mut session, _repository) = picking(&paged_fixture(20)).await;
    assert_eq!(session.destination().pagination().loaded_count, 20);
    assert!(session.destination().pagination().has_more);

    assert!(session.load_more_destination().await.unwrap());
    session.settle().await.unwrap();
    assert_eq!(session.destination().pagination().loaded_count, 40);
    assert!(session.destination().pagination().has_more);

    assert!(session.load_more_destination().await.unwrap());
    session.settle().await.unwrap();
    assert_eq!(session.destination().pagination().loaded_count, 50);
    assert!(!session.destination().pagination().has_more);

    assert!(!session.load_more_destination().await.unwrap());

    let listing = names(&session);
    assert_eq!(listing.len(), 50);
    assert_eq!(listing.first().map(String::as_str), Some("Folder-001"));
    assert_eq!(listing.last().map(String::as_str), Some("Folder-050"));
}

#[tokio::test]
async fn test_scroll_near_bottom_loads_next_page() {
    let (mut session, _repository) = picking(&paged_fixture(20)).await;

    let top = ScrollMetrics {
        offset: 0.0,
        viewport: 200.0,
        extent: 1000.0,
    };
    assert!(!session.scroll_destination(top).await.unwrap());

    let bottom = ScrollMetrics {
        offset: 700.0,
        viewport: 200.0,
        extent: 1000.0,
    };
    assert!(session.scroll_destination(bottom).await.unwrap());
    // Nothing else is requested while the page is in flight.
    assert!(!session.scroll_destination(bottom).await.unwrap());
    session.settle().await.unwrap();
    assert_eq!(session.destination().pagination().loaded_count, 40);
}

#[tokio::test]
async fn test_selection_survives_load_more() {
    let (mut session, _repository) = picking(&paged_fixture(20)).await;
    let selected = format!("{}/Folder-005", DEST_ROOT);
    session.select_destination(Some(&selected)).unwrap();

    session.load_more_destination().await.unwrap();
    session.settle().await.unwrap();
    assert_eq!(
        session.destination().selection().selected_path.as_deref(),
        Some(selected.as_str())
    );
    assert_eq!(session.destination().selected_index(), Some(4));
}

#[tokio::test(start_paused = true)]
async fn test_search_after_load_more_starts_from_first_page() {
    let (mut session, _repository) = picking(&paged_fixture(20)).await;
    assert!(session.load_more_destination().await.unwrap());
    session.settle().await.unwrap();
    assert_eq!(session.destination().pagination().loaded_count, 40);

    session.search_destination("Folder-0").unwrap();
    session.settle().await.unwrap();

    let pagination = session.destination().pagination();
    assert_eq!(pagination.search_text, "Folder-0");
    assert_eq!(pagination.loaded_count, 20);
    assert!(pagination.has_more);
    let listing = names(&session);
    assert_eq!(listing.len(), 20);
    assert_eq!(listing.first().map(String::as_str), Some("Folder-001"));
    assert_eq!(listing.last().map(String::as_str), Some("Folder-020"));
}

#[tokio::test(start_paused = true)]
async fn test_rapid_search_dispatches_one_fetch() {
    let (mut session, repository) = picking(&Fixture::default()).await;
    session.enter_destination("Invoices").await.unwrap();
    session.settle().await.unwrap();

    session.search_destination("invoice").unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    session.search_destination("invoice-2024").unwrap();
    session.settle().await.unwrap();

    let searches: Vec<_> = repository
        .calls()
        .into_iter()
        .filter(|c| c.operation == Operation::SearchChildren)
        .collect();
    assert_eq!(searches.len(), 1);
    assert_eq!(searches[0].query.as_deref(), Some("invoice-2024"));
    assert_eq!(names(&session), vec!["invoice-2024"]);
    assert_eq!(
        session.destination().navigation().listing[0].path,
        format!("{}/Invoices/invoice-2024", DEST_ROOT)
    );
}

#[tokio::test(start_paused = true)]
async fn test_slow_search_response_is_discarded() {
    let mut fixture = Fixture::default();
    fixture.search_latency_ms.insert("Ac".to_string(), 2_000);
    let (mut session, repository) = picking(&fixture).await;
    session.enter_destination("Clients").await.unwrap();
    session.settle().await.unwrap();

    session.search_destination("Ac").unwrap();
    // The debounce fires and the slow search goes out.
    session.process_next().await.unwrap();

    session.search_destination("Glob").unwrap();
    session.settle().await.unwrap();

    assert_eq!(repository.count_calls(Operation::SearchChildren), 2);
    assert_eq!(session.destination().search_text(), "Glob");
    assert_eq!(names(&session), vec!["Globex"]);
}

#[tokio::test(start_paused = true)]
async fn test_clearing_search_restores_children() {
    let (mut session, _repository) = picking(&Fixture::default()).await;
    session.search_destination("Forms").unwrap();
    session.settle().await.unwrap();
    // Forms is a reserved name and never offered as a destination.
    assert!(names(&session).is_empty());

    session.search_destination("").unwrap();
    session.settle().await.unwrap();
    assert_eq!(names(&session), vec!["2024", "Clients", "Invoices"]);
}

#[tokio::test]
async fn test_copy_into_selected_folder() {
    let (mut session, repository) = picking(&Fixture::default()).await;
    assert!(!session.can_confirm());

    let target = format!("{}/2024", DEST_ROOT);
    session.select_destination(Some(&target)).unwrap();
    assert!(session.can_confirm());

    session.confirm_copy().await.unwrap();
    assert!(session.is_copying());
    session.settle().await.unwrap();

    assert_eq!(session.phase(), SessionPhase::Succeeded);
    let outcome = session.outcome().unwrap();
    assert!(outcome.success());
    assert_eq!(
        outcome.result_path(),
        Some("/sites/team/Shared Documents/2024/template.docx")
    );
    assert_eq!(
        outcome.url(),
        Some("https://contoso.example/sites/team/Shared Documents/2024/template.docx")
    );
    assert!(repository.contains(
        &fixture_dest_id(),
        "/sites/team/Shared Documents/2024/template.docx"
    ));
    assert_eq!(
        breadcrumb::trail_text(session.success_trail()),
        "... > 2024"
    );
    assert!(session
        .open_created_document()
        .unwrap()
        .starts_with("ms-word:"));
}

fn fixture_dest_id() -> String {
    Fixture::default().destination.tree_id
}

fn template_listings(repository: &MemoryRepository) -> usize {
    repository
        .calls()
        .iter()
        .filter(|c| c.operation == Operation::ListChildren && c.path == TEMPLATE_ROOT)
        .count()
}

#[tokio::test]
async fn test_template_listing_refreshes_after_copy() {
    let (mut session, repository) = picking(&Fixture::default()).await;
    assert_eq!(template_listings(&repository), 1);

    session
        .select_destination(Some(&format!("{}/2024", DEST_ROOT)))
        .unwrap();
    session.confirm_copy().await.unwrap();
    session.settle().await.unwrap();
    assert_eq!(template_listings(&repository), 2);
}

#[tokio::test]
async fn test_copy_into_current_folder_without_selection() {
    let (mut session, _repository) = picking(&Fixture::default()).await;
    session.enter_destination("Clients").await.unwrap();
    session.settle().await.unwrap();
    assert!(session.can_confirm());

    session.confirm_copy().await.unwrap();
    session.settle().await.unwrap();
    assert_eq!(
        session.outcome().and_then(|o| o.result_path()),
        Some("/sites/team/Shared Documents/Clients/template.docx")
    );
}

#[tokio::test]
async fn test_library_root_is_rejected_unless_allowed() {
    let (mut session, repository) = picking(&Fixture::default()).await;
    assert!(!session.can_confirm());
    assert_matches!(
        session.confirm_copy().await,
        Err(TemplateCopyError::InvalidSelection(_))
    );
    assert_eq!(repository.count_calls(Operation::Copy), 0);

    let mut fixture = Fixture::default();
    fixture.settings.allow_create_at_root = true;
    let (mut session, _repository) = picking(&fixture).await;
    assert!(session.can_confirm());
    session.confirm_copy().await.unwrap();
    session.settle().await.unwrap();
    assert_eq!(
        session.outcome().and_then(|o| o.result_path()),
        Some("/sites/team/Shared Documents/template.docx")
    );
}

#[tokio::test]
async fn test_failed_copy_keeps_picker_for_retry() {
    let mut fixture = Fixture::default();
    fixture.failures.push(FailureRule {
        operation: Operation::Copy,
        path_contains: Some("Clients".to_string()),
        kind: FailureKind::AccessDenied,
        message: "no write access".to_string(),
    });
    let (mut session, repository) = picking(&fixture).await;

    session
        .select_destination(Some(&format!("{}/Clients", DEST_ROOT)))
        .unwrap();
    session.confirm_copy().await.unwrap();
    session.settle().await.unwrap();

    assert_eq!(session.phase(), SessionPhase::Failed);
    assert!(session.last_error().unwrap().contains("no write access"));
    assert!(!session.outcome().unwrap().success());
    assert!(session.open_created_document().is_none());
    // No automatic retry.
    assert_eq!(repository.count_calls(Operation::Copy), 1);

    session
        .select_destination(Some(&format!("{}/2024", DEST_ROOT)))
        .unwrap();
    session.confirm_copy().await.unwrap();
    session.settle().await.unwrap();
    assert_eq!(session.phase(), SessionPhase::Succeeded);
    assert_eq!(repository.count_calls(Operation::Copy), 2);
}

#[tokio::test]
async fn test_renamed_copy_keeps_extension() {
    let (mut session, _repository) = picking(&Fixture::default()).await;
    session.rename_copy("Q3 report").unwrap();
    assert_eq!(session.copy_file_name(), Some("Q3 report.docx"));

    session
        .select_destination(Some(&format!("{}/2024", DEST_ROOT)))
        .unwrap();
    session.confirm_copy().await.unwrap();
    session.settle().await.unwrap();
    assert_eq!(
        session.outcome().and_then(|o| o.result_path()),
        Some("/sites/team/Shared Documents/2024/Q3 report.docx")
    );
}

#[tokio::test]
async fn test_listing_failure_is_reported() {
    let mut fixture = Fixture::default();
    fixture.failures.push(FailureRule {
        operation: Operation::ListChildren,
        path_contains: Some("Invoices".to_string()),
        kind: FailureKind::Transport,
        message: "connection reset".to_string(),
    });
    let (mut session, _repository) = picking(&fixture).await;
    session.enter_destination("Invoices").await.unwrap();
    session.settle().await.unwrap();

    assert_matches!(session.destination().status(), BrowserStatus::Failed(_));
    assert!(names(&session).is_empty());
    assert!(session.last_error().unwrap().contains("connection reset"));
}

#[tokio::test]
async fn test_close_returns_to_templates() {
    let (mut session, _repository) = picking(&Fixture::default()).await;
    session.close_session();

    assert_eq!(session.phase(), SessionPhase::Browsing);
    assert!(session.selected_template().is_none());
    assert!(session.destination().navigation().listing.is_empty());
    assert_eq!(session.templates().current_listing().len(), 2);
    assert!(session.select_destination(None).is_err());
}
