use crate::copy::{self, CopyOutcome, CopyPlan};
use crate::error::RepositoryError;
use crate::fetch::{FetchTag, FetchedFolder};
use crate::node::TreeRoot;
use crate::repository::{ListOptions, PageRequest, Repository};
use std::sync::Arc;
use tokio::sync::mpsc;

pub type FetchResult = Result<FetchedFolder, RepositoryError>;

#[derive(Debug, Clone)]
pub enum Task {
    LoadTemplateFolder {
        tag: FetchTag,
        tree: TreeRoot,
    },
    LoadDestinationPage {
        tag: FetchTag,
        tree: TreeRoot,
        page: PageRequest,
    },
    CopyTemplate {
        ticket: u64,
        plan: CopyPlan,
    },
}

#[derive(Debug, Clone)]
pub enum TaskResult {
    TemplateFolderLoaded { tag: FetchTag, result: FetchResult },
    DestinationPageLoaded { tag: FetchTag, result: FetchResult },
    SearchDebounceElapsed { generation: u64 },
    CopyFinished { ticket: u64, outcome: CopyOutcome },
}

/// Receive tasks until the sender is dropped. Each task runs on its own
/// tokio task so a slow listing never holds up a newer one.
pub async fn run_worker(
    mut task_receiver: mpsc::Receiver<Task>,
    result_sender: mpsc::Sender<TaskResult>,
    repository: Arc<dyn Repository>,
) {
    while let Some(task) = task_receiver.recv().await {
        let repository = Arc::clone(&repository);
        let result_sender = result_sender.clone();
        tokio::spawn(async move {
            let result = execute_task(repository.as_ref(), task).await;
            if result_sender.send(result).await.is_err() {
                // Session has dropped the receiver; nobody is waiting.
                log::debug!("worker result dropped: session closed");
            }
        });
    }
}

pub async fn execute_task(repository: &dyn Repository, task: Task) -> TaskResult {
    match task {
        Task::LoadTemplateFolder { tag, tree } => {
            let options = ListOptions {
                include_files: true,
                page: None,
            };
            let result = load_folder(repository, tree, tag.folder.clone(), options).await;
            TaskResult::TemplateFolderLoaded { tag, result }
        }
        Task::LoadDestinationPage { tag, tree, page } => {
            let result = load_destination_page(repository, tree, &tag, page).await;
            TaskResult::DestinationPageLoaded { tag, result }
        }
        Task::CopyTemplate { ticket, plan } => {
            let outcome = copy::run(repository, plan).await;
            TaskResult::CopyFinished { ticket, outcome }
        }
    }
}

/// Resolve the tree root, then list `folder` (or the root itself).
pub async fn load_folder(
    repository: &dyn Repository,
    tree: TreeRoot,
    folder: Option<String>,
    options: ListOptions,
) -> FetchResult {
    let root = repository.list_folder_root(tree.clone()).await?;
    let folder_path = folder.unwrap_or_else(|| root.root_path.clone());
    let nodes = repository
        .list_children(tree, folder_path.clone(), options)
        .await?;
    Ok(FetchedFolder {
        root_path: root.root_path,
        folder_path,
        nodes,
    })
}

async fn load_destination_page(
    repository: &dyn Repository,
    tree: TreeRoot,
    tag: &FetchTag,
    page: PageRequest,
) -> FetchResult {
    if tag.search_text.is_empty() {
        let options = ListOptions {
            include_files: false,
            page: Some(page),
        };
        return load_folder(repository, tree, tag.folder.clone(), options).await;
    }

    let root = repository.list_folder_root(tree.clone()).await?;
    let folder_path = tag.folder.clone().unwrap_or_else(|| root.root_path.clone());
    let nodes = repository
        .search_children(tree, folder_path.clone(), tag.search_text.clone(), page)
        .await?;
    Ok(FetchedFolder {
        root_path: root.root_path,
        folder_path,
        nodes,
    })
}
