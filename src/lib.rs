pub mod async_task;
pub mod breadcrumb;
pub mod cli;
pub mod command;
pub mod config;
pub mod copy;
pub mod debounce;
pub mod destination_browser;
pub mod error;
pub mod executor;
pub mod fetch;
pub mod file_kind;
pub mod file_name;
pub mod fixture;
pub mod main_lib;
pub mod memory_repository;
pub mod node;
pub mod path_utils;
pub mod repository;
pub mod session;
pub mod snapshot;
pub mod template_browser;
pub mod test_runner;
pub mod url_utils;
