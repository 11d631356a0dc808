use clap::Parser;
use template_copy::cli::{Cli, Commands};
use template_copy::error::{Result, TemplateCopyError};
use template_copy::main_lib;

fn init_logging(verbose: bool) -> Result<()> {
    // Logs go to the file named by TEMPLATE_COPY_LOG so they never mix with command output.
    if let Ok(log_file) = std::env::var("TEMPLATE_COPY_LOG") {
        let target = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)?;

        env_logger::Builder::new()
            .target(env_logger::Target::Pipe(Box::new(target)))
            .filter_level(log::LevelFilter::Debug)
            .try_init()
            .map_err(|e| TemplateCopyError::Generic(e.to_string()))?;
    } else if verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .try_init()
            .map_err(|e| TemplateCopyError::Generic(e.to_string()))?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Run { fixture: None });

    let verbose = matches!(command, Commands::Test { verbose: true, .. });
    init_logging(verbose)?;

    match command {
        Commands::Run { fixture } => main_lib::run_repl(fixture.as_deref()).await,
        Commands::Execute {
            fixture,
            command,
            output,
        } => {
            main_lib::execute_command(fixture.as_deref(), &command, output.as_deref()).await?;
            Ok(())
        }
        Commands::Test {
            script,
            fixture,
            settle_timeout,
            verbose: _,
        } => {
            let result =
                main_lib::run_headless_test(&script, fixture.as_deref(), settle_timeout).await?;
            result.print_summary();

            if !result.success {
                return Err(TemplateCopyError::Generic("Test failed".to_string()));
            }
            Ok(())
        }
        Commands::CheckConfig { config } => {
            main_lib::check_config(&config)?;
            Ok(())
        }
        Commands::SaveFixture { output } => main_lib::save_fixture(output.as_deref()),
    }
}
