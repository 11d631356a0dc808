use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "template-copy")]
#[command(about = "Pick a document template and copy it into a folder of another library")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Drive a session line by line from stdin (default)
    Run {
        /// Path to a JSON fixture describing both libraries (built-in sample if omitted)
        #[arg(short, long)]
        fixture: Option<String>,
    },
    /// Execute a command against a fresh session and output the resulting state
    Execute {
        /// Path to a JSON fixture describing both libraries
        #[arg(short, long)]
        fixture: Option<String>,
        /// Command to execute (e.g., "open_templates", "sequence:[open_templates,select_template:a.docx]")
        #[arg(short = 'x', long)]
        command: String,
        /// Output file for the resulting snapshot (defaults to stdout)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Run a headless test script
    Test {
        /// Path to the test script file
        #[arg(short, long)]
        script: String,
        /// Path to a JSON fixture describing both libraries
        #[arg(short, long)]
        fixture: Option<String>,
        /// Maximum time to wait for the session to settle, in seconds
        #[arg(long, default_value = "5")]
        settle_timeout: u64,
        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
    /// Validate a session configuration file
    CheckConfig {
        /// Path to the JSON configuration file
        #[arg(short, long)]
        config: String,
    },
    /// Write the built-in sample fixture as JSON
    SaveFixture {
        /// Output file for the fixture (defaults to stdout)
        #[arg(short, long)]
        output: Option<String>,
    },
}
