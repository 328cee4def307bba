use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    #[command(about = "Record interactions on a page and generate a test script")]
    Record {
        #[arg(help = "URL of the page to record")]
        url: String,
        #[arg(short, long, help = "Output dialect (javascript, typescript, playwright)")]
        dialect: Option<String>,
        #[arg(long, help = "Stop automatically after this many seconds")]
        duration: Option<u64>,
        #[arg(short, long, help = "Write the generated script to this file")]
        output: Option<PathBuf>,
        #[arg(long, help = "Save the recording report (JSON) to this file")]
        save: Option<PathBuf>,
        #[arg(long, help = "Directory for step screenshots")]
        artifacts_dir: Option<PathBuf>,
    },

    #[command(about = "Compile a saved recording into a test script")]
    Compile {
        #[arg(help = "Recording report or step array (JSON)")]
        input: PathBuf,
        #[arg(long, help = "Target URL (required for bare step arrays)")]
        url: Option<String>,
        #[arg(short, long, help = "Output dialect (javascript, typescript, playwright)")]
        dialect: Option<String>,
        #[arg(long, help = "Suite name")]
        suite: Option<String>,
        #[arg(long, help = "Test name")]
        name: Option<String>,
        #[arg(short, long, help = "Write the script to this file")]
        output: Option<PathBuf>,
    },

    #[command(about = "Step through a saved recording")]
    Inspect {
        #[arg(help = "Recording report or step array (JSON)")]
        input: PathBuf,
        #[arg(long, help = "Show a single step (0-based index)")]
        step: Option<usize>,
    },

    #[command(about = "List supported script dialects")]
    Dialects,

    #[command(about = "Manage configuration")]
    Config {
        #[command(subcommand)]
        subcommand: ConfigCommand,
    },
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    #[command(about = "Initialize config file with defaults")]
    Init,

    #[command(about = "Show current configuration")]
    Show,

    #[command(about = "Edit configuration file")]
    Edit,

    #[command(about = "Show config file path")]
    Path,
}
