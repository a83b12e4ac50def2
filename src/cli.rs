use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Print the scheduler commands instead of running them
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Schedule a shutdown at TIME on the given weekdays
    Create {
        #[arg(value_name = "HH:MM")]
        time: String,
        /// ISO weekdays, 1 = Monday ... 7 = Sunday
        #[arg(
            short,
            long,
            value_name = "DAYS",
            value_delimiter = ',',
            required = true,
            allow_negative_numbers = true
        )]
        days: Vec<i64>,
        /// Shut down once instead of every week
        #[arg(long)]
        once: bool,
    },
    /// Cancel the scheduled shutdown and any running countdown
    Remove,
    /// Show the scheduled task as reported by the OS
    Info,
    /// Exit with status 0 if a shutdown task is registered, 1 otherwise
    Status,
    /// Show the last saved schedule settings
    Config,
    /// Generate shell completions
    Completions {
        #[arg(value_name = "SHELL")]
        shell: String,
    },
}
