mod cli;

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use auto_shutdown::settings::log_file_from_env;
use auto_shutdown::{CommandRunner, DryRunRunner, ScheduleManager, Settings, SystemCommandRunner};
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Console plus `auto_shutdown.log`; the returned guard flushes the file on drop.
fn init_logging(verbose: bool, log_file: Option<&Path>) -> Option<WorkerGuard> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let (file_layer, guard) = match log_file.and_then(open_log_file) {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    guard
}

fn open_log_file(path: &Path) -> Option<RollingFileAppender> {
    let file_name = path.file_name()?.to_str()?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    match RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
    {
        Ok(appender) => Some(appender),
        Err(err) => {
            eprintln!("warning: cannot write log file {}: {err}", path.display());
            None
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.verbose, log_file_from_env().as_deref());

    let mut settings = Settings::from_env();
    settings.dry_run |= cli.dry_run;

    let runner: Box<dyn CommandRunner> = if settings.dry_run {
        Box::new(DryRunRunner)
    } else {
        Box::new(
            SystemCommandRunner::new(settings.command_timeout)
                .with_encoding(settings.output_encoding),
        )
    };
    let manager = ScheduleManager::new(runner, settings);

    match cli.command {
        Some(Commands::Create { time, days, once }) => {
            let outcome = manager.create_schedule(days, &time, !once)?;
            if let Some(secs) = outcome.immediate_shutdown_secs {
                println!("Shutdown countdown started: {} second(s) left", secs);
            }
            if outcome.task_installed {
                println!(
                    "Shutdown scheduled for {} (warning starts {} on {})",
                    time,
                    outcome.trigger.time,
                    outcome.trigger.weekdays.day_tokens()
                );
            }
        }
        Some(Commands::Remove) => {
            manager.remove_schedule()?;
            println!("Shutdown schedule cancelled");
        }
        Some(Commands::Status) => {
            if manager.has_active_schedule() {
                println!("Schedule active");
            } else {
                println!("No active schedule");
                return Ok(ExitCode::FAILURE);
            }
        }
        Some(Commands::Config) => match manager.load_config() {
            Some(config) => println!("{}", serde_json::to_string_pretty(&config)?),
            None => println!("No saved schedule"),
        },
        Some(Commands::Completions { shell }) => {
            use clap_complete::{generate, Shell};
            let shell = shell.to_lowercase();
            let shell_enum = match shell.as_str() {
                "bash" => Shell::Bash,
                "zsh" => Shell::Zsh,
                "fish" => Shell::Fish,
                "elvish" => Shell::Elvish,
                "powershell" => Shell::PowerShell,
                _ => {
                    println!("Unsupported shell: {}", shell);
                    return Ok(ExitCode::SUCCESS);
                }
            };
            let mut cmd = Cli::command();
            generate(shell_enum, &mut cmd, "auto-shutdown", &mut std::io::stdout());
        }
        Some(Commands::Info) | None => {
            print!("{}", with_trailing_newline(manager.get_schedule_info()));
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn with_trailing_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}
