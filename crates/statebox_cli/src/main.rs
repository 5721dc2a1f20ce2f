//! Command-line driver for the store layer.
//!
//! # Responsibility
//! - Build `AppStores` from `STATEBOX_*` environment configuration.
//! - Apply one command from argv and print the resulting state as JSON.
//!
//! Without `STATEBOX_DB_PATH` every run starts from defaults.

use clap::{Parser, Subcommand, ValueEnum};
use log::error;
use statebox_core::{core_version, init_logging, AppStores, CoreConfig, Theme};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "statebox_cli")]
#[command(about = "Inspect and mutate statebox stores", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the core library version
    Version,

    /// Manage the persisted task list
    Tasks {
        #[command(subcommand)]
        command: TaskCommand,
    },

    /// Manage the persisted user preferences
    Prefs {
        #[command(subcommand)]
        command: PrefsCommand,
    },

    /// Apply counter steps in order (the counter is not persisted)
    Counter {
        #[arg(value_enum, required = true, value_name = "STEP")]
        steps: Vec<CounterStep>,
    },
}

#[derive(Subcommand, Debug)]
enum TaskCommand {
    /// Print the task list
    List,

    /// Remove every completed task
    Clear,

    /// Append a task; words are joined with single spaces
    Add {
        #[arg(required = true, num_args = 1.., value_name = "TITLE")]
        title: Vec<String>,
    },

    /// Flip the completed flag of a task
    Toggle {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Remove a task
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum PrefsCommand {
    /// Print the current preferences
    Show,

    /// Flip the notifications flag
    Notifications,

    /// Set the colour theme
    Theme {
        #[arg(value_enum, value_name = "THEME")]
        theme: ThemeArg,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ThemeArg {
    Light,
    Dark,
    System,
}

impl From<ThemeArg> for Theme {
    fn from(value: ThemeArg) -> Self {
        match value {
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
            ThemeArg::System => Theme::System,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum CounterStep {
    Increment,
    Decrement,
    Reset,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli.command) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<String, String> {
    if let Commands::Version = command {
        return Ok(format!("statebox_core version={}", core_version()));
    }

    let config = CoreConfig::from_env().map_err(|err| err.to_string())?;
    if config.logging.log_dir.is_some() {
        init_logging(&config.logging).map_err(|err| err.to_string())?;
    }
    let stores = AppStores::open(&config).map_err(|err| {
        error!("event=cli_open module=cli status=error error={err}");
        format!("failed to open storage: {err}")
    })?;
    execute(&stores, command)
}

fn execute(stores: &AppStores, command: Commands) -> Result<String, String> {
    match command {
        Commands::Version => Ok(format!("statebox_core version={}", core_version())),
        Commands::Tasks { command } => run_tasks(stores, command),
        Commands::Prefs { command } => run_prefs(stores, command),
        Commands::Counter { steps } => run_counter(stores, &steps),
    }
}

fn run_tasks(stores: &AppStores, command: TaskCommand) -> Result<String, String> {
    let tasks = &stores.tasks;
    match command {
        TaskCommand::List => {}
        TaskCommand::Clear => tasks.clear_completed(),
        TaskCommand::Add { title } => {
            let title = title.join(" ");
            let title = title.trim();
            if title.is_empty() {
                return Err("task title must not be blank".to_string());
            }
            tasks.add_task(title);
        }
        TaskCommand::Toggle { id } => tasks.toggle_task(&id),
        TaskCommand::Delete { id } => tasks.delete_task(&id),
    }
    to_json(&*tasks.get_state())
}

fn run_prefs(stores: &AppStores, command: PrefsCommand) -> Result<String, String> {
    let preferences = &stores.preferences;
    match command {
        PrefsCommand::Show => {}
        PrefsCommand::Notifications => preferences.toggle_notifications(),
        PrefsCommand::Theme { theme } => preferences.set_theme(theme.into()),
    }
    to_json(&*preferences.get_state())
}

// The counter is volatile, so steps are applied in sequence within one run.
fn run_counter(stores: &AppStores, steps: &[CounterStep]) -> Result<String, String> {
    let counter = &stores.counter;
    for step in steps {
        match step {
            CounterStep::Increment => counter.increment(),
            CounterStep::Decrement => counter.decrement(),
            CounterStep::Reset => counter.reset(),
        }
    }
    to_json(&*counter.get_state())
}

fn to_json(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|err| err.to_string())
}
