//! todods CLI - a hierarchical to-do list kept in a single JSON file.

use clap::Parser;
use std::cell::Cell;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;
use std::rc::Rc;
use todods::cli::{Cli, Commands, ConfigCommands};
use todods::commands::{self, CommandResult};
use todods::config::{self, ConfigOverrides, OutputFormat, ResolvedConfig};
use todods::storage::TodoStore;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "TODODS_LOG";

/// Configuration in effect for one invocation.
struct Settings {
    config_path: Option<PathBuf>,
    resolved: ResolvedConfig,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut human = cli.human_readable;
    let result = match load_settings(&cli) {
        Ok(settings) => {
            human = settings.resolved.output_format() == OutputFormat::Human;
            run_command(cli.command, &settings, human)
        }
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
        }
        process::exit(1);
    }
}

/// Log to stderr; `TODODS_LOG` takes an `EnvFilter` directive.
///
/// `-v` enables debug output for both the library (`todods`) and this
/// binary (`todo`).
fn init_logging(verbose: bool) {
    let default = if verbose { "todods=debug,todo=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(true)
        .with_level(true)
        .init();
}

fn load_settings(cli: &Cli) -> Result<Settings, todods::Error> {
    let config_path = config::config_path();
    let file_config = match config_path {
        Some(ref path) => config::read_config(path)?,
        None => config::TodoConfig::new(),
    };

    let mut overrides = ConfigOverrides::new();
    if let Some(ref path) = cli.data_file {
        overrides = overrides.with_data_file(path);
    }
    if cli.human_readable {
        overrides = overrides.with_output_format(OutputFormat::Human);
    }

    let resolved = config::resolve_config(&file_config, config_path.as_deref(), &overrides)?;
    debug!(data_file = %resolved.data_file().display(), "resolved configuration");
    Ok(Settings {
        config_path,
        resolved,
    })
}

/// Load the store and log every save it reports.
fn open_store(settings: &Settings) -> TodoStore {
    let mut store = TodoStore::new(settings.resolved.data_file());
    store.load();

    let saves = Rc::new(Cell::new(0u32));
    let seen = Rc::clone(&saves);
    let path = settings.resolved.data_file().display().to_string();
    store.subscribe(move || {
        seen.set(seen.get() + 1);
        info!(path = %path, saves = seen.get(), "to-do file updated");
    });
    store
}

/// Explicit flags win; otherwise the configured default applies.
fn include_completed(settings: &Settings, hide: bool, show: bool) -> bool {
    if hide {
        false
    } else if show {
        true
    } else {
        settings.resolved.show_completed()
    }
}

fn run_command(
    command: Option<Commands>,
    settings: &Settings,
    human: bool,
) -> Result<(), todods::Error> {
    match command {
        Some(Commands::Add { title, due, list }) => {
            let mut store = open_store(settings);
            let result =
                commands::add_task(&mut store, &title, due.as_deref(), list.as_deref())?;
            output(&result, human);
        }

        Some(Commands::AddList { title, list }) => {
            let mut store = open_store(settings);
            let result = commands::add_list(&mut store, &title, list.as_deref())?;
            output(&result, human);
        }

        Some(Commands::List {
            list,
            hide_completed,
            show_completed,
        }) => {
            let store = open_store(settings);
            let include = include_completed(settings, hide_completed, show_completed);
            let result = commands::list(&store, list.as_deref(), include)?;
            output(&result, human);
        }

        Some(Commands::Tree {
            hide_completed,
            show_completed,
        }) => {
            let store = open_store(settings);
            let include = include_completed(settings, hide_completed, show_completed);
            output(&commands::tree(&store, include), human);
        }

        Some(Commands::Quick { limit }) => {
            let store = open_store(settings);
            let limit = limit.unwrap_or_else(|| settings.resolved.quick_view_limit());
            output(&commands::quick(&store, limit), human);
        }

        Some(Commands::Show { id }) => {
            let store = open_store(settings);
            output(&commands::show(&store, &id)?, human);
        }

        Some(Commands::Rename { id, title }) => {
            let mut store = open_store(settings);
            output(&commands::rename(&mut store, &id, &title)?, human);
        }

        Some(Commands::Due { id, when }) => {
            let mut store = open_store(settings);
            output(&commands::set_due(&mut store, &id, &when)?, human);
        }

        Some(Commands::Done { id }) => {
            let mut store = open_store(settings);
            output(&commands::set_completed(&mut store, &id, true)?, human);
        }

        Some(Commands::Undone { id }) => {
            let mut store = open_store(settings);
            output(&commands::set_completed(&mut store, &id, false)?, human);
        }

        Some(Commands::Delete { id, force }) => {
            let mut store = open_store(settings);
            output(&commands::delete(&mut store, &id, force)?, human);
        }

        Some(Commands::Path) => {
            let result = commands::paths(&settings.resolved, settings.config_path.as_deref());
            output(&result, human);
        }

        Some(Commands::Config { command }) => match command {
            ConfigCommands::Show => {
                output(&commands::config_show(&settings.resolved), human);
            }
            ConfigCommands::Init => {
                let path = settings.config_path.as_deref().ok_or_else(|| {
                    todods::Error::Other("Could not determine config directory".to_string())
                })?;
                output(&commands::config_init(path, &settings.resolved)?, human);
            }
        },

        None => {
            let store = open_store(settings);
            let limit = settings.resolved.quick_view_limit();
            output(&commands::quick(&store, limit), human);
        }
    }

    Ok(())
}

fn output<T: CommandResult>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
