//! CLI argument definitions for todods.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Long version string with build metadata.
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("TODODS_GIT_COMMIT"),
    ", built ",
    env!("TODODS_BUILD_TIMESTAMP"),
    ")"
);

/// todods - a hierarchical to-do list.
///
/// Tasks live in lists, lists can nest, and everything is kept in one JSON file.
/// Start with `todo tree` to see what is there.
#[derive(Parser, Debug)]
#[command(name = "todo")]
#[command(author, version, long_version = LONG_VERSION, about = "A hierarchical to-do list kept in a single JSON file", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Use this to-do file instead of the configured one.
    /// Can also be set via TODODS_DATA_FILE environment variable.
    #[arg(short = 'f', long = "file", global = true)]
    pub data_file: Option<PathBuf>,

    /// Log debug details to stderr (TODODS_LOG takes precedence)
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a task
    Add {
        /// Task title
        title: String,

        /// Due time: YYYY-MM-DD [HH:MM], YYYY/MM/DD [HH:MM], or RFC 3339
        #[arg(short, long)]
        due: Option<String>,

        /// List to add the task to. A task ID means "next to that task".
        #[arg(short, long)]
        list: Option<String>,
    },

    /// Add a list
    AddList {
        /// List title
        title: String,

        /// List to nest the new list in. A task ID means "next to that task".
        #[arg(short, long)]
        list: Option<String>,
    },

    /// Show the items of one list (the top level by default)
    List {
        /// List ID
        #[arg(short, long)]
        list: Option<String>,

        /// Hide completed tasks
        #[arg(long)]
        hide_completed: bool,

        /// Show completed tasks even if config hides them
        #[arg(long, conflicts_with = "hide_completed")]
        show_completed: bool,
    },

    /// Show the whole tree
    Tree {
        /// Hide completed tasks
        #[arg(long)]
        hide_completed: bool,

        /// Show completed tasks even if config hides them
        #[arg(long, conflicts_with = "hide_completed")]
        show_completed: bool,
    },

    /// Show the next open tasks across all lists
    Quick {
        /// Maximum number of tasks (default from config, else 8)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Show an item by ID
    Show {
        /// Item ID
        id: String,
    },

    /// Change an item's title
    Rename {
        /// Item ID
        id: String,

        /// New title
        title: String,
    },

    /// Set or clear a task's due time
    Due {
        /// Task ID
        id: String,

        /// Due time (YYYY-MM-DD [HH:MM], YYYY/MM/DD [HH:MM], RFC 3339) or "none"
        when: String,
    },

    /// Mark a task as completed
    Done {
        /// Task ID
        id: String,
    },

    /// Mark a task as not completed
    Undone {
        /// Task ID
        id: String,
    },

    /// Delete an item (a list is deleted with everything in it)
    Delete {
        /// Item ID
        id: String,

        /// Required to delete a list that still has items
        #[arg(long)]
        force: bool,
    },

    /// Show where data and config are read from
    Path,

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show resolved configuration with value sources
    Show,

    /// Write a config.kdl with the current effective settings if none exists
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add_with_options() {
        let cli = Cli::parse_from(["todo", "-H", "add", "Report", "--due", "2024-05-02", "--list", "42"]);
        assert!(cli.human_readable);
        match cli.command {
            Some(Commands::Add { title, due, list }) => {
                assert_eq!(title, "Report");
                assert_eq!(due.as_deref(), Some("2024-05-02"));
                assert_eq!(list.as_deref(), Some("42"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["todo", "tree", "--file", "/tmp/t.json", "-H"]);
        assert!(cli.human_readable);
        assert_eq!(cli.data_file, Some(PathBuf::from("/tmp/t.json")));
    }

    #[test]
    fn test_show_and_hide_completed_conflict() {
        assert!(Cli::try_parse_from(["todo", "list", "--hide-completed", "--show-completed"]).is_err());
    }
}
