use clap::{Parser, Subcommand};

/// Command-line interface definition for rWorktime
/// CLI application to track work-day sessions and the payroll ledger with SQLite
#[derive(Parser)]
#[command(
    name = "rworktime",
    version = env!("CARGO_PKG_VERSION"),
    about = "Work-day session tracker: start, pause, resume and end the day, with a per-day worktime ledger in SQLite",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    /// User the command applies to (default: $USER / $USERNAME)
    #[arg(global = true, long = "user", short = 'u')]
    pub user: Option<String>,

    /// Pretend the current time is this one ("YYYY-MM-DD HH:MM")
    #[arg(global = true, long = "at", value_name = "DATETIME")]
    pub at: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Manage the configuration file (view, edit, check, migrate)
    Config {
        #[arg(long = "print", help = "Print the current configuration file")]
        print_config: bool,

        #[arg(long = "check", help = "Check configuration file for missing fields")]
        check: bool,

        #[arg(long = "migrate", help = "Add missing fields to the configuration file")]
        migrate: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/notepad)"
        )]
        edit_config: bool,

        #[arg(
            long = "editor",
            help = "Specify the editor to use (vim, nano, or custom path)"
        )]
        editor: Option<String>,
    },

    /// Start the work day
    Start,

    /// Start a temporary stop (break)
    Pause,

    /// Resume from a temporary stop, or reopen a day ended today
    Resume,

    /// End the work day
    End {
        /// End time (HH:MM or "YYYY-MM-DD HH:MM"); defaults to now
        #[arg(long = "end", value_name = "TIME")]
        end: Option<String>,

        /// Worked minutes to record instead of the measured ones
        #[arg(long = "minutes", value_name = "MINUTES")]
        minutes: Option<i64>,
    },

    /// End the work day on behalf of the scheduler
    #[command(name = "auto-end")]
    AutoEnd {
        /// Scheduled end (HH:MM or "YYYY-MM-DD HH:MM"); defaults to now
        #[arg(long = "end", value_name = "TIME")]
        end: Option<String>,
    },

    /// Close a worktime entry left open by a crash or a midnight reset
    Resolve {
        /// Work date of the entry (YYYY-MM-DD)
        date: String,

        /// End time (HH:MM on that date, or "YYYY-MM-DD HH:MM"); defaults to now
        #[arg(long = "end", value_name = "TIME")]
        end: Option<String>,
    },

    /// Reset sessions still running from a previous day
    #[command(name = "midnight-reset")]
    MidnightReset,

    /// Show the current session with live totals
    Status,

    /// List worktime entries
    Entries {
        #[arg(
            long,
            short,
            help = "Filter by year/month/day or a range (YYYY-MM-DD:YYYY-MM-DD); default: current month"
        )]
        period: Option<String>,

        #[arg(long = "json", help = "Print entries as JSON")]
        json: bool,
    },

    /// Set the final minutes of a day (administrative edit)
    Finalize {
        /// Work date (YYYY-MM-DD)
        date: String,

        #[arg(long = "worked", value_name = "MINUTES")]
        worked: i64,

        #[arg(long = "overtime", value_name = "MINUTES", default_value_t = 0)]
        overtime: i64,
    },

    /// Print the internal log table
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,

        #[arg(long = "op", help = "Only rows of this operation (start, end, resolve, ...)")]
        operation: Option<String>,
    },
}
