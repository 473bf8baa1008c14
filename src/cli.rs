// src/cli.rs
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(author, version, about = "A CLI tool to log gym sets per profile", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Print `list` and `catalog list` output as CSV instead of tables
    #[arg(long, global = true)]
    pub export_csv: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewCli {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AvatarCli {
    Lifter,
    Runner,
    Cyclist,
    Swimmer,
    Boxer,
    Climber,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage profiles
    #[command(subcommand)]
    Profile(ProfileCommands),
    /// Log, edit or delete sets on the active profile
    #[command(subcommand)]
    Log(LogCommands),
    /// Show the active profile's history grouped by period
    List {
        /// Period to group by (defaults to `default_view` from the config)
        #[arg(short, long, value_enum)]
        view: Option<ViewCli>,
    },
    /// Show the exercise catalog
    #[command(subcommand)]
    Catalog(CatalogCommands),
    /// Manage catalog categories
    #[command(subcommand)]
    Category(CategoryCommands),
    /// Manage exercises within a category
    #[command(subcommand)]
    Exercise(ExerciseCommands),
    /// Set the view `list` uses when none is given
    SetDefaultView {
        #[arg(value_enum)]
        view: ViewCli,
    },
    /// Show the path to the data file
    DataPath,
    /// Show the path to the config file
    ConfigPath,
    /// Generate shell completion scripts
    GenerateCompletion {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// List profiles; the active one is marked
    List,
    /// Create a profile
    Add {
        name: String,
        #[arg(short, long, value_enum)]
        avatar: Option<AvatarCli>,
    },
    /// Rename a profile or change its avatar
    Edit {
        id: i64,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long, value_enum)]
        avatar: Option<AvatarCli>,
    },
    /// Delete a profile and all of its sets
    Delete {
        id: i64,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Make a profile the active one
    Switch { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum LogCommands {
    /// Log one set dated today
    Add {
        /// Name of the exercise (e.g., "Squat")
        #[arg(short, long)]
        exercise: String,
        /// Category for an exercise not yet in the catalog
        #[arg(short, long)]
        category: Option<String>,
        /// Weight lifted, 0 to 1000 with up to two decimals
        #[arg(short, long)]
        weight: String,
        /// Number of repetitions
        #[arg(short, long)]
        reps: String,
        #[arg(short, long, default_value = "")]
        note: String,
    },
    /// Change weight, reps or note of a set
    Edit {
        id: i64,
        #[arg(short, long)]
        weight: Option<String>,
        #[arg(short, long)]
        reps: Option<String>,
        #[arg(short, long)]
        note: Option<String>,
    },
    /// Delete a set
    Delete {
        id: i64,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum CatalogCommands {
    /// List categories and their exercises
    List,
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    Add {
        name: String,
    },
    Rename {
        old: String,
        new: String,
    },
    /// Delete a category with its exercises; logged sets are kept
    Delete {
        name: String,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ExerciseCommands {
    Add {
        #[arg(short, long)]
        category: String,
        name: String,
    },
    /// Rename an exercise in the catalog; logged sets keep the old name
    Rename {
        #[arg(short, long)]
        category: String,
        old: String,
        new: String,
    },
    Delete {
        #[arg(short, long)]
        category: String,
        name: String,
        #[arg(long)]
        yes: bool,
    },
}

// Function to parse CLI arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

// Needed by clap_complete
pub fn build_cli_command() -> clap::Command {
    Cli::command()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn log_add_parses_short_flags() {
        let cli = Cli::try_parse_from([
            "gym-tracker", "log", "add", "-e", "Squat", "-w", "100", "-r", "5",
        ])
        .unwrap();
        match cli.command {
            Commands::Log(LogCommands::Add {
                exercise,
                category,
                weight,
                reps,
                note,
            }) => {
                assert_eq!(exercise, "Squat");
                assert_eq!(category, None);
                assert_eq!(weight, "100");
                assert_eq!(reps, "5");
                assert_eq!(note, "");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn export_csv_is_global() {
        let cli = Cli::try_parse_from(["gym-tracker", "list", "--view", "weekly", "--export-csv"])
            .unwrap();
        assert!(cli.export_csv);
        assert!(matches!(
            cli.command,
            Commands::List {
                view: Some(ViewCli::Weekly)
            }
        ));
    }
}
