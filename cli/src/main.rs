mod commands;
mod config;
mod fdc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    cmd_clear, cmd_exercise_add, cmd_exercise_list, cmd_exercise_rename, cmd_exercise_suggest,
    cmd_food_add, cmd_food_barcode, cmd_food_clear, cmd_food_delete, cmd_food_list,
    cmd_food_recent, cmd_food_search, cmd_food_summary, cmd_goals_set, cmd_goals_show,
    cmd_set_days, cmd_set_delete, cmd_set_list, cmd_set_record, cmd_stats,
};
use crate::config::Config;
use crate::fdc::FdcClient;
use liftfuel_core::service::{ClearScope, LiftfuelService};

#[derive(Parser)]
#[command(
    name = "liftfuel",
    version,
    about = "Track lifts and what fuels them",
    long_about = "Track lifts and what fuels them.\n\nRecords workout sets per exercise, \
                  logs meals from USDA FoodData Central, and shows progress against \
                  daily macro goals."
)]
struct Cli {
    /// Log debug output to stderr (overrides LIFTFUEL_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the exercise list
    Exercise {
        #[command(subcommand)]
        command: ExerciseCommands,
    },
    /// Record and review workout sets
    Set {
        #[command(subcommand)]
        command: SetCommands,
    },
    /// Show max/average weight and recent progress for an exercise
    Stats {
        /// Exercise name
        exercise: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search foods and log meals
    Food {
        #[command(subcommand)]
        command: FoodCommands,
    },
    /// Show or change daily calorie/macro goals
    Goals {
        #[command(subcommand)]
        command: GoalsCommands,
    },
    /// Delete stored data
    Clear {
        #[command(subcommand)]
        command: ClearCommands,
    },
}

#[derive(Subcommand)]
enum ExerciseCommands {
    /// List exercises
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add one or more exercises
    Add {
        /// Exercise names
        #[arg(required = true)]
        names: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rename an exercise (recorded sets follow)
    Rename {
        /// Current name
        name: String,
        /// New name
        new_name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Suggest popular exercises you don't track yet
    Suggest {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum SetCommands {
    /// Record a set
    Record {
        /// Exercise name
        exercise: String,
        /// Repetitions
        reps: u32,
        /// Weight lifted
        weight: f64,
        /// Record even if an identical set was just recorded
        #[arg(short, long)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List sets for an exercise (newest first)
    List {
        /// Exercise name
        exercise: String,
        /// Oldest first
        #[arg(long)]
        oldest_first: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show sets for an exercise grouped by day
    Days {
        /// Exercise name
        exercise: String,
        /// Group by calendar date instead of weekday
        #[arg(long)]
        by_date: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a set by ID
    Delete {
        /// Set ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum FoodCommands {
    /// Search FoodData Central
    Search {
        /// Search query
        query: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Look up a barcode and log it
    Barcode {
        /// UPC/GTIN barcode
        code: String,
        /// Number of servings
        #[arg(short, long, default_value = "1")]
        servings: String,
        /// Pick result N without prompting
        #[arg(long)]
        pick: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search for a food and log it
    Add {
        /// Food name to search for
        query: String,
        /// Number of servings
        #[arg(short, long, default_value = "1")]
        servings: String,
        /// Pick result N without prompting
        #[arg(long)]
        pick: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List logged meals
    List {
        /// Only meals on this date (YYYY-MM-DD or today/yesterday)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a logged meal by ID
    Delete {
        /// Meal ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove all logged meals
    Clear {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show totals against goals
    Summary {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show recent searches
    Recent {
        /// Forget recent searches
        #[arg(long)]
        clear: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum GoalsCommands {
    /// Show daily goals
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set daily goals; omitted values are kept
    Set {
        /// Calories per day
        #[arg(long)]
        calories: Option<f64>,
        /// Protein grams per day
        #[arg(long)]
        protein: Option<f64>,
        /// Carbohydrate grams per day
        #[arg(long)]
        carbs: Option<f64>,
        /// Fat grams per day
        #[arg(long)]
        fat: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ClearCommands {
    /// Delete everything
    All {
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete all exercises and their sets
    Exercises {
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete all recorded sets
    Sets {
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    /// Commands that read exercises or sets. Only these seed the default
    /// exercise and link legacy sets first, so a damaged workout log never
    /// blocks meals, goals, or `clear`.
    fn uses_exercises(&self) -> bool {
        matches!(
            self,
            Commands::Exercise { .. } | Commands::Set { .. } | Commands::Stats { .. }
        )
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("LIFTFUEL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    debug!(data_dir = %config.data_dir.display(), "Using data directory");
    let svc = LiftfuelService::new(&config.db_path)?;
    if cli.command.uses_exercises() {
        svc.load_exercises()?;
    }

    match cli.command {
        Commands::Exercise { command } => match command {
            ExerciseCommands::List { json } => cmd_exercise_list(&svc, json),
            ExerciseCommands::Add { names, json } => cmd_exercise_add(&svc, &names, json),
            ExerciseCommands::Rename {
                name,
                new_name,
                json,
            } => cmd_exercise_rename(&svc, &name, &new_name, json),
            ExerciseCommands::Suggest { json } => cmd_exercise_suggest(&svc, json),
        },
        Commands::Set { command } => match command {
            SetCommands::Record {
                exercise,
                reps,
                weight,
                yes,
                json,
            } => cmd_set_record(&svc, &exercise, reps, weight, yes, json),
            SetCommands::List {
                exercise,
                oldest_first,
                json,
            } => cmd_set_list(&svc, &exercise, oldest_first, json),
            SetCommands::Days {
                exercise,
                by_date,
                json,
            } => cmd_set_days(&svc, &exercise, by_date, json),
            SetCommands::Delete { id, json } => cmd_set_delete(&svc, &id, json),
        },
        Commands::Stats { exercise, json } => cmd_stats(&svc, &exercise, json),
        Commands::Food { command } => {
            let fdc = FdcClient::new(&config.fdc_base_url, &config.fdc_api_key)?;
            match command {
                FoodCommands::Search { query, json } => {
                    cmd_food_search(&svc, &fdc, &query, json).await
                }
                FoodCommands::Barcode {
                    code,
                    servings,
                    pick,
                    json,
                } => cmd_food_barcode(&svc, &fdc, &code, &servings, pick, json).await,
                FoodCommands::Add {
                    query,
                    servings,
                    pick,
                    json,
                } => cmd_food_add(&svc, &fdc, &query, &servings, pick, json).await,
                FoodCommands::List { date, json } => cmd_food_list(&svc, date, json),
                FoodCommands::Delete { id, json } => cmd_food_delete(&svc, &id, json),
                FoodCommands::Clear { json } => cmd_food_clear(&svc, json),
                FoodCommands::Summary { json } => cmd_food_summary(&svc, json),
                FoodCommands::Recent { clear, json } => cmd_food_recent(&svc, clear, json),
            }
        }
        Commands::Goals { command } => match command {
            GoalsCommands::Show { json } => cmd_goals_show(&svc, json),
            GoalsCommands::Set {
                calories,
                protein,
                carbs,
                fat,
                json,
            } => cmd_goals_set(&svc, calories, protein, carbs, fat, json),
        },
        Commands::Clear { command } => match command {
            ClearCommands::All { yes, json } => cmd_clear(&svc, ClearScope::All, yes, json),
            ClearCommands::Exercises { yes, json } => {
                cmd_clear(&svc, ClearScope::Exercises, yes, json)
            }
            ClearCommands::Sets { yes, json } => {
                cmd_clear(&svc, ClearScope::WorkoutSets, yes, json)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_set_record() {
        let cli = Cli::try_parse_from(["liftfuel", "set", "record", "Squat", "5", "102.5", "-y"])
            .unwrap();
        let Commands::Set {
            command:
                SetCommands::Record {
                    exercise,
                    reps,
                    weight,
                    yes,
                    json,
                },
        } = cli.command
        else {
            panic!("expected set record");
        };
        assert_eq!(exercise, "Squat");
        assert_eq!(reps, 5);
        assert!((weight - 102.5).abs() < f64::EPSILON);
        assert!(yes);
        assert!(!json);
    }

    #[test]
    fn test_negative_reps_rejected() {
        assert!(Cli::try_parse_from(["liftfuel", "set", "record", "Squat", "-5", "100"]).is_err());
    }

    #[test]
    fn test_only_workout_commands_load_exercises() {
        let parse = |args: &[&str]| Cli::try_parse_from(args.iter().copied()).unwrap().command;

        assert!(parse(&["liftfuel", "set", "list", "Squat"]).uses_exercises());
        assert!(parse(&["liftfuel", "stats", "Squat"]).uses_exercises());
        assert!(parse(&["liftfuel", "exercise", "list"]).uses_exercises());
        assert!(!parse(&["liftfuel", "clear", "sets", "--yes"]).uses_exercises());
        assert!(!parse(&["liftfuel", "clear", "all", "--yes"]).uses_exercises());
        assert!(!parse(&["liftfuel", "food", "summary"]).uses_exercises());
        assert!(!parse(&["liftfuel", "goals", "show"]).uses_exercises());
    }

    #[test]
    fn test_exercise_add_requires_name() {
        assert!(Cli::try_parse_from(["liftfuel", "exercise", "add"]).is_err());
    }
}
