mod commands;
mod config;
mod logging;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use crate::commands::{
    cmd_clear, cmd_export, cmd_food_add, cmd_food_delete, cmd_food_list, cmd_habit_create,
    cmd_habit_default, cmd_habit_delete, cmd_habit_grid, cmd_habit_hide, cmd_habit_icon,
    cmd_habit_list, cmd_habit_set, cmd_habit_today, cmd_habit_toggle, cmd_habit_unhide,
    cmd_import, cmd_insights, cmd_monthly, cmd_protein_graph, cmd_protein_log, cmd_protein_show,
    cmd_screen_chart, cmd_screen_log, cmd_screen_show, cmd_snippet_save, cmd_snippet_show,
};
use crate::config::Config;
use habitdash_core::service::HabitService;

#[derive(Parser)]
#[command(
    name = "habitdash",
    version,
    about = "Track protein, habits and screen time from the terminal",
    long_about = "Track protein, habits and screen time from the terminal.\n\n\
        Data lives in a local SQLite file; set HABITDASH_DATA_DIR to move it."
)]
struct Cli {
    /// Log debug output to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log and view daily protein intake
    Protein {
        #[command(subcommand)]
        command: ProteinCommands,
    },
    /// Manage the food catalogue
    Food {
        #[command(subcommand)]
        command: FoodCommands,
    },
    /// Manage habits and mark days done
    Habit {
        #[command(subcommand)]
        command: HabitCommands,
    },
    /// Log and chart screen time
    Screen {
        #[command(subcommand)]
        command: ScreenCommands,
    },
    /// Averages, completion and streaks over a window
    Insights {
        /// weekly, last30 or calendar (remembered; default: last used)
        #[arg(short, long)]
        range: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Trailing 30-day summary
    Monthly {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Weekly free-text notes
    Snippet {
        #[command(subcommand)]
        command: SnippetCommands,
    },
    /// Export all data to a JSON backup
    Export {
        /// Output file (default: backup-YYYY-MM-DD.json, `-` for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Import a JSON backup (keys in the file replace stored keys)
    Import {
        /// Path to the backup file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete all stored data
    Clear {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ProteinCommands {
    /// Add servings to a day and save it
    Log {
        /// Foods to add as NAME or NAME:SERVINGS (name or id)
        foods: Vec<String>,
        /// Foods to take servings away from, as NAME or NAME:SERVINGS
        #[arg(short, long)]
        remove: Vec<String>,
        /// Start from an empty day instead of the saved selections
        #[arg(long)]
        replace: bool,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a day's foods and total
    Show {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Protein heatmap
    Graph {
        /// week, month, year or last365 (remembered)
        #[arg(short, long)]
        range: Option<String>,
        /// asc or desc (remembered)
        #[arg(short, long)]
        order: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum FoodCommands {
    /// Add a food to the catalogue
    Add {
        /// Food name
        name: String,
        /// Protein per serving in grams
        #[arg(long)]
        protein: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List or search foods
    List {
        /// Case-insensitive name filter
        #[arg(short, long)]
        search: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a food by ID
    Delete {
        /// Food ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum HabitCommands {
    /// Create a habit
    Create {
        /// Habit name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a habit and all of its history
    Delete {
        /// Habit name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Hide a habit from views, keeping its history
    Hide {
        /// Habit name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a hidden habit again
    Unhide {
        /// Habit name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set or clear a habit's emoji icon
    Icon {
        /// Habit name
        name: String,
        /// Emoji (only the first one is kept)
        icon: Option<String>,
        /// Remove the icon
        #[arg(long)]
        clear: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set or show the default habit
    Default {
        /// Habit name (omit to show the current default)
        name: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List habits with streaks
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Flip a habit's done state for a day
    Toggle {
        /// Habit name
        name: String,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a habit done (or not done with --off) for a day
    Set {
        /// Habit name
        name: String,
        /// Mark as not done
        #[arg(long)]
        off: bool,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Done-grid for a habit (default: the focused habit)
    Grid {
        /// Habit name
        name: Option<String>,
        /// week, month, year or last365 (remembered)
        #[arg(short, long)]
        range: Option<String>,
        /// asc or desc (remembered)
        #[arg(short, long)]
        order: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Visible habits and whether each is done for a day
    Today {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ScreenCommands {
    /// Log screen time for a day (replaces any earlier value)
    Log {
        /// Hours
        hours: u32,
        /// Minutes
        #[arg(default_value = "0")]
        minutes: u32,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show screen time for a day
    Show {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Chart screen time in hours
    Chart {
        /// Number of days (remembered, default 7)
        #[arg(short, long)]
        days: Option<u32>,
        /// End the chart on the Sunday after this week (YYYY-Www)
        #[arg(short, long)]
        week: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum SnippetCommands {
    /// Show the note for a week
    Show {
        /// Week (YYYY-Www, default: this week)
        #[arg(short, long)]
        week: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Save the note for a week (reads stdin when no text is given)
    Save {
        /// Note text
        text: Option<String>,
        /// Week (YYYY-Www, default: this week)
        #[arg(short, long)]
        week: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

#[allow(clippy::too_many_lines)]
fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    tracing::debug!(
        data_dir = %config.data_dir.display(),
        db = %config.db_path.display(),
        "using database"
    );
    let svc = HabitService::new(&config.db_path)?;

    match cli.command {
        Commands::Protein { command } => match command {
            ProteinCommands::Log {
                foods,
                remove,
                replace,
                date,
                json,
            } => cmd_protein_log(&svc, &foods, &remove, replace, date, json),
            ProteinCommands::Show { date, json } => cmd_protein_show(&svc, date, json),
            ProteinCommands::Graph { range, order, json } => {
                cmd_protein_graph(&svc, range.as_deref(), order.as_deref(), json)
            }
        },
        Commands::Food { command } => match command {
            FoodCommands::Add {
                name,
                protein,
                json,
            } => cmd_food_add(&svc, &name, protein, json),
            FoodCommands::List { search, json } => cmd_food_list(&svc, search.as_deref(), json),
            FoodCommands::Delete { id, json } => cmd_food_delete(&svc, id, json),
        },
        Commands::Habit { command } => match command {
            HabitCommands::Create { name, json } => cmd_habit_create(&svc, &name, json),
            HabitCommands::Delete { name, json } => cmd_habit_delete(&svc, &name, json),
            HabitCommands::Hide { name, json } => cmd_habit_hide(&svc, &name, json),
            HabitCommands::Unhide { name, json } => cmd_habit_unhide(&svc, &name, json),
            HabitCommands::Icon {
                name,
                icon,
                clear,
                json,
            } => cmd_habit_icon(&svc, &name, icon.as_deref(), clear, json),
            HabitCommands::Default { name, json } => {
                cmd_habit_default(&svc, name.as_deref(), json)
            }
            HabitCommands::List { json } => cmd_habit_list(&svc, json),
            HabitCommands::Toggle { name, date, json } => {
                cmd_habit_toggle(&svc, &name, date, json)
            }
            HabitCommands::Set {
                name,
                off,
                date,
                json,
            } => cmd_habit_set(&svc, &name, !off, date, json),
            HabitCommands::Grid {
                name,
                range,
                order,
                json,
            } => cmd_habit_grid(
                &svc,
                name.as_deref(),
                range.as_deref(),
                order.as_deref(),
                json,
            ),
            HabitCommands::Today { date, json } => cmd_habit_today(&svc, date, json),
        },
        Commands::Screen { command } => match command {
            ScreenCommands::Log {
                hours,
                minutes,
                date,
                json,
            } => cmd_screen_log(&svc, hours, minutes, date, json),
            ScreenCommands::Show { date, json } => cmd_screen_show(&svc, date, json),
            ScreenCommands::Chart { days, week, json } => {
                cmd_screen_chart(&svc, days, week.as_deref(), json)
            }
        },
        Commands::Insights { range, json } => cmd_insights(&svc, range.as_deref(), json),
        Commands::Monthly { json } => cmd_monthly(&svc, json),
        Commands::Snippet { command } => match command {
            SnippetCommands::Show { week, json } => cmd_snippet_show(&svc, week, json),
            SnippetCommands::Save { text, week, json } => {
                cmd_snippet_save(&svc, week, text, json)
            }
        },
        Commands::Export { output, json } => cmd_export(&svc, output, json),
        Commands::Import { file, json } => cmd_import(&svc, &file, json),
        Commands::Clear { yes, json } => cmd_clear(&svc, yes, json),
    }
}
