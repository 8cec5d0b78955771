mod compose;
mod gate;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use nutrilog_core::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Window sizes offered for statistics
const RECOGNIZED_WINDOWS: [usize; 4] = [3, 7, 10, 30];

#[derive(Parser)]
#[command(name = "nutrilog")]
#[command(about = "Natural-language diet and exercise journal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log more (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up or show the body profile used for BMR
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Analyze a journal entry and store it as the day's log
    Log {
        /// Read the entry from a file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,

        /// Ingest an already-extracted analysis JSON instead of calling the model
        #[arg(long)]
        from_analysis: Option<PathBuf>,
    },

    /// Show averages and projected weight change
    Stats {
        /// Number of most recent days (3, 7, 10 or 30)
        #[arg(long, value_parser = parse_window)]
        window: Option<usize>,
    },

    /// List stored logs, or the daily series for a window
    History {
        /// Number of most recent days (3, 7, 10 or 30)
        #[arg(long, value_parser = parse_window)]
        window: Option<usize>,
    },

    /// Show the full details of one day
    Show {
        /// Date as YYYY-MM-DD
        date: NaiveDate,
    },

    /// Export all logs to CSV
    Export {
        #[arg(long)]
        output: PathBuf,
    },

    /// Print an example journal entry
    Template,
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Create or replace the profile
    Set {
        /// Height in cm
        #[arg(long)]
        height: String,
        /// Weight in kg
        #[arg(long)]
        weight: String,
        /// Age in years
        #[arg(long)]
        age: String,
        /// male or female
        #[arg(long)]
        gender: String,
    },
    /// Print the current profile
    Show,
}

fn parse_window(raw: &str) -> std::result::Result<usize, String> {
    let window: usize = raw
        .parse()
        .map_err(|_| format!("'{}' is not a number", raw))?;
    if RECOGNIZED_WINDOWS.contains(&window) {
        Ok(window)
    } else {
        Err(format!("window must be one of {:?}", RECOGNIZED_WINDOWS))
    }
}

struct Paths {
    data_dir: PathBuf,
    profile: PathBuf,
    logs: PathBuf,
}

impl Paths {
    fn new(data_dir: PathBuf) -> Self {
        Self {
            profile: data_dir.join("profile.json"),
            logs: data_dir.join("logs.json"),
            data_dir,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    nutrilog_core::logging::init(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("Command failed: {:?}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let paths = Paths::new(
        cli.data_dir
            .unwrap_or_else(|| config.data.data_dir.clone()),
    );

    match cli.command {
        Commands::Profile { action } => match action {
            ProfileAction::Set {
                height,
                weight,
                age,
                gender,
            } => cmd_profile_set(&paths, &height, &weight, &age, &gender),
            ProfileAction::Show => cmd_profile_show(&paths),
        },
        Commands::Log {
            file,
            from_analysis,
        } => cmd_log(&paths, &config, file, from_analysis).await,
        Commands::Stats { window } => {
            cmd_stats(&paths, window.unwrap_or_else(|| default_window(&config)))
        }
        Commands::History { window } => cmd_history(&paths, window),
        Commands::Show { date } => cmd_show(&paths, date),
        Commands::Export { output } => cmd_export(&paths, &output),
        Commands::Template => {
            println!("{}", compose::TEMPLATE);
            Ok(())
        }
    }
}

fn default_window(config: &Config) -> usize {
    let window = config.stats.default_window;
    if !RECOGNIZED_WINDOWS.contains(&window) {
        tracing::warn!(
            "Configured window {} is not one of {:?}, using it anyway",
            window,
            RECOGNIZED_WINDOWS
        );
    }
    window
}

fn open_store(paths: &Paths) -> LogStore<JsonFileSink> {
    let (store, outcome) = LogStore::open(JsonFileSink::new(&paths.logs));
    if let LoadOutcome::Recovered { reason } = outcome {
        eprintln!("⚠ Saved logs could not be read ({}).", reason);
        eprintln!("  Starting with an empty history; the old file was kept as logs.json.corrupt");
    }
    store
}

fn require_profile(paths: &Paths) -> Result<UserProfile> {
    UserProfile::load(&paths.profile)?.ok_or(Error::NoProfile)
}

fn cmd_profile_set(
    paths: &Paths,
    height: &str,
    weight: &str,
    age: &str,
    gender: &str,
) -> Result<()> {
    let profile = UserProfile::parse(height, weight, age, gender)?;
    profile.save(&paths.profile)?;

    println!("✓ Profile saved");
    display_profile(&profile);
    Ok(())
}

fn cmd_profile_show(paths: &Paths) -> Result<()> {
    match UserProfile::load(&paths.profile)? {
        Some(profile) => display_profile(&profile),
        None => println!("No profile yet. Run `nutrilog profile set` to get started."),
    }
    Ok(())
}

async fn cmd_log(
    paths: &Paths,
    config: &Config,
    file: Option<PathBuf>,
    from_analysis: Option<PathBuf>,
) -> Result<()> {
    let profile = require_profile(paths)?;

    if let Some(analysis_path) = from_analysis {
        let raw_text = match file {
            Some(path) => std::fs::read_to_string(path)?,
            None => String::new(),
        };
        let contents = std::fs::read_to_string(&analysis_path)?;
        let result = extract::parse_analysis(&contents)?;

        let mut store = open_store(paths);
        let log = ingest_analysis(&mut store, &profile, &raw_text, result)?;
        display_saved(&log);
        return Ok(());
    }

    let raw_text = compose::read_entry(file.as_deref(), &paths.data_dir)?;

    // Held until the log is persisted
    let _gate = gate::AnalysisGate::acquire(&paths.data_dir)?;

    let extractor = match GeminiClient::from_config(&config.extraction) {
        Ok(client) => client,
        Err(e) => return Err(report_failure(paths, &raw_text, e)),
    };

    println!("Analyzing entry...");
    let today = chrono::Local::now().date_naive();
    let mut store = open_store(paths);

    match analyze_and_ingest(&extractor, &mut store, &profile, &raw_text, today).await {
        Ok(log) => {
            compose::clear_draft(&paths.data_dir)?;
            display_saved(&log);
            Ok(())
        }
        Err(Error::Extraction(e)) => Err(report_failure(paths, &raw_text, e)),
        Err(e) => {
            eprintln!("✗ The analysis could not be saved.");
            keep_draft(paths, &raw_text);
            Err(e)
        }
    }
}

/// Tell the user what went wrong and keep their text for a retry
fn report_failure(paths: &Paths, raw_text: &str, error: ExtractionError) -> Error {
    tracing::warn!("Extraction failed: {}", error);
    eprintln!("✗ {}", error.user_message());
    keep_draft(paths, raw_text);
    Error::Extraction(error)
}

fn keep_draft(paths: &Paths, raw_text: &str) {
    match compose::save_draft(&paths.data_dir, raw_text) {
        Ok(path) => eprintln!("  Your entry was saved to {}", path.display()),
        Err(e) => tracing::warn!("Failed to save draft: {}", e),
    }
}

fn cmd_stats(paths: &Paths, window: usize) -> Result<()> {
    let store = open_store(paths);

    let Some(stats) = aggregate(store.all(), window) else {
        println!("No logs yet. Record a day with `nutrilog log`.");
        return Ok(());
    };

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  LAST {} DAYS", window);
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  Based on {} logs", stats.days);
    println!("  Average intake:   {} kcal", stats.avg_calories);
    println!("  Average burn:     {} kcal", stats.avg_burn);
    println!("  Average balance:  {:+} kcal", stats.avg_net);
    println!();
    println!("  Projected weight change: {:+.2} kg", stats.weight_change_kg);
    match stats.trend() {
        Trend::Deficit => println!("  Nice work! With a calorie deficit, weight should go down."),
        Trend::Surplus => println!("  Intake is above expenditure, weight is expected to go up."),
    }
    println!();
    Ok(())
}

fn cmd_history(paths: &Paths, window: Option<usize>) -> Result<()> {
    let store = open_store(paths);

    if store.is_empty() {
        println!("No logs yet.");
        return Ok(());
    }

    if let Some(window) = window {
        println!("{:<12} {:>8} {:>8} {:>8}", "date", "intake", "burn", "net");
        for point in daily_series(store.all(), window) {
            println!(
                "{:<12} {:>8.0} {:>8.0} {:>+8.0}",
                point.date, point.intake, point.burn, point.net
            );
        }
        return Ok(());
    }

    for log in store.all() {
        println!(
            "{}  {:>+6.0} net  {:>6.0} kcal in  P {:.0}g  C {:.0}g  F {:.0}g",
            log.date,
            log.net_calories,
            log.intake.calories,
            log.intake.protein,
            log.intake.carbs,
            log.intake.fat
        );
        if !log.exercise.is_empty() {
            let activities: Vec<&str> = log.exercise.iter().map(|e| e.description.as_str()).collect();
            println!("            {}", activities.join(", "));
        }
    }
    Ok(())
}

fn cmd_show(paths: &Paths, date: NaiveDate) -> Result<()> {
    let store = open_store(paths);
    let log = store
        .get(date)
        .ok_or_else(|| Error::Other(format!("No log recorded for {}", date)))?;

    display_log(log);
    Ok(())
}

fn cmd_export(paths: &Paths, output: &Path) -> Result<()> {
    let store = open_store(paths);
    let count = export_csv(store.all(), output)?;

    println!("✓ Exported {} logs", count);
    println!("  CSV: {}", output.display());
    Ok(())
}

fn display_profile(profile: &UserProfile) {
    println!("  Gender: {}", profile.gender);
    println!("  Height: {} cm", profile.height);
    println!("  Weight: {} kg", profile.weight);
    println!("  Age:    {}", profile.age);
    println!("  BMR:    {} kcal/day", profile.bmr);
}

fn display_saved(log: &DailyLog) {
    println!("\n✓ Log saved for {}", log.date);
    println!(
        "  {:.0} kcal in, {:.0} kcal burned, {:+.0} net",
        log.intake.calories, log.total_burned, log.net_calories
    );
    for suggestion in &log.suggestions {
        println!("  → {}", suggestion);
    }
}

fn display_log(log: &DailyLog) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}", log.date);
    println!("╰─────────────────────────────────────────╯");
    println!("  Net calories: {:+.0} kcal", log.net_calories);
    println!();

    if !log.meals.is_empty() {
        println!(
            "  {:<12} {:>8} {:>8} {:>8} {:>8}  items",
            "meal", "kcal", "protein", "fat", "carbs"
        );
        for meal in &log.meals {
            println!(
                "  {:<12} {:>8.0} {:>8.1} {:>8.1} {:>8.1}  {}",
                meal.meal_type,
                meal.nutrition.calories,
                meal.nutrition.protein,
                meal.nutrition.fat,
                meal.nutrition.carbs,
                meal.items
            );
        }
    }
    println!(
        "  {:<12} {:>8.0} {:>8.1} {:>8.1} {:>8.1}",
        "total", log.intake.calories, log.intake.protein, log.intake.fat, log.intake.carbs
    );
    println!(
        "  Fiber {:.1} g, sodium {:.0} mg",
        log.intake.fiber, log.intake.sodium
    );
    println!();

    println!("  Exercise:");
    if log.exercise.is_empty() {
        println!("    (none)");
    }
    for entry in &log.exercise {
        println!("    {} ({:.0} kcal)", entry.description, entry.calories_burned);
    }
    println!("  Total burned: {:.0} kcal (including BMR)", log.total_burned);

    if !log.suggestions.is_empty() {
        println!();
        println!("  Suggestions:");
        for suggestion in &log.suggestions {
            println!("    → {}", suggestion);
        }
    }

    if !log.notes.is_empty() {
        println!();
        println!("  Notes: {}", log.notes);
    }

    println!();
    println!("  Entry:");
    for line in log.raw_text.lines() {
        println!("    {}", line);
    }
    println!();
}
