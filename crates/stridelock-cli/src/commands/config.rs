use chrono::{NaiveDate, NaiveTime, Weekday};
use clap::Subcommand;
use stridelock_core::PrefStore;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the full enforcement configuration
    Show,
    /// Set the daily blocking window (e.g. "08:00" "22:00")
    Window {
        /// Window start, HH:MM
        start: String,
        /// Window end, HH:MM; before start wraps overnight
        end: String,
    },
    /// Set the control days (e.g. "mon,tue,wed,thu,fri")
    Days {
        /// Comma-separated weekday names
        days: String,
    },
    /// Set the commitment deposit; zero disables enforcement
    Deposit { amount: f64 },
    /// Set the steps-per-kilometre conversion constant
    Stride { steps_per_km: u32 },
    /// Set the trial end date (YYYY-MM-DD), or "none" to clear
    TrialEnd { date: String },
    /// Mark the tutorial as completed
    TutorialDone,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::store()?;
    let mut prefs = store.load()?;
    match action {
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(&prefs.goal_config())?);
            return Ok(());
        }
        ConfigAction::Window { start, end } => {
            prefs.blocking_start = parse_time(&start)?;
            prefs.blocking_end = parse_time(&end)?;
        }
        ConfigAction::Days { days } => {
            let mut parsed = Vec::new();
            for name in days.split(',').filter(|s| !s.is_empty()) {
                let day: Weekday = name
                    .trim()
                    .parse()
                    .map_err(|_| format!("unknown weekday: {name}"))?;
                if !parsed.contains(&day) {
                    parsed.push(day);
                }
            }
            prefs.control_days = parsed;
        }
        ConfigAction::Deposit { amount } => {
            if amount < 0.0 {
                return Err("deposit cannot be negative".into());
            }
            prefs.deposit = amount;
        }
        ConfigAction::Stride { steps_per_km } => {
            if steps_per_km == 0 {
                return Err("steps-per-km must be positive".into());
            }
            prefs.steps_per_km = steps_per_km;
        }
        ConfigAction::TrialEnd { date } => {
            prefs.trial_end_date = if date == "none" {
                None
            } else {
                Some(NaiveDate::parse_from_str(&date, "%Y-%m-%d")?)
            };
        }
        ConfigAction::TutorialDone => {
            prefs.tutorial_completed = true;
        }
    }
    store.save(&prefs)?;
    println!("ok");
    Ok(())
}

fn parse_time(text: &str) -> Result<NaiveTime, Box<dyn std::error::Error>> {
    NaiveTime::parse_from_str(text, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S"))
        .map_err(|_| format!("invalid time: {text} (expected HH:MM)").into())
}
