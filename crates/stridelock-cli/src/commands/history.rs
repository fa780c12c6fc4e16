use chrono::{Local, NaiveDate};
use clap::Subcommand;
use stridelock_core::EventLog;

#[derive(Subcommand)]
pub enum HistoryAction {
    /// Show recent block events, newest first
    Recent {
        /// Maximum number of events
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Daily block summary
    Summary {
        /// Day to summarize (YYYY-MM-DD), default today
        #[arg(long)]
        date: Option<String>,
    },
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let log = EventLog::open()?;
    match action {
        HistoryAction::Recent { limit } => {
            for event in log.recent(limit)? {
                println!(
                    "{}  {}  {}  ({} steps / {:.2} km of {} {})",
                    event.at.to_rfc3339(),
                    event.package,
                    event.reason,
                    event.steps,
                    event.distance_km,
                    event.goal_value,
                    event.unit,
                );
            }
        }
        HistoryAction::Summary { date } => {
            let date = match date {
                Some(text) => NaiveDate::parse_from_str(&text, "%Y-%m-%d")?,
                None => Local::now().date_naive(),
            };
            let summary = log.daily_summary(date)?;
            println!(
                "{date}: {} blocks across {} packages",
                summary.blocks, summary.distinct_packages
            );
        }
    }
    Ok(())
}
