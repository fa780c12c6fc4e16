use clap::Subcommand;
use stridelock_core::{GoalUnit, PrefStore};

#[derive(Subcommand)]
pub enum GoalAction {
    /// Show the daily goal
    Get,
    /// Set the daily goal
    Set {
        /// Goal value (steps, or kilometres with --unit distance)
        value: f64,
        /// Goal unit: "steps" or "distance"
        #[arg(long, default_value = "steps")]
        unit: String,
    },
}

pub fn run(action: GoalAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::store()?;
    match action {
        GoalAction::Get => {
            let prefs = store.load()?;
            println!("{} {}", prefs.goal_value, prefs.goal_unit);
        }
        GoalAction::Set { value, unit } => {
            if value <= 0.0 {
                return Err("goal must be positive".into());
            }
            let mut prefs = store.load()?;
            prefs.goal_value = value;
            prefs.goal_unit = match unit.as_str() {
                "steps" => GoalUnit::Steps,
                "distance" | "km" => GoalUnit::Distance,
                other => return Err(format!("unknown unit: {other}").into()),
            };
            store.save(&prefs)?;
            println!("ok");
        }
    }
    Ok(())
}
