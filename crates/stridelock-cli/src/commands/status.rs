use std::sync::Arc;

use clap::Subcommand;
use stridelock_core::{EvalClock, GateEngine, MovementManager, PrefStore};

#[derive(Subcommand)]
pub enum StatusAction {
    /// Show today's progress and goal
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Preview the gate decision for a package
    Check {
        /// Package identifier (e.g. "com.example.doom")
        package: String,
    },
}

pub fn run(action: StatusAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        StatusAction::Show { json } => {
            let store = super::store()?;
            let prefs = store.load()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&prefs)?);
                return Ok(());
            }
            println!(
                "progress: {} steps / {:.2} km",
                prefs.steps_today, prefs.distance_today_km
            );
            println!("goal:     {} {}", prefs.goal_value, prefs.goal_unit);
            println!("deposit:  {}", prefs.deposit);
            println!(
                "source:   {}",
                prefs.connected_source.as_deref().unwrap_or("device sensors")
            );
            if prefs.emergency_active {
                println!("emergency override active");
            }
        }
        StatusAction::Check { package } => {
            let store = Arc::new(super::store()?);
            let movement = Arc::new(MovementManager::new(store.clone()));
            movement.start()?;
            let engine = GateEngine::new(store, movement);
            let decision = engine.evaluate(&package, &EvalClock::current())?;
            println!("{}", serde_json::to_string(&decision)?);
        }
    }
    Ok(())
}
