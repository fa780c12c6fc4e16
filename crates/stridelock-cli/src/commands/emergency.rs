use chrono::Utc;
use clap::Subcommand;
use stridelock_core::{EmergencyState, PrefStore, EMERGENCY_WINDOW_SECS};

#[derive(Subcommand)]
pub enum EmergencyAction {
    /// Start the 15-minute override window
    Start,
    /// Cancel a running override
    Cancel,
    /// Show the override state
    Status,
}

pub fn run(action: EmergencyAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::store()?;
    let mut prefs = store.load()?;
    let now = Utc::now();
    match action {
        EmergencyAction::Start => {
            EmergencyState::activated_at(now).write_prefs(&mut prefs);
            store.save(&prefs)?;
            println!("emergency override started ({EMERGENCY_WINDOW_SECS}s)");
        }
        EmergencyAction::Cancel => {
            EmergencyState::inactive().write_prefs(&mut prefs);
            store.save(&prefs)?;
            println!("emergency override cancelled");
        }
        EmergencyAction::Status => {
            let state = EmergencyState::from_prefs(&prefs);
            if state.active && !state.expired(now) {
                println!("active, {}s remaining", state.remaining_secs(now));
            } else {
                println!("inactive");
            }
        }
    }
    Ok(())
}
