use clap::Subcommand;
use stridelock_core::PrefStore;

#[derive(Subcommand)]
pub enum LockAction {
    /// List locked packages
    List,
    /// Add a package to the locked set
    Add {
        /// Package identifier
        package: String,
    },
    /// Remove a package from the locked set
    Remove {
        /// Package identifier
        package: String,
    },
}

pub fn run(action: LockAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::store()?;
    match action {
        LockAction::List => {
            let prefs = store.load()?;
            for package in &prefs.locked_apps {
                println!("{package}");
            }
        }
        LockAction::Add { package } => {
            let mut prefs = store.load()?;
            if prefs.locked_apps.insert(package) {
                store.save(&prefs)?;
            }
            println!("ok");
        }
        LockAction::Remove { package } => {
            let mut prefs = store.load()?;
            if prefs.locked_apps.remove(&package) {
                store.save(&prefs)?;
                println!("ok");
            } else {
                eprintln!("not locked: {package}");
                std::process::exit(1);
            }
        }
    }
    Ok(())
}
