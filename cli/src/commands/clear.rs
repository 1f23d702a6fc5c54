use anyhow::{Result, bail};

use liftfuel_core::service::{ClearScope, LiftfuelService};

use super::helpers::prompt_confirm;

pub(crate) fn cmd_clear(
    svc: &LiftfuelService,
    scope: ClearScope,
    yes: bool,
    json: bool,
) -> Result<()> {
    let what = match scope {
        ClearScope::All => "all stored data",
        ClearScope::Exercises => "all exercises and their sets",
        ClearScope::WorkoutSets => "all recorded sets",
    };

    if !yes {
        if json {
            bail!("Refusing to delete {what} without --yes");
        }
        if !prompt_confirm(&format!("Delete {what}? This cannot be undone."))? {
            eprintln!("Nothing deleted");
            return Ok(());
        }
    }

    svc.clear(scope)?;
    if json {
        println!("{}", serde_json::json!({ "cleared": what }));
    } else {
        println!("Deleted {what}");
    }
    Ok(())
}
