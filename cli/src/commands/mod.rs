mod clear;
mod exercise;
mod food;
mod goals;
mod helpers;
mod set;

use anyhow::{Result, bail};
use std::future::Future;
use tracing::info;

pub(crate) use clear::cmd_clear;
pub(crate) use exercise::{
    cmd_exercise_add, cmd_exercise_list, cmd_exercise_rename, cmd_exercise_suggest,
};
pub(crate) use food::{
    cmd_food_add, cmd_food_barcode, cmd_food_clear, cmd_food_delete, cmd_food_list,
    cmd_food_recent, cmd_food_search, cmd_food_summary,
};
pub(crate) use goals::{cmd_goals_set, cmd_goals_show};
pub(crate) use set::{cmd_set_days, cmd_set_delete, cmd_set_list, cmd_set_record, cmd_stats};

/// Run `fut` until it finishes or the user hits Ctrl-C. A cancelled future is
/// dropped, so an in-flight request is abandoned without touching state.
pub(super) async fn cancellable<F: Future>(fut: F) -> Result<F::Output> {
    tokio::select! {
        out = fut => Ok(out),
        _ = tokio::signal::ctrl_c() => {
            info!("Cancelled by user");
            bail!("Cancelled")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancellable_passes_output_through() {
        let out = cancellable(async { 41 + 1 }).await.unwrap();
        assert_eq!(out, 42);
    }
}
