use scuderia_core::config::LoadOptions;
use scuderia_db::PickStore;
use tracing::warn;

use crate::commands::{build_runtime, load_config, open_store, CommandResult};

/// Token the operator must pass verbatim to `--confirm`.
pub const CONFIRMATION_TOKEN: &str = "RESET";

pub fn run(options: &LoadOptions, confirm: Option<&str>) -> CommandResult {
    if confirm != Some(CONFIRMATION_TOKEN) {
        return CommandResult::failure(
            "reset",
            "reset_guard",
            format!("refusing to delete picks: pass `--confirm {CONFIRMATION_TOKEN}` to proceed"),
            6,
        );
    }

    let config = match load_config("reset", options) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("reset") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let store = open_store(&config).await?;
        let removed = store.clear().await;
        store.pool().close().await;
        removed.map_err(|error| ("reset_execution", error.to_string(), 5u8))
    });

    match result {
        Ok(removed) => {
            warn!(event_name = "system.reset.completed", removed, "all picks deleted");
            CommandResult::success("reset", format!("deleted {removed} picks"))
        }
        Err(failure) => CommandResult::from_step("reset", failure),
    }
}
