use scuderia_core::config::LoadOptions;
use tracing::info;

use crate::commands::{build_runtime, load_config, open_store, CommandResult};

pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match load_config("migrate", options) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("migrate") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let store = open_store(&config).await?;
        store.pool().close().await;
        Ok::<(), crate::commands::StepFailure>(())
    });

    match result {
        Ok(()) => {
            info!(event_name = "system.migrate.completed", "migrations applied");
            CommandResult::success("migrate", "applied pending migrations")
        }
        Err(failure) => CommandResult::from_step("migrate", failure),
    }
}
