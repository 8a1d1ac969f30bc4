use serde::Serialize;

use scuderia_core::config::LoadOptions;
use scuderia_core::domain::pick::{Pick, PickStats};
use scuderia_db::PickStore;

use crate::commands::{build_runtime, load_config, open_store, CommandResult, StepFailure};

#[derive(Debug, Serialize)]
struct StatsReport<'a> {
    command: &'a str,
    status: &'a str,
    #[serde(flatten)]
    stats: PickStats,
    /// Most recently changed first.
    picks: &'a [Pick],
}

pub fn run(options: &LoadOptions, json: bool) -> CommandResult {
    let config = match load_config("stats", options) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("stats") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let store = open_store(&config).await?;
        let stats = store.stats().await;
        let picks = store.get_picks_by_recency().await;
        store.pool().close().await;

        let stats = stats.map_err(|error| ("stats_query", error.to_string(), 5u8))?;
        let picks = picks.map_err(|error| ("stats_query", error.to_string(), 5u8))?;
        Ok::<_, StepFailure>((stats, picks))
    });

    match result {
        Ok((stats, picks)) if json => CommandResult::report(
            "stats",
            &StatsReport { command: "stats", status: "ok", stats, picks: &picks },
        ),
        Ok((stats, picks)) => CommandResult::success("stats", render_stats(&stats, &picks)),
        Err(failure) => CommandResult::from_step("stats", failure),
    }
}

fn render_stats(stats: &PickStats, picks: &[Pick]) -> String {
    let mut lines = vec![
        format!("Total picks: {}", stats.total_picks),
        format!("Unique teams: {}", stats.unique_teams),
        format!("Unique drivers: {}", stats.unique_drivers),
    ];
    if picks.is_empty() {
        lines.push("No picks recorded.".to_string());
        return lines.join("\n");
    }

    lines.push("Picks (most recent first):".to_string());
    for pick in picks {
        let name = pick.display_name().unwrap_or_else(|| pick.user_id.as_str());
        lines.push(format!(
            "  - {name}: {} / {} (updated {})",
            pick.team,
            pick.driver,
            pick.updated_at.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    lines.join("\n")
}
