use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use scuderia_bot::roster::{live_roster_source, RosterError, RosterSource};
use scuderia_core::availability::{
    compute_available, summarize, AvailabilitySummary, TeamAvailability,
};
use scuderia_core::config::{LoadOptions, RosterConfig};
use scuderia_core::domain::roster::Roster;
use scuderia_core::errors::ApplicationError;
use scuderia_db::PickStore;

use crate::commands::{build_runtime, load_config, open_store, CommandResult, StepFailure};

/// Reads a roster file shaped as `[{"name": "...", "drivers": ["..."]}]`.
pub fn read_roster(path: &Path) -> Result<Roster> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read roster file `{}`", path.display()))?;
    let roster: Roster = serde_json::from_str(&raw)
        .with_context(|| format!("could not parse roster file `{}`", path.display()))?;
    if roster.is_empty() {
        anyhow::bail!("roster file `{}` lists no teams", path.display());
    }
    Ok(roster)
}

/// Without a roster file the configured live roster is fetched.
pub fn run(options: &LoadOptions, roster_path: Option<&Path>) -> CommandResult {
    let file_roster = match roster_path.map(read_roster).transpose() {
        Ok(roster) => roster,
        Err(error) => {
            return CommandResult::failure("available", "roster_input", format!("{error:#}"), 2)
        }
    };
    let config = match load_config("available", options) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("available") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let roster = match file_roster {
            Some(roster) => roster,
            None => fetch_live_roster(&config.roster).await?,
        };
        let store = open_store(&config).await?;
        let selected = store.get_selected_drivers().await;
        store.pool().close().await;
        let selected =
            selected.map_err(|error| ("availability_query", error.to_string(), 5u8))?;
        Ok::<_, StepFailure>((roster, selected))
    });

    match result {
        Ok((roster, selected)) => {
            let teams = compute_available(&roster, &selected);
            let summary = summarize(&roster, &selected);
            CommandResult::success("available", render_availability(&summary, &teams))
        }
        Err(failure) => CommandResult::from_step("available", failure),
    }
}

async fn fetch_live_roster(config: &RosterConfig) -> Result<Roster, StepFailure> {
    let source = live_roster_source(config).map_err(roster_fetch_failure)?;
    let roster = source.roster().await.map_err(roster_fetch_failure)?;
    if roster.is_empty() {
        return Err((
            "roster_fetch",
            format!("live roster for {} {} lists no teams", config.year, config.country_name),
            3u8,
        ));
    }
    info!(
        event_name = "system.roster.loaded",
        teams = roster.teams.len(),
        drivers = roster.driver_count(),
        "live roster loaded"
    );
    Ok(roster)
}

fn roster_fetch_failure(error: RosterError) -> StepFailure {
    ("roster_fetch", ApplicationError::from(error).to_string(), 3u8)
}

fn render_availability(summary: &AvailabilitySummary, teams: &[TeamAvailability]) -> String {
    let mut lines = vec![format!(
        "{} of {} drivers available ({} taken)",
        summary.available_drivers, summary.total_drivers, summary.taken_drivers
    )];
    if teams.is_empty() {
        lines.push("All drivers have been taken.".to_string());
    }
    for team in teams {
        lines.push(format!(
            "  - {} ({}): {}",
            team.team,
            team.available_count,
            team.available_drivers.join(", ")
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::fs;

    use scuderia_core::availability::{compute_available, summarize};

    use super::{read_roster, render_availability};

    #[test]
    fn reads_roster_file_and_renders_remaining_drivers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("roster.json");
        fs::write(
            &path,
            r#"[{"name": "Ferrari", "drivers": ["Charles Leclerc", "Lewis Hamilton"]},
                {"name": "Haas F1 Team", "drivers": ["Esteban Ocon"]}]"#,
        )
        .expect("write roster");

        let roster = read_roster(&path).expect("roster");
        let selected: HashSet<String> = ["Esteban Ocon".to_string()].into_iter().collect();
        let rendered = render_availability(
            &summarize(&roster, &selected),
            &compute_available(&roster, &selected),
        );

        assert_eq!(
            rendered,
            "2 of 3 drivers available (1 taken)\n  - Ferrari (2): Charles Leclerc, Lewis Hamilton"
        );
    }

    #[test]
    fn rejects_missing_or_empty_roster_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = read_roster(&dir.path().join("missing.json")).expect_err("missing");
        assert!(missing.to_string().contains("could not read roster file"));

        let empty = dir.path().join("empty.json");
        fs::write(&empty, "[]").expect("write");
        let error = read_roster(&empty).expect_err("empty");
        assert!(error.to_string().contains("lists no teams"));
    }
}
