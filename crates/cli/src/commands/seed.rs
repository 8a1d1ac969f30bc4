use scuderia_core::config::LoadOptions;
use scuderia_db::{LeaderboardSeed, SeedResult, SqlPickStore, VerificationResult};
use tracing::info;

use crate::commands::{build_runtime, load_config, open_store, CommandResult, StepFailure};

pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match load_config("seed", options) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("seed") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let store = open_store(&config).await?;
        let outcome = seed_and_verify(&store).await;
        store.pool().close().await;
        outcome
    });

    match result {
        Ok(seeded) => {
            info!(
                event_name = "system.seed.completed",
                seeded = seeded.seeded.len(),
                already_present = seeded.already_present.len(),
                "seed picks loaded"
            );
            CommandResult::success("seed", summary_message(&seeded))
        }
        Err(failure) => CommandResult::from_step("seed", failure),
    }
}

async fn seed_and_verify(store: &SqlPickStore) -> Result<SeedResult, StepFailure> {
    let loaded = LeaderboardSeed::load(store)
        .await
        .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;
    let verification = LeaderboardSeed::verify(store)
        .await
        .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;
    check_verification(&loaded, &verification)?;
    Ok(loaded)
}

fn check_verification(
    loaded: &SeedResult,
    verification: &VerificationResult,
) -> Result<(), StepFailure> {
    if verification.all_present {
        return Ok(());
    }

    let failed_checks = verification
        .checks
        .iter()
        .filter_map(|(check, passed)| (!passed).then_some(*check))
        .collect::<Vec<_>>();
    let mut message = if failed_checks.is_empty() {
        "Some seed picks failed to load".to_string()
    } else {
        format!("Seed verification failed for users: {}", failed_checks.join(", "))
    };
    if !loaded.conflicted.is_empty() {
        message.push_str(" (driver already claimed by another user)");
    }
    Err(("seed_verification", message, 6u8))
}

fn summary_message(result: &SeedResult) -> String {
    let lines = LeaderboardSeed::picks()
        .iter()
        .map(|seed| {
            format!(
                "  - {} ({}): {} / {}",
                seed.ea_username, seed.user_id, seed.team, seed.driver
            )
        })
        .collect::<Vec<_>>();
    format!(
        "Leaderboard seed loaded: {} new, {} already present\n{}",
        result.seeded.len(),
        result.already_present.len(),
        lines.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use scuderia_db::{SeedResult, VerificationResult};

    use super::check_verification;

    #[test]
    fn verification_error_message_targets_failed_users() {
        let loaded = SeedResult { conflicted: vec!["100000007"], ..SeedResult::default() };
        let verification = VerificationResult {
            all_present: false,
            checks: vec![("100000001", true), ("100000007", false)],
        };

        let (error_class, message, exit_code) =
            check_verification(&loaded, &verification).expect_err("must fail");
        assert_eq!(error_class, "seed_verification");
        assert_eq!(exit_code, 6);
        assert_eq!(
            message,
            "Seed verification failed for users: 100000007 (driver already claimed by another user)"
        );
    }

    #[test]
    fn complete_verification_passes() {
        let verification =
            VerificationResult { all_present: true, checks: vec![("100000001", true)] };
        assert!(check_verification(&SeedResult::default(), &verification).is_ok());
    }
}
