use scuderia_core::domain::pick::{PickSelection, SaveOutcome, UserId};

use crate::repositories::{PickStore, RepositoryError};

/// Canonical leaderboard picks used for demos and local testing.
const SEED_PICKS: &[SeedPick] = &[
    SeedPick {
        user_id: "100000001",
        ea_username: "gcadventure",
        team: "Aston Martin",
        driver: "Fernando Alonso",
    },
    SeedPick {
        user_id: "100000002",
        ea_username: "jphshield23",
        team: "Kick Sauber",
        driver: "Nico Hulkenberg",
    },
    SeedPick {
        user_id: "100000003",
        ea_username: "gacrmomo",
        team: "Aston Martin",
        driver: "Lance Stroll",
    },
    SeedPick {
        user_id: "100000004",
        ea_username: "jamesngoose69",
        team: "Red Bull Racing",
        driver: "Max Verstappen",
    },
    SeedPick {
        user_id: "100000005",
        ea_username: "lotusteve",
        team: "Kick Sauber",
        driver: "Gabriel Bortoleto",
    },
    SeedPick {
        user_id: "100000006",
        ea_username: "greyoak2462",
        team: "McLaren",
        driver: "Oscar Piastri",
    },
    SeedPick {
        user_id: "100000007",
        ea_username: "boonie7474",
        team: "McLaren",
        driver: "Lando Norris",
    },
    SeedPick {
        user_id: "100000008",
        ea_username: "scottyboy2373692",
        team: "Mercedes",
        driver: "George Russell",
    },
];

/// Leaderboard seed dataset.
///
/// Seeding goes through [`PickStore::save`], so a seed whose driver is already
/// owned by a real user is reported as a conflict instead of overwriting it.
pub struct LeaderboardSeed;

impl LeaderboardSeed {
    pub fn picks() -> &'static [SeedPick] {
        SEED_PICKS
    }

    /// Load the seed picks. Running it twice leaves the store unchanged.
    pub async fn load<S>(store: &S) -> Result<SeedResult, RepositoryError>
    where
        S: PickStore + ?Sized,
    {
        let mut result = SeedResult::default();

        for seed in SEED_PICKS {
            let user_id = UserId::new(seed.user_id);
            if let Some(existing) = store.get_user_pick(&user_id).await? {
                if existing.team == seed.team && existing.driver == seed.driver {
                    result.already_present.push(seed.user_id);
                    continue;
                }
            }

            match store.save(seed.selection()).await? {
                SaveOutcome::Accepted(_) => result.seeded.push(seed.user_id),
                SaveOutcome::Rejected(_) => result.conflicted.push(seed.user_id),
            }
        }

        Ok(result)
    }

    /// Verify that every seed pick is stored as defined.
    pub async fn verify<S>(store: &S) -> Result<VerificationResult, RepositoryError>
    where
        S: PickStore + ?Sized,
    {
        let mut checks = Vec::with_capacity(SEED_PICKS.len());

        for seed in SEED_PICKS {
            let stored = store.get_user_pick(&UserId::new(seed.user_id)).await?;
            let matches = stored.is_some_and(|pick| {
                pick.team == seed.team
                    && pick.driver == seed.driver
                    && pick.ea_username.as_deref() == Some(seed.ea_username)
            });
            checks.push((seed.user_id, matches));
        }

        let all_present = checks.iter().all(|(_, present)| *present);
        Ok(VerificationResult { all_present, checks })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SeedPick {
    pub user_id: &'static str,
    pub ea_username: &'static str,
    pub team: &'static str,
    pub driver: &'static str,
}

impl SeedPick {
    pub fn selection(&self) -> PickSelection {
        PickSelection::new(UserId::new(self.user_id), self.team, self.driver)
            .with_ea_username(self.ea_username)
    }
}

#[derive(Debug, Default)]
pub struct SeedResult {
    pub seeded: Vec<&'static str>,
    pub already_present: Vec<&'static str>,
    /// Seed users whose driver was already owned by someone else.
    pub conflicted: Vec<&'static str>,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
