use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    pub drivers: Vec<String>,
}

impl Team {
    pub fn new<I, S>(name: impl Into<String>, drivers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { name: name.into(), drivers: drivers.into_iter().map(Into::into).collect() }
    }

    pub fn has_driver(&self, driver: &str) -> bool {
        self.drivers.iter().any(|candidate| candidate == driver)
    }
}

/// Raw driver entry as reported by an external data source.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverRecord {
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl DriverRecord {
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    pub teams: Vec<Team>,
}

impl Roster {
    pub fn new(teams: Vec<Team>) -> Self {
        Self { teams }
    }

    /// Groups driver records by team. Records without a team or a name are
    /// skipped, repeated drivers are kept once, and teams come out sorted by
    /// name.
    pub fn from_driver_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a DriverRecord>,
    {
        let mut teams: Vec<Team> = Vec::new();

        for record in records {
            let Some(team_name) =
                record.team_name.as_deref().map(str::trim).filter(|name| !name.is_empty())
            else {
                continue;
            };
            let driver = record.full_name();
            if driver.is_empty() {
                continue;
            }

            match teams.iter_mut().find(|team| team.name == team_name) {
                Some(team) => {
                    if !team.has_driver(&driver) {
                        team.drivers.push(driver);
                    }
                }
                None => teams.push(Team { name: team_name.to_string(), drivers: vec![driver] }),
            }
        }

        teams.sort_by(|left, right| left.name.cmp(&right.name));
        Self { teams }
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn team(&self, name: &str) -> Option<&Team> {
        self.teams.iter().find(|team| team.name == name)
    }

    pub fn contains(&self, team: &str, driver: &str) -> bool {
        self.team(team).is_some_and(|team| team.has_driver(driver))
    }

    pub fn driver_count(&self) -> usize {
        self.teams.iter().map(|team| team.drivers.len()).sum()
    }
}
