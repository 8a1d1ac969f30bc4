//! Availability of roster drivers given the drivers already picked.

use std::collections::HashSet;

use serde::Serialize;

use crate::domain::roster::{Roster, Team};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TeamAvailability {
    pub team: String,
    pub available_count: usize,
    pub available_drivers: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AvailabilitySummary {
    pub total_drivers: usize,
    pub taken_drivers: usize,
    pub available_drivers: usize,
}

/// Teams that still have at least one selectable driver, in roster order.
/// A team whose drivers are all taken is left out entirely.
pub fn compute_available(roster: &Roster, selected: &HashSet<String>) -> Vec<TeamAvailability> {
    roster.teams.iter().filter_map(|team| available_for_team(team, selected)).collect()
}

pub fn team_availability(
    roster: &Roster,
    team: &str,
    selected: &HashSet<String>,
) -> Option<TeamAvailability> {
    roster.team(team).and_then(|team| available_for_team(team, selected))
}

/// Counts only drivers that appear in the roster; picks of drivers that
/// dropped off the roster do not reduce availability.
pub fn summarize(roster: &Roster, selected: &HashSet<String>) -> AvailabilitySummary {
    let total_drivers = roster.driver_count();
    let taken_drivers = roster
        .teams
        .iter()
        .flat_map(|team| team.drivers.iter())
        .filter(|driver| selected.contains(*driver))
        .count();

    AvailabilitySummary {
        total_drivers,
        taken_drivers,
        available_drivers: total_drivers - taken_drivers,
    }
}

fn available_for_team(team: &Team, selected: &HashSet<String>) -> Option<TeamAvailability> {
    let available_drivers: Vec<String> =
        team.drivers.iter().filter(|driver| !selected.contains(*driver)).cloned().collect();

    if available_drivers.is_empty() {
        return None;
    }

    Some(TeamAvailability {
        team: team.name.clone(),
        available_count: available_drivers.len(),
        available_drivers,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{compute_available, summarize, team_availability, TeamAvailability};
    use crate::domain::roster::{Roster, Team};

    fn roster() -> Roster {
        Roster::new(vec![
            Team::new("Red Bull", ["Verstappen", "Perez"]),
            Team::new("Ferrari", ["Leclerc", "Sainz"]),
        ])
    }

    fn selected(drivers: &[&str]) -> HashSet<String> {
        drivers.iter().map(|driver| driver.to_string()).collect()
    }

    #[test]
    fn filters_selected_drivers_and_preserves_order() {
        let result = compute_available(&roster(), &selected(&["Verstappen", "Leclerc"]));

        assert_eq!(
            result,
            vec![
                TeamAvailability {
                    team: "Red Bull".to_string(),
                    available_count: 1,
                    available_drivers: vec!["Perez".to_string()],
                },
                TeamAvailability {
                    team: "Ferrari".to_string(),
                    available_count: 1,
                    available_drivers: vec!["Sainz".to_string()],
                },
            ]
        );
    }

    #[test]
    fn team_with_all_drivers_taken_is_omitted() {
        let result = compute_available(&roster(), &selected(&["Verstappen", "Perez"]));

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].team, "Ferrari");
        assert!(result.iter().all(|team| team.team != "Red Bull"));
    }

    #[test]
    fn everything_taken_yields_no_teams() {
        let result =
            compute_available(&roster(), &selected(&["Verstappen", "Perez", "Leclerc", "Sainz"]));
        assert!(result.is_empty());
    }

    #[test]
    fn nothing_selected_keeps_full_roster() {
        let roster = roster();
        let result = compute_available(&roster, &HashSet::new());

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].available_drivers, vec!["Verstappen", "Perez"]);
        assert_eq!(result[1].available_count, 2);
    }

    #[test]
    fn does_not_mutate_inputs() {
        let roster = roster();
        let picked = selected(&["Sainz"]);
        let before = roster.clone();

        let _ = compute_available(&roster, &picked);

        assert_eq!(roster, before);
        assert_eq!(picked, selected(&["Sainz"]));
    }

    #[test]
    fn single_team_lookup_respects_filtering() {
        let picked = selected(&["Verstappen"]);

        let red_bull = team_availability(&roster(), "Red Bull", &picked).expect("red bull");
        assert_eq!(red_bull.available_drivers, vec!["Perez"]);

        assert!(team_availability(&roster(), "Williams", &picked).is_none());
        assert!(team_availability(&roster(), "Red Bull", &selected(&["Verstappen", "Perez"]))
            .is_none());
    }

    #[test]
    fn summary_counts_only_roster_drivers() {
        let summary = summarize(&roster(), &selected(&["Verstappen", "Leclerc", "Hamilton"]));

        assert_eq!(summary.total_drivers, 4);
        assert_eq!(summary.taken_drivers, 2);
        assert_eq!(summary.available_drivers, 2);
    }
}
