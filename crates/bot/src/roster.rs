//! Roster sources used to build the selection menus.
//!
//! The live source reads the OpenF1 API: the first meeting for the configured
//! year and country gives a `meeting_key`, and the drivers entered for that
//! meeting are grouped into teams.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use scuderia_core::config::RosterConfig;
use scuderia_core::domain::roster::{DriverRecord, Roster};
use scuderia_core::errors::ApplicationError;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("roster request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("no meetings found for {year} in {country_name}")]
    EmptyMeetings { year: u16, country_name: String },
    #[error("no drivers found for meeting {meeting_key}")]
    EmptyDrivers { meeting_key: i64 },
}

impl From<RosterError> for ApplicationError {
    fn from(value: RosterError) -> Self {
        ApplicationError::Integration(value.to_string())
    }
}

#[async_trait]
pub trait RosterSource: Send + Sync {
    async fn roster(&self) -> Result<Roster, RosterError>;
}

/// Fixed roster, for tests and offline use.
#[derive(Clone, Debug, Default)]
pub struct StaticRosterSource {
    roster: Roster,
}

impl StaticRosterSource {
    pub fn new(roster: Roster) -> Self {
        Self { roster }
    }
}

#[async_trait]
impl RosterSource for StaticRosterSource {
    async fn roster(&self) -> Result<Roster, RosterError> {
        Ok(self.roster.clone())
    }
}

#[derive(Debug, Deserialize)]
struct Meeting {
    meeting_key: i64,
}

pub struct OpenF1RosterSource {
    client: Client,
    base_url: String,
    year: u16,
    country_name: String,
}

impl OpenF1RosterSource {
    pub fn new(config: &RosterConfig) -> Result<Self, RosterError> {
        let client =
            Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_owned(),
            year: config.year,
            country_name: config.country_name.clone(),
        })
    }

    async fn meeting_key(&self) -> Result<i64, RosterError> {
        let meetings: Vec<Meeting> = self
            .client
            .get(format!("{}/meetings", self.base_url))
            .query(&[("year", self.year.to_string()), ("country_name", self.country_name.clone())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        meetings.first().map(|meeting| meeting.meeting_key).ok_or_else(|| {
            RosterError::EmptyMeetings { year: self.year, country_name: self.country_name.clone() }
        })
    }

    async fn fetch(&self) -> Result<Roster, RosterError> {
        let meeting_key = self.meeting_key().await?;
        let drivers: Vec<DriverRecord> = self
            .client
            .get(format!("{}/drivers", self.base_url))
            .query(&[("meeting_key", meeting_key)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if drivers.is_empty() {
            return Err(RosterError::EmptyDrivers { meeting_key });
        }
        Ok(Roster::from_driver_records(&drivers))
    }
}

#[async_trait]
impl RosterSource for OpenF1RosterSource {
    async fn roster(&self) -> Result<Roster, RosterError> {
        let result = self.fetch().await;
        match &result {
            Ok(roster) => info!(
                event_name = "roster.fetch.completed",
                teams = roster.teams.len(),
                drivers = roster.driver_count(),
                "roster fetched"
            ),
            Err(error) => {
                warn!(event_name = "roster.fetch.failed", error = %error, "roster fetch failed")
            }
        }
        result
    }
}

/// Fetches from the inner source once and serves the copy until `refresh`.
/// A failed fetch is not cached.
pub struct CachedRosterSource<R> {
    inner: R,
    cached: RwLock<Option<Roster>>,
}

impl<R> CachedRosterSource<R>
where
    R: RosterSource,
{
    pub fn new(inner: R) -> Self {
        Self { inner, cached: RwLock::new(None) }
    }

    pub async fn refresh(&self) -> Result<Roster, RosterError> {
        let roster = self.inner.roster().await?;
        *self.cached.write().await = Some(roster.clone());
        Ok(roster)
    }
}

/// OpenF1 behind a cache, as configured by `[roster]`.
pub fn live_roster_source(
    config: &RosterConfig,
) -> Result<CachedRosterSource<OpenF1RosterSource>, RosterError> {
    Ok(CachedRosterSource::new(OpenF1RosterSource::new(config)?))
}

#[async_trait]
impl<R> RosterSource for CachedRosterSource<R>
where
    R: RosterSource,
{
    async fn roster(&self) -> Result<Roster, RosterError> {
        if let Some(roster) = self.cached.read().await.as_ref() {
            return Ok(roster.clone());
        }

        let mut cached = self.cached.write().await;
        if let Some(roster) = cached.as_ref() {
            return Ok(roster.clone());
        }
        let roster = self.inner.roster().await?;
        *cached = Some(roster.clone());
        Ok(roster)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use scuderia_core::config::RosterConfig;
    use scuderia_core::domain::roster::{Roster, Team};

    use super::{
        live_roster_source, CachedRosterSource, OpenF1RosterSource, RosterError, RosterSource,
    };

    fn config(base_url: String) -> RosterConfig {
        RosterConfig {
            api_base_url: base_url,
            year: 2025,
            country_name: "Spain".to_owned(),
            timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn openf1_source_groups_drivers_of_first_meeting() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/meetings"))
            .and(query_param("year", "2025"))
            .and(query_param("country_name", "Spain"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{ "meeting_key": 1259 }, { "meeting_key": 1300 }])),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/drivers"))
            .and(query_param("meeting_key", "1259"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "team_name": "McLaren", "first_name": "Oscar", "last_name": "Piastri" },
                { "team_name": "Ferrari", "first_name": "Charles", "last_name": "Leclerc" },
                { "team_name": "McLaren", "first_name": "Lando", "last_name": "Norris" },
                { "team_name": null, "first_name": "Reserve", "last_name": "Driver" },
                { "team_name": "Ferrari", "first_name": "Charles", "last_name": "Leclerc" }
            ])))
            .mount(&server)
            .await;

        let source = OpenF1RosterSource::new(&config(server.uri())).expect("client");
        let roster = source.roster().await.expect("roster");

        assert_eq!(
            roster,
            Roster::new(vec![
                Team::new("Ferrari", ["Charles Leclerc"]),
                Team::new("McLaren", ["Oscar Piastri", "Lando Norris"]),
            ])
        );
    }

    #[tokio::test]
    async fn openf1_source_reports_missing_meeting() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/meetings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let source = OpenF1RosterSource::new(&config(server.uri())).expect("client");
        let error = source.roster().await.expect_err("no meetings");

        assert!(matches!(error, RosterError::EmptyMeetings { year: 2025, .. }));
    }

    #[tokio::test]
    async fn openf1_source_surfaces_http_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/meetings"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let source = OpenF1RosterSource::new(&config(server.uri())).expect("client");
        assert!(matches!(source.roster().await, Err(RosterError::Http(_))));
    }

    #[tokio::test]
    async fn openf1_source_reports_empty_driver_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/meetings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "meeting_key": 7 }])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/drivers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let source = OpenF1RosterSource::new(&config(server.uri())).expect("client");
        assert!(matches!(
            source.roster().await,
            Err(RosterError::EmptyDrivers { meeting_key: 7 })
        ));
    }

    #[tokio::test]
    async fn live_source_serves_cached_roster_after_first_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/meetings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "meeting_key": 9 }])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/drivers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "team_name": "Williams", "first_name": "Carlos", "last_name": "Sainz" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let source = live_roster_source(&config(format!("{}/", server.uri()))).expect("client");
        let first = source.roster().await.expect("first");
        let second = source.roster().await.expect("second");

        assert_eq!(first, Roster::new(vec![Team::new("Williams", ["Carlos Sainz"])]));
        assert_eq!(first, second);
    }

    struct CountingSource {
        calls: AtomicUsize,
        fail_first: bool,
    }

    impl CountingSource {
        fn new(fail_first: bool) -> Self {
            Self { calls: AtomicUsize::new(0), fail_first }
        }
    }

    #[async_trait]
    impl RosterSource for CountingSource {
        async fn roster(&self) -> Result<Roster, RosterError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_first && call == 0 {
                return Err(RosterError::EmptyDrivers { meeting_key: 1 });
            }
            Ok(Roster::new(vec![Team::new(format!("Team {call}"), ["Driver"])]))
        }
    }

    #[tokio::test]
    async fn cached_source_fetches_once_until_refresh() {
        let cached =
            CachedRosterSource::new(CountingSource::new(false));

        let first = cached.roster().await.expect("first");
        let second = cached.roster().await.expect("second");
        assert_eq!(first, second);
        assert_eq!(first.teams[0].name, "Team 0");

        let refreshed = cached.refresh().await.expect("refresh");
        assert_eq!(refreshed.teams[0].name, "Team 1");
        assert_eq!(cached.roster().await.expect("after refresh").teams[0].name, "Team 1");
    }

    #[tokio::test]
    async fn cached_source_retries_after_failure() {
        let cached =
            CachedRosterSource::new(CountingSource::new(true));

        assert!(cached.roster().await.is_err());
        assert_eq!(cached.roster().await.expect("second attempt").teams[0].name, "Team 1");
    }
}
