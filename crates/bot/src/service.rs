//! Command handling that ties the pick store, the roster and the menus
//! together.

use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;

use scuderia_core::availability::{compute_available, team_availability};
use scuderia_core::domain::pick::{PickRejection, PickSelection, SaveOutcome};
use scuderia_core::domain::roster::Roster;
use scuderia_core::errors::{ApplicationError, DomainError};
use scuderia_db::PickStore;

use crate::blocks::{self, MessageTemplate};
use crate::commands::{CommandRouteError, PickerCommandService, RequestContext};
use crate::roster::RosterSource;

pub struct PickerService<S, R> {
    store: S,
    roster: R,
}

impl<S, R> PickerService<S, R>
where
    S: PickStore,
    R: RosterSource,
{
    pub fn new(store: S, roster: R) -> Self {
        Self { store, roster }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// `None` when the roster cannot be fetched or is empty; the caller
    /// answers with the "data not available" template.
    async fn current_roster(&self, context: &RequestContext) -> Option<Roster> {
        match self.roster.roster().await {
            Ok(roster) if !roster.is_empty() => Some(roster),
            Ok(_) => {
                warn!(
                    event_name = "roster.fetch.empty",
                    correlation_id = %correlation_id(context),
                    "roster source returned no teams"
                );
                None
            }
            Err(error) => {
                warn!(
                    event_name = "roster.fetch.failed",
                    correlation_id = %correlation_id(context),
                    error = %error,
                    "roster unavailable"
                );
                None
            }
        }
    }

    fn failure(&self, error: ApplicationError, context: &RequestContext) -> MessageTemplate {
        let interface = error.into_interface(correlation_id(context));
        warn!(
            event_name = "picker.request.failed",
            correlation_id = %interface.correlation_id(),
            user_id = %context.user_id,
            error = %interface,
            "picker request failed"
        );
        blocks::error_message(interface.user_message(), interface.correlation_id())
    }
}

#[async_trait]
impl<S, R> PickerCommandService for PickerService<S, R>
where
    S: PickStore,
    R: RosterSource,
{
    async fn start_pick(
        &self,
        ea_username: Option<String>,
        context: &RequestContext,
    ) -> Result<MessageTemplate, CommandRouteError> {
        let Some(roster) = self.current_roster(context).await else {
            return Ok(blocks::roster_unavailable_message());
        };
        let selected = match self.store.get_selected_drivers().await {
            Ok(selected) => selected,
            Err(error) => return Ok(self.failure(error.into(), context)),
        };

        let available = compute_available(&roster, &selected);
        if available.is_empty() {
            return Ok(blocks::all_drivers_taken_message());
        }
        Ok(blocks::team_menu_message(&available, ea_username.as_deref()))
    }

    async fn select_team(
        &self,
        team: String,
        ea_username: Option<String>,
        context: &RequestContext,
    ) -> Result<MessageTemplate, CommandRouteError> {
        let Some(roster) = self.current_roster(context).await else {
            return Ok(blocks::roster_unavailable_message());
        };
        if roster.team(&team).is_none() {
            return Ok(self.failure(DomainError::UnknownTeam(team).into(), context));
        }
        let selected = match self.store.get_selected_drivers().await {
            Ok(selected) => selected,
            Err(error) => return Ok(self.failure(error.into(), context)),
        };

        match team_availability(&roster, &team, &selected) {
            Some(availability) => {
                Ok(blocks::driver_menu_message(&availability, ea_username.as_deref()))
            }
            None => Ok(blocks::team_exhausted_message(&team)),
        }
    }

    async fn select_driver(
        &self,
        team: String,
        driver: String,
        ea_username: Option<String>,
        context: &RequestContext,
    ) -> Result<MessageTemplate, CommandRouteError> {
        let Some(roster) = self.current_roster(context).await else {
            return Ok(blocks::roster_unavailable_message());
        };
        if !roster.contains(&team, &driver) {
            return Ok(self.failure(DomainError::UnknownSelection { team, driver }.into(), context));
        }

        let mut selection = PickSelection::new(context.user_id.clone(), team, driver);
        if let Some(ea_username) = ea_username {
            selection = selection.with_ea_username(ea_username);
        }

        match self.store.save(selection).await {
            Ok(SaveOutcome::Accepted(pick)) => {
                info!(
                    event_name = "picker.selection.saved",
                    correlation_id = %correlation_id(context),
                    user_id = %pick.user_id,
                    driver = %pick.driver,
                    "selection saved"
                );
                Ok(blocks::pick_saved_message(&pick))
            }
            Ok(SaveOutcome::Rejected(PickRejection::DriverTaken { driver })) => {
                Ok(blocks::driver_taken_message(&driver))
            }
            Err(error) => Ok(self.failure(error.into(), context)),
        }
    }

    async fn my_pick(
        &self,
        context: &RequestContext,
    ) -> Result<MessageTemplate, CommandRouteError> {
        match self.store.get_user_pick(&context.user_id).await {
            Ok(Some(pick)) => Ok(blocks::my_pick_message(&pick)),
            Ok(None) => Ok(blocks::no_pick_message()),
            Err(error) => Ok(self.failure(error.into(), context)),
        }
    }

    async fn leaderboard(
        &self,
        context: &RequestContext,
    ) -> Result<MessageTemplate, CommandRouteError> {
        match self.store.get_all_picks().await {
            Ok(picks) if picks.is_empty() => Ok(blocks::empty_leaderboard_message()),
            Ok(picks) => Ok(blocks::leaderboard_message(&picks)),
            Err(error) => Ok(self.failure(error.into(), context)),
        }
    }
}

fn correlation_id(context: &RequestContext) -> String {
    if context.request_id.trim().is_empty() {
        format!("req-{}", Uuid::new_v4())
    } else {
        context.request_id.clone()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use scuderia_core::domain::pick::{PickSelection, UserId};
    use scuderia_core::domain::roster::{Roster, Team};
    use scuderia_db::{InMemoryPickStore, PickStore};

    use super::{correlation_id, PickerService};
    use crate::blocks::{self, Block, TextObject};
    use crate::commands::{
        CommandRouter, PickerCommandService, RequestContext, SelectionPayload, SlashCommandPayload,
        DRIVER_SELECT_ID, TEAM_SELECT_ID,
    };
    use crate::roster::{RosterError, RosterSource, StaticRosterSource};

    fn roster() -> Roster {
        Roster::new(vec![
            Team::new("Ferrari", ["Charles Leclerc", "Lewis Hamilton"]),
            Team::new("McLaren", ["Lando Norris", "Oscar Piastri"]),
        ])
    }

    fn context(user: &str) -> RequestContext {
        RequestContext {
            user_id: UserId::new(user),
            channel_id: "C1".to_owned(),
            request_id: format!("req-{user}"),
        }
    }

    fn service() -> PickerService<InMemoryPickStore, StaticRosterSource> {
        PickerService::new(InMemoryPickStore::new(), StaticRosterSource::new(roster()))
    }

    struct FailingRoster;

    #[async_trait]
    impl RosterSource for FailingRoster {
        async fn roster(&self) -> Result<Roster, RosterError> {
            Err(RosterError::EmptyMeetings { year: 2025, country_name: "Spain".to_owned() })
        }
    }

    fn section_text(message: &blocks::MessageTemplate) -> String {
        message
            .blocks
            .iter()
            .filter_map(|block| match block {
                Block::Section { text: TextObject::Markdown { text }, .. }
                | Block::Section { text: TextObject::Plain { text }, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn start_pick_omits_fully_claimed_teams() {
        let service = service();
        for (user, driver) in [("a", "Lando Norris"), ("b", "Oscar Piastri")] {
            service
                .store()
                .save(PickSelection::new(UserId::new(user), "McLaren", driver))
                .await
                .expect("seed");
        }

        let message = service.start_pick(None, &context("c")).await.expect("start");
        let menu = message.select_menu().expect("team menu");
        let labels: Vec<&str> = menu.options.iter().map(|option| option.label.as_str()).collect();
        assert_eq!(labels, vec!["Ferrari"]);
    }

    #[tokio::test]
    async fn start_pick_reports_every_driver_taken() {
        let service = service();
        for (index, (team, driver)) in [
            ("Ferrari", "Charles Leclerc"),
            ("Ferrari", "Lewis Hamilton"),
            ("McLaren", "Lando Norris"),
            ("McLaren", "Oscar Piastri"),
        ]
        .into_iter()
        .enumerate()
        {
            service
                .store()
                .save(PickSelection::new(UserId::new(index.to_string()), team, driver))
                .await
                .expect("seed");
        }

        let message = service.start_pick(None, &context("late")).await.expect("start");
        assert_eq!(message, blocks::all_drivers_taken_message());
    }

    #[tokio::test]
    async fn start_pick_without_roster_reports_data_unavailable() {
        let service = PickerService::new(InMemoryPickStore::new(), FailingRoster);
        let message = service.start_pick(None, &context("a")).await.expect("start");
        assert_eq!(message, blocks::roster_unavailable_message());

        let empty = PickerService::new(InMemoryPickStore::new(), StaticRosterSource::default());
        let message = empty.start_pick(None, &context("a")).await.expect("start");
        assert_eq!(message, blocks::roster_unavailable_message());
    }

    #[tokio::test]
    async fn team_then_driver_selection_saves_pick() {
        let service = service();

        let driver_menu = service
            .select_team("Ferrari".to_owned(), Some("boonie7474".to_owned()), &context("u1"))
            .await
            .expect("team");
        assert_eq!(driver_menu.select_menu().expect("menu").options.len(), 2);

        let saved = service
            .select_driver(
                "Ferrari".to_owned(),
                "Lewis Hamilton".to_owned(),
                Some("boonie7474".to_owned()),
                &context("u1"),
            )
            .await
            .expect("driver");
        assert!(section_text(&saved).contains("Successfully saved your pick!"));

        let stored = service.store().get_user_pick(&UserId::new("u1")).await.expect("find");
        let stored = stored.expect("pick stored");
        assert_eq!(stored.driver, "Lewis Hamilton");
        assert_eq!(stored.ea_username.as_deref(), Some("boonie7474"));

        let mine = service.my_pick(&context("u1")).await.expect("mypick");
        assert!(section_text(&mine).contains("**Driver:** Lewis Hamilton"));
    }

    #[tokio::test]
    async fn second_claim_gets_taken_message() {
        let service = service();
        service
            .select_driver("McLaren".to_owned(), "Lando Norris".to_owned(), None, &context("u1"))
            .await
            .expect("first");

        let taken = service
            .select_driver("McLaren".to_owned(), "Lando Norris".to_owned(), None, &context("u2"))
            .await
            .expect("second");
        assert_eq!(taken, blocks::driver_taken_message("Lando Norris"));
        assert_eq!(service.store().get_user_pick(&UserId::new("u2")).await.expect("find"), None);
    }

    #[tokio::test]
    async fn selection_outside_roster_is_rejected_before_store() {
        let service = service();

        let message = service
            .select_driver("Ferrari".to_owned(), "Lando Norris".to_owned(), None, &context("u1"))
            .await
            .expect("invalid");
        assert!(message.blocks.iter().any(|block| matches!(
            block,
            Block::Context { elements, .. }
                if elements.contains(&TextObject::plain("Correlation ID: req-u1"))
        )));
        assert!(service.store().get_all_picks().await.expect("all").is_empty());

        let unknown_team =
            service.select_team("Brabham".to_owned(), None, &context("u1")).await.expect("team");
        assert!(section_text(&unknown_team).contains("not valid"));
    }

    #[tokio::test]
    async fn team_claimed_between_menus_shows_exhausted_notice() {
        let service = service();
        for (user, driver) in [("a", "Lando Norris"), ("b", "Oscar Piastri")] {
            service
                .select_driver("McLaren".to_owned(), driver.to_owned(), None, &context(user))
                .await
                .expect("claim");
        }

        let message =
            service.select_team("McLaren".to_owned(), None, &context("c")).await.expect("team");
        assert_eq!(message, blocks::team_exhausted_message("McLaren"));
    }

    fn selected(custom_id: &str, value: &str) -> SelectionPayload {
        SelectionPayload {
            custom_id: custom_id.to_owned(),
            value: value.to_owned(),
            channel_id: "C1".to_owned(),
            user_id: "u1".to_owned(),
            request_id: "req-u1".to_owned(),
        }
    }

    #[tokio::test]
    async fn offered_options_resolve_for_names_with_padding_and_separators() {
        let roster = Roster::new(vec![Team::new(" Ferrari ", ["Lewis Hamilton ", "A;B=100%"])]);
        let router = CommandRouter::new(PickerService::new(
            InMemoryPickStore::new(),
            StaticRosterSource::new(roster),
        ));

        let team_menu = router
            .route(&SlashCommandPayload {
                command: "/pick".to_owned(),
                text: String::new(),
                channel_id: "C1".to_owned(),
                user_id: "u1".to_owned(),
                request_id: "req-u1".to_owned(),
            })
            .await
            .expect("pick");
        let team_value = team_menu.select_menu().expect("team menu").options[0].value.clone();

        let driver_menu =
            router.route_selection(&selected(TEAM_SELECT_ID, &team_value)).await.expect("team");
        let options = driver_menu.select_menu().expect("driver menu").options.clone();
        assert_eq!(options.len(), 2);

        for (user, option) in ["u1", "u2"].into_iter().zip(&options) {
            let mut payload = selected(DRIVER_SELECT_ID, &option.value);
            payload.user_id = user.to_owned();
            let saved = router.route_selection(&payload).await.expect("driver");
            assert!(section_text(&saved).contains("Successfully saved your pick!"));
        }

        let stored = router.service().store().get_all_picks().await.expect("all");
        let drivers: Vec<&str> = stored.iter().map(|pick| pick.driver.as_str()).collect();
        assert_eq!(drivers, vec!["Lewis Hamilton ", "A;B=100%"]);
        assert!(stored.iter().all(|pick| pick.team == " Ferrari "));
    }

    #[tokio::test]
    async fn leaderboard_and_mypick_empty_states() {
        let service = service();
        assert_eq!(
            service.leaderboard(&context("a")).await.expect("leaderboard"),
            blocks::empty_leaderboard_message()
        );
        assert_eq!(
            service.my_pick(&context("a")).await.expect("mypick"),
            blocks::no_pick_message()
        );
    }

    #[test]
    fn blank_request_id_gets_generated_correlation_id() {
        let mut ctx = context("a");
        assert_eq!(correlation_id(&ctx), "req-a");

        ctx.request_id = "  ".to_owned();
        let generated = correlation_id(&ctx);
        assert!(generated.starts_with("req-"));
        assert_eq!(generated.len(), "req-".len() + 36);
    }
}
