use serde::Serialize;

use scuderia_core::availability::TeamAvailability;
use scuderia_core::domain::pick::Pick;

use crate::commands::{
    driver_option_value, team_option_value, DRIVER_SELECT_ID, TEAM_SELECT_ID,
    UNAVAILABLE_OPTION_VALUE,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    Plain { text: String },
    Markdown { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into() }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self::Markdown { text: text.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self { label: label.into(), value: value.into(), description: None }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SelectMenu {
    pub custom_id: String,
    pub placeholder: String,
    pub options: Vec<SelectOption>,
    pub disabled: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section { block_id: String, text: TextObject },
    Select { block_id: String, menu: SelectMenu },
    Context { block_id: String, elements: Vec<TextObject> },
}

/// Who sees the response: only the invoking user, or the whole channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Ephemeral,
    Public,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageTemplate {
    pub fallback_text: String,
    pub visibility: Visibility,
    pub blocks: Vec<Block>,
}

impl MessageTemplate {
    pub fn is_ephemeral(&self) -> bool {
        self.visibility == Visibility::Ephemeral
    }

    pub fn select_menu(&self) -> Option<&SelectMenu> {
        self.blocks.iter().find_map(|block| match block {
            Block::Select { menu, .. } => Some(menu),
            _ => None,
        })
    }
}

pub struct MessageBuilder {
    fallback_text: String,
    visibility: Visibility,
    blocks: Vec<Block>,
}

impl MessageBuilder {
    pub fn new(fallback_text: impl Into<String>) -> Self {
        Self {
            fallback_text: fallback_text.into(),
            visibility: Visibility::Ephemeral,
            blocks: Vec::new(),
        }
    }

    pub fn public(mut self) -> Self {
        self.visibility = Visibility::Public;
        self
    }

    pub fn section<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut SectionBuilder),
    {
        let mut builder = SectionBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Section { block_id: block_id.into(), text: builder.build() });
        self
    }

    pub fn select<F>(
        mut self,
        block_id: impl Into<String>,
        custom_id: impl Into<String>,
        placeholder: impl Into<String>,
        build: F,
    ) -> Self
    where
        F: FnOnce(&mut SelectBuilder),
    {
        let mut builder = SelectBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Select {
            block_id: block_id.into(),
            menu: builder.build(custom_id.into(), placeholder.into()),
        });
        self
    }

    pub fn context<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ContextBuilder),
    {
        let mut builder = ContextBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Context { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn build(self) -> MessageTemplate {
        MessageTemplate {
            fallback_text: self.fallback_text,
            visibility: self.visibility,
            blocks: self.blocks,
        }
    }
}

#[derive(Default)]
pub struct SectionBuilder {
    text: Option<TextObject>,
}

impl SectionBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::plain(text));
        self
    }

    pub fn markdown(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::markdown(text));
        self
    }

    fn build(self) -> TextObject {
        self.text.unwrap_or_else(|| TextObject::plain(""))
    }
}

#[derive(Default)]
pub struct SelectBuilder {
    options: Vec<SelectOption>,
    disabled: bool,
}

impl SelectBuilder {
    pub fn option(&mut self, option: SelectOption) -> &mut Self {
        self.options.push(option);
        self
    }

    /// Disabled menu whose only option carries the unavailable sentinel.
    pub fn unavailable(&mut self, label: impl Into<String>) -> &mut Self {
        self.options = vec![SelectOption::new(label, UNAVAILABLE_OPTION_VALUE)
            .description("Please try again later.")];
        self.disabled = true;
        self
    }

    fn build(self, custom_id: String, placeholder: String) -> SelectMenu {
        SelectMenu { custom_id, placeholder, options: self.options, disabled: self.disabled }
    }
}

#[derive(Default)]
pub struct ContextBuilder {
    elements: Vec<TextObject>,
}

impl ContextBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::plain(text));
        self
    }

    pub fn markdown(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::markdown(text));
        self
    }

    fn build(self) -> Vec<TextObject> {
        self.elements
    }
}

pub fn team_menu_message(
    teams: &[TeamAvailability],
    ea_username: Option<&str>,
) -> MessageTemplate {
    MessageBuilder::new("Welcome to the F1 Scuderia Picker! Please select your favorite team:")
        .section("picker.team_menu.header.v1", |section| {
            section.markdown(
                "Welcome to the **F1 Scuderia Picker**! Please select your favorite team:",
            );
        })
        .select(
            "picker.team_menu.select.v1",
            TEAM_SELECT_ID,
            "Choose your favorite F1 team...",
            |select| {
                for team in teams {
                    select.option(
                        SelectOption::new(&team.team, team_option_value(&team.team, ea_username))
                            .description(drivers_available_label(team.available_count)),
                    );
                }
            },
        )
        .build()
}

pub fn all_drivers_taken_message() -> MessageTemplate {
    MessageBuilder::new("Every driver has already been picked.")
        .section("picker.team_menu.exhausted.v1", |section| {
            section.plain(
                "Every driver has already been picked. Check `/leaderboard` to see who has whom.",
            );
        })
        .select(
            "picker.team_menu.select.v1",
            TEAM_SELECT_ID,
            "No teams available...",
            |select| {
                select.unavailable("No teams available");
            },
        )
        .build()
}

pub fn driver_menu_message(
    team: &TeamAvailability,
    ea_username: Option<&str>,
) -> MessageTemplate {
    MessageBuilder::new(format!("You have selected {}. Now, please choose your driver:", team.team))
        .section("picker.driver_menu.header.v1", |section| {
            section.markdown(format!(
                "You have selected **{}**. Now, please choose your driver:",
                escape_markdown(&team.team)
            ));
        })
        .select(
            "picker.driver_menu.select.v1",
            DRIVER_SELECT_ID,
            "Choose your favorite driver...",
            |select| {
                for driver in &team.available_drivers {
                    select.option(SelectOption::new(
                        driver,
                        driver_option_value(&team.team, driver, ea_username),
                    ));
                }
            },
        )
        .build()
}

pub fn team_exhausted_message(team: &str) -> MessageTemplate {
    MessageBuilder::new(format!("No drivers are left for {team}."))
        .section("picker.driver_menu.exhausted.v1", |section| {
            section.markdown(format!(
                "Sorry, every driver for **{}** has been picked. \
                 Use `/pick` to choose another team.",
                escape_markdown(team)
            ));
        })
        .select(
            "picker.driver_menu.select.v1",
            DRIVER_SELECT_ID,
            "No drivers available...",
            |select| {
                select.unavailable("No drivers available");
            },
        )
        .build()
}

pub fn pick_saved_message(pick: &Pick) -> MessageTemplate {
    MessageBuilder::new(format!("Saved your pick: {} / {}", pick.team, pick.driver))
        .section("picker.pick.saved.v1", |section| {
            section.markdown(format!(
                "**Successfully saved your pick!**\n**Team:** {}\n**Driver:** {}",
                escape_markdown(&pick.team),
                escape_markdown(&pick.driver)
            ));
        })
        .build()
}

pub fn driver_taken_message(driver: &str) -> MessageTemplate {
    MessageBuilder::new(format!("{driver} has already been taken."))
        .section("picker.pick.taken.v1", |section| {
            section.markdown(format!(
                "**{}** has already been taken by another user. Use `/pick` to choose again.",
                escape_markdown(driver)
            ));
        })
        .build()
}

pub fn my_pick_message(pick: &Pick) -> MessageTemplate {
    MessageBuilder::new(format!("Your F1 pick: {} / {}", pick.team, pick.driver))
        .section("picker.my_pick.summary.v1", |section| {
            section.markdown(format!(
                "**Your F1 Pick**\n**Team:** {}\n**Driver:** {}",
                escape_markdown(&pick.team),
                escape_markdown(&pick.driver)
            ));
        })
        .build()
}

pub fn no_pick_message() -> MessageTemplate {
    MessageBuilder::new("You have not made a selection yet.")
        .section("picker.my_pick.empty.v1", |section| {
            section.plain("You have not made a selection yet. Use `/pick` to get started!");
        })
        .build()
}

/// Public leaderboard, one line per pick in the order picks were first made.
pub fn leaderboard_message(picks: &[Pick]) -> MessageTemplate {
    let lines = picks
        .iter()
        .map(|pick| {
            let name = pick
                .display_name()
                .map(escape_markdown)
                .unwrap_or_else(|| format!("<@{}>", pick.user_id));
            format!(
                "**{name}:** {} / {}",
                escape_markdown(&pick.team),
                escape_markdown(&pick.driver)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    MessageBuilder::new(format!("F1 Scuderia Leaderboard ({} picks)", picks.len()))
        .public()
        .section("picker.leaderboard.header.v1", |section| {
            section.markdown("**F1 Scuderia Leaderboard**");
        })
        .section("picker.leaderboard.picks.v1", |section| {
            section.markdown(lines);
        })
        .build()
}

pub fn empty_leaderboard_message() -> MessageTemplate {
    MessageBuilder::new("No picks have been made yet.")
        .section("picker.leaderboard.empty.v1", |section| {
            section.plain("No picks have been made yet. Be the first to use `/pick`!");
        })
        .build()
}

pub fn roster_unavailable_message() -> MessageTemplate {
    MessageBuilder::new("F1 data is not currently available.")
        .section("picker.roster.unavailable.v1", |section| {
            section.plain("F1 data is not currently available. Please try again in a few moments.");
        })
        .build()
}

pub fn selection_unavailable_message() -> MessageTemplate {
    MessageBuilder::new("F1 data is currently unavailable.")
        .section("picker.selection.unavailable.v1", |section| {
            section.plain("F1 data is currently unavailable. Please try again later.");
        })
        .build()
}

pub fn error_message(summary: &str, correlation_id: &str) -> MessageTemplate {
    MessageBuilder::new(summary.to_owned())
        .section("picker.error.summary.v1", |section| {
            section.markdown(format!(":warning: {summary}"));
        })
        .context("picker.error.context.v1", |context| {
            context.plain(format!("Correlation ID: {correlation_id}"));
        })
        .build()
}

pub fn help_message() -> MessageTemplate {
    MessageBuilder::new("Scuderia Picker help")
        .section("picker.help.summary.v1", |section| {
            section.markdown(
                "**Available commands**\n\
                 • `/pick [ea_username]` choose your team and driver\n\
                 • `/mypick` show your current pick\n\
                 • `/leaderboard` show everyone's picks\n\
                 • `/pickhelp` show this message",
            );
        })
        .context("picker.help.rules.v1", |context| {
            context.plain(
                "Each driver can belong to only one user. Picking again replaces your pick.",
            );
        })
        .build()
}

/// Backslash-escapes formatting and mention characters in user or roster text.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '*' | '_' | '~' | '`' | '|' | '<' | '>' | '@' | '#' | '[' | ']') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn drivers_available_label(count: usize) -> String {
    match count {
        1 => "1 driver available".to_owned(),
        count => format!("{count} drivers available"),
    }
}
