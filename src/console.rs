//! Line-oriented console front end for the query editor.
//!
//! Each input line is parsed into a [`ConsoleCommand`] and executed against a
//! [`QueryEditor`]. Query changes are printed by a separate listener (see `main.rs`), so the
//! console only prints direct answers to commands.

use crate::editor::{QueryEditor, SearchOutcome};
use crate::models::QueryUpdate;
use crate::services::ResourceFetcher;
use crate::state::{EditorState, QueryChange};
use std::io::Write;
use thiserror::Error;

pub const HELP: &str = "\
Commands:
  search <text>           search for a player profile
  select <n>              use the n-th search result as the query profile
  clear                   remove the profile from the query
  toggle <id> on|off      select or deselect a character
  mode <value>|none       set or clear the activity mode
  modes                   list activity modes
  show                    print the query and the characters
  help                    print this help
  quit                    leave the editor";

/// A parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Search(String),
    Select(usize),
    ClearProfile,
    Toggle { character_id: String, selected: bool },
    Mode(Option<i32>),
    Modes,
    Show,
    Help,
    Quit,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command '{0}' (try 'help')")]
    UnknownCommand(String),

    #[error("'{command}' needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("Invalid argument for '{command}': {value}")]
    InvalidArgument {
        command: &'static str,
        value: String,
    },

    #[error("No search result #{0}")]
    NoSuchOption(usize),
}

/// Whether the console keeps reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub fn parse_command(line: &str) -> Result<ConsoleCommand, ConsoleError> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    match verb.to_ascii_lowercase().as_str() {
        "" => Err(ConsoleError::Empty),
        // Search text may legitimately be empty: it clears the options
        "search" => Ok(ConsoleCommand::Search(rest.to_string())),
        "select" => {
            let index = required(rest, "select", "a result number")?;
            index
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .map(ConsoleCommand::Select)
                .ok_or_else(|| ConsoleError::InvalidArgument {
                    command: "select",
                    value: index.to_string(),
                })
        }
        "clear" => Ok(ConsoleCommand::ClearProfile),
        "toggle" => {
            let mut parts = rest.split_whitespace();
            let character_id = parts.next().ok_or(ConsoleError::MissingArgument {
                command: "toggle",
                argument: "a character id",
            })?;
            let selected = match parts.next().map(str::to_ascii_lowercase).as_deref() {
                Some("on") | None => true,
                Some("off") => false,
                Some(other) => {
                    return Err(ConsoleError::InvalidArgument {
                        command: "toggle",
                        value: other.to_string(),
                    });
                }
            };
            Ok(ConsoleCommand::Toggle {
                character_id: character_id.to_string(),
                selected,
            })
        }
        "mode" => {
            let value = required(rest, "mode", "a mode value or 'none'")?;
            if value.eq_ignore_ascii_case("none") {
                return Ok(ConsoleCommand::Mode(None));
            }
            value
                .parse::<i32>()
                .map(|v| ConsoleCommand::Mode(Some(v)))
                .map_err(|_| ConsoleError::InvalidArgument {
                    command: "mode",
                    value: value.to_string(),
                })
        }
        "modes" => Ok(ConsoleCommand::Modes),
        "show" => Ok(ConsoleCommand::Show),
        "help" | "?" => Ok(ConsoleCommand::Help),
        "quit" | "exit" => Ok(ConsoleCommand::Quit),
        other => Err(ConsoleError::UnknownCommand(other.to_string())),
    }
}

fn required<'a>(
    rest: &'a str,
    command: &'static str,
    argument: &'static str,
) -> Result<&'a str, ConsoleError> {
    if rest.is_empty() {
        Err(ConsoleError::MissingArgument { command, argument })
    } else {
        Ok(rest)
    }
}

/// Execute one command, writing its direct output to `out`.
pub async fn execute<F, W>(
    editor: &QueryEditor<F>,
    command: ConsoleCommand,
    out: &mut W,
) -> anyhow::Result<Flow>
where
    F: ResourceFetcher + 'static,
    W: Write,
{
    let controller = editor.controller();

    match command {
        ConsoleCommand::Search(text) => match editor.search_profiles(&text).await {
            SearchOutcome::Resolved(options) if options.is_empty() => {
                writeln!(out, "{}", controller.search_view().no_options_message)?;
            }
            SearchOutcome::Resolved(options) => {
                for (n, option) in options.iter().enumerate() {
                    writeln!(
                        out,
                        "{:>3}. {} (platform {}, id {})",
                        n + 1,
                        option.label,
                        option.value.membership_type,
                        option.value.membership_id
                    )?;
                }
            }
            SearchOutcome::Superseded => writeln!(out, "Search superseded")?,
            SearchOutcome::Failed(message) => writeln!(out, "Search failed: {}", message)?,
        },

        ConsoleCommand::Select(n) => {
            let options = controller.profile_options();
            let option = n
                .checked_sub(1)
                .and_then(|index| options.get(index))
                .ok_or(ConsoleError::NoSuchOption(n))?;
            editor
                .update(QueryUpdate::profile(option.value.clone()))
                .join()
                .await;
            write!(out, "{}", render_characters(&controller.snapshot()))?;
        }

        ConsoleCommand::ClearProfile => {
            editor.update(QueryUpdate::clear_profile()).join().await;
        }

        ConsoleCommand::Toggle {
            character_id,
            selected,
        } => {
            editor
                .set_character_selected(&character_id, selected)
                .join()
                .await;
            write!(out, "{}", render_characters(&controller.snapshot()))?;
        }

        ConsoleCommand::Mode(mode) => {
            editor.update(QueryUpdate::activity_mode(mode)).join().await;
        }

        ConsoleCommand::Modes => {
            let modes = controller.activity_mode_options();
            if modes.is_empty() {
                writeln!(out, "No activity modes loaded")?;
            }
            for mode in modes {
                writeln!(out, "{:>6}  {}", mode.value, mode.label)?;
            }
        }

        ConsoleCommand::Show => write!(out, "{}", render_state(&controller.snapshot()))?,
        ConsoleCommand::Help => writeln!(out, "{}", HELP)?,
        ConsoleCommand::Quit => return Ok(Flow::Quit),
    }

    Ok(Flow::Continue)
}

/// Characters with their selection marks.
pub fn render_characters(state: &EditorState) -> String {
    let selected = state.query.selected_characters();
    let mut text = String::new();

    for item in state.characters_to_render() {
        let mark = if item.is_placeholder {
            "-"
        } else if selected.contains(&item.character_id) {
            "x"
        } else {
            " "
        };
        text.push_str(&format!("  [{}] {} ({})\n", mark, item.description, item.character_id));
    }
    text
}

/// Full editor view: profile, characters, activity mode.
pub fn render_state(state: &EditorState) -> String {
    let profile = state
        .profile_value()
        .first()
        .map(|option| option.label.clone())
        .unwrap_or_else(|| "(none)".to_string());

    let activity_mode = match state.query.activity_mode {
        Some(value) => state
            .activity_modes
            .iter()
            .find(|mode| mode.value == value)
            .map(|mode| format!("{} ({})", mode.label, value))
            .unwrap_or_else(|| value.to_string()),
        None => "(any)".to_string(),
    };

    format!(
        "Player: {}\nCharacters:\n{}Activity mode: {}\n",
        profile,
        render_characters(state),
        activity_mode
    )
}

/// One-line description of a change worth showing, `None` for the rest.
pub fn render_change(change: &QueryChange) -> Option<String> {
    match change {
        QueryChange::RunRequested(query) => {
            let model = serde_json::to_string(&query.to_model()).ok()?;
            let note = if query.is_executable() {
                ""
            } else {
                " (incomplete profile, backend will reject)"
            };
            Some(format!("run requested{}: {}", note, model))
        }
        QueryChange::FetchFailed { resource, message } => {
            Some(format!("{} failed: {}", resource, message))
        }
        QueryChange::CharactersChanged(characters) if !characters.is_empty() => {
            let loaded = characters.iter().filter(|c| !c.is_placeholder).count();
            (loaded > 0).then(|| format!("{} characters loaded", loaded))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityMode, CharacterItem, Membership, Query};
    use crate::services::ResourceName;

    fn foo() -> Membership {
        Membership::new(3, "1", "Foo#1234")
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse_command("search Foo Bar"),
            Ok(ConsoleCommand::Search("Foo Bar".to_string()))
        );
        assert_eq!(parse_command("  SELECT 2 "), Ok(ConsoleCommand::Select(2)));
        assert_eq!(
            parse_command("toggle c1 off"),
            Ok(ConsoleCommand::Toggle {
                character_id: "c1".to_string(),
                selected: false
            })
        );
        assert_eq!(parse_command("mode 84"), Ok(ConsoleCommand::Mode(Some(84))));
        assert_eq!(parse_command("mode none"), Ok(ConsoleCommand::Mode(None)));
        assert_eq!(parse_command("search"), Ok(ConsoleCommand::Search(String::new())));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_command("   "), Err(ConsoleError::Empty));
        assert!(matches!(parse_command("select 0"), Err(ConsoleError::InvalidArgument { .. })));
        assert!(matches!(parse_command("select"), Err(ConsoleError::MissingArgument { .. })));
        assert!(matches!(parse_command("toggle c1 maybe"), Err(ConsoleError::InvalidArgument { .. })));
        assert_eq!(
            parse_command("launch"),
            Err(ConsoleError::UnknownCommand("launch".to_string()))
        );
    }

    #[test]
    fn test_render_state_marks_selection() {
        let mut state = EditorState::new(Query {
            profile: Some(foo()),
            characters: Some(vec!["c2".to_string()]),
            activity_mode: Some(84),
        });
        state.characters.profile_changed(Some(&foo()));
        state.characters.characters_loaded(
            &foo(),
            vec![
                CharacterItem::new("c1", "Hunter"),
                CharacterItem::new("c2", "Titan"),
            ],
            &[],
        );
        state.activity_modes = vec![ActivityMode {
            label: "Trials of Osiris".to_string(),
            value: 84,
        }];

        let text = render_state(&state);
        assert!(text.contains("Player: Foo#1234"));
        assert!(text.contains("[ ] Hunter (c1)"));
        assert!(text.contains("[x] Titan (c2)"));
        assert!(text.contains("Activity mode: Trials of Osiris (84)"));
    }

    #[test]
    fn test_render_placeholders() {
        let text = render_state(&EditorState::default());
        assert!(text.contains("Player: (none)"));
        assert!(text.contains("[-] Warlock (1)"));
        assert!(text.contains("Activity mode: (any)"));
    }

    #[test]
    fn test_render_run_request() {
        let query = Query {
            profile: Some(foo()),
            ..Default::default()
        };
        let line = render_change(&QueryChange::RunRequested(query)).unwrap();

        assert!(line.starts_with("run requested: "));
        assert!(line.contains(r#""membershipId":"1""#));
    }

    #[test]
    fn test_render_skips_quiet_changes() {
        assert_eq!(
            render_change(&QueryChange::StaleResponseDiscarded {
                resource: ResourceName::ProfileSearch
            }),
            None
        );
        assert_eq!(
            render_change(&QueryChange::CharactersChanged(CharacterItem::placeholders())),
            None
        );
    }
}
