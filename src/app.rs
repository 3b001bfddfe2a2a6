//! Console front end for the voice code assistant.
//!
//! # Architecture
//!
//! [`ConsoleApp`] stands in for the presentation layer.  It owns a
//! [`SessionManager`] handle and turns typed lines into [`ConsoleCommand`]s:
//!
//! * a plain line is a final voice transcript and goes to
//!   [`SessionManager::submit_command`] in its own task, so a second command
//!   can be issued while the first is still in flight;
//! * slash commands drive chat selection and the editor buffer.
//!
//! Output comes from [`SessionEvent`]s rendered by [`render_event`].
//!
//! | Command          | Effect                                        |
//! |------------------|-----------------------------------------------|
//! | `<text>`         | submit `<text>` as an utterance               |
//! | `/new`           | start a new chat                              |
//! | `/chats`         | refresh and list the sidebar                  |
//! | `/open <id\|n>`  | load a chat by id or sidebar position         |
//! | `/code`          | print the editor buffer                       |
//! | `/load <path>`   | read a file into the editor                   |
//! | `/save <path>`   | write the editor to a file                    |
//! | `/config [save]` | show or write the settings file               |
//! | `/status`        | backend, phase and active chat                |
//! | `/help`, `/quit` | `/quit` aborts requests still in flight       |

use std::path::PathBuf;

use tokio::task::JoinHandle;

use crate::backend::ChatSummary;
use crate::config::{AppConfig, AppPaths};
use crate::session::{EntryKind, SessionEvent, SessionManager, SubmitOutcome, TranscriptEntry};

/// Busy indicator line.
pub const THINKING: &str = "> Assistant is thinking...";

const HELP: &str = "\
Speak (type) a request, or use:
  /new            start a new chat
  /chats          list previous chats
  /open <id|n>    open a chat by id or list position
  /code           show the editor contents
  /load <path>    load a file into the editor
  /save <path>    save the editor to a file
  /config [save]  show settings, or write them to the settings file
  /status         show backend and session status
  /quit           exit (unanswered requests are abandoned)";

// ---------------------------------------------------------------------------
// ConsoleCommand
// ---------------------------------------------------------------------------

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Utterance(String),
    NewChat,
    ListChats,
    Open(String),
    ShowCode,
    Load(PathBuf),
    Save(PathBuf),
    ShowConfig,
    SaveConfig,
    Status,
    Help,
    Quit,
    Empty,
    /// Unknown or malformed slash command, with a message for the user.
    Invalid(String),
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ConsoleCommand::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return ConsoleCommand::Utterance(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match (name, arg.is_empty()) {
            ("new", _) => ConsoleCommand::NewChat,
            ("chats", _) => ConsoleCommand::ListChats,
            ("code", _) => ConsoleCommand::ShowCode,
            ("config", true) => ConsoleCommand::ShowConfig,
            ("config", false) if arg == "save" => ConsoleCommand::SaveConfig,
            ("config", false) => ConsoleCommand::Invalid("usage: /config [save]".to_string()),
            ("status", _) => ConsoleCommand::Status,
            ("help", _) => ConsoleCommand::Help,
            ("quit" | "exit", _) => ConsoleCommand::Quit,
            ("open", false) => ConsoleCommand::Open(arg.to_string()),
            ("load", false) => ConsoleCommand::Load(PathBuf::from(arg)),
            ("save", false) => ConsoleCommand::Save(PathBuf::from(arg)),
            ("open" | "load" | "save", true) => {
                ConsoleCommand::Invalid(format!("/{name} needs an argument"))
            }
            _ => ConsoleCommand::Invalid(format!("unknown command /{name} (try /help)")),
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Console line for one transcript entry.  User lines get `>>`, everything
/// else `>`.
pub fn render_entry(entry: &TranscriptEntry) -> String {
    let prefix = match entry.kind {
        EntryKind::User => ">>",
        EntryKind::Assistant | EntryKind::Output | EntryKind::Error => ">",
    };
    format!("{prefix} {}", entry.text)
}

/// Sidebar listing; the active chat is marked with `*`.
pub fn render_sidebar(chats: &[ChatSummary], active: Option<&str>) -> String {
    if chats.is_empty() {
        return "No chats yet. Start talking to create one.".to_string();
    }
    chats
        .iter()
        .enumerate()
        .map(|(i, chat)| {
            let marker = if Some(chat.id.as_str()) == active { '*' } else { ' ' };
            let title = if chat.title.is_empty() {
                "Untitled chat"
            } else {
                chat.title.as_str()
            };
            format!("{marker}{:>3}. {title}  [{}]", i + 1, chat.id)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text to print for a session event, if any.
pub fn render_event(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::TranscriptAppended(entry) => Some(render_entry(entry)),
        SessionEvent::TranscriptReplaced(entries) => Some(
            std::iter::once("----".to_string())
                .chain(entries.iter().map(render_entry))
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        SessionEvent::EditorUpdated(code) => {
            Some(format!("  [editor: {} lines]", code.lines().count()))
        }
        SessionEvent::BusyChanged(true) => Some(THINKING.to_string()),
        SessionEvent::BusyChanged(false)
        | SessionEvent::SidebarRefreshed(_)
        | SessionEvent::ActiveChatChanged(_)
        | SessionEvent::ConnectivityChanged(_) => None,
    }
}

// ---------------------------------------------------------------------------
// ConsoleApp
// ---------------------------------------------------------------------------

/// Whether the read loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Stop reading.  Utterances still in flight have already been aborted
    /// and reported by [`ConsoleApp::abandon_pending`].
    Quit,
}

/// Dispatches console commands to the session manager.
pub struct ConsoleApp {
    manager: SessionManager,
    /// Settings as read from disk, before environment overrides.
    config: AppConfig,
    settings_file: PathBuf,
    pending: Vec<JoinHandle<SubmitOutcome>>,
}

impl ConsoleApp {
    pub fn new(manager: SessionManager, config: AppConfig) -> Self {
        Self {
            manager,
            config,
            settings_file: AppPaths::new().settings_file,
            pending: Vec::new(),
        }
    }

    /// Write `/config save` output somewhere other than the platform path.
    pub fn with_settings_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_file = path.into();
        self
    }

    /// Handle one input line.
    pub async fn handle_line(&mut self, line: &str) -> Flow {
        self.dispatch(ConsoleCommand::parse(line)).await
    }

    pub async fn dispatch(&mut self, command: ConsoleCommand) -> Flow {
        match command {
            ConsoleCommand::Utterance(text) => {
                self.pending.retain(|handle| !handle.is_finished());
                let manager = self.manager.clone();
                self.pending
                    .push(tokio::spawn(async move { manager.submit_command(&text).await }));
            }
            ConsoleCommand::NewChat => self.manager.new_session(),
            ConsoleCommand::ListChats => {
                self.manager.refresh_sidebar().await;
                let active = self.manager.active_chat_id();
                println!("{}", render_sidebar(&self.manager.sidebar(), active.as_deref()));
            }
            ConsoleCommand::Open(target) => {
                let chat_id = self.resolve_chat(&target);
                self.manager.select_session(Some(&chat_id)).await;
            }
            ConsoleCommand::ShowCode => {
                println!("----- editor -----\n{}\n------------------", self.manager.editor_text());
            }
            ConsoleCommand::Load(path) => match tokio::fs::read_to_string(&path).await {
                Ok(code) => {
                    self.manager.set_editor_text(code);
                    self.note(TranscriptEntry::output(format!(
                        "Loaded {} into the editor.",
                        path.display()
                    )));
                }
                Err(e) => self.note(TranscriptEntry::error(format!(
                    "Error: cannot read {}: {e}",
                    path.display()
                ))),
            },
            ConsoleCommand::Save(path) => {
                let code = self.manager.editor_text();
                match tokio::fs::write(&path, code).await {
                    Ok(()) => self.note(TranscriptEntry::output(format!(
                        "Saved editor to {}.",
                        path.display()
                    ))),
                    Err(e) => self.note(TranscriptEntry::error(format!(
                        "Error: cannot write {}: {e}",
                        path.display()
                    ))),
                }
            }
            ConsoleCommand::ShowConfig => println!("{}", self.config_listing()),
            ConsoleCommand::SaveConfig => self.save_config(),
            ConsoleCommand::Status => println!("{}", self.status_line()),
            ConsoleCommand::Help => println!("{HELP}"),
            ConsoleCommand::Invalid(message) => println!("{message}"),
            ConsoleCommand::Empty => {}
            ConsoleCommand::Quit => {
                let abandoned = self.abandon_pending();
                if abandoned > 0 {
                    println!("> Abandoned {abandoned} unanswered request(s).");
                }
                return Flow::Quit;
            }
        }
        Flow::Continue
    }

    /// Abort every utterance still waiting on the backend and return how
    /// many there were.
    pub fn abandon_pending(&mut self) -> usize {
        let mut abandoned = 0;
        for handle in self.pending.drain(..) {
            if !handle.is_finished() {
                handle.abort();
                abandoned += 1;
            }
        }
        if abandoned > 0 {
            log::info!("console: abandoned {abandoned} in-flight request(s)");
        }
        abandoned
    }

    fn config_listing(&self) -> String {
        match toml::to_string_pretty(&self.config) {
            Ok(text) => format!("# {}\n{}", self.settings_file.display(), text.trim_end()),
            Err(e) => format!("cannot render settings: {e}"),
        }
    }

    fn save_config(&self) {
        match self.config.save_to(&self.settings_file) {
            Ok(()) => self.note(TranscriptEntry::output(format!(
                "Saved settings to {}.",
                self.settings_file.display()
            ))),
            Err(e) => {
                log::warn!("console: failed to save settings: {e:#}");
                self.note(TranscriptEntry::error(format!(
                    "Error: cannot write {}: {e}",
                    self.settings_file.display()
                )));
            }
        }
    }

    /// `/open 2` picks the second sidebar entry; anything else is an id.
    fn resolve_chat(&self, target: &str) -> String {
        let sidebar = self.manager.sidebar();
        target
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| sidebar.get(i))
            .map(|chat| chat.id.clone())
            .unwrap_or_else(|| target.to_string())
    }

    fn status_line(&self) -> String {
        format!(
            "backend: {:?} | phase: {} | chat: {} | persistence: {}",
            self.manager.connectivity(),
            self.manager.phase().label(),
            self.manager.active_chat_id().as_deref().unwrap_or("(new)"),
            if self.manager.persistence_enabled() { "on" } else { "off" },
        )
    }

    fn note(&self, entry: TranscriptEntry) {
        self.manager.append_entry(entry);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
