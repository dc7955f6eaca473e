use std::borrow::Cow;
use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;

use reedline::{
    ColumnarMenu, DefaultCompleter, Emacs, FileBackedHistory, KeyCode, KeyModifiers, MenuBuilder,
    Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus, Reedline,
    ReedlineEvent, ReedlineMenu, Signal, default_emacs_keybindings,
};

/// A single read from the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadEvent {
    Line(String),
    Interrupted,
    Eof,
}

/// Line-input capability. The loop core only sees this trait, so it can be
/// driven by a scripted source in tests instead of a terminal.
pub trait LineInput {
    fn read_line(&mut self) -> io::Result<ReadEvent>;
    fn add_history(&mut self, line: &str);
}

struct ConsolePrompt {
    text: String,
}

impl Prompt for ConsolePrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.text)
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _mode: PromptEditMode) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!("({}reverse search) ", prefix))
    }
}

/// Interactive input backed by reedline, with persistent history and prefix
/// completion over the given word list.
pub struct ReedlineInput {
    editor: Reedline,
    prompt: ConsolePrompt,
}

impl ReedlineInput {
    pub fn new(prompt: String, history_file: Option<PathBuf>, completions: Vec<String>) -> Self {
        let mut editor = Reedline::create();

        if let Some(path) = history_file {
            match FileBackedHistory::with_file(500, path) {
                Ok(history) => editor = editor.with_history(Box::new(history)),
                Err(err) => tracing::error!("could not open the console history: {err}"),
            }
        }

        // Dots and parentheses are part of completable names.
        let mut completer = DefaultCompleter::with_inclusions(&['.', '(', ')', '[', ']']);
        completer.insert(completions);
        let completer = Box::new(completer);
        let menu = Box::new(ColumnarMenu::default().with_name("completion_menu"));
        let mut keybindings = default_emacs_keybindings();
        keybindings.add_binding(
            KeyModifiers::NONE,
            KeyCode::Tab,
            ReedlineEvent::UntilFound(vec![
                ReedlineEvent::Menu("completion_menu".to_string()),
                ReedlineEvent::MenuNext,
            ]),
        );

        let editor = editor
            .with_completer(completer)
            .with_menu(ReedlineMenu::EngineCompleter(menu))
            .with_edit_mode(Box::new(Emacs::new(keybindings)));

        Self {
            editor,
            prompt: ConsolePrompt { text: prompt },
        }
    }
}

impl LineInput for ReedlineInput {
    fn read_line(&mut self) -> io::Result<ReadEvent> {
        match self.editor.read_line(&self.prompt)? {
            Signal::Success(line) => Ok(ReadEvent::Line(line)),
            Signal::CtrlC => Ok(ReadEvent::Interrupted),
            Signal::CtrlD => Ok(ReadEvent::Eof),
        }
    }

    fn add_history(&mut self, _line: &str) {
        // reedline records submitted lines itself.
    }
}

/// Scripted input source for exercising the loop without a terminal. Once
/// the events run out, every further read is end-of-input.
pub struct ScriptedInput {
    events: VecDeque<ReadEvent>,
    pub history: Vec<String>,
}

impl ScriptedInput {
    pub fn new(events: impl IntoIterator<Item = ReadEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
            history: Vec::new(),
        }
    }
}

impl LineInput for ScriptedInput {
    fn read_line(&mut self) -> io::Result<ReadEvent> {
        Ok(self.events.pop_front().unwrap_or(ReadEvent::Eof))
    }

    fn add_history(&mut self, line: &str) {
        self.history.push(line.to_string());
    }
}
