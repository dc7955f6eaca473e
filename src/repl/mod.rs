pub mod command;
pub mod help;
pub mod input;

use std::path::PathBuf;

use crossterm::style::Color;
use tracing::{error, warn};

use crate::console::Console;
use crate::engine::pool::StatePool;
use crate::engine::{EngineState, bridge};
use crate::lifecycle::{DoneHandle, ReadyGate};
use crate::shutdown::ShutdownRegistry;
use command::Command;
use input::{LineInput, ReadEvent, ReedlineInput};

/// Printed by the shutdown sweep when the console closes.
pub const EXIT_MESSAGE: &str = "goodbye";

/// Why the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// One of the quit builtins.
    Quit,
    /// The `zalgo` easter egg; the process root maps this to a non-zero
    /// exit status.
    EasterEgg,
    /// Terminal end-of-input.
    Eof,
    /// An interrupt from the line editor.
    Interrupted,
    /// The serving side went away before ever becoming ready.
    ServerFailed,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReplOptions {
    /// Require two consecutive EOFs to leave the console.
    pub double_eof: bool,
    pub debug: bool,
    pub verbose: bool,
}

/// The read-eval-print loop.
///
/// Blocks until the server signals readiness, then reads lines, classifies
/// them, and dispatches or evaluates until a termination trigger. Every
/// exit path delivers the Done signal before returning.
pub fn run(
    state: &mut EngineState,
    input: &mut dyn LineInput,
    console: &Console,
    ready: ReadyGate,
    done: &DoneHandle,
    opts: &ReplOptions,
) -> ExitReason {
    if !ready.wait() {
        warn!("the server went away before becoming ready, leaving the console");
        done.signal();
        return ExitReason::ServerFailed;
    }
    console.println(&console.paint("ready", Color::Green));

    let mut pending_eof = false;
    loop {
        let event = match input.read_line() {
            Ok(event) => event,
            Err(err) => {
                error!("error reading line: {err}");
                continue;
            }
        };
        match event {
            ReadEvent::Interrupted => {
                warn!("interrupted");
                done.signal();
                return ExitReason::Interrupted;
            }
            ReadEvent::Eof => {
                if opts.debug {
                    console.println(&console.paint("EOF", Color::Magenta));
                }
                if opts.double_eof && !pending_eof {
                    console.error("Press ctrl-d again to exit.");
                    pending_eof = true;
                    continue;
                }
                done.signal();
                return ExitReason::Eof;
            }
            ReadEvent::Line(line) => {
                // Any read line, even a blank one, breaks an EOF streak.
                pending_eof = false;
                if !line.trim().is_empty() {
                    input.add_history(line.trim());
                }
                match command::classify(&line) {
                    Command::Empty => continue,
                    Command::Help => console.println(&help::render_help(console, help::GENERAL_HELP)),
                    Command::WebHelp => console.println(&help::render_help(console, help::WEB_HELP)),
                    Command::ConfigHelp => {
                        console.println(&help::render_help(console, help::CONFIG_HELP));
                    }
                    Command::HelpTopic(topic) => {
                        console.println(&help::render_help_about(console, &topic));
                    }
                    Command::Exit => {
                        done.signal();
                        return ExitReason::Quit;
                    }
                    Command::EasterEgg => {
                        console.error("exiting...");
                        done.signal();
                        return ExitReason::EasterEgg;
                    }
                    Command::Eval(src) => {
                        if let Err(err) = bridge::eval_line(state, &src) {
                            console.error(&err.to_string());
                        }
                    }
                }
            }
        }
    }
}

/// Run an interactive console session against the live server.
///
/// Draws one state from the pool and keeps it for the whole session:
/// console-local bindings accumulate in it, so it is closed on exit rather
/// than released back for request-handling reuse.
pub fn interactive(
    pool: &StatePool,
    console: Console,
    registry: &ShutdownRegistry,
    ready: ReadyGate,
    done: DoneHandle,
    opts: ReplOptions,
) -> anyhow::Result<ExitReason> {
    let mut state = pool.acquire()?;
    pool.factory().install_console_extras(&mut state)?;

    let history_file = home::home_dir()
        .unwrap_or_else(|| {
            error!("could not find a home directory to store the console history");
            PathBuf::from(".")
        })
        .join(".bosun_history");

    let prompt = console.paint("js> ", Color::Cyan);
    let mut input = ReedlineInput::new(prompt, Some(history_file), help::completion_words());

    {
        let verbose = opts.verbose;
        registry.register("console-farewell", move || {
            // Verbose shutdown logging already says plenty.
            if !verbose {
                console.println(&console.paint(EXIT_MESSAGE, Color::Blue));
            }
            Ok(())
        });
    }

    let reason = run(&mut state, &mut input, &console, ready, &done, &opts);
    drop(state);
    Ok(reason)
}
