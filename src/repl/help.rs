use crossterm::style::Color;

use crate::console::Console;

pub const GENERAL_HELP: &str = "\
Available functions:

Output

// Output text. Takes a variable number of values.
print(...)
// Pretty-print the given values, expanding objects and quoting strings.
pprint(...)
// Log the given strings as info. Takes a variable number of strings.
log(...)
// Log the given strings as a warning. Takes a variable number of strings.
warn(...)
// Log the given strings as an error. Takes a variable number of strings.
err(...)

Server

// Return the version string for the server
version() -> string
// Return the number of nanoseconds from 1970 (\"Unix time\")
unixnano() -> number
// Return the directory where the server is running. If a filename (optional)
// is given, then the path to where the server is running, joined with a path
// separator and the given filename, is returned.
serverdir([string]) -> string
// Return a string with various server information
server.info() -> string
// Return the number of seconds the server has been running
server.uptime() -> number
";

pub const WEB_HELP: &str = "\
Available functions:

Handling requests

// Return the requested HTTP method (GET, POST etc).
method() -> string
// Return the requested URL path.
urlpath() -> string
// Return the HTTP header in the request, for a given key, or an empty string.
header(string) -> string
// Set an HTTP header given a key and a value.
setheader(string, string)
// Return the HTTP body in the request
body() -> string
// Set a HTTP status code (like 200 or 404).
// Must be used before other functions that writes to the client!
status(number)
// Output text to the browser/client. Takes a variable number of strings.
print(...)
// Transmit what has been outputted so far, to the client.
flush()
";

pub const CONFIG_HELP: &str = "\
Available functions:

Only available in the server configuration script

// Set the default address for the server on the form [host][:port].
SetAddr(string)
// Provide a function that will be run once,
// when the server is ready to start serving.
OnReady(function)
// Direct the logging to the given filename. If the filename is an empty
// string, direct logging to stderr. Returns true if successful.
LogTo(string) -> bool
";

pub const USAGE: &str = "
Type \"webhelp\" for an overview of functions that are available when
handling requests. Or \"confighelp\" for an overview of functions that are
available when configuring the server.
";

/// A documentation line together with the contiguous comment block right
/// above it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpEntry {
    pub comment: String,
    pub signature: String,
}

/// Find `topic` across the help texts, in order; first match wins.
pub fn lookup(topic: &str, texts: &[&str]) -> Option<HelpEntry> {
    for text in texts {
        let mut comment = String::new();
        for line in text.lines() {
            if line.starts_with(topic) {
                return Some(HelpEntry {
                    comment: comment.trim_end().to_string(),
                    signature: line.to_string(),
                });
            }
            // Gather comments until a non-comment is encountered.
            if let Some(rest) = line.strip_prefix("//") {
                comment.push_str(rest.trim());
                comment.push('\n');
            } else {
                comment.clear();
            }
        }
    }
    None
}

/// Syntax highlight one help-text line.
///
/// The line decomposes, in order, into a trailing `//` comment, a leading
/// namespace prefix up to the rightmost `.`, a function-name token up to
/// `(`, and a trailing `->` return annotation; type keywords left in the
/// argument list are recolored individually. With colors disabled this is
/// the identity.
pub fn highlight(console: &Console, line: &str) -> String {
    let (mut rest, comment) = match line.find("//") {
        Some(at) => (
            line[..at].to_string(),
            console.paint(&line[at..], Color::DarkGrey),
        ),
        None => (line.to_string(), String::new()),
    };

    let namespace = match rest.rfind('.') {
        Some(at) => {
            let painted = console.paint(&rest[..at], Color::Green);
            rest = rest[at..].to_string();
            painted
        }
        None => String::new(),
    };

    let function = match rest.find('(') {
        Some(at) => {
            let painted = console.paint(&rest[..at], Color::Green);
            rest = rest[at..].to_string();
            painted
        }
        None => String::new(),
    };

    let (rest, returns) = match rest.find("->") {
        Some(at) => {
            let painted = format!(
                "{}{}",
                console.paint("->", Color::Blue),
                console.paint(&rest[at + 2..], Color::DarkRed)
            );
            (rest[..at].to_string(), painted)
        }
        None => (rest, String::new()),
    };

    let rest = rest.replace("string", &console.paint("string", Color::Blue));
    let rest = rest.replace("number", &console.paint("number", Color::Yellow));
    let rest = rest.replace("function", &console.paint("function", Color::Cyan));

    format!("{namespace}{function}{rest}{returns}{comment}")
}

/// Highlighted help text followed by the usage message.
pub fn render_help(console: &Console, text: &str) -> String {
    let mut out = String::new();
    for line in text.lines() {
        out.push_str(&highlight(console, line));
        out.push('\n');
    }
    out.push_str(USAGE);
    out.push('\n');
    out
}

/// Help about a single topic or function.
pub fn render_help_about(console: &Console, topic: &str) -> String {
    let builtin = match topic {
        "help" => Some("Output general help or help about a specific topic."),
        "webhelp" => Some("Output help about web-related functions."),
        "confighelp" => Some("Output help about configuration-related functions."),
        "quit" | "exit" | "shutdown" | "halt" => Some("Quit bosun."),
        _ => None,
    };
    if let Some(text) = builtin {
        return console.paint(text, Color::DarkGrey);
    }
    match lookup(topic, &[GENERAL_HELP, WEB_HELP, CONFIG_HELP]) {
        Some(entry) => format!(
            "\n{}\n\n{}\n",
            highlight(console, &entry.signature),
            console.paint(&entry.comment, Color::DarkGrey)
        ),
        None => format!(
            "{}{}",
            console.paint("Found no help for: ", Color::DarkGrey),
            console.paint(topic, Color::White)
        ),
    }
}

/// Everything the line editor should complete: the builtin commands plus
/// every function mentioned in the general help text.
pub fn completion_words() -> Vec<String> {
    let mut words: Vec<String> = [
        "help",
        "webhelp",
        "confighelp",
        "quit",
        "exit",
        "shutdown",
        "halt",
        "zalgo",
    ]
    .into_iter()
    .map(String::from)
    .collect();

    for line in GENERAL_HELP.lines() {
        if line.starts_with("//") {
            continue;
        }
        if let Some(at) = line.find('(') {
            let name = &line[..at];
            if line.contains("()") {
                words.push(format!("{name}()"));
            } else {
                words.push(format!("{name}("));
            }
        }
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> Console {
        Console::new(false)
    }

    #[test]
    fn lookup_returns_the_comment_block_and_signature() {
        let entry = lookup("version", &[GENERAL_HELP, WEB_HELP, CONFIG_HELP]).unwrap();
        assert_eq!(entry.signature, "version() -> string");
        assert_eq!(entry.comment, "Return the version string for the server");
    }

    #[test]
    fn lookup_gathers_multi_line_comment_blocks() {
        let entry = lookup("serverdir", &[GENERAL_HELP]).unwrap();
        assert_eq!(entry.signature, "serverdir([string]) -> string");
        assert!(entry.comment.starts_with("Return the directory where the server is running."));
        assert_eq!(entry.comment.lines().count(), 3);
    }

    #[test]
    fn first_matching_text_wins() {
        // `print` is documented in both the general and web help.
        let entry = lookup("print", &[GENERAL_HELP, WEB_HELP, CONFIG_HELP]).unwrap();
        assert_eq!(
            entry.comment,
            "Output text. Takes a variable number of values."
        );
        // A web-only topic is still found.
        let entry = lookup("method", &[GENERAL_HELP, WEB_HELP, CONFIG_HELP]).unwrap();
        assert_eq!(entry.signature, "method() -> string");
    }

    #[test]
    fn a_comment_block_does_not_leak_past_a_signature() {
        // `pprint` sits right after `print(...)`: its block must only be its
        // own comment line.
        let entry = lookup("pprint", &[GENERAL_HELP]).unwrap();
        assert_eq!(
            entry.comment,
            "Pretty-print the given values, expanding objects and quoting strings."
        );
    }

    #[test]
    fn unknown_topics_return_a_not_found_message() {
        assert!(lookup("frobnicate", &[GENERAL_HELP, WEB_HELP, CONFIG_HELP]).is_none());
        let rendered = render_help_about(&plain(), "frobnicate");
        assert_eq!(rendered, "Found no help for: frobnicate");
    }

    #[test]
    fn builtin_topics_have_fixed_answers() {
        assert_eq!(
            render_help_about(&plain(), "quit"),
            "Quit bosun."
        );
        assert_eq!(
            render_help_about(&plain(), "help"),
            "Output general help or help about a specific topic."
        );
    }

    #[test]
    fn render_help_is_the_text_plus_usage_when_plain() {
        let rendered = render_help(&plain(), GENERAL_HELP);
        assert_eq!(rendered, format!("{GENERAL_HELP}{USAGE}\n"));
    }

    #[test]
    fn highlight_is_identity_without_colors() {
        for line in GENERAL_HELP.lines() {
            assert_eq!(highlight(&plain(), line), line);
        }
    }

    #[test]
    fn highlight_colors_every_fragment() {
        let console = Console::new(true);
        let line = "server.info() -> string // Server information";
        let highlighted = highlight(&console, line);
        assert_ne!(highlighted, line);
        assert!(highlighted.contains(&console.paint("server", Color::Green)));
        assert!(highlighted.contains(&console.paint("->", Color::Blue)));
        assert!(highlighted.contains(&console.paint(" string ", Color::DarkRed)));
        assert!(highlighted.contains(&console.paint("// Server information", Color::DarkGrey)));
    }

    #[test]
    fn completion_words_cover_builtins_and_help_functions() {
        let words = completion_words();
        for builtin in ["help", "webhelp", "quit", "zalgo"] {
            assert!(words.iter().any(|w| w == builtin));
        }
        // No-argument functions complete with both parentheses, others with
        // the opening one.
        assert!(words.iter().any(|w| w == "version()"));
        assert!(words.iter().any(|w| w == "print("));
        assert!(words.iter().any(|w| w == "serverdir("));
        assert!(words.iter().any(|w| w == "server.info()"));
        // Comment lines contribute nothing.
        assert!(!words.iter().any(|w| w.starts_with("//")));
    }
}
