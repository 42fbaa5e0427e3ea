//! User-facing status messages
//!
//! Every message has a severity [`Level`]. Whether it is shown, on which
//! stream and in which color depends only on the level and the verbosity
//! count given on the command line:
//!
//! | Level              | Shown when      | Stream | Color   |
//! |--------------------|-----------------|--------|---------|
//! | `NotSet` / `Debug` | verbosity >= 2  | stdout | magenta |
//! | `Info`             | always          | stdout | green   |
//! | `Warning`          | verbosity >= 1  | stderr | yellow  |
//! | `Error`/`Critical` | always          | stderr | red     |

use std::fmt;
use std::io::{self, IsTerminal, Write};

use colored::{Color, Colorize};

/// Message severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Unclassified, shown like debug output
    NotSet = 0,
    /// Diagnostic detail
    Debug = 10,
    /// Result of an operation
    Info = 20,
    /// Something went wrong but processing continues
    Warning = 30,
    /// Failure detail
    Error = 40,
    /// Unrecoverable failure
    Critical = 50,
}

/// Output stream of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    /// Standard output
    Stdout,
    /// Standard error
    Stderr,
}

/// Where and how a message is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    /// Destination stream
    pub stream: Stream,
    /// Foreground color
    pub color: Color,
}

impl Level {
    /// Route of a message at this level, `None` when the verbosity hides it
    pub fn route(self, verbosity: u8) -> Option<Route> {
        let (stream, color, min_verbosity) = match self {
            Level::NotSet | Level::Debug => (Stream::Stdout, Color::Magenta, 2),
            Level::Info => (Stream::Stdout, Color::Green, 0),
            Level::Warning => (Stream::Stderr, Color::Yellow, 1),
            Level::Error | Level::Critical => (Stream::Stderr, Color::Red, 0),
        };
        (verbosity >= min_verbosity).then_some(Route { stream, color })
    }

    /// Level name
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::NotSet => "NOTSET",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Sink {
    writer: Box<dyn Write>,
    color: bool,
}

/// Prints messages according to their level and the verbosity count
pub struct Reporter {
    verbosity: u8,
    stdout: Sink,
    stderr: Sink,
}

impl Reporter {
    /// Reporter bound to the process stdout and stderr
    ///
    /// Colors are used only on streams attached to a terminal.
    pub fn stdio(verbosity: u8) -> Self {
        let stdout_color = io::stdout().is_terminal();
        let stderr_color = io::stderr().is_terminal();
        Self::with_sinks(verbosity, Box::new(io::stdout()), Box::new(io::stderr()))
            .with_colors(stdout_color, stderr_color)
    }

    /// Reporter writing to the given sinks, without colors
    pub fn with_sinks(verbosity: u8, stdout: Box<dyn Write>, stderr: Box<dyn Write>) -> Self {
        Self {
            verbosity,
            stdout: Sink {
                writer: stdout,
                color: false,
            },
            stderr: Sink {
                writer: stderr,
                color: false,
            },
        }
    }

    /// Enable or disable colors per stream
    pub fn with_colors(mut self, stdout: bool, stderr: bool) -> Self {
        self.stdout.color = stdout;
        self.stderr.color = stderr;
        self
    }

    /// Print a message followed by a newline
    pub fn report(&mut self, message: impl AsRef<str>, level: Level) {
        self.emit(message.as_ref(), level);
    }

    /// Print at [`Level::Debug`]
    pub fn debug(&mut self, message: impl AsRef<str>) {
        self.report(message, Level::Debug);
    }

    /// Print at [`Level::Info`]
    pub fn info(&mut self, message: impl AsRef<str>) {
        self.report(message, Level::Info);
    }

    /// Print at [`Level::Warning`]
    pub fn warning(&mut self, message: impl AsRef<str>) {
        self.report(message, Level::Warning);
    }

    /// Print at [`Level::Error`]
    pub fn error(&mut self, message: impl AsRef<str>) {
        self.report(message, Level::Error);
    }

    fn emit(&mut self, message: &str, level: Level) {
        let Some(route) = level.route(self.verbosity) else {
            return;
        };
        let sink = match route.stream {
            Stream::Stdout => &mut self.stdout,
            Stream::Stderr => &mut self.stderr,
        };
        let text = if sink.color {
            message.color(route.color).to_string()
        } else {
            message.to_string()
        };

        // Console failures are not reported anywhere
        let written = writeln!(sink.writer, "{}", text).and_then(|_| sink.writer.flush());
        if written.is_err() {
            log::trace!("could not print {} message", level);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::capture::{reporter, Captured};
    use super::*;
    use proptest::prelude::*;

    const LEVELS: [Level; 6] = [
        Level::NotSet,
        Level::Debug,
        Level::Info,
        Level::Warning,
        Level::Error,
        Level::Critical,
    ];

    #[test]
    fn test_routes() {
        assert_eq!(
            Level::Info.route(0),
            Some(Route {
                stream: Stream::Stdout,
                color: Color::Green
            })
        );
        assert_eq!(Level::Warning.route(0), None);
        assert_eq!(Level::Warning.route(1).unwrap().stream, Stream::Stderr);
        assert_eq!(Level::Debug.route(1), None);
        assert_eq!(Level::NotSet.route(2).unwrap().color, Color::Magenta);
        assert_eq!(Level::Critical.route(0).unwrap().color, Color::Red);
    }

    #[test]
    fn test_level_order_and_names() {
        assert!(Level::Debug < Level::Info && Level::Error < Level::Critical);
        assert_eq!(Level::Warning as u8, 30);
        assert_eq!(Level::Critical.to_string(), "CRITICAL");
    }

    #[test]
    fn test_report_streams() {
        let (mut reporter, out, err) = reporter(1);
        reporter.debug("hidden");
        reporter.info("XML Schema valid!");
        reporter.warning("validation failed");
        reporter.error("boom");

        assert_eq!(out.text(), "XML Schema valid!\n");
        assert_eq!(err.text(), "validation failed\nboom\n");
    }

    #[test]
    fn test_report_at_level() {
        let (mut reporter, out, err) = reporter(0);
        reporter.report("shown", Level::Critical);
        reporter.report("hidden", Level::NotSet);
        assert_eq!(out.text(), "");
        assert_eq!(err.text(), "shown\n");
    }

    #[test]
    fn test_colors_only_when_enabled() {
        colored::control::set_override(true);
        let out = Captured::default();
        let mut colored_reporter =
            Reporter::with_sinks(0, Box::new(out.clone()), Box::new(io::sink()))
                .with_colors(true, false);
        colored_reporter.info("ok");
        assert!(out.text().starts_with("\u{1b}["));
        assert!(out.text().contains("ok"));

        let (mut plain, out, _) = reporter(0);
        plain.info("ok");
        assert_eq!(out.text(), "ok\n");
        colored::control::unset_override();
    }

    proptest! {
        #[test]
        fn prop_warning_needs_one_verbose(verbosity in 0u8..=16) {
            prop_assert_eq!(Level::Warning.route(verbosity).is_some(), verbosity >= 1);
        }

        #[test]
        fn prop_debug_needs_two_verbose(verbosity in 0u8..=16) {
            prop_assert_eq!(Level::Debug.route(verbosity).is_some(), verbosity >= 2);
            prop_assert_eq!(Level::NotSet.route(verbosity).is_some(), verbosity >= 2);
        }

        #[test]
        fn prop_info_and_errors_always_shown(verbosity in 0u8..=16) {
            prop_assert!(Level::Info.route(verbosity).is_some());
            prop_assert!(Level::Error.route(verbosity).is_some());
            prop_assert!(Level::Critical.route(verbosity).is_some());
        }

        #[test]
        fn prop_stream_depends_on_level_only(verbosity in 2u8..=16, index in 0usize..6) {
            let level = LEVELS[index];
            let route = level.route(verbosity).unwrap();
            let expected = if level >= Level::Warning { Stream::Stderr } else { Stream::Stdout };
            prop_assert_eq!(route.stream, expected);
        }

        #[test]
        fn prop_message_written_verbatim(message in "[a-zA-Z0-9 .:/!]{0,40}") {
            let (mut reporter, out, _) = reporter(0);
            reporter.info(&message);
            prop_assert_eq!(out.text(), format!("{}\n", message));
        }
    }
}
