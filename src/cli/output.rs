//! Terminal output for the `init` and `config` commands
//!
//! Each line is rendered to a `String` before printing, so the plain form
//! can be checked in tests. Colors come from owo-colors and are switched off
//! with `--no-color`.

use owo_colors::OwoColorize;
use std::path::Path;

/// How a status line is marked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    /// Something finished as asked
    Ok,
    /// Neutral information
    Note,
    /// Nothing failed, but the user should look
    Caution,
    /// The command failed; printed to stderr
    Problem,
}

impl Mark {
    fn tag(self) -> &'static str {
        match self {
            Mark::Ok => "[OK]",
            Mark::Note => "[NOTE]",
            Mark::Caution => "[WARN]",
            Mark::Problem => "[ERROR]",
        }
    }

    fn symbol(self) -> String {
        match self {
            Mark::Ok => "✓".green().bold().to_string(),
            Mark::Note => "•".blue().to_string(),
            Mark::Caution => "⚠".yellow().bold().to_string(),
            Mark::Problem => "✗".red().bold().to_string(),
        }
    }
}

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    /// Create an output helper with colors enabled
    pub fn new() -> Self {
        Self { colored: true }
    }

    /// Create an output helper with colors disabled
    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Pick the style from the global `--no-color` flag.
    pub fn for_flags(no_color: bool) -> Self {
        if no_color {
            Self::no_color()
        } else {
            Self::new()
        }
    }

    /// Print the MindfulSpace banner
    pub fn banner(&self) {
        let version = format!("v{}", env!("CARGO_PKG_VERSION"));
        if self.colored {
            println!(
                "\n   {} {}\n   {}\n",
                "MindfulSpace".bright_cyan().bold(),
                version.dimmed(),
                "A gentle place to talk, share and find help".bright_white()
            );
        } else {
            println!(
                "\n   MindfulSpace {}\n   A gentle place to talk, share and find help\n",
                version
            );
        }
    }

    /// Print a section title, e.g. "Configuration" or "Next steps"
    pub fn section(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    /// Print a marked status line. Problems go to stderr.
    pub fn status(&self, mark: Mark, message: &str) {
        let line = self.render_status(mark, message);
        if mark == Mark::Problem {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }

    /// Report a file that `init` wrote
    pub fn wrote(&self, path: &Path) {
        println!("{}", self.render_file("wrote", path, None));
    }

    /// Report a file that `init` left alone, and why
    pub fn kept(&self, path: &Path, reason: &str) {
        println!("{}", self.render_file("kept", path, Some(reason)));
    }

    /// Print one resolved configuration value
    pub fn setting(&self, key: &str, value: &str) {
        println!("{}", self.render_setting(key, value));
    }

    /// Print a numbered follow-up, optionally with the command to run
    pub fn next_step(&self, number: usize, text: &str, command: Option<&str>) {
        println!("{}", self.render_step(number, text));
        if let Some(command) = command {
            if self.colored {
                println!("       {}", format!("$ {}", command).bright_cyan());
            } else {
                println!("       $ {}", command);
            }
        }
    }

    fn render_status(&self, mark: Mark, message: &str) -> String {
        if !self.colored {
            return format!("  {} {}", mark.tag(), message);
        }
        let message = match mark {
            Mark::Ok => message.green().to_string(),
            Mark::Note => message.to_string(),
            Mark::Caution => message.yellow().to_string(),
            Mark::Problem => message.red().to_string(),
        };
        format!("  {} {}", mark.symbol(), message)
    }

    fn render_file(&self, verb: &str, path: &Path, note: Option<&str>) -> String {
        let path = path.display().to_string();
        match (self.colored, note) {
            (false, None) => format!("  [{}] {}", verb.to_uppercase(), path),
            (false, Some(note)) => format!("  [{}] {} ({})", verb.to_uppercase(), path, note),
            (true, None) => format!(
                "  {} {} {}",
                "✓".green().bold(),
                verb.dimmed(),
                path.bright_white()
            ),
            (true, Some(note)) => format!(
                "  {} {} {} {}",
                "○".yellow(),
                verb.dimmed(),
                path.dimmed(),
                format!("({})", note).yellow()
            ),
        }
    }

    fn render_setting(&self, key: &str, value: &str) -> String {
        if self.colored {
            format!("    {:<20} {}", key.dimmed(), value.bright_white())
        } else {
            format!("    {:<20} {}", format!("{}:", key), value)
        }
    }

    fn render_step(&self, number: usize, text: &str) -> String {
        if self.colored {
            format!("  {} {}", format!("{}.", number).cyan().bold(), text)
        } else {
            format!("  {}. {}", number, text)
        }
    }
}
