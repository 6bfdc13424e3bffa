//! Styled terminal output for fanout reports
//!
//! Symbols and colours come from `console`; everything except errors respects
//! quiet mode.

use console::style;

/// Output handler for consistent CLI formatting
pub struct Output {
    verbose: bool,
    quiet: bool,
}

impl Output {
    /// Create a new output handler
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("✔").green(), message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        // Errors are always shown, even in quiet mode
        eprintln!("{} {}", style("✖").red(), message);
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("⚠").yellow(), message);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("ℹ").blue(), message);
        }
    }

    /// Print a verbose message (only if verbose mode is enabled)
    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            println!("{} {}", style("ℹ").dim(), style(message).dim());
        }
    }

    /// Print a header/title
    pub fn header(&self, title: &str) {
        if !self.quiet {
            println!("\n{}", style(title).bold().underlined());
        }
    }

    /// Print a section header with enhanced styling
    pub fn section_header(&self, title: &str) {
        if !self.quiet {
            println!("\n{}", style(title).bold().cyan());
        }
    }

    /// Print a step in a process
    pub fn step(&self, step: &str) {
        if !self.quiet {
            println!("{} {}", style("❯").cyan(), step);
        }
    }

    /// Print a key-value pair with consistent styling
    pub fn key_value(&self, key: &str, value: &str, highlight: bool) {
        if !self.quiet {
            let styled_value = if highlight {
                style(value).green().bold()
            } else {
                style(value).white()
            };
            println!("  {} {}", style(key).dim(), styled_value);
        }
    }

    /// Print one slot of a batch: position, label, and what happened
    pub fn slot(&self, index: usize, label: &str, detail: &str, success: bool) {
        if !self.quiet {
            let icon = if success {
                style("✓").green().bold()
            } else {
                style("✗").red().bold()
            };
            let detail = if success {
                style(detail).dim()
            } else {
                style(detail).red()
            };
            println!(
                "  {} {} {} {}",
                icon,
                style(format!("#{}", index + 1)).yellow(),
                style(label).bold(),
                detail
            );
        }
    }

    /// Print an indented block, line by line
    pub fn indent(&self, block: &str) {
        if !self.quiet {
            for line in block.lines() {
                println!("    {line}");
            }
        }
    }

    /// Print a section separator
    pub fn separator(&self) {
        if !self.quiet {
            println!("{}", style("─".repeat(50)).dim());
        }
    }

    /// Print an action result with consistent styling
    pub fn action_result(&self, action: &str, result: &str, success: bool) {
        if !self.quiet {
            let icon = if success { "✓" } else { "✗" };
            let styled_icon = if success {
                style(icon).green().bold()
            } else {
                style(icon).red().bold()
            };
            println!("{} {} {}", styled_icon, style(action).bold(), style(result).dim());
        }
    }
}
