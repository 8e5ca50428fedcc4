use std::io::{self, BufRead, Write};

use crate::app::Prompter;

/// Asks on stdout and reads answers from stdin.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    fn read_answer(message: &str, suffix: &str) -> Option<String> {
        let mut stdout = io::stdout();
        let _ = write!(stdout, "{message}{suffix}");
        let _ = stdout.flush();

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&mut self, message: &str) -> bool {
        Self::read_answer(message, " [y/N] ")
            .is_some_and(|answer| is_affirmative(&answer))
    }

    fn prompt(&mut self, message: &str) -> Option<String> {
        Self::read_answer(message, " ").filter(|answer| !answer.is_empty())
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
