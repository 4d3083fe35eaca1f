//! Operator confirmation
//!
//! Promotion is irreversible, so the cutover asks before mutating:
//! - affirmation is explicit: only the word `yes` counts
//! - anything else, including a read failure or end of input, is a decline
//! - one answer covers exactly one gate

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::sync::Mutex;

/// Yes/no prompt.
pub trait Confirm: Send + Sync {
    /// Ask `prompt`; `true` only on explicit affirmation.
    fn confirm(&self, prompt: &str) -> bool;
}

/// Whether a typed answer affirms.
pub fn is_affirmative(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}

/// Prompts on stdout and reads one line from stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConfirmer;

impl Confirm for StdinConfirmer {
    fn confirm(&self, prompt: &str) -> bool {
        let mut stdout = io::stdout();
        if write!(stdout, "{} (yes/no): ", prompt)
            .and_then(|_| stdout.flush())
            .is_err()
        {
            return false;
        }
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => false,
            Ok(_) => is_affirmative(&line),
        }
    }
}

/// Always affirms. Used for `--yes`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Replays canned answers in order and records every prompt.
///
/// Declines once the answers run out.
#[derive(Debug, Default)]
pub struct ScriptedConfirmer {
    answers: Mutex<VecDeque<bool>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedConfirmer {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts shown so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

impl Confirm for ScriptedConfirmer {
    fn confirm(&self, prompt: &str) -> bool {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.answers
            .lock()
            .ok()
            .and_then(|mut answers| answers.pop_front())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_yes_affirms() {
        assert!(is_affirmative("yes"));
        assert!(is_affirmative("YES\n"));
        assert!(is_affirmative("  Yes "));
        assert!(!is_affirmative("y"));
        assert!(!is_affirmative("no"));
        assert!(!is_affirmative(""));
        assert!(!is_affirmative("yes please"));
    }

    #[test]
    fn test_scripted_confirmer_replays_then_declines() {
        let confirmer = ScriptedConfirmer::new([true, false]);
        assert!(confirmer.confirm("first"));
        assert!(!confirmer.confirm("second"));
        assert!(!confirmer.confirm("third"));
        assert_eq!(confirmer.prompts(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_assume_yes() {
        assert!(AssumeYes.confirm("anything"));
    }
}
