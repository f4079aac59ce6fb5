//! Detect when the remote shell is back at its prompt.

/// Prompt printed by the shell when it is idle.
pub const DEFAULT_PROMPT: &str = "rtt:~$";

/// Decides whether the shell finished its output.
///
/// The shell reprints the prompt on a line of its own once a command
/// completes. Output is complete when the last line holds the prompt
/// and the line before it is a prompt-free line with at least one
/// letter in it. Blank lines and repeated prompts never complete
/// an exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptDetector {
    prompt: String,
}

impl Default for PromptDetector {
    fn default() -> Self {
        Self::new(DEFAULT_PROMPT)
    }
}

impl PromptDetector {
    /// Create a detector for a prompt literal.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }

    /// Get the prompt literal.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Whether the lines end with a response followed by the prompt.
    pub fn is_ready(&self, lines: &[&str]) -> bool {
        self.response_line(lines).is_some()
    }

    /// The response line if the shell is back at its prompt.
    pub fn response_line<'a>(&self, lines: &[&'a str]) -> Option<&'a str> {
        let [.., previous, last] = lines else {
            return None;
        };
        if lines.len() < 3 || !last.contains(self.prompt.as_str()) {
            return None;
        }
        if previous.contains(self.prompt.as_str())
            || !previous.chars().any(|c| c.is_ascii_alphabetic())
        {
            return None;
        }
        Some(*previous)
    }
}
