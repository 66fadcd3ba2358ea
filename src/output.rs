// ABOUTME: Output sink and confirmation prompt abstractions for the CLI.
// ABOUTME: Orchestrations write to an explicit writer instead of global state.

use std::io::{self, BufRead, Write};

/// Asks the user yes/no questions. The orchestrator never reads stdin
/// directly so tests can script answers.
pub trait Prompt {
    fn confirm(&mut self, message: &str) -> io::Result<bool>;
}

/// Interactive prompt reading answers from stdin.
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn confirm(&mut self, message: &str) -> io::Result<bool> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        write!(out, "{message} [y/N] ")?;
        out.flush()?;

        let stdin = io::stdin();
        let mut answer = String::new();
        stdin.lock().read_line(&mut answer)?;

        Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
    }
}

/// Scripted prompt answering a fixed sequence. Answers beyond the script
/// are "no".
#[derive(Default)]
pub struct ScriptedPrompt {
    answers: Vec<bool>,
    pub asked: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new(answers: Vec<bool>) -> Self {
        Self {
            answers,
            asked: Vec::new(),
        }
    }
}

impl Prompt for ScriptedPrompt {
    fn confirm(&mut self, message: &str) -> io::Result<bool> {
        self.asked.push(message.to_string());
        let index = self.asked.len() - 1;
        Ok(self.answers.get(index).copied().unwrap_or(false))
    }
}

/// Print a `Key: Value` field line.
pub fn field<W: Write>(w: &mut W, key: &str, value: &str) -> io::Result<()> {
    writeln!(w, "{key}: {value}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_prompt_follows_script_then_declines() {
        let mut prompt = ScriptedPrompt::new(vec![true, false]);
        assert!(prompt.confirm("first?").unwrap());
        assert!(!prompt.confirm("second?").unwrap());
        assert!(!prompt.confirm("third?").unwrap());
        assert_eq!(prompt.asked.len(), 3);
    }

    #[test]
    fn field_formats_key_value() {
        let mut buf = Vec::new();
        field(&mut buf, "StackName", "test-mystack").unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "StackName: test-mystack\n");
    }
}
