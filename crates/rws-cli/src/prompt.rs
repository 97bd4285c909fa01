//! Terminal-backed [`UserPrompt`].

use std::io::Write;

use async_trait::async_trait;
use rws_sdk::UserPrompt;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Asks on stderr and reads the reply from stdin.
///
/// With `assume_yes` every confirmation is accepted without asking. A
/// closed stdin declines and cancels.
pub struct TerminalPrompt {
    assume_yes: bool,
}

impl TerminalPrompt {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }

    async fn read_line(question: &str) -> Option<String> {
        eprint!("{question} ");
        let _ = std::io::stderr().flush();
        let mut line = String::new();
        let mut reader = BufReader::new(tokio::io::stdin());
        match reader.read_line(&mut line).await {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

#[async_trait]
impl UserPrompt for TerminalPrompt {
    async fn confirm(&self, question: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        Self::read_line(&format!("{question} [y/N]"))
            .await
            .is_some_and(|reply| is_yes(&reply))
    }

    async fn ask(&self, question: &str) -> Option<String> {
        Self::read_line(question).await.filter(|s| !s.is_empty())
    }
}

fn is_yes(reply: &str) -> bool {
    matches!(reply.to_ascii_lowercase().as_str(), "y" | "yes")
}
