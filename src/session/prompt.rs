//! Logout prompt shown when the server ends the session.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::invalidation::InvalidationNotice;

/// A one-button acknowledgment prompt.
///
/// `acknowledge` resolves once the user has dismissed the prompt. The session
/// manager clears local state only after it returns.
#[async_trait]
pub trait LogoutPrompt: Send + Sync {
    async fn acknowledge(&self, notice: &InvalidationNotice);
}

/// Prompt on the controlling terminal: prints the notice to stderr and waits
/// for Enter. EOF or a read error counts as acknowledgment.
pub struct TerminalPrompt;

#[async_trait]
impl LogoutPrompt for TerminalPrompt {
    async fn acknowledge(&self, notice: &InvalidationNotice) {
        eprintln!();
        eprintln!("== {} ==", notice.title);
        eprintln!("{}", notice.message);
        eprintln!("[OK] press Enter");

        let mut line = String::new();
        let mut stdin = BufReader::new(tokio::io::stdin());
        if let Err(e) = stdin.read_line(&mut line).await {
            log::warn!("Failed to read prompt acknowledgment: {}", e);
        }
    }
}

/// Prompt that acknowledges immediately after logging the notice.
///
/// For non-interactive runs where nobody can press a button.
pub struct LogOnlyPrompt;

#[async_trait]
impl LogoutPrompt for LogOnlyPrompt {
    async fn acknowledge(&self, notice: &InvalidationNotice) {
        log::warn!("{}: {}", notice.title, notice.message);
    }
}
