//! Non-interactive entry points: one-shot questions, primer inspection,
//! config initialisation, and a line-mode chat for terminals without a TTY.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::app::Helpline;
use crate::config::Config;
use crate::session::Session;
use crate::ui::conversation::{SlashCommand, get_help_text, parse_slash_command};

/// Submit one message to a fresh session and print the assistant entry.
///
/// Blank input is an error so the process exits non-zero.
pub async fn ask(helpline: &Helpline, message: &str) -> Result<()> {
    let mut session = helpline.new_session();
    let turn = session.submit(message).await?;
    println!("{}", turn.reply_text());
    Ok(())
}

/// Print the system primer exactly as it is sent to the service
pub fn print_primer(config: &Config) -> Result<()> {
    let primer = crate::app::load_primer(&config.dataset)?;
    println!("{primer}");
    Ok(())
}

/// Write a default config.toml into the helpline home
pub fn init_config(config: &Config) -> Result<()> {
    let path = config.save_new()?;
    println!("📝 Wrote {}", path.display());
    println!("Add {} to {}", crate::config::API_KEY_ENV, config.home.join("secrets.toml").display());
    Ok(())
}

/// Line-mode chat over arbitrary reader/writer pairs (stdin/stdout in practice)
pub async fn plain_chat<R, W>(session: &mut Session, input: R, mut output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    output
        .write_all(b"Helpline Conversation Assistant. Type /help for commands.\n> ")
        .await?;
    output.flush().await?;

    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        let reply = match parse_slash_command(&line) {
            Some(SlashCommand::Bye) => break,
            Some(SlashCommand::Clear) => {
                session.clear();
                "Conversation cleared.".to_string()
            }
            Some(SlashCommand::Help) => get_help_text(),
            None => match session.submit(&line).await {
                Ok(turn) => format!("Assistant: {}", turn.reply_text()),
                Err(warning) => format!("⚠️  {warning}"),
            },
        };

        output.write_all(reply.as_bytes()).await?;
        output.write_all(b"\n> ").await?;
        output.flush().await?;
    }

    output.write_all(b"\n").await?;
    output.flush().await?;
    Ok(())
}
