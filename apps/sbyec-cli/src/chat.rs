//! Interactive terminal chat.
use anyhow::Result;
use std::io::{BufRead, Write};

use sbyec_core::config::OrgProfile;

use crate::state::AppState;

const EXIT_WORDS: &[&str] = &["quit", "exit", "bye"];

pub fn run(state: &AppState, org: &OrgProfile, mut input: impl BufRead, mut out: impl Write) -> Result<()> {
    let rule = "=".repeat(60);
    writeln!(out, "{rule}\n{} Chatbot\n{}\n{rule}", org.short_name, org.name)?;
    writeln!(out, "\nAsk me anything about {}!", org.short_name)?;
    writeln!(out, "Type 'quit' to exit, 'refresh' to reload content\n")?;

    let mut line = String::new();
    loop {
        write!(out, "You: ")?;
        out.flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        let lowered = question.to_lowercase();
        if EXIT_WORDS.contains(&lowered.as_str()) {
            writeln!(
                out,
                "\nChatbot: Thank you for your interest in {}! Visit us at {} or call {}. Goodbye!",
                org.short_name, org.website, org.phone
            )?;
            break;
        }
        if lowered == "refresh" {
            match state.refresh() {
                Ok(()) => writeln!(out, "Knowledge base refreshed!\n")?,
                Err(e) => writeln!(out, "Refresh failed: {:#}\n", e)?,
            }
            continue;
        }
        writeln!(out, "\nChatbot: {}\n", state.ask(question, true))?;
    }
    Ok(())
}
