use std::time::Duration;

use colored::Colorize;
use console::Term;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use termimad::MadSkin;

use crate::tasks::{TaskPayload, TaskResponse};

const PREVIEW_HEAD: usize = 12;
const PREVIEW_TAIL: usize = 6;

pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
    spinner.set_style(style);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

pub fn print_header() {
    let term = Term::stdout();
    let _ = term.clear_screen();

    println!("{}", "╔══════════════════════════════════════╗".cyan());
    println!("{}", "║      🦙 Ollama Research Assistant    ║".cyan());
    println!("{}", "╚══════════════════════════════════════╝".cyan());
    println!();
}

pub fn print_separator() {
    println!("{}", "─".repeat(50).dimmed());
}

pub fn get_user_prompt() -> anyhow::Result<String> {
    print_separator();

    let prompt: String = Input::new()
        .with_prompt("🤖 What should I do?")
        .allow_empty(false)
        .interact_text()?;

    Ok(prompt)
}

/// First and last lines of long output with an omission marker between them.
pub fn preview_lines(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= PREVIEW_HEAD + PREVIEW_TAIL {
        return text.to_string();
    }

    let omitted = lines.len() - PREVIEW_HEAD - PREVIEW_TAIL;
    let mut preview: Vec<String> = lines[..PREVIEW_HEAD].iter().map(|l| l.to_string()).collect();
    preview.push(format!("⋮ ... ({} lines omitted) ...", omitted));
    preview.extend(lines[lines.len() - PREVIEW_TAIL..].iter().map(|l| l.to_string()));
    preview.join("\n")
}

fn print_list(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("{}", title.blue().bold());
    for item in items {
        println!("  {} {}", "•".blue(), item);
    }
}

pub fn print_response(response: &TaskResponse) {
    println!();
    if response.success {
        println!("{} {}", "✅".green(), response.message.green().bold());
    } else {
        println!("{} {}", "❌".red(), response.message.red().bold());
    }
    println!("{} {}", "Task type:".dimmed(), response.task_type);

    let skin = MadSkin::default();
    match &response.result {
        TaskPayload::FileCreated(created) => {
            println!("{} {}", "📄 Saved to:".blue(), created.path.display());
            println!("{} {} bytes", "💾 Size:".blue(), created.bytes);
            println!();
            skin.print_text(&created.preview);
        }
        TaskPayload::Research(research) => {
            println!("{} {} ({})", "🗂 Category:".blue(), research.category_label, research.topic);
            println!("{} {}", "🔎 Query:".blue(), research.query);
            if let Some(path) = &research.path {
                println!("{} {}", "📄 Saved to:".blue(), path.display());
            }
            if research.fallback_attempted {
                println!("{}", "↩ Fallback sources were consulted".yellow());
            }
            println!();
            print_list("Sources used:", &research.sources_used);
            print_list("Highlights:", &research.sample_excerpts);
            println!();
            print_separator();
            skin.print_text(&preview_lines(&research.report));
        }
        TaskPayload::Text(text) => {
            println!();
            skin.print_text(text);
        }
        TaskPayload::None => {}
    }

    if let Some(error) = &response.error {
        if *error != response.message {
            println!("{} {}", "Error:".red(), error);
        }
    }
}

pub fn print_json(response: &TaskResponse) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}
