use colored::Colorize;
use log::info;
use std::time::Instant;

use crate::api_models::SelectedModel;
use crate::cli;
use crate::tasks::{TaskOrchestrator, TaskRequest, TaskResponse};

const EXIT_WORDS: [&str; 4] = ["quit", "exit", "bye", "goodbye"];

pub fn is_exit_command(input: &str) -> bool {
    EXIT_WORDS.contains(&input.trim().to_lowercase().as_str())
}

pub struct AssistantSession {
    model: SelectedModel,
    orchestrator: TaskOrchestrator,
    json: bool,
    completed: usize,
    failed: usize,
}

impl AssistantSession {
    pub fn new(model: SelectedModel, orchestrator: TaskOrchestrator, json: bool) -> Self {
        Self {
            model,
            orchestrator,
            json,
            completed: 0,
            failed: 0,
        }
    }

    /// Interactive loop until an exit word or end of input.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        self.show_welcome();

        loop {
            let user_input = match cli::get_user_prompt() {
                Ok(input) => input,
                Err(_) => {
                    println!("\n{}", "Session ended by user".yellow());
                    break;
                }
            };

            if is_exit_command(&user_input) {
                println!("{}", "Goodbye! 👋".cyan());
                break;
            }

            self.run_once(&user_input).await?;
            println!();
        }

        info!(
            "Session finished: {} tasks succeeded, {} failed",
            self.completed, self.failed
        );
        Ok(())
    }

    /// Run one task and print its envelope.
    pub async fn run_once(&mut self, text: &str) -> anyhow::Result<TaskResponse> {
        let start_time = Instant::now();
        let request = TaskRequest::new(text).with_model_hint(self.model.get_name());

        let spinner = cli::spinner("Working on it...");
        let response = self.orchestrator.handle(&request).await;
        spinner.finish_and_clear();

        if response.success {
            self.completed += 1;
        } else {
            self.failed += 1;
        }

        if self.json {
            cli::print_json(&response)?;
        } else {
            cli::print_response(&response);
            println!(
                "{} Completed in {:.2}s",
                "⏱".dimmed(),
                start_time.elapsed().as_secs_f64()
            );
        }

        Ok(response)
    }

    fn show_welcome(&self) {
        println!("{}", "🤖 Research Assistant".cyan().bold());
        println!("Model: {}", self.model.get_name().yellow());
        println!();
        println!("{}", "I can help you with:".blue());
        println!("  {} Gathering information from the web into a sourced report", "•".blue());
        println!("  {} Writing stories, notes and documents to files", "•".blue());
        println!("  {} Answering questions directly", "•".blue());
        println!();
        println!("{}", "Type 'quit' or 'exit' to end the session".dimmed());
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_words_ignore_case_and_whitespace() {
        assert!(is_exit_command("  Quit "));
        assert!(is_exit_command("GOODBYE"));
        assert!(!is_exit_command("exit the building"));
    }
}
