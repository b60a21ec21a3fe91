use clap::Parser;
use colored::Colorize;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    api_models::SelectedModel,
    client::{fetch_models, resolve_model, select_model, OllamaClient},
    config::AssistantConfig,
    research::{HttpFetcher, SourceTables},
    session::AssistantSession,
    tasks::TaskOrchestrator,
    writers::LocalFileWriter,
};

pub mod api_models;
pub mod cli;
pub mod client;
pub mod config;
pub mod errors;
pub mod logging;
pub mod research;
pub mod session;
pub mod tasks;
pub mod text;
pub mod writers;

#[cfg(test)]
mod testing;

const SYSTEM_PROMPT: &str = "You are a careful research and writing assistant. Follow the requested output format exactly.";

#[derive(Parser, Debug)]
#[command(name = "ollama-research-assistant", version, about = "Route tasks to file creation or sourced web research using a local Ollama model")]
struct Args {
    /// Model to use; skips the interactive picker when installed
    #[arg(short, long)]
    model: Option<String>,

    #[arg(long)]
    ollama_url: Option<String>,

    /// Directory research reports and created files are written to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    #[arg(long)]
    log_level: Option<String>,

    /// Config file (defaults to ~/.ollama_agent/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the response envelope as JSON
    #[arg(long)]
    json: bool,

    /// Run a single task and exit
    task: Vec<String>,
}

fn load_config(args: &Args) -> anyhow::Result<AssistantConfig> {
    let mut config = AssistantConfig::load(args.config.as_deref())?;
    config.apply_env()?;

    if let Some(model) = &args.model {
        config.model = Some(model.clone());
    }
    if let Some(url) = &args.ollama_url {
        config.ollama_url = url.trim_end_matches('/').to_string();
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(level) = &args.log_level {
        config.set_log_level(level)?;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;
    logging::init(&config.log_level);

    let one_shot = !args.task.is_empty();
    if !one_shot {
        cli::print_header();
        println!("{}", "🚀 Research Assistant Startup".cyan().bold());
        println!();
    }

    let spinner = cli::spinner("Fetching models from Ollama...");
    let models = match fetch_models(&config.ollama_url).await {
        Ok(models) => {
            spinner.finish_and_clear();
            models
        }
        Err(e) => {
            spinner.finish_with_message("✗ Connection failed".red().to_string());
            println!("{} Failed to connect to Ollama: {}", "❌".red(), e);
            println!("{} Make sure Ollama is running: ollama serve", "💡".yellow());
            return Err(e.into());
        }
    };

    if models.is_empty() {
        println!(
            "{} No models available. Install one with: ollama pull llama3.2",
            "⚠".yellow()
        );
        return Ok(());
    }

    let selected_model = match resolve_model(&models, config.model.as_deref()) {
        Some(model) => model,
        None if one_shot => models
            .first()
            .cloned()
            .map(SelectedModel::from)
            .ok_or_else(|| anyhow::anyhow!("No models available."))?,
        None => select_model(&models)?,
    };
    if !one_shot {
        selected_model.display_info();
    }
    info!("Writing output to {}", config.output_dir.display());

    let inference = Arc::new(
        OllamaClient::new(
            &config.ollama_url,
            selected_model.get_name(),
            config.temperature,
            config.max_tokens,
        )
        .with_system_prompt(SYSTEM_PROMPT),
    );
    let fetcher = Arc::new(HttpFetcher::new(&config.user_agent, config.max_page_chars)?);
    let orchestrator = TaskOrchestrator::new(
        inference,
        fetcher,
        Arc::new(LocalFileWriter),
        SourceTables::shared(),
        config,
    );

    let mut session = AssistantSession::new(selected_model, orchestrator, args.json);
    if one_shot {
        let response = session.run_once(&args.task.join(" ")).await?;
        if !response.success {
            std::process::exit(1);
        }
    } else {
        session.run().await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args::parse_from([
            "ollama-research-assistant",
            "--config",
            dir.path().join("missing.json").to_str().unwrap(),
            "--model",
            "mistral",
            "--output-dir",
            "/tmp/out",
            "--log-level",
            "warn",
            "find",
            "news",
        ]);

        let config = load_config(&args).unwrap();

        assert_eq!(config.model.as_deref(), Some("mistral"));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(args.task, vec!["find", "news"]);
    }

    #[test]
    fn invalid_log_level_is_rejected() {
        let args = Args::parse_from(["ollama-research-assistant", "--config", "/nonexistent/config.json", "--log-level", "loud"]);
        assert!(load_config(&args).is_err());
    }
}
