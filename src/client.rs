use async_trait::async_trait;
use colored::Colorize;
use dialoguer::Select;
use log::{debug, info, warn};
use reqwest::Client;
use std::time::Duration;
use tabled::{settings::Style, Table};

use crate::api_models::{
    GenerateOptions, GenerateRequest, GenerateResponse, Model, ModelDisplay, ModelsResponse,
    SelectedModel,
};
use crate::errors::InferenceError;

/// Text-completion collaborator. Stateless request/response; every call is bounded by `timeout`.
#[async_trait]
pub trait Inference: Send + Sync {
    async fn generate(&self, prompt: &str, timeout: Duration) -> Result<String, InferenceError>;
}

/// Run one completion and absorb any failure, logging it against `call_site`.
///
/// Returns `None` on timeout, error, or a blank response so callers can pick their own default.
pub async fn generate_or_none(
    inference: &dyn Inference,
    prompt: &str,
    timeout: Duration,
    call_site: &str,
) -> Option<String> {
    match inference.generate(prompt, timeout).await {
        Ok(text) if !text.trim().is_empty() => {
            debug!("{}: received {} characters", call_site, text.len());
            Some(text)
        }
        Ok(_) => {
            warn!("{}: inference returned an empty response", call_site);
            None
        }
        Err(e) => {
            warn!("{}: {}", call_site, e);
            None
        }
    }
}

pub struct OllamaClient {
    http: Client,
    base_url: String,
    model: String,
    options: GenerateOptions,
    system_prompt: Option<String>,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str, temperature: f32, max_tokens: u32) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            options: GenerateOptions {
                temperature,
                num_predict: max_tokens,
            },
            system_prompt: None,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: &str) -> Self {
        self.system_prompt = Some(system_prompt.to_string());
        self
    }

    async fn request_completion(&self, prompt: &str) -> Result<String, InferenceError> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            system: self.system_prompt.clone(),
            options: self.options,
        };

        let response = self
            .http
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(InferenceError::request)?;

        if !response.status().is_success() {
            return Err(InferenceError::request(format!(
                "API request failed: {}",
                response.status()
            )));
        }

        let body: GenerateResponse = response.json().await.map_err(InferenceError::request)?;
        if let Some(duration_ns) = body.total_duration {
            debug!(
                "Generation took {:.2}s (done: {})",
                duration_ns as f64 / 1_000_000_000.0,
                body.done
            );
        }

        if body.response.trim().is_empty() {
            return Err(InferenceError::EmptyResponse);
        }
        Ok(body.response)
    }
}

#[async_trait]
impl Inference for OllamaClient {
    async fn generate(&self, prompt: &str, timeout: Duration) -> Result<String, InferenceError> {
        match tokio::time::timeout(timeout, self.request_completion(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(InferenceError::Timeout {
                seconds: timeout.as_secs(),
            }),
        }
    }
}

// Model Selection
pub async fn fetch_models(base_url: &str) -> Result<Vec<Model>, reqwest::Error> {
    let response = Client::new()
        .get(format!("{}/api/tags", base_url.trim_end_matches('/')))
        .send()
        .await?
        .error_for_status()?;

    let models_response: ModelsResponse = response.json().await?;
    Ok(models_response.models)
}

/// Pick the configured model if it is installed, otherwise the first installed one.
pub fn resolve_model(models: &[Model], configured: Option<&str>) -> Option<SelectedModel> {
    let wanted = configured?;
    if let Some(model) = models.iter().find(|m| m.name == wanted) {
        return Some(SelectedModel::from(model.clone()));
    }

    let fallback = models.first()?;
    warn!(
        "Model '{}' is not installed, using '{}' instead",
        wanted, fallback.name
    );
    Some(SelectedModel::from(fallback.clone()))
}

pub fn display_models_table(models: &[Model]) {
    let model_displays: Vec<ModelDisplay> = models
        .iter()
        .enumerate()
        .map(|(index, model)| ModelDisplay {
            index: index + 1,
            name: model.name.clone(),
            size: format!("{:.2} GB", model.size as f64 / 1_000_000_000.0),
            modified: model
                .modified_at
                .split('T')
                .next()
                .filter(|date| !date.is_empty())
                .unwrap_or("Unknown")
                .to_string(),
        })
        .collect();

    let mut table = Table::new(model_displays);
    table.with(Style::modern());

    println!("{}", "Available Models:".cyan().bold());
    println!("{}", table);
    println!();
}

pub fn select_model(models: &[Model]) -> anyhow::Result<SelectedModel> {
    if models.is_empty() {
        anyhow::bail!("No models available.");
    }

    display_models_table(models);

    let model_options: Vec<String> = models
        .iter()
        .map(|model| {
            format!(
                "{} ({:.2} GB)",
                model.name,
                model.size as f64 / 1_000_000_000.0
            )
        })
        .collect();

    let selection = Select::new()
        .with_prompt("Select model for your session")
        .items(&model_options)
        .default(0)
        .interact()?;

    let selected = SelectedModel::from(models[selection].clone());
    info!("Selected model {}", selected.name);
    Ok(selected)
}
