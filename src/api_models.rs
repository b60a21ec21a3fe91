use colored::Colorize;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

#[derive(Serialize, Debug)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub options: GenerateOptions,
}

#[derive(Serialize, Debug, Clone, Copy)]
pub struct GenerateOptions {
    pub temperature: f32,
    pub num_predict: u32,
}

// Non-streaming /api/generate response
#[derive(Deserialize, Debug)]
pub struct GenerateResponse {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub total_duration: Option<u64>,
}

#[derive(Deserialize, Debug)]
pub struct ModelsResponse {
    pub models: Vec<Model>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Model {
    pub name: String,
    pub size: u64,
    #[serde(default)]
    pub digest: String,
    #[serde(default)]
    pub modified_at: String,
}

#[derive(Tabled)]
pub struct ModelDisplay {
    #[tabled(rename = "Index")]
    pub index: usize,
    #[tabled(rename = "📦 Model")]
    pub name: String,
    #[tabled(rename = "💾 Size")]
    pub size: String,
    #[tabled(rename = "📅 Modified")]
    pub modified: String,
}

#[derive(Debug, Clone)]
pub struct SelectedModel {
    pub name: String,
    pub size_gb: f64,
    pub digest: String,
}

impl From<Model> for SelectedModel {
    fn from(model: Model) -> Self {
        SelectedModel {
            name: model.name,
            size_gb: model.size as f64 / 1_000_000_000.0,
            digest: model.digest,
        }
    }
}

impl SelectedModel {
    pub fn display_info(&self) {
        println!("{}", "Selected Model:".cyan().bold());
        println!("  {} {}", "Name:".blue(), self.name.white().bold());
        println!("  {} {:.2} GB", "Size:".blue(), self.size_gb);
        if self.digest.len() >= 12 {
            println!("  {} {}", "Digest:".blue(), self.digest[..12].dimmed());
        }
        println!();
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }
}
