use async_trait::async_trait;
use log::{error, info};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::client::Inference;
use crate::config::AssistantConfig;
use crate::research::{Fetcher, ResearchPipeline, SourceTables};
use crate::tasks::classifier::{classify, TaskKind};
use crate::tasks::envelope::{TaskPayload, TaskResponse};
use crate::tasks::file_creation::FileCreator;
use crate::tasks::filename;
use crate::writers::FileWriter;

/// One incoming instruction. Consumed once by [`TaskOrchestrator::handle`].
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRequest {
    pub request_id: Uuid,
    pub text: String,
    pub model_hint: Option<String>,
}

impl TaskRequest {
    pub fn new(text: &str) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            text: text.trim().to_string(),
            model_hint: None,
        }
    }

    pub fn with_model_hint(mut self, model: &str) -> Self {
        self.model_hint = Some(model.to_string());
        self
    }
}

/// Executes a task kind the orchestrator has no built-in path for.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(&self, request: &TaskRequest) -> TaskResponse;
}

fn direct_prompt(text: &str) -> String {
    format!(
        "You are a helpful assistant. Complete the following request directly and concisely.\n\n\
         User request: {}",
        text
    )
}

pub struct TaskOrchestrator {
    inference: Arc<dyn Inference>,
    writer: Arc<dyn FileWriter>,
    research: ResearchPipeline,
    handlers: HashMap<TaskKind, Arc<dyn TaskHandler>>,
    config: AssistantConfig,
}

impl TaskOrchestrator {
    pub fn new(
        inference: Arc<dyn Inference>,
        fetcher: Arc<dyn Fetcher>,
        writer: Arc<dyn FileWriter>,
        tables: Arc<SourceTables>,
        config: AssistantConfig,
    ) -> Self {
        let research = ResearchPipeline::new(
            Arc::clone(&inference),
            fetcher,
            Arc::clone(&writer),
            tables,
            config.clone(),
        );
        Self {
            inference,
            writer,
            research,
            handlers: HashMap::new(),
            config,
        }
    }

    pub fn with_handler(mut self, kind: TaskKind, handler: Arc<dyn TaskHandler>) -> Self {
        self.handlers.insert(kind, handler);
        self
    }

    pub async fn handle(&self, request: &TaskRequest) -> TaskResponse {
        let classification = classify(&request.text);
        info!(
            "Task {} classified as {} ({}), model hint {:?}",
            request.request_id, classification.kind, classification.rule, request.model_hint
        );

        match classification.kind {
            TaskKind::FileCreation => self.create_file(request).await,
            TaskKind::WebResearch => {
                let suggested = filename::find_anchored(&request.text);
                let report = self.research.run_research(&request.text, suggested.as_ref()).await;
                TaskResponse::research(request.request_id, &report)
            }
            TaskKind::General => self.complete_directly(request).await,
            other => match self.handlers.get(&other) {
                Some(handler) => handler.handle(request).await,
                None => TaskResponse::unsupported(request.request_id, other),
            },
        }
    }

    async fn create_file(&self, request: &TaskRequest) -> TaskResponse {
        let target = filename::extract(&request.text);
        let creator = FileCreator::new(
            self.inference.as_ref(),
            self.writer.as_ref(),
            &self.config.output_dir,
            self.config.inference_timeout(),
        );

        match creator.create(&request.text, &target).await {
            Ok(created) => TaskResponse::file_created(request.request_id, created),
            Err(e) => {
                error!("File creation failed: {}", e);
                TaskResponse::failed(
                    request.request_id,
                    TaskKind::FileCreation.as_str(),
                    format!("Could not create {}", target),
                    e.to_string(),
                )
            }
        }
    }

    async fn complete_directly(&self, request: &TaskRequest) -> TaskResponse {
        match self
            .inference
            .generate(&direct_prompt(&request.text), self.config.inference_timeout())
            .await
        {
            Ok(text) => TaskResponse::succeeded(
                request.request_id,
                TaskKind::General.as_str(),
                TaskPayload::Text(text.trim().to_string()),
                "Task completed",
            ),
            Err(e) => TaskResponse::failed(
                request.request_id,
                TaskKind::General.as_str(),
                "The model could not complete the request",
                e.to_string(),
            ),
        }
    }
}
