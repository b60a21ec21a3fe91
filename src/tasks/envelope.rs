use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;

use crate::research::category::Category;
use crate::research::ResearchReport;
use crate::tasks::classifier::TaskKind;
use crate::tasks::file_creation::FileCreation;

/// Research output as shown to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchPayload {
    pub category: Category,
    pub category_label: String,
    pub topic: String,
    pub query: String,
    pub filename: Option<String>,
    pub path: Option<PathBuf>,
    pub sources_used: Vec<String>,
    pub sample_excerpts: Vec<String>,
    pub information: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub headlines: Vec<String>,
    pub fallback_attempted: bool,
    pub report: String,
}

impl From<&ResearchReport> for ResearchPayload {
    fn from(report: &ResearchReport) -> Self {
        Self {
            category: report.resolution.category,
            category_label: report.resolution.label.clone(),
            topic: report.resolution.topic.clone(),
            query: report.query.text.clone(),
            filename: report.filename(),
            path: report.path.clone(),
            sources_used: report.sources_used.clone(),
            sample_excerpts: report.sample_excerpts.clone(),
            information: report.information.clone(),
            headlines: report.headlines.clone(),
            fallback_attempted: report.fallback_attempted(),
            report: report.report.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TaskPayload {
    FileCreated(FileCreation),
    Research(Box<ResearchPayload>),
    Text(String),
    None,
}

/// Uniform response for every execution path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub request_id: Uuid,
    pub success: bool,
    pub task_type: String,
    pub result: TaskPayload,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskResponse {
    pub fn succeeded(request_id: Uuid, task_type: impl Into<String>, result: TaskPayload, message: impl Into<String>) -> Self {
        Self {
            request_id,
            success: true,
            task_type: task_type.into(),
            result,
            message: message.into(),
            error: None,
        }
    }

    pub fn failed(request_id: Uuid, task_type: impl Into<String>, message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            request_id,
            success: false,
            task_type: task_type.into(),
            result: TaskPayload::None,
            message: message.into(),
            error: Some(error.into()),
        }
    }

    pub fn file_created(request_id: Uuid, created: FileCreation) -> Self {
        let message = format!("Created {}", created.filename);
        Self::succeeded(
            request_id,
            TaskKind::FileCreation.as_str(),
            TaskPayload::FileCreated(created),
            message,
        )
    }

    /// `{category}_information` envelope. A failed run still carries its no-information report.
    pub fn research(request_id: Uuid, report: &ResearchReport) -> Self {
        let task_type = format!("{}_information", report.resolution.label.replace(' ', "_"));
        let payload = TaskPayload::Research(Box::new(ResearchPayload::from(report)));

        match report.error_message() {
            None => Self::succeeded(
                request_id,
                task_type,
                payload,
                format!("{} Information gathered successfully", report.resolution.display_name()),
            ),
            Some(error) => Self {
                request_id,
                success: false,
                task_type,
                result: payload,
                message: error.clone(),
                error: Some(error),
            },
        }
    }

    pub fn unsupported(request_id: Uuid, kind: TaskKind) -> Self {
        Self::failed(
            request_id,
            kind.as_str(),
            format!("No handler is registered for {} tasks", kind),
            "Unsupported task type",
        )
    }
}
