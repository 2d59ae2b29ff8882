//! Axum route handler for the screening endpoint.

use std::collections::BTreeMap;

use axum::{
    extract::{Multipart, State},
    Json,
};
use tracing::info;

use crate::errors::AppError;
use crate::state::AppState;
use crate::workflow::case::Case;
use crate::workflow::controller::{to_response, SchedulerResponse};
use crate::workflow::resume::extract_resume_text;

struct Upload {
    file_name: String,
    bytes: Vec<u8>,
}

/// POST /scheduler
///
/// Multipart form with the six candidate answers plus an optional `file` resume.
/// Every missing answer is reported at once and no conversation is started.
pub async fn handle_schedule(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<SchedulerResponse>, AppError> {
    let (fields, upload) = read_form(multipart).await?;

    let case = Case::from_answers(state.job_description.to_string(), String::new(), &fields)
        .map_err(AppError::MissingFields)?;

    let resume_text = match upload {
        Some(upload) => {
            extract_resume_text(&state.config.upload_dir, &upload.file_name, upload.bytes).await?
        }
        None => {
            info!("No resume uploaded");
            String::new()
        }
    };
    let case = case.with_resume_text(resume_text);

    let (conversation_id, report) = state.workflow.run(case).await?;
    Ok(Json(to_response(conversation_id, report)?))
}

async fn read_form(
    mut multipart: Multipart,
) -> Result<(BTreeMap<String, String>, Option<Upload>), AppError> {
    let malformed = |e: axum::extract::multipart::MultipartError| {
        AppError::Validation(format!("Malformed multipart body: {e}"))
    };

    let mut fields = BTreeMap::new();
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "file" {
            let file_name = field.file_name().unwrap_or("resume").to_string();
            let bytes = field.bytes().await.map_err(malformed)?;
            if !file_name.is_empty() && !bytes.is_empty() {
                upload = Some(Upload {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
        } else {
            let value = field.text().await.map_err(malformed)?;
            fields.insert(name, value);
        }
    }

    Ok((fields, upload))
}
