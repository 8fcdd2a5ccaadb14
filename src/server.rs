use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::routing::get;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::error::PipelineError;
use crate::pipeline::{Pipeline, ProcessOutcome};

#[derive(Debug, Deserialize)]
pub struct ProcessQuery {
    pub link: String,
}

#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub success: bool,
    pub file_id: u64,
    pub img_id: u64,
    pub name: String,
    pub artist: String,
    pub language: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl From<ProcessOutcome> for ProcessResponse {
    fn from(outcome: ProcessOutcome) -> Self {
        ProcessResponse {
            success: true,
            file_id: outcome.file_id,
            img_id: outcome.img_id,
            name: outcome.name,
            artist: outcome.artist,
            language: outcome.language,
            tags: outcome.tags,
            audio_url: outcome.audio_url,
            image_url: outcome.image_url,
        }
    }
}

pub fn router(pipeline: Pipeline) -> Router {
    Router::new()
        .route("/process", get(process))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(pipeline))
}

async fn process(
    State(pipeline): State<Arc<Pipeline>>,
    Query(query): Query<ProcessQuery>,
) -> Result<Json<ProcessResponse>, PipelineError> {
    let outcome = pipeline.process(&query.link).await?;
    Ok(Json(outcome.into()))
}
