//! Question answering and semantic search endpoints

use axum::{extract::State, Form, Json};
use serde::Deserialize;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{QueryResponse, SearchResponse, Status};

/// Form body of `POST /query`
#[derive(Debug, Deserialize)]
pub struct QueryForm {
    pub query: String,
}

/// Form body of `POST /search`
#[derive(Debug, Deserialize)]
pub struct SearchForm {
    pub query: String,
    #[serde(default)]
    pub top_k: Option<usize>,
}

/// POST /query - Answer a question from the indexed documents
pub async fn query(
    State(state): State<AppState>,
    Form(form): Form<QueryForm>,
) -> Result<Json<QueryResponse>> {
    let start = Instant::now();
    tracing::info!("Query: \"{}\"", form.query);

    let response = state.query_handler().answer_query(&form.query).await?;

    tracing::info!(
        "Query finished in {}ms (answered: {})",
        start.elapsed().as_millis(),
        response.is_success()
    );

    Ok(Json(response))
}

/// POST /search - Ranked chunks without generation
pub async fn search(
    State(state): State<AppState>,
    Form(form): Form<SearchForm>,
) -> Result<Json<SearchResponse>> {
    if form.query.trim().is_empty() {
        return Err(Error::InvalidRequest("Query text is empty".to_string()));
    }

    let retriever = state.retriever();
    let top_k = form.top_k.unwrap_or_else(|| retriever.default_top_k());
    let results = retriever.retrieve_relevant_text(&form.query, top_k).await;

    Ok(Json(SearchResponse {
        status: Status::Success,
        query: form.query,
        results,
    }))
}
