//! Search endpoint.

use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use tracing::instrument;

use crate::error::Result;
use crate::search::SearchParams;
use crate::state::AppState;

/// Search shops and products.
#[instrument(skip(state), fields(q = %params.q))]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Response> {
    let results = state
        .search()
        .search(state.supabase(), state.llm(), &params)
        .await?;
    Ok(Json(&*results).into_response())
}
