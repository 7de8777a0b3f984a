//! HTTP handlers for the blogger recommendation list

use axum::{
    extract::{Query, State},
    Json,
};

use super::beans::BeanListParams;
use crate::error::AppResult;
use crate::services::beans::BeanView;
use crate::services::local_today;
use crate::AppState;

/// Blogger beans with the list filters applied
pub async fn list_blogger_beans(
    State(state): State<AppState>,
    Query(params): Query<BeanListParams>,
) -> AppResult<Json<Vec<BeanView>>> {
    let filter = params.to_filter()?;
    let beans = state
        .blogger
        .list(&filter, params.sort, local_today(state.utc_offset));
    Ok(Json(beans))
}
