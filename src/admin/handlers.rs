use axum::{extract::State, response::Html, Json};
use std::time::Instant;

use crate::admin::report::StatusReport;
use crate::http::server::AppState;

fn current_report(state: &AppState) -> StatusReport {
    StatusReport::from_snapshot(
        &state.registry.snapshot(),
        Instant::now(),
        state.retry_interval,
    )
}

pub async fn get_status_json(State(state): State<AppState>) -> Json<StatusReport> {
    Json(current_report(&state))
}

pub async fn get_status_page(State(state): State<AppState>) -> Html<String> {
    Html(current_report(&state).render_html())
}
