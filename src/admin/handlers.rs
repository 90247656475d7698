use std::collections::BTreeMap;
use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::admin::api::{ApiHandler, RecordingSummary};
use crate::statistics::StatisticsSnapshot;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub recordings: usize,
}

pub async fn get_status(State(api): State<ApiHandler>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        recordings: api.recording_count(),
    })
}

pub async fn get_recordings(State(api): State<ApiHandler>) -> Json<Vec<RecordingSummary>> {
    Json(api.recordings())
}

pub async fn get_statistics(State(api): State<ApiHandler>) -> Json<StatisticsSnapshot> {
    Json(api.statistics())
}

pub async fn get_path_statistics(State(api): State<ApiHandler>) -> Json<BTreeMap<String, u64>> {
    Json(api.request_counter_per_path())
}

pub async fn get_recording_statistics(
    State(api): State<ApiHandler>,
) -> Json<BTreeMap<String, u64>> {
    Json(api.request_counter_per_recording())
}

pub async fn reset_statistics(State(api): State<ApiHandler>) -> StatusCode {
    api.reset_total_statistic_counter();
    StatusCode::NO_CONTENT
}
