use super::AppState;
use crate::types::{Format, Organization, ServiceInfo, ServiceType, TrackCapabilities};
use axum::{Json, extract::State};

pub async fn service_info(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        id: "org.example.tracksift".to_string(),
        name: "tracksift".to_string(),
        r#type: ServiceType {
            group: "org.example".to_string(),
            artifact: "tracksift".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        description: Some(
            "Windowed alignment and feature tracks with per-position downsampling".to_string(),
        ),
        organization: Organization {
            name: "Example Organization".to_string(),
            url: "https://example.org".to_string(),
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        tracks: TrackCapabilities {
            formats: vec![Format::Bam, Format::Bed, Format::Fasta],
            item_scale_threshold: state.engine.item_scale_threshold,
            max_item_span: state.engine.max_item_span,
            max_bins: state.engine.max_bins,
            default_budget: state.default_budget,
            default_frame: state.default_frame,
            query_timeout_secs: state.query_timeout.as_secs(),
        },
    })
}
