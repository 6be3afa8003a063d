use super::{AppState, run_blocking};
use crate::{
    Result,
    engine::{FeatureTrackResult, TrackAssembler},
    formats::BedSource,
    types::{FeaturesQuery, Format},
};
use axum::{
    Json,
    extract::{Path, Query, State},
};

pub async fn get_features(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<FeaturesQuery>,
) -> Result<Json<FeatureTrackResult>> {
    let (interval, scale) = query.window()?;
    let files = state.storage.locate(&id, Format::Bed).await?;

    let assembler = TrackAssembler::new(state.engine);
    let result = run_blocking(state.query_timeout, move |cancel| {
        let mut source = BedSource::open(&files.data)?;
        assembler.feature_query(&mut source, &interval, scale, &cancel)
    })
    .await?;

    Ok(Json(result))
}
