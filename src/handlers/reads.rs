use super::{AppState, run_blocking};
use crate::{
    Error, Result,
    engine::{TrackAssembler, TrackResult},
    formats::{BamSource, FastaReference, ReferenceSource},
    types::{Format, ReadsQuery},
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::debug;

pub async fn get_reads(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ReadsQuery>,
) -> Result<Json<TrackResult>> {
    let request = query.window_request(state.default_budget, state.default_frame)?;

    let alignments = state.storage.locate(&id, Format::Bam).await?;
    let alignment_index = alignments.require_index()?.clone();

    // A missing reference only matters at item resolution
    let reference_id = query.reference.as_deref().unwrap_or(&id);
    let reference = match state.storage.locate(reference_id, Format::Fasta).await {
        Ok(files) => files.index.map(|index| (files.data, index)),
        Err(Error::NotFound(_)) => None,
        Err(e) => return Err(e),
    };
    debug!(
        id = %id,
        reference = reference_id,
        has_reference = reference.is_some(),
        "reads query"
    );

    let assembler = TrackAssembler::new(state.engine);
    let result = run_blocking(state.query_timeout, move |cancel| {
        let mut reads = BamSource::open(&alignments.data, &alignment_index)?;
        let mut fasta = reference
            .map(|(data, index)| FastaReference::open(&data, &index))
            .transpose()?;
        assembler.window_query(
            &mut reads,
            fasta.as_mut().map(|f| f as &mut dyn ReferenceSource),
            &request,
            &cancel,
        )
    })
    .await?;

    Ok(Json(result))
}
