//! Relevance filtering of one topic's search hits.

use std::collections::HashSet;

use tracing::{debug, info, instrument};

use lunathink_shared::{RelevanceJudge, RelevanceVerdict, Result, SearchHit, Stage};

/// Keep the hits the judge deems relevant to `topic`, in their original order.
///
/// Verdicts are matched only against `hits`, which must all belong to this
/// topic's search round. An empty hit list skips the judge.
#[instrument(skip_all, fields(topic = %topic, hits = hits.len()))]
pub async fn filter(
    judge: &dyn RelevanceJudge,
    topic: &str,
    hits: Vec<SearchHit>,
) -> Result<Vec<SearchHit>> {
    if hits.is_empty() {
        debug!("no hits, skipping relevance check");
        return Ok(hits);
    }

    let verdicts = judge
        .judge(topic, &hits)
        .await
        .map_err(|e| e.at_stage(Stage::Relevance))?;

    let keep = matching_ids(&verdicts, &hits);
    let relevant: Vec<SearchHit> = hits.into_iter().filter(|h| keep.contains(&h.id)).collect();

    info!(verdicts = verdicts.len(), relevant = relevant.len(), "relevance filtered");
    Ok(relevant)
}

fn matching_ids(verdicts: &[RelevanceVerdict], hits: &[SearchHit]) -> HashSet<u32> {
    let known: HashSet<u32> = hits.iter().map(|h| h.id).collect();

    verdicts
        .iter()
        .filter_map(|v| match parse_hit_id(&v.hit_id) {
            Some(id) if known.contains(&id) => Some(id),
            _ => {
                debug!(hit_id = %v.hit_id, "verdict matches no hit, ignoring");
                None
            }
        })
        .collect()
}

/// `" 3 "`, `"#3"` and `"3"` all refer to hit 3.
fn parse_hit_id(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed).trim();
    digits.parse().ok()
}
