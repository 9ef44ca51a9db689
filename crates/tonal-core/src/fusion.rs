//! Audio/metadata score fusion (C8): `final = alpha*audio + (1-alpha)*metadata`.
//!
//! Grounded on `original_source/audio/fusion/audio_metadata_fusion.py`
//! (`AudioMetadataFusion.search_by_track`, `_metadata_score`): the
//! metadata similarity is a coarse `+1` per matching `genre`/`year`, and a
//! query track with no stored metadata degrades gracefully to an
//! audio-only ranking rather than failing.

use tracing::warn;

use crate::acoustic::AcousticSearcher;
use crate::error::Result;
use crate::ident::normalize_track_id;
use crate::metadata::{MetadataStore, Row};

#[derive(Clone, Debug, PartialEq)]
pub struct FusedResult {
    pub track_id: String,
    pub score: f64,
    pub score_audio: f64,
    pub score_metadata: f64,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub genre: Option<String>,
    pub year: Option<String>,
}

pub struct FusionEngine<'a> {
    audio: AcousticSearcher<'a>,
    metadata: &'a MetadataStore,
}

impl<'a> FusionEngine<'a> {
    pub fn new(audio: AcousticSearcher<'a>, metadata: &'a MetadataStore) -> Self {
        Self { audio, metadata }
    }

    /// `alpha` is clamped to `[0, 1]` before use.
    pub fn fuse(&self, query_track_id: &str, top_k: usize, alpha: f64) -> Result<Vec<FusedResult>> {
        let alpha = alpha.clamp(0.0, 1.0);
        let query_track_id = normalize_track_id(query_track_id);

        let audio_results = self.audio.search_by_id(&query_track_id, top_k, 0.0);
        if audio_results.is_empty() {
            return Ok(Vec::new());
        }

        let reference = self.metadata.find_by_track_id(&query_track_id)?;
        if reference.is_none() {
            warn!(track_id = %query_track_id, "fusion: no reference metadata, falling back to audio-only ranking");
        }

        let mut fused = Vec::with_capacity(audio_results.len());
        for (candidate_id, score_audio) in audio_results {
            let candidate = self.metadata.find_by_track_id(&candidate_id)?;

            let (score_metadata, title, artist, genre, year) = match (&candidate, &reference) {
                (Some(candidate_md), Some(reference_md)) => {
                    let md_score = metadata_score(candidate_md, reference_md);
                    (
                        md_score,
                        row_string(candidate_md, "title"),
                        row_string(candidate_md, "artist"),
                        row_string(candidate_md, "genre"),
                        row_string(candidate_md, "year"),
                    )
                }
                _ => (0.0, None, None, None, None),
            };

            let score = alpha * score_audio + (1.0 - alpha) * score_metadata;
            fused.push(FusedResult {
                track_id: candidate_id,
                score,
                score_audio,
                score_metadata,
                title,
                artist,
                genre,
                year,
            });
        }

        // Ties (e.g. both metadata components zero at alpha=0) preserve audio
        // order as the secondary key, falling back to track_id only as a
        // final, fully-deterministic tiebreaker (spec.md §8 scenario 4).
        fused.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap()
                .then_with(|| b.score_audio.partial_cmp(&a.score_audio).unwrap())
                .then_with(|| a.track_id.cmp(&b.track_id))
        });
        fused.truncate(top_k);
        Ok(fused)
    }
}

fn metadata_score(candidate: &Row, reference: &Row) -> f64 {
    let mut score = 0.0;
    if let (Some(g1), Some(g2)) = (row_string(candidate, "genre"), row_string(reference, "genre")) {
        if g1 == g2 {
            score += 1.0;
        }
    }
    if let (Some(y1), Some(y2)) = (row_string(candidate, "year"), row_string(reference, "year")) {
        if y1 == y2 {
            score += 1.0;
        }
    }
    score
}

fn row_string(row: &Row, column: &str) -> Option<String> {
    row.get(column).and_then(|v| match v {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
