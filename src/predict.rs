//! Contextual fill prediction.
//!
//! Tokenizes the masked cleaned text, finds the placeholder positions, derives
//! sentence segment ids, runs the masked language model once, and keeps the
//! top-K vocabulary entries at every placeholder.

use tracing::{debug, info};

use crate::config::OverflowPolicy;
use crate::error::{CorrectionError, CorrectionResult};

/// Token that closes a sentence for segment-id purposes.
pub const SENTENCE_TERMINAL: &str = ".";

/// Maps text to subword tokens and vocabulary ids.
pub trait SubwordTokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> CorrectionResult<Vec<String>>;

    fn ids_for(&self, tokens: &[String]) -> Vec<u32>;

    fn tokens_for(&self, ids: &[u32]) -> Vec<String>;
}

/// Scores every vocabulary entry at every input position.
pub trait MaskedLanguageModel: Send {
    /// Longest token sequence a single `infer` call accepts.
    fn max_positions(&self) -> usize;

    /// One score vector over the vocabulary per input position.
    fn infer(&self, token_ids: &[u32], segment_ids: &[u32]) -> CorrectionResult<Vec<Vec<f32>>>;
}

/// Model candidates for every placeholder, in text order.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub mask_positions: Vec<usize>,
    /// Top-K tokens per placeholder, best first
    pub candidates: Vec<Vec<String>>,
}

/// Settings the predictor needs from the pipeline configuration.
#[derive(Debug, Clone, Copy)]
pub struct PredictOptions<'a> {
    pub placeholder: &'a str,
    pub top_k: usize,
    pub overflow: OverflowPolicy,
}

/// Predict candidates for each placeholder in `masked`.
///
/// `expected_masks` is the number of placeholders the masking step inserted;
/// any other count after tokenization is a `Desync`.
pub fn predict_candidates(
    masked: &str,
    expected_masks: usize,
    tokenizer: &dyn SubwordTokenizer,
    model: &dyn MaskedLanguageModel,
    options: PredictOptions<'_>,
) -> CorrectionResult<Prediction> {
    let tokens = tokenizer.tokenize(masked)?;
    let mask_positions: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, token)| token.as_str() == options.placeholder)
        .map(|(i, _)| i)
        .collect();
    if mask_positions.len() != expected_masks {
        return Err(CorrectionError::Desync {
            expected: expected_masks,
            found: mask_positions.len(),
        });
    }
    if mask_positions.is_empty() {
        return Ok(Prediction {
            mask_positions,
            candidates: Vec::new(),
        });
    }

    let ids = tokenizer.ids_for(&tokens);
    let limit = model.max_positions();
    let windows = if tokens.len() <= limit {
        vec![(0, tokens.len())]
    } else {
        match options.overflow {
            OverflowPolicy::Fail => {
                return Err(CorrectionError::ContextOverflow {
                    tokens: tokens.len(),
                    limit,
                });
            }
            OverflowPolicy::Window => {
                let windows = sentence_windows(&tokens, limit);
                info!(tokens = tokens.len(), limit, windows = windows.len(), "Windowed inference");
                windows
            }
        }
    };

    let mut candidates = Vec::with_capacity(mask_positions.len());
    let mut next_mask = 0;
    for (start, end) in windows {
        let window_masks: Vec<usize> = mask_positions[next_mask..]
            .iter()
            .copied()
            .take_while(|&pos| pos < end)
            .collect();
        if window_masks.is_empty() {
            continue;
        }
        next_mask += window_masks.len();

        let segments = segment_ids(&tokens[start..end]);
        let scores = model.infer(&ids[start..end], &segments)?;
        if scores.len() != end - start {
            return Err(CorrectionError::model(format!(
                "Model returned {} score vectors for {} tokens",
                scores.len(),
                end - start
            )));
        }
        for pos in window_masks {
            let best = top_k(&scores[pos - start], options.top_k);
            candidates.push(tokenizer.tokens_for(&best));
        }
    }

    debug!(masks = mask_positions.len(), "Predicted candidates");
    Ok(Prediction {
        mask_positions,
        candidates,
    })
}

/// Segment ids that advance after every sentence terminal.
///
/// Each terminal shares the id of the sentence it closes; tokens after the
/// last terminal get the final, incremented id.
pub fn segment_ids(tokens: &[String]) -> Vec<u32> {
    let mut segment = 0;
    tokens
        .iter()
        .map(|token| {
            let id = segment;
            if token == SENTENCE_TERMINAL {
                segment += 1;
            }
            id
        })
        .collect()
}

/// Indices of the `k` highest scores, best first; ties keep the lower index.
pub fn top_k(scores: &[f32], k: usize) -> Vec<u32> {
    if k == 0 {
        return Vec::new();
    }
    let rank = |a: &usize, b: &usize| scores[*b].total_cmp(&scores[*a]).then(a.cmp(b));
    let mut order: Vec<usize> = (0..scores.len()).collect();
    if k < order.len() {
        order.select_nth_unstable_by(k - 1, rank);
        order.truncate(k);
    }
    order.sort_unstable_by(rank);
    order.into_iter().map(|i| i as u32).collect()
}

/// Split `tokens` into `[start, end)` windows no longer than `limit`,
/// breaking after sentence terminals where possible.
fn sentence_windows(tokens: &[String], limit: usize) -> Vec<(usize, usize)> {
    let limit = limit.max(1);
    let mut windows = Vec::new();
    let mut start = 0;
    while start < tokens.len() {
        let hard_end = (start + limit).min(tokens.len());
        let end = if hard_end == tokens.len() {
            hard_end
        } else {
            tokens[start..hard_end]
                .iter()
                .rposition(|t| t == SENTENCE_TERMINAL)
                .map(|i| start + i + 1)
                .unwrap_or(hard_end)
        };
        windows.push((start, end));
        start = end;
    }
    windows
}
