use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::application::settings::SamplingParams;
use crate::domain::{ports::TokenId, DomainError};

/// Min-p filter, then temperature, then a categorical draw.
pub struct Sampler {
    params: SamplingParams,
    rng: StdRng,
}

impl Sampler {
    /// `min_p` is clamped to `[0, 1]` so the most likely token always
    /// survives the filter.
    pub fn new(mut params: SamplingParams) -> Self {
        params.min_p = if params.min_p.is_nan() {
            0.0
        } else {
            params.min_p.clamp(0.0, 1.0)
        };
        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { params, rng }
    }

    pub fn sample(&mut self, logits: &[f32]) -> Result<TokenId, DomainError> {
        let candidates: Vec<(usize, f32)> = logits
            .iter()
            .enumerate()
            .map(|(i, l)| (i, if l.is_nan() { f32::NEG_INFINITY } else { *l }))
            .collect();

        let max_logit = candidates
            .iter()
            .map(|(_, l)| *l)
            .fold(f32::NEG_INFINITY, f32::max);
        if !max_logit.is_finite() {
            return Err(DomainError::internal("no finite logits to sample from"));
        }

        let kept = min_p_filter(candidates, max_logit, self.params.min_p);

        if kept.is_empty() {
            return Err(DomainError::internal("min-p filter left no candidate tokens"));
        }

        let index = if self.params.temperature <= 0.0 {
            greedy(&kept)?
        } else {
            let weights: Vec<f64> = kept
                .iter()
                .map(|(_, l)| f64::from((l - max_logit) / self.params.temperature).exp())
                .collect();
            let dist = WeightedIndex::new(&weights)
                .map_err(|e| DomainError::internal(format!("sampling weights: {e}")))?;
            kept[dist.sample(&mut self.rng)].0
        };

        TokenId::try_from(index)
            .map_err(|_| DomainError::internal(format!("token index {index} out of range")))
    }
}

/// Keeps tokens whose probability is at least `min_p` times the best one.
/// `p_i / p_max = exp(l_i - l_max)`, so the test runs on logits directly.
fn min_p_filter(candidates: Vec<(usize, f32)>, max_logit: f32, min_p: f32) -> Vec<(usize, f32)> {
    if min_p <= 0.0 {
        return candidates
            .into_iter()
            .filter(|(_, l)| l.is_finite())
            .collect();
    }

    let floor = max_logit + min_p.ln();
    candidates
        .into_iter()
        .filter(|(_, l)| l.is_finite() && *l >= floor)
        .collect()
}

fn greedy(kept: &[(usize, f32)]) -> Result<usize, DomainError> {
    kept.iter()
        .fold(None::<(usize, f32)>, |best, &(i, l)| match best {
            Some((_, bl)) if bl >= l => best,
            _ => Some((i, l)),
        })
        .map(|(i, _)| i)
        .ok_or_else(|| DomainError::internal("no candidate token to pick"))
}
