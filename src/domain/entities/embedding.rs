use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding(pub Vec<f32>);

impl Embedding {
    pub fn new(vec: Vec<f32>) -> Self {
        Self(vec)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    /// Dot product accumulated in `f64` over the shorter of the two vectors.
    pub fn dot(&self, other: &[f32]) -> f32 {
        dot(&self.0, other)
    }

    pub fn normalized(self, mode: Normalization) -> Self {
        Self(normalize(&self.0, mode))
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(vec: Vec<f32>) -> Self {
        Self(vec)
    }
}

impl AsRef<[f32]> for Embedding {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum::<f64>() as f32
}

/// How an embedding is scaled before it is stored or compared.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    None,
    /// Scale so the largest magnitude maps onto the int16 range.
    MaxAbs,
    Taxicab,
    #[default]
    L2,
    PNorm(f32),
}

fn normalize(input: &[f32], mode: Normalization) -> Vec<f32> {
    let sum: f64 = match mode {
        Normalization::None => 1.0,
        Normalization::MaxAbs => {
            let max = input
                .iter()
                .fold(0.0f64, |acc, x| acc.max(f64::from(x.abs())));
            max / 32760.0
        }
        Normalization::Taxicab => input.iter().map(|x| f64::from(x.abs())).sum(),
        Normalization::L2 => input
            .iter()
            .map(|x| f64::from(*x) * f64::from(*x))
            .sum::<f64>()
            .sqrt(),
        Normalization::PNorm(p) => {
            let p = f64::from(p);
            input
                .iter()
                .map(|x| f64::from(x.abs()).powf(p))
                .sum::<f64>()
                .powf(1.0 / p)
        }
    };

    let scale = if sum > 0.0 { 1.0 / sum } else { 0.0 };
    input.iter().map(|x| (f64::from(*x) * scale) as f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_truncates_to_shorter() {
        let a = Embedding::new(vec![1.0, 2.0, 3.0]);
        assert_eq!(a.dot(&[2.0, 1.0]), 4.0);
    }

    #[test]
    fn test_l2_normalization_yields_unit_length() {
        let e = Embedding::new(vec![3.0, 4.0]).normalized(Normalization::L2);
        assert!((e.0[0] - 0.6).abs() < 1e-6);
        assert!((e.0[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_max_abs_normalization_scales_to_int16_range() {
        let e = Embedding::new(vec![0.5, -1.0]).normalized(Normalization::MaxAbs);
        assert!((e.0[1] + 32760.0).abs() < 1e-2);
        assert!((e.0[0] - 16380.0).abs() < 1e-2);
    }

    #[test]
    fn test_zero_vector_stays_zero() {
        let e = Embedding::new(vec![0.0, 0.0]).normalized(Normalization::L2);
        assert_eq!(e.0, vec![0.0, 0.0]);
    }

    #[test]
    fn test_none_leaves_values_untouched() {
        let e = Embedding::new(vec![2.0, -7.5]).normalized(Normalization::None);
        assert_eq!(e.0, vec![2.0, -7.5]);
    }
}
