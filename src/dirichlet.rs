//! Dirichlet exploration noise, mixed into a length-7 prior
//! vector at legal-column slots only.

use rand::Rng;
use rand_distr::Dirichlet;

use crate::board::COLUMNS;

/// Replace `priors[c]` for every legal `c` with `weight_prior * priors[c] +
/// weight_noise * noise[c]`, where `noise` is drawn from a symmetric
/// Dirichlet(`alpha`) distribution over exactly the legal columns. Illegal
/// columns are left untouched (they are expected to already hold `0.0`).
///
/// A single legal column, or none at all, needs no exploration noise and is
/// a no-op.
pub fn mix_dirichlet_noise(
    priors: &mut [f32; COLUMNS],
    legal: &[bool; COLUMNS],
    alpha: f32,
    weight_prior: f32,
    weight_noise: f32,
    rng: &mut impl Rng,
) {
    let legal_idx: Vec<usize> = (0..COLUMNS).filter(|&c| legal[c]).collect();
    if legal_idx.len() < 2 {
        return;
    }

    let distr = Dirichlet::new_with_size(alpha, legal_idx.len()).expect("alpha must be positive");
    let noise: Vec<f32> = rng.sample(distr);

    for (i, &c) in legal_idx.iter().enumerate() {
        priors[c] = weight_prior * priors[c] + weight_noise * noise[i];
    }
}
