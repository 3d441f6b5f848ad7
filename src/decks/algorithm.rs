//! Leitner box scheduling
//!
//! Terms live in one of `BOX_COUNT` boxes. A correct answer promotes a term
//! one box, a miss demotes or resets it. The next term is drawn by first
//! choosing a box with probability proportional to
//!
//! ```text
//! w[i] = count[i] / 2^i
//! ```
//!
//! and then choosing a member of that box uniformly. Lower boxes are
//! therefore practiced far more often than higher ones, even when they
//! hold fewer terms.

use rand::Rng;

use super::models::{BoxCounts, MoveSignal, BOX_COUNT};

const LAST_BOX: usize = BOX_COUNT - 1;

/// Box a term lands in after `signal` is applied in box `current`.
///
/// Total for every input: out-of-range boxes are clamped the same way as
/// valid ones and never overflow.
pub fn destination(current: usize, signal: Option<MoveSignal>) -> usize {
    match signal {
        Some(MoveSignal::Reset) => 0,
        Some(MoveSignal::Demote) => current.saturating_sub(1),
        Some(MoveSignal::Promote) => current.saturating_add(1).min(LAST_BOX),
        None => current,
    }
}

/// Sampling weight of each box: `count[i] / 2^i`
pub fn weights(counts: &BoxCounts) -> [f64; BOX_COUNT] {
    let mut weights = [0.0; BOX_COUNT];
    for (i, (weight, count)) in weights.iter_mut().zip(counts.as_array()).enumerate() {
        *weight = *count as f64 / (1u64 << i) as f64;
    }
    weights
}

/// Cumulative distribution over the boxes.
///
/// Returns `None` when every box is empty. Otherwise the values are
/// non-decreasing and the last one is 1 up to rounding.
pub fn cutoffs(counts: &BoxCounts) -> Option<[f64; BOX_COUNT]> {
    let weights = weights(counts);
    let sum: f64 = weights.iter().sum();
    if sum <= 0.0 {
        return None;
    }

    let mut cutoffs = [0.0; BOX_COUNT];
    let mut running = 0.0;
    for (cutoff, weight) in cutoffs.iter_mut().zip(weights.iter()) {
        running += weight;
        *cutoff = running / sum;
    }
    Some(cutoffs)
}

/// Inverse-CDF lookup: the smallest box whose cutoff exceeds `r`.
///
/// The last box is always accepted so the lookup terminates even when
/// rounding leaves the final cutoff slightly below 1.
pub fn select_box(cutoffs: &[f64; BOX_COUNT], r: f64) -> usize {
    cutoffs
        .iter()
        .position(|&cutoff| r < cutoff)
        .unwrap_or(LAST_BOX)
}

/// Draw a box for the next question, or `None` if the deck is empty
pub fn choose_box<R: Rng + ?Sized>(counts: &BoxCounts, rng: &mut R) -> Option<usize> {
    let cutoffs = cutoffs(counts)?;
    let r: f64 = rng.gen();
    Some(select_box(&cutoffs, r))
}
