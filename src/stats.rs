//! Statistical analyses over sample buffers
//!
//! Pure functions: every analysis treats the buffer as read-only, keeps no
//! state, and can be re-run on the same buffer with identical results.
//! Non-finite samples (NaN/Inf) are valid-but-flagged inputs: tail
//! comparisons simply never count them, and the spacing histogram excludes
//! them while reporting how many were seen.

/// Magnitude scales probed by the tail-ratio metric
pub const TAIL_SCALES: [f64; 6] = [1e-1, 1e-2, 1e-3, 1e-4, 1e-5, 1e-6];

/// Default bucket count for the spacing histogram
pub const SPACING_BINS: usize = 64;

/// Which tail a comparison probes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tail {
    /// `value < threshold`
    Lower,
    /// `value > threshold`
    Upper,
}

/// Observed-vs-expected mass beyond one threshold.
///
/// `ratio == 1.0` is perfect calibration at that scale. The raw `count` is
/// carried alongside so a reader can judge sampling noise against systematic
/// bias: at `c = 1e-6` with 360 000 samples the expected count is ~0.36, so
/// the ratio is dominated by noise — that is inherent to the scale, not a
/// defect in the metric.
#[derive(Debug, Clone, PartialEq)]
pub struct TailComparison {
    /// Probed tail
    pub tail: Tail,
    /// Threshold compared against
    pub threshold: f64,
    /// Theoretical uniform mass beyond the threshold
    pub expected_fraction: f64,
    /// Samples observed beyond the threshold
    pub count: usize,
    /// Total samples in the buffer
    pub sample_count: usize,
    /// `(count / sample_count) / expected_fraction`
    pub ratio: f64,
}

/// One tail comparison at an explicit threshold and expected fraction.
#[must_use]
pub fn tail_comparison(
    values: &[f32],
    tail: Tail,
    threshold: f64,
    expected_fraction: f64,
) -> TailComparison {
    let count = values
        .iter()
        .filter(|&&v| {
            let v = f64::from(v);
            match tail {
                Tail::Lower => v < threshold,
                Tail::Upper => v > threshold,
            }
        })
        .count();
    let sample_count = values.len();
    let ratio = if sample_count == 0 || expected_fraction == 0.0 {
        f64::NAN
    } else {
        (count as f64 / sample_count as f64) / expected_fraction
    };
    TailComparison {
        tail,
        threshold,
        expected_fraction,
        count,
        sample_count,
        ratio,
    }
}

/// The full comparison table: lower tails at each scale `c`, then upper
/// tails at `1 - c`.
///
/// Both tails share `expected_fraction = c` — for a uniform distribution the
/// mass below `c` equals the mass above `1 - c`. This matches the original
/// display layout and is kept for corpus compatibility.
#[must_use]
pub fn tail_comparisons(values: &[f32]) -> Vec<TailComparison> {
    let lowers = TAIL_SCALES
        .iter()
        .map(|&c| tail_comparison(values, Tail::Lower, c, c));
    let uppers = TAIL_SCALES
        .iter()
        .map(|&c| tail_comparison(values, Tail::Upper, 1.0 - c, c));
    lowers.chain(uppers).collect()
}

/// Count of NaN/Inf samples in a buffer
#[must_use]
pub fn non_finite_count(values: &[f32]) -> usize {
    values.iter().filter(|v| !v.is_finite()).count()
}

/// Histogram of nearest-neighbor gaps between sorted sample values.
///
/// A kernel whose arithmetic can only emit a few distinct output levels
/// produces a spike of exact-zero gaps in the first bucket — the primary
/// signal for degenerate randomness that still looks visually uniform.
#[derive(Debug, Clone, PartialEq)]
pub struct SpacingHistogram {
    /// Smallest observed gap
    pub min_gap: f32,
    /// Largest observed gap
    pub max_gap: f32,
    /// Gap counts per equal-width bucket spanning `[min_gap, max_gap]`
    pub counts: Vec<u64>,
    /// Non-finite samples excluded from the analysis
    pub non_finite: usize,
}

impl SpacingHistogram {
    /// Total gaps counted
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// Nearest-neighbor spacing histogram over `bins` equal-width buckets.
///
/// Sorts a copy of the finite values ascending, takes consecutive
/// differences, and buckets them across `[min_gap, max_gap]`; a gap exactly
/// equal to the observed maximum lands in the last bucket. Returns `None`
/// when `bins == 0` or fewer than two finite values exist (no gaps to bin).
#[must_use]
pub fn spacing_histogram(values: &[f32], bins: usize) -> Option<SpacingHistogram> {
    if bins == 0 {
        return None;
    }
    let non_finite = non_finite_count(values);
    let mut sorted: Vec<f32> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.len() < 2 {
        return None;
    }
    sorted.sort_unstable_by(f32::total_cmp);

    let gaps: Vec<f32> = sorted.windows(2).map(|w| w[1] - w[0]).collect();
    let min_gap = gaps.iter().copied().fold(f32::INFINITY, f32::min);
    let max_gap = gaps.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let span = max_gap - min_gap;

    let mut counts = vec![0u64; bins];
    for gap in gaps {
        let index = if span == 0.0 {
            0
        } else {
            (((gap - min_gap) / span) * bins as f32) as usize
        };
        counts[index.min(bins - 1)] += 1;
    }

    Some(SpacingHistogram {
        min_gap,
        max_gap,
        counts,
        non_finite,
    })
}
