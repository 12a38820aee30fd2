use crate::error::{PipelineError, Result};

/// Outcome of a two-sample Kolmogorov-Smirnov test.
#[derive(Debug, Clone, Copy)]
pub struct KsOutcome {
    /// Supremum distance between the two empirical CDFs.
    pub statistic: f64,
    /// Asymptotic p-value in [0, 1].
    pub p_value: f64,
}

/// Two-sample Kolmogorov-Smirnov test.
///
/// Compares the empirical distributions of `sample1` and `sample2`; a low
/// p-value indicates the samples likely come from different distributions.
/// The p-value uses the asymptotic Kolmogorov distribution, which is an
/// approximation for small samples.
pub fn ks_2samp(sample1: &[f64], sample2: &[f64]) -> Result<KsOutcome> {
    if sample1.is_empty() || sample2.is_empty() {
        return Err(PipelineError::Statistical {
            column: String::new(),
            message: "cannot compare empty samples".to_string(),
        });
    }

    let mut sorted1 = sample1.to_vec();
    let mut sorted2 = sample2.to_vec();
    sorted1.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted2.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n1 = sorted1.len() as f64;
    let n2 = sorted2.len() as f64;

    // Walk the merged order of both samples, tracking each ECDF; the KS
    // statistic is the largest gap observed between them.
    let mut d_max = 0.0f64;
    let mut i = 0usize;
    let mut j = 0usize;
    while i < sorted1.len() && j < sorted2.len() {
        let x = sorted1[i].min(sorted2[j]);
        while i < sorted1.len() && sorted1[i] <= x {
            i += 1;
        }
        while j < sorted2.len() && sorted2[j] <= x {
            j += 1;
        }
        let cdf1 = i as f64 / n1;
        let cdf2 = j as f64 / n2;
        let diff = (cdf1 - cdf2).abs();
        if diff > d_max {
            d_max = diff;
        }
    }

    let n_eff = (n1 * n2) / (n1 + n2);
    let lambda = d_max * n_eff.sqrt();

    Ok(KsOutcome {
        statistic: d_max,
        p_value: ks_p_value(lambda),
    })
}

/// Asymptotic Kolmogorov survival function:
/// P(D > d) ~ 2 * sum_{k=1}^inf (-1)^{k+1} * exp(-2 * k^2 * lambda^2)
fn ks_p_value(lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return 1.0;
    }
    let mut p = 0.0;
    for k in 1..=100 {
        let sign = if k % 2 == 1 { 1.0 } else { -1.0 };
        let term = sign * (-2.0 * f64::from(k).powi(2) * lambda.powi(2)).exp();
        p += term;
        if term.abs() < 1e-10 {
            break;
        }
    }
    (2.0 * p).clamp(0.0, 1.0)
}
