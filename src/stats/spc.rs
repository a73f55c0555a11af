//! Six Sigma statistical analysis over throughput samples
//!
//! All statistics are descriptive snapshots over the sample sequence the
//! analyzer was built with; nothing is cached or mutated. Samples are not
//! validated: NaN or negative values flow through the arithmetic and
//! surface as NaN results rather than errors.

use serde::{Deserialize, Serialize};

/// 3-sigma Shewhart control chart limits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlLimits {
    /// Center line (sample mean)
    pub center: f64,
    /// Upper control limit (mean + 3 sigma)
    pub upper_limit: f64,
    /// Lower control limit (mean - 3 sigma)
    pub lower_limit: f64,
}

/// Six Sigma analyzer over a sequence of throughput samples
pub struct SpcAnalyzer {
    samples: Vec<f64>,
}

impl SpcAnalyzer {
    /// Create an analyzer over the given samples
    pub fn new(samples: Vec<f64>) -> Self {
        Self { samples }
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the analyzer holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample mean (0.0 when empty)
    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// Population standard deviation (divide by N, not N-1)
    pub fn std_dev(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let variance = self
            .samples
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / self.samples.len() as f64;
        variance.sqrt()
    }

    /// Process capability index (Cpk).
    ///
    /// `min((usl - mean) / 3σ, (mean - lsl) / 3σ)` with population σ.
    /// Returns the 0.0 sentinel for fewer than 2 samples, and also for
    /// σ = 0 (constant samples): no spread gives no observed defect
    /// trigger, so capability is treated as undefined rather than
    /// infinite.
    pub fn capability_index(&self, usl: f64, lsl: f64) -> f64 {
        if self.samples.len() < 2 {
            return 0.0;
        }

        let std = self.std_dev();
        if std == 0.0 {
            return 0.0;
        }

        let mean = self.mean();
        ((usl - mean) / (3.0 * std)).min((mean - lsl) / (3.0 * std))
    }

    /// Classic 3-sigma control chart limits.
    ///
    /// Single-point Shewhart limits only; no sub-grouping or run rules.
    /// `None` when fewer than 2 samples exist.
    pub fn control_limits(&self) -> Option<ControlLimits> {
        if self.samples.len() < 2 {
            return None;
        }

        let mean = self.mean();
        let std = self.std_dev();

        Some(ControlLimits {
            center: mean,
            upper_limit: mean + 3.0 * std,
            lower_limit: mean - 3.0 * std,
        })
    }

    /// Sigma level from the observed defect rate.
    ///
    /// A sample is a defect if strictly below `defect_threshold`. Returns
    /// 0.0 for fewer than 2 samples and when every sample is a defect;
    /// otherwise `probit(1 - defect_rate) + 1.5`, the conventional
    /// short-term/long-term Six Sigma conversion. A defect rate of zero
    /// yields infinity.
    pub fn sigma_level(&self, defect_threshold: f64) -> f64 {
        if self.samples.len() < 2 {
            return 0.0;
        }

        let defects = self.samples.iter().filter(|&&x| x < defect_threshold).count();
        let defect_rate = defects as f64 / self.samples.len() as f64;

        if defect_rate >= 1.0 {
            return 0.0;
        }

        normal_quantile(1.0 - defect_rate) + 1.5 // 1.5 sigma shift
    }
}

/// Standard normal quantile function (probit).
///
/// Acklam's rational approximation, absolute error below 1.2e-9 over
/// (0, 1). Returns -infinity at 0 and +infinity at 1.
pub fn normal_quantile(p: f64) -> f64 {
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];

    const P_LOW: f64 = 0.02425;
    const P_HIGH: f64 = 1.0 - P_LOW;

    if p < P_LOW {
        // Lower tail
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= P_HIGH {
        // Central region
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        // Upper tail
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_mean_and_std_dev() {
        let analyzer = SpcAnalyzer::new(vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!(close(analyzer.mean(), 5.0, 1e-12));
        // Population standard deviation of the classic example is exactly 2
        assert!(close(analyzer.std_dev(), 2.0, 1e-12));
    }

    #[test]
    fn test_capability_index() {
        let analyzer = SpcAnalyzer::new(vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        // mean 5, sigma 2: (10 - 5) / 6 = 0.8333, (5 - 0) / 6 = 0.8333
        assert!(close(analyzer.capability_index(10.0, 0.0), 5.0 / 6.0, 1e-9));
        // Asymmetric limits take the nearer side
        assert!(close(analyzer.capability_index(8.0, 0.0), 0.5, 1e-9));
    }

    #[test]
    fn test_capability_index_sentinels() {
        assert_eq!(SpcAnalyzer::new(vec![]).capability_index(100.0, 10.0), 0.0);
        assert_eq!(SpcAnalyzer::new(vec![50.0]).capability_index(100.0, 10.0), 0.0);
        // Constant samples: sigma = 0 yields the defined sentinel, not a panic
        assert_eq!(
            SpcAnalyzer::new(vec![50.0, 50.0, 50.0]).capability_index(100.0, 10.0),
            0.0
        );
    }

    #[test]
    fn test_control_limits() {
        let analyzer = SpcAnalyzer::new(vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        let limits = analyzer.control_limits().unwrap();
        assert!(close(limits.center, 5.0, 1e-12));
        assert!(close(limits.upper_limit, 11.0, 1e-12));
        assert!(close(limits.lower_limit, -1.0, 1e-12));
    }

    #[test]
    fn test_control_limits_insufficient_data() {
        assert!(SpcAnalyzer::new(vec![]).control_limits().is_none());
        assert!(SpcAnalyzer::new(vec![42.0]).control_limits().is_none());
    }

    #[test]
    fn test_sigma_level_known_scenario() {
        // Defects {5, 8, 9} of 5 samples: rate 0.6, probit(0.4) + 1.5
        let analyzer = SpcAnalyzer::new(vec![5.0, 8.0, 12.0, 9.0, 11.0]);
        assert!(close(analyzer.sigma_level(10.0), 1.2467, 1e-3));
    }

    #[test]
    fn test_sigma_level_sentinels() {
        assert_eq!(SpcAnalyzer::new(vec![]).sigma_level(10.0), 0.0);
        assert_eq!(SpcAnalyzer::new(vec![5.0]).sigma_level(10.0), 0.0);
        // All defects
        assert_eq!(SpcAnalyzer::new(vec![1.0, 2.0, 3.0]).sigma_level(10.0), 0.0);
    }

    #[test]
    fn test_sigma_level_zero_defects_is_infinite() {
        let analyzer = SpcAnalyzer::new(vec![20.0, 30.0, 40.0]);
        assert!(analyzer.sigma_level(10.0).is_infinite());
    }

    #[test]
    fn test_sigma_level_non_increasing_in_defect_rate() {
        let samples = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        let analyzer = SpcAnalyzer::new(samples);

        // Raising the threshold raises the defect rate
        let mut previous = f64::INFINITY;
        for threshold in [1.5, 2.5, 3.5, 4.5, 5.5, 6.5, 7.5, 8.5] {
            let level = analyzer.sigma_level(threshold);
            assert!(level <= previous, "sigma level rose at threshold {}", threshold);
            previous = level;
        }
    }

    #[test]
    fn test_normal_quantile_reference_values() {
        assert!(close(normal_quantile(0.5), 0.0, 1e-9));
        assert!(close(normal_quantile(0.975), 1.959963985, 1e-6));
        assert!(close(normal_quantile(0.025), -1.959963985, 1e-6));
        assert!(close(normal_quantile(0.4), -0.2533471, 1e-6));
        // Tails use the rational tail expansion
        assert!(close(normal_quantile(0.001), -3.090232306, 1e-6));
        assert!(close(normal_quantile(0.999), 3.090232306, 1e-6));
        assert_eq!(normal_quantile(0.0), f64::NEG_INFINITY);
        assert_eq!(normal_quantile(1.0), f64::INFINITY);
    }

    #[test]
    fn test_nan_samples_flow_through() {
        let analyzer = SpcAnalyzer::new(vec![f64::NAN, 5.0, 6.0]);
        assert!(analyzer.mean().is_nan());
        assert!(analyzer.capability_index(100.0, 10.0).is_nan());
    }
}
