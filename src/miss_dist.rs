use serde::Serialize;

/// Once the tail holds more mass than this, the distribution grows.
const TAIL_THRESHOLD: f64 = 1e-18;

const INITIAL_SLOTS: usize = 10;

/// Discrete distribution over "exactly `i` bad events so far".
///
/// Starts as certainty of zero bad events. [`add`] folds in one more
/// independent event via the convolution recurrence, so after `n` calls
/// `p(i)` is the probability that exactly `i` of them went bad.
///
/// [`add`]: MissDistribution::add
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MissDistribution {
    p: Vec<f64>,
}

impl MissDistribution {
    pub fn new() -> Self {
        let mut p = vec![0.0; INITIAL_SLOTS];
        p[0] = 1.0;

        Self { p }
    }

    /// Folds in an event that succeeds with probability `prob_good`.
    pub fn add(&mut self, prob_good: f64) {
        if self.p[self.p.len() - 1] > TAIL_THRESHOLD {
            self.p.push(0.0);
        }

        for i in (1..self.p.len()).rev() {
            self.p[i] = self.p[i] * prob_good + self.p[i - 1] * (1.0 - prob_good);
        }

        self.p[0] *= prob_good;
    }

    /// `P(at most n bad events)`, extending past the stored tail by
    /// counting the last slot once per missing index.
    pub fn sum_up_to(&self, n: usize) -> f64 {
        let stored = (n + 1).min(self.p.len());
        let mut sum: f64 = self.p[..stored].iter().sum();

        if n + 1 > self.p.len() {
            sum += self.p[self.p.len() - 1] * (n + 1 - self.p.len()) as f64;
        }

        sum
    }

    /// The raw probabilities, index = exact number of bad events.
    pub fn probabilities(&self) -> &[f64] {
        &self.p
    }
}

impl Default for MissDistribution {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binomial(n: u64, k: u64) -> f64 {
        let mut out = 1.0;

        for i in 0..k {
            out *= (n - i) as f64 / (i + 1) as f64;
        }

        out
    }

    #[test]
    fn starts_certain() {
        let dist = MissDistribution::new();

        assert_eq!(dist.probabilities()[0], 1.0);
        assert_eq!(dist.sum_up_to(0), 1.0);
        assert_eq!(dist.sum_up_to(100), 1.0);
    }

    #[test]
    fn ten_coin_flips_are_binomial() {
        let mut dist = MissDistribution::new();

        for _ in 0..10 {
            dist.add(0.5);
        }

        for k in 0..=10usize {
            let expected = binomial(10, k as u64) * 0.5f64.powi(10);

            assert!(
                (dist.probabilities()[k] - expected).abs() < 1e-12,
                "k={k}: {} vs {expected}",
                dist.probabilities()[k],
            );
        }
    }

    #[test]
    fn mass_is_conserved() {
        let mut dist = MissDistribution::new();

        for i in 0..200 {
            dist.add(0.3 + 0.6 * ((i % 7) as f64 / 7.0));

            let total: f64 = dist.probabilities().iter().sum();

            // growth keeps the truncation loss below the tail threshold
            assert!(total <= 1.0 + 1e-9);
            assert!(total >= 1.0 - 1e-9);

            for &p in dist.probabilities() {
                assert!((0.0..=1.0).contains(&p));
            }
        }
    }

    #[test]
    fn sum_extends_past_the_tail() {
        let mut dist = MissDistribution::new();

        for _ in 0..5 {
            dist.add(0.9);
        }

        let len = dist.probabilities().len();
        let last = dist.probabilities()[len - 1];
        let all: f64 = dist.probabilities().iter().sum();

        assert!((dist.sum_up_to(len + 2) - (all + 3.0 * last)).abs() < 1e-15);
    }
}
