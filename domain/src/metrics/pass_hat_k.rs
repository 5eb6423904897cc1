//! pass^k: probability that k independent trials of a task all succeed

fn binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}

/// `C(successes, k) / C(trials, k)`; `None` when `k` is zero or exceeds the trial count.
pub fn pass_hat_k(trials: usize, successes: usize, k: usize) -> Option<f64> {
    if k == 0 || k > trials || successes > trials {
        return None;
    }
    Some(binomial(successes, k) / binomial(trials, k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_hat_k() {
        assert_eq!(pass_hat_k(4, 4, 4), Some(1.0));
        assert_eq!(pass_hat_k(4, 2, 1), Some(0.5));
        // C(3,2) / C(4,2) = 3 / 6
        assert!((pass_hat_k(4, 3, 2).unwrap() - 0.5).abs() < 1e-12);
        assert_eq!(pass_hat_k(4, 1, 2), Some(0.0));
        assert_eq!(pass_hat_k(2, 2, 3), None);
        assert_eq!(pass_hat_k(2, 2, 0), None);
    }
}
