//! Small numeric and formatting helpers shared by the scorer and report builders

/// Statistical utilities
pub mod stats {
    /// Mean of an iterator, `None` when it yields nothing
    pub fn mean_of<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
        let (sum, count) = values
            .into_iter()
            .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }

    pub fn percentile(values: &[f64], p: f64) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let len = sorted.len();
        let index = ((len as f64 - 1.0) * p / 100.0).round() as usize;
        sorted[index.min(len - 1)]
    }

    /// Percentage change where a drop from `baseline` to `current` is positive.
    /// Returns `None` when the baseline is zero.
    pub fn improvement_pct(baseline: f64, current: f64) -> Option<f64> {
        if baseline == 0.0 || !baseline.is_finite() {
            return None;
        }
        Some((baseline - current) / baseline * 100.0)
    }

    pub fn clamp_score(score: f64) -> f64 {
        if score.is_nan() {
            return 0.0;
        }
        score.clamp(0.0, 100.0)
    }
}

/// Lock helpers. A panicking alert subscriber must not wedge the collectors,
/// so poisoned locks are recovered rather than propagated.
pub(crate) mod sync {
    use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

    pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
        lock.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
        lock.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Format utilities
pub mod format {
    pub fn bytes_human(bytes: u64) -> String {
        const KB: u64 = 1024;
        const MB: u64 = 1024 * 1024;
        const GB: u64 = 1024 * 1024 * 1024;
        match bytes {
            b if b >= GB => format!("{:.1} GB", b as f64 / GB as f64),
            b if b >= MB => format!("{:.1} MB", b as f64 / MB as f64),
            b if b >= KB => format!("{:.1} KB", b as f64 / KB as f64),
            b => format!("{} B", b),
        }
    }

    pub fn ms(value: f64) -> String {
        if value >= 1000.0 {
            format!("{:.2}s", value / 1000.0)
        } else {
            format!("{:.1}ms", value)
        }
    }

    pub fn signed_pct(value: f64) -> String {
        format!("{:+.1}%", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_percentile() {
        assert_eq!(stats::mean_of(Vec::<f64>::new()), None);
        assert_eq!(stats::mean_of(vec![4.0, 6.0]), Some(5.0));

        let values: Vec<f64> = (1..=100).map(|v| v as f64).collect();
        assert_eq!(stats::percentile(&values, 50.0), 51.0);
        assert_eq!(stats::percentile(&values, 100.0), 100.0);
    }

    #[test]
    fn test_improvement_pct_guards_zero() {
        assert_eq!(stats::improvement_pct(0.0, 10.0), None);
        assert_eq!(stats::improvement_pct(20.0, 10.0), Some(50.0));
        assert_eq!(stats::improvement_pct(10.0, 15.0), Some(-50.0));
    }

    #[test]
    fn test_clamp_score() {
        assert_eq!(stats::clamp_score(-20.0), 0.0);
        assert_eq!(stats::clamp_score(140.0), 100.0);
        assert_eq!(stats::clamp_score(f64::NAN), 0.0);
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(format::bytes_human(512), "512 B");
        assert_eq!(format::bytes_human(2048), "2.0 KB");
        assert_eq!(format::ms(16.666), "16.7ms");
        assert_eq!(format::ms(3200.0), "3.20s");
        assert_eq!(format::signed_pct(12.345), "+12.3%");
    }
}
