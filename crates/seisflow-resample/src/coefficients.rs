//! Low-pass coefficient design and the process-wide cache.
//!
//! Coefficient vectors depend only on the per-stage decimation factor (a
//! process uses a single passband/stopband/scale triple), so they are
//! cached by factor and shared read-only by every stage that decimates by
//! it. The cache lives for as long as any resampler instance does:
//! instances register a [`CacheHandle`] on construction and the table is
//! cleared when the last handle drops.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use seisflow_foundation::StreamError;

use crate::remez::{remez, FilterKind};

struct CacheInner {
    instances: usize,
    table: HashMap<u32, Arc<[f64]>>,
}

static CACHE: OnceLock<Mutex<CacheInner>> = OnceLock::new();

fn cache() -> &'static Mutex<CacheInner> {
    CACHE.get_or_init(|| {
        Mutex::new(CacheInner {
            instances: 0,
            table: HashMap::new(),
        })
    })
}

/// Number of coefficient sets currently cached. Diagnostic surface, used
/// by lifecycle tests and operator logging.
pub fn cached_factor_count() -> usize {
    cache().lock().table.len()
}

/// Filter design parameters shared by every stage of one resampler.
#[derive(Debug, Clone, Copy)]
pub struct FilterSpec {
    /// Passband edge as a fraction of the output Nyquist frequency.
    pub passband_edge: f64,
    /// Stopband edge as a fraction of the output Nyquist frequency.
    pub stopband_edge: f64,
    /// Filter length multiplier; a factor-N stage gets `N*scale*2 + 1` taps.
    pub coeff_scale: u32,
    /// Largest factor a single stage may take before chaining.
    pub max_stage_factor: u32,
}

impl FilterSpec {
    /// Split `n` into a bounded leading factor and the remainder delegated
    /// to a chained stage. Scans divisors downward from the per-stage
    /// maximum; a prime beyond the maximum cannot be split and keeps its
    /// full (expensive) filter length.
    pub fn split_factor(&self, n: u32) -> (u32, Option<u32>) {
        if n <= self.max_stage_factor {
            return (n, None);
        }
        for i in (2..=self.max_stage_factor).rev() {
            if n % i == 0 {
                return (i, Some(n / i));
            }
        }
        (n, None)
    }

    /// The full stage-factor chain for a requested decimation of `n`.
    pub fn factor_chain(&self, n: u32) -> Vec<u32> {
        let mut chain = Vec::new();
        let mut remaining = n;
        loop {
            let (factor, rest) = self.split_factor(remaining);
            chain.push(factor);
            match rest {
                Some(r) => remaining = r,
                None => break,
            }
        }
        chain
    }
}

/// Registration of one live resampler instance against the shared cache.
pub struct CacheHandle(());

impl CacheHandle {
    pub fn register() -> Self {
        cache().lock().instances += 1;
        CacheHandle(())
    }

    /// Coefficients for a single bounded stage factor, designed on first
    /// use. The lock is not held while the exchange runs; when two
    /// threads race on the same factor the first insert wins and both get
    /// the same (deterministic) vector.
    pub fn coefficients(&self, n: u32, spec: &FilterSpec) -> Result<Arc<[f64]>, StreamError> {
        if let Some(c) = cache().lock().table.get(&n) {
            return Ok(c.clone());
        }

        let designed = design_low_pass(n, spec)?;

        let mut guard = cache().lock();
        Ok(guard.table.entry(n).or_insert(designed).clone())
    }
}

impl Drop for CacheHandle {
    fn drop(&mut self) {
        let mut guard = cache().lock();
        guard.instances -= 1;
        if guard.instances == 0 {
            guard.table.clear();
        }
    }
}

fn design_low_pass(n: u32, spec: &FilterSpec) -> Result<Arc<[f64]>, StreamError> {
    let numtaps = (n * spec.coeff_scale * 2 + 1) as usize;
    let bands = [
        0.0,
        0.5 * spec.passband_edge / n as f64,
        0.5 * spec.stopband_edge / n as f64,
        0.5,
    ];
    let desired = [1.0, 0.0];
    let weights = [1.0, 1.0];

    tracing::debug!("caching {} coefficients for factor {}", numtaps, n);

    let coeff = remez(numtaps, &bands, &desired, &weights, FilterKind::Bandpass)
        .map_err(|e| StreamError::FilterDesign(e.to_string()))?;
    Ok(coeff.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(max: u32) -> FilterSpec {
        FilterSpec {
            passband_edge: 0.7,
            stopband_edge: 0.9,
            coeff_scale: 10,
            max_stage_factor: max,
        }
    }

    #[test]
    fn small_factor_is_single_stage() {
        assert_eq!(spec(50).split_factor(4), (4, None));
        assert_eq!(spec(50).factor_chain(50), vec![50]);
    }

    #[test]
    fn large_factor_splits_on_biggest_divisor() {
        assert_eq!(spec(50).split_factor(100), (50, Some(2)));
        assert_eq!(spec(50).factor_chain(100), vec![50, 2]);
    }

    #[test]
    fn chain_product_preserves_total_factor() {
        for n in [60u32, 96, 100, 600, 996, 997, 1000, 3600] {
            let chain = spec(50).factor_chain(n);
            let product: u32 = chain.iter().product();
            assert_eq!(product, n, "chain {chain:?} for {n}");
        }
    }

    #[test]
    fn oversized_prime_stays_whole() {
        // 997 is prime: no divisor at or below the cap, so it cannot be
        // split and the stage keeps the full factor.
        assert_eq!(spec(50).factor_chain(997), vec![997]);
    }

    #[test]
    fn composite_splits_leave_bounded_leads() {
        let chain = spec(50).factor_chain(996);
        assert!(chain[0] <= 50);
        assert_eq!(chain.iter().product::<u32>(), 996);
    }

    #[test]
    fn designed_length_matches_factor() {
        let handle = CacheHandle::register();
        let coeff = handle.coefficients(4, &spec(50)).unwrap();
        assert_eq!(coeff.len(), 4 * 10 * 2 + 1);
        // Symmetric low-pass kernel.
        let mid = coeff.len() / 2;
        assert!(coeff[mid] > 0.0);
        let dc: f64 = coeff.iter().sum();
        assert!((dc - 1.0).abs() < 0.02);
    }

    #[test]
    fn repeated_lookups_share_storage() {
        let handle = CacheHandle::register();
        let a = handle.coefficients(5, &spec(50)).unwrap();
        let b = handle.coefficients(5, &spec(50)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
