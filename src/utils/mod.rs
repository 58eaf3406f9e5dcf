use std::mem::transmute;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;
use took::Timer;

use crate::problem::Num;

pub mod stats;
pub mod validator;

pub trait Tolerance {
    fn tol() -> Self;
}

impl Tolerance for Num {
    fn tol() -> Self {
        0.001
    }
}

pub type Random = Pcg64Mcg;

pub fn create_seeded_rng(seed: i128) -> Random {
    let raw_bytes: [u8; 16] = unsafe { transmute(seed) };
    let mut rng = Pcg64Mcg::from_seed(raw_bytes);
    // discard the first three
    rng.next_u64();
    rng.next_u64();
    rng.next_u64();
    rng
}

pub enum TimeLimit {
    Seconds(u64),
    None,
}

impl TimeLimit {
    pub fn as_seconds(&self) -> u64 {
        match self {
            Self::Seconds(seconds) => *seconds,
            Self::None => u64::MAX,
        }
    }
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

pub struct Countdown {
    start: Timer,
    time_limit: TimeLimit,
}

impl Countdown {
    pub fn new(start: Timer, limit: TimeLimit) -> Self {
        Self {
            start,
            time_limit: limit,
        }
    }

    pub fn empty() -> Self {
        Self {
            start: Timer::new(),
            time_limit: TimeLimit::None,
        }
    }

    pub fn time_remaining_millis(&self) -> u64 {
        if let TimeLimit::Seconds(value) = self.time_limit {
            let limit_millis = value.saturating_mul(1000);
            let elapsed = self.start.took().as_std().as_millis() as u64;
            limit_millis.saturating_sub(elapsed)
        } else {
            u64::MAX
        }
    }

    /// Fraction of the time budget still left, in [0, 1]; 1 without a limit.
    pub fn fraction_remaining(&self) -> f64 {
        if let TimeLimit::Seconds(value) = self.time_limit {
            let limit_millis = value.saturating_mul(1000);
            if limit_millis == 0 {
                return 0.0;
            }
            self.time_remaining_millis() as f64 / limit_millis as f64
        } else {
            1.0
        }
    }

    pub fn is_finished(&self) -> bool {
        self.time_remaining_millis() == 0
    }

    pub fn is_time_remaining(&self) -> bool {
        !self.is_finished()
    }

    pub fn time_elapsed(&self) -> Duration {
        self.start.took().clone().into_std()
    }
}

/// Cooperative cancellation flag checked at every loop boundary of the search.
#[derive(Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn seeded_rng_is_deterministic() {
        let mut a = create_seeded_rng(42);
        let mut b = create_seeded_rng(42);
        for _ in 0..16 {
            assert_eq!(a.gen_range(0..1000usize), b.gen_range(0..1000usize));
        }
    }

    #[test]
    fn countdown_without_limit_never_finishes() {
        let countdown = Countdown::empty();
        assert!(countdown.is_time_remaining());
        assert_eq!(countdown.fraction_remaining(), 1.0);
    }

    #[test]
    fn cancellation_token_flips_once() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
