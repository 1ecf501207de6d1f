//! Causal timestamp sampling and popularity-skewed id sampling.
//!
//! Every timestamp drawn here is guaranteed to land at or after its lower
//! bound (and at or before the upper bound when one is given); the
//! referential invariants of the generated dataset all rest on that.

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDateTime};
use rand::Rng;

/// Uniform draw within [lower, upper], whole seconds.
pub fn between(rng: &mut impl Rng, lower: NaiveDateTime, upper: NaiveDateTime) -> NaiveDateTime {
    let lo = lower.and_utc().timestamp();
    let hi = upper.and_utc().timestamp().max(lo);
    from_unix(rng.gen_range(lo..=hi), lower)
}

/// `lower` plus a uniform whole-second delay in [min_delay, max_delay].
pub fn after(
    rng: &mut impl Rng,
    lower: NaiveDateTime,
    min_delay: i64,
    max_delay: i64,
) -> NaiveDateTime {
    let delay = rng.gen_range(min_delay..=max_delay.max(min_delay));
    from_unix(lower.and_utc().timestamp() + delay, lower)
}

fn from_unix(secs: i64, fallback: NaiveDateTime) -> NaiveDateTime {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.naive_utc())
        .unwrap_or(fallback)
}

/// Population split into a hot head and a cold tail, in the order given.
/// Draws favor the hot side to mimic popularity concentration.
pub struct SkewedIds {
    hot: Vec<i64>,
    cold: Vec<i64>,
}

impl SkewedIds {
    pub fn split(ids: Vec<i64>, hot_ratio: f64) -> Result<Self> {
        if ids.is_empty() {
            return Err(anyhow!("Cannot build a skewed sampler over an empty id set"));
        }
        let cut = ((ids.len() as f64) * hot_ratio) as usize;
        let mut hot = ids;
        let cold = hot.split_off(cut.min(hot.len()));
        Ok(Self { hot, cold })
    }

    /// Hot with the given probability, uniform inside the chosen partition.
    /// Falls back to whichever partition is non-empty.
    pub fn pick(&self, rng: &mut impl Rng, hot_probability: f64) -> i64 {
        let side = if self.cold.is_empty() {
            &self.hot
        } else if self.hot.is_empty() {
            &self.cold
        } else if rng.gen_bool(hot_probability) {
            &self.hot
        } else {
            &self.cold
        };
        side[rng.gen_range(0..side.len())]
    }

    pub fn hot_len(&self) -> usize {
        self.hot.len()
    }

    pub fn cold_len(&self) -> usize {
        self.cold.len()
    }
}
