//! Fixed-capacity rolling mean.
//!
//! A circular buffer of the last `window` samples with an incrementally
//! maintained sum: each push subtracts the evicted sample (once the window
//! is full) and adds the new one, so the mean costs O(1) and never
//! allocates.  During warm-up the mean divides by the number of samples
//! actually held, not by `window`.
//!
//! Samples are `f32`.  16-bit ADC codes summed over a window of at most a
//! few hundred entries stay below 2^24, so the running sum is exact.

use crate::error::{Error, Result};

pub struct RollingAverage<const CAP: usize> {
    ring: [f32; CAP],
    window: usize,
    /// Next slot to write.
    index: usize,
    /// Valid samples held (`<= window`).
    count: usize,
    sum: f32,
    last: f32,
}

impl<const CAP: usize> RollingAverage<CAP> {
    /// An averager over `window` samples.  Fails if `window` is zero or
    /// larger than `CAP`.
    pub fn new(window: usize) -> Result<Self> {
        if window == 0 || window > CAP {
            return Err(Error::Config("rolling window outside 1..=capacity"));
        }
        Ok(Self {
            ring: [0.0; CAP],
            window,
            index: 0,
            count: 0,
            sum: 0.0,
            last: 0.0,
        })
    }

    /// Add a sample and return the new mean.
    pub fn push(&mut self, value: f32) -> f32 {
        if self.count < self.window {
            self.count += 1;
        } else {
            self.sum -= self.ring[self.index];
        }

        self.ring[self.index] = value;
        self.sum += value;

        self.index = (self.index + 1) % self.window;
        self.last = self.sum / self.count as f32;
        self.last
    }

    /// Push every value in order.
    pub fn push_batch(&mut self, values: &[f32]) {
        for &v in values {
            self.push(v);
        }
    }

    /// Seed from another averager's retained samples, oldest first.
    pub fn extend_from<const M: usize>(&mut self, other: &RollingAverage<M>) {
        for v in other.samples() {
            self.push(v);
        }
    }

    /// Most recent mean; zero before the first push.
    pub fn last_value(&self) -> f32 {
        self.last
    }

    pub fn sum(&self) -> f32 {
        self.sum
    }

    /// Number of valid samples held.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Retained samples, oldest first.
    pub fn samples(&self) -> impl Iterator<Item = f32> + '_ {
        let start = if self.count < self.window { 0 } else { self.index };
        (0..self.count).map(move |i| self.ring[(start + i) % self.window])
    }

    /// Zero everything, keeping the window size.
    pub fn reset(&mut self) {
        self.ring = [0.0; CAP];
        self.index = 0;
        self.count = 0;
        self.sum = 0.0;
        self.last = 0.0;
    }
}
