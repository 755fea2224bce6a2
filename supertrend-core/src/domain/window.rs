//! Trailing bar windows.
//!
//! `BarWindow` is a borrowed view over the caller's history; trimming it never
//! touches the underlying bars. `BarBuffer` is the owned counterpart for live
//! feeds that want the engine to see exactly its required lookback.

use std::collections::VecDeque;

use super::bar::{Bar, PriceSource};

/// Ordered, read-only view of the most recent bars (oldest first).
#[derive(Debug, Clone, Copy)]
pub struct BarWindow<'a> {
    bars: &'a [Bar],
}

impl<'a> BarWindow<'a> {
    pub fn new(bars: &'a [Bar]) -> Self {
        Self { bars }
    }

    /// The last `len` bars (or all of them if fewer are available).
    pub fn trailing(&self, len: usize) -> BarWindow<'a> {
        let start = self.bars.len().saturating_sub(len);
        BarWindow {
            bars: &self.bars[start..],
        }
    }

    pub fn bars(&self) -> &'a [Bar] {
        self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&'a Bar> {
        self.bars.last()
    }

    /// Bar immediately before the last one.
    pub fn previous(&self) -> Option<&'a Bar> {
        self.bars.len().checked_sub(2).map(|i| &self.bars[i])
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    pub fn prices(&self, source: PriceSource) -> Vec<f64> {
        self.bars.iter().map(|b| b.price(source)).collect()
    }
}

/// Owned, fixed-capacity trailing buffer of bars.
///
/// Pushing beyond capacity evicts the oldest bar.
#[derive(Debug, Clone)]
pub struct BarBuffer {
    capacity: usize,
    bars: VecDeque<Bar>,
}

impl BarBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            bars: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.bars.len() == self.capacity
    }

    pub fn push(&mut self, bar: Bar) {
        if self.bars.len() == self.capacity {
            self.bars.pop_front();
        }
        self.bars.push_back(bar);
    }

    /// Contiguous slice of the buffered bars, oldest first.
    pub fn as_slice(&mut self) -> &[Bar] {
        self.bars.make_contiguous()
    }

    pub fn window(&mut self) -> BarWindow<'_> {
        BarWindow::new(self.as_slice())
    }
}
