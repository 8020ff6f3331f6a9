//! Passive per-tick metrics sink.

use crate::error::SimError;

use super::types::TickRecord;

/// Accumulates tick records and per-intersection queue statistics.
///
/// Cumulative counters must never decrease between records.
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    records: Vec<TickRecord>,
    queue_sums: Vec<u64>,
    queue_max: Vec<u32>,
}

impl MetricsCollector {
    pub fn new(intersections: usize, expected_ticks: usize) -> Self {
        Self {
            records: Vec::with_capacity(expected_ticks),
            queue_sums: vec![0; intersections],
            queue_max: vec![0; intersections],
        }
    }

    /// Appends one tick's snapshot.
    ///
    /// # Errors
    ///
    /// [`SimError::InternalConsistency`] if the queue vector has the wrong
    /// width or a cumulative counter went backwards.
    pub fn record(&mut self, record: TickRecord) -> Result<(), SimError> {
        if record.queue_lengths.len() != self.queue_sums.len() {
            return Err(SimError::consistency(format!(
                "tick {}: {} queue lengths for {} intersections",
                record.tick,
                record.queue_lengths.len(),
                self.queue_sums.len()
            )));
        }
        if let Some(prev) = self.records.last() {
            if record.emissions_total_g < prev.emissions_total_g {
                return Err(SimError::consistency(format!(
                    "tick {}: cumulative emissions fell from {} to {}",
                    record.tick, prev.emissions_total_g, record.emissions_total_g
                )));
            }
            if record.completed_count < prev.completed_count {
                return Err(SimError::consistency(format!(
                    "tick {}: completed count fell from {} to {}",
                    record.tick, prev.completed_count, record.completed_count
                )));
            }
        }

        for ((sum, max), &q) in self
            .queue_sums
            .iter_mut()
            .zip(self.queue_max.iter_mut())
            .zip(&record.queue_lengths)
        {
            *sum += u64::from(q);
            *max = (*max).max(q);
        }
        self.records.push(record);
        Ok(())
    }

    pub fn records(&self) -> &[TickRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<TickRecord> {
        self.records
    }

    /// Mean over intersections of each intersection's mean queue.
    pub fn avg_queue(&self) -> f64 {
        let ticks = self.records.len();
        if ticks == 0 || self.queue_sums.is_empty() {
            return 0.0;
        }
        let per_node: f64 = self
            .queue_sums
            .iter()
            .map(|&s| s as f64 / ticks as f64)
            .sum();
        per_node / self.queue_sums.len() as f64
    }

    /// Largest queue seen at any intersection.
    pub fn max_queue(&self) -> u32 {
        self.queue_max.iter().copied().max().unwrap_or(0)
    }
}
