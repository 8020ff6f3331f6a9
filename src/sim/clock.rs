/// A simulation clock that hands out tick indices over a fixed horizon.
///
/// The engine pulls one tick at a time; a tick is consumed only when it
/// is handed out, so an interrupted step can be resumed without skipping.
///
/// # Examples
///
/// ```
/// use urban_traffic_sim::sim::clock::Clock;
///
/// let mut clock = Clock::new(3, 1.0);
/// let mut ticks = Vec::new();
///
/// while let Some(tick) = clock.tick() {
///     ticks.push(tick);
/// }
/// assert_eq!(ticks, vec![0, 1, 2]);
/// assert!(clock.is_exhausted());
/// assert_eq!(clock.time_s(2), 2.0);
/// ```
#[derive(Debug, Clone)]
pub struct Clock {
    /// Next tick to hand out
    current: usize,
    /// Total ticks in the horizon
    total: usize,
    /// Seconds per tick
    dt_s: f64,
}

impl Clock {
    /// Creates a clock over `total` ticks of `dt_s` seconds each.
    pub fn new(total: usize, dt_s: f64) -> Self {
        Self {
            current: 0,
            total,
            dt_s,
        }
    }

    /// Advances the clock by one tick.
    ///
    /// # Returns
    ///
    /// * `Some(tick)` - The tick index (starting from 0) before advancing
    /// * `None` - If the horizon has been exhausted
    pub fn tick(&mut self) -> Option<usize> {
        if self.current < self.total {
            let tick = self.current;
            self.current += 1;
            Some(tick)
        } else {
            None
        }
    }

    /// Simulated time at the start of `tick`.
    pub fn time_s(&self, tick: usize) -> f64 {
        tick as f64 * self.dt_s
    }

    pub fn is_exhausted(&self) -> bool {
        self.current >= self.total
    }
}
