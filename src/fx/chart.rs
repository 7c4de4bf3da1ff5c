//! Decorative live chart
//!
//! A row of bars that loop the same CSS keyframe animation, each offset by a
//! random start delay so the row never moves in lockstep.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// One bar and its animation offset (seconds)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartBar {
    pub delay: f64,
}

/// Bars for the chart area
#[derive(Debug, Clone, PartialEq)]
pub struct LiveChart {
    bars: Vec<ChartBar>,
    cycle: f64,
}

impl LiveChart {
    /// `count` bars with delays drawn from [0, max_delay)
    pub fn new(count: usize, max_delay: f64, cycle: f64, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let max_delay = max_delay.max(0.0);
        let bars = (0..count)
            .map(|_| ChartBar {
                delay: rng.random::<f64>() * max_delay,
            })
            .collect();
        Self { bars, cycle }
    }

    pub fn bars(&self) -> &[ChartBar] {
        &self.bars
    }

    /// Length of one animation loop (seconds)
    pub fn cycle(&self) -> f64 {
        self.cycle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_same_seed_same_bars() {
        assert_eq!(LiveChart::new(30, 2.0, 3.0, 5), LiveChart::new(30, 2.0, 3.0, 5));
        assert_eq!(LiveChart::new(30, 2.0, 3.0, 5).bars().len(), 30);
    }

    #[test]
    fn test_delays_are_staggered() {
        let chart = LiveChart::new(30, 2.0, 3.0, 77);
        let first = chart.bars()[0].delay;
        assert!(chart.bars().iter().any(|b| b.delay != first));
    }

    proptest! {
        #[test]
        fn prop_delay_in_range(seed in any::<u64>(), count in 0usize..64) {
            let chart = LiveChart::new(count, 2.0, 3.0, seed);
            prop_assert_eq!(chart.bars().len(), count);
            for bar in chart.bars() {
                prop_assert!((0.0..2.0).contains(&bar.delay));
            }
        }
    }
}
