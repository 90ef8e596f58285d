//! Supertrend: ATR-based directional indicator.
//!
//! Inherently sequential: each bar's final bands and direction depend on the
//! previous bar's bands, direction and close. The computation is a single
//! forward fold of [`SupertrendState`] over the bars.
//!
//! Output is the active band, i.e. the final lower band (support) while trending up,
//! final upper band (resistance) while trending down. The first defined value
//! sits at index `period - 1`, where the Wilder ATR is seeded.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::atr::{true_range, wilder_smooth};
use super::params::IndicatorParams;
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    #[error("insufficient data: need at least {needed} bars, got {available}")]
    InsufficientData { needed: usize, available: usize },

    #[error("malformed bar at index {index}: {reason}")]
    MalformedBar { index: usize, reason: String },

    #[error("non-finite indicator value at index {index}")]
    NonFiniteOutput { index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
}

/// One defined Supertrend output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupertrendPoint {
    pub value: f64,
    pub direction: Direction,
    pub final_upper: f64,
    pub final_lower: f64,
}

/// Running state carried from one bar to the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupertrendState {
    pub final_upper: f64,
    pub final_lower: f64,
    pub direction: Direction,
}

impl SupertrendState {
    /// State at the seed bar: final bands equal basic bands, trending up.
    pub fn seed(basic_upper: f64, basic_lower: f64) -> Self {
        Self {
            final_upper: basic_upper,
            final_lower: basic_lower,
            direction: Direction::Up,
        }
    }

    /// Advance one bar.
    ///
    /// The upper band only moves down unless the previous close broke above
    /// it; the lower band only moves up unless the previous close broke below
    /// it. A close exactly on the active band keeps the current direction.
    pub fn next(self, basic_upper: f64, basic_lower: f64, prev_close: f64, close: f64) -> Self {
        let final_upper = if basic_upper < self.final_upper || prev_close > self.final_upper {
            basic_upper
        } else {
            self.final_upper
        };

        let final_lower = if basic_lower > self.final_lower || prev_close < self.final_lower {
            basic_lower
        } else {
            self.final_lower
        };

        let direction = match self.direction {
            Direction::Up if close < final_lower => Direction::Down,
            Direction::Down if close > final_upper => Direction::Up,
            unchanged => unchanged,
        };

        Self {
            final_upper,
            final_lower,
            direction,
        }
    }

    pub fn value(&self) -> f64 {
        match self.direction {
            Direction::Up => self.final_lower,
            Direction::Down => self.final_upper,
        }
    }

    pub fn point(&self) -> SupertrendPoint {
        SupertrendPoint {
            value: self.value(),
            direction: self.direction,
            final_upper: self.final_upper,
            final_lower: self.final_lower,
        }
    }
}

/// Supertrend output aligned 1:1 with the input bars.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SupertrendSeries {
    points: Vec<Option<SupertrendPoint>>,
}

impl SupertrendSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SupertrendPoint> {
        self.points.get(index).and_then(Option::as_ref)
    }

    pub fn points(&self) -> &[Option<SupertrendPoint>] {
        &self.points
    }

    /// Indicator values, `None` during warm-up.
    pub fn values(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.map(|p| p.value)).collect()
    }

    pub fn directions(&self) -> Vec<Option<Direction>> {
        self.points.iter().map(|p| p.map(|p| p.direction)).collect()
    }

    pub fn defined_count(&self) -> usize {
        self.points.iter().filter(|p| p.is_some()).count()
    }

    pub fn last(&self) -> Option<&SupertrendPoint> {
        self.points.last().and_then(Option::as_ref)
    }
}

#[derive(Debug, Clone)]
pub struct Supertrend {
    params: IndicatorParams,
    name: String,
}

impl Supertrend {
    pub fn new(params: IndicatorParams) -> Self {
        Self {
            name: format!("supertrend_{}_{}", params.period(), params.multiplier()),
            params,
        }
    }

    pub fn params(&self) -> &IndicatorParams {
        &self.params
    }

    /// Compute the Supertrend for a full bar series.
    ///
    /// Fails with `InsufficientData` when fewer than `period` bars are given.
    /// A series of `period..period + 2` bars is not an error; it just has
    /// fewer than two defined points.
    pub fn compute(&self, bars: &[Bar]) -> Result<SupertrendSeries, IndicatorError> {
        let period = self.params.period();
        let multiplier = self.params.multiplier();
        let n = bars.len();

        if n < period {
            return Err(IndicatorError::InsufficientData {
                needed: period,
                available: n,
            });
        }
        validate_bars(bars)?;

        let atr = wilder_smooth(&true_range(bars), period);
        let basic_bands = |i: usize| {
            let hl2 = bars[i].hl2();
            let offset = multiplier * atr[i];
            (hl2 + offset, hl2 - offset)
        };

        let seed = self.params.seed_index();
        let mut points = Vec::with_capacity(n);
        points.resize(seed, None);

        let (upper, lower) = basic_bands(seed);
        let mut state = SupertrendState::seed(upper, lower);
        points.push(Some(checked_point(&state, seed)?));

        for i in (seed + 1)..n {
            let (upper, lower) = basic_bands(i);
            state = state.next(upper, lower, bars[i - 1].close, bars[i].close);
            points.push(Some(checked_point(&state, i)?));
        }

        Ok(SupertrendSeries { points })
    }
}

fn validate_bars(bars: &[Bar]) -> Result<(), IndicatorError> {
    for (index, bar) in bars.iter().enumerate() {
        if bar.is_void() {
            return Err(IndicatorError::MalformedBar {
                index,
                reason: "non-finite high/low/close".into(),
            });
        }
        if bar.high < bar.low {
            return Err(IndicatorError::MalformedBar {
                index,
                reason: format!("high {} below low {}", bar.high, bar.low),
            });
        }
    }
    Ok(())
}

fn checked_point(state: &SupertrendState, index: usize) -> Result<SupertrendPoint, IndicatorError> {
    let point = state.point();
    if point.final_upper.is_finite() && point.final_lower.is_finite() {
        Ok(point)
    } else {
        Err(IndicatorError::NonFiniteOutput { index })
    }
}

impl Indicator for Supertrend {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.params.seed_index()
    }

    fn compute_values(&self, bars: &[Bar]) -> Vec<f64> {
        match self.compute(bars) {
            Ok(series) => series
                .values()
                .into_iter()
                .map(|v| v.unwrap_or(f64::NAN))
                .collect(),
            Err(_) => vec![f64::NAN; bars.len()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlc_bars, DEFAULT_EPSILON};

    fn params(period: usize, multiplier: f64) -> IndicatorParams {
        IndicatorParams::new(period, multiplier).unwrap()
    }

    /// Closes fall 0.5/day from 200 for 20 bars (high/low = close ± 1, so
    /// every true range is exactly 2), then gap up 10 points on bar 20.
    fn declining_then_jump() -> Vec<Bar> {
        let mut data = Vec::new();
        for i in 0..20 {
            let c = 200.0 - 0.5 * i as f64;
            data.push((c, c + 1.0, c - 1.0, c));
        }
        let c = 190.5 + 10.0;
        data.push((c, c + 1.0, c - 1.0, c));
        make_ohlc_bars(&data)
    }

    #[test]
    fn seed_equals_simple_mean_basic_band() {
        let bars = make_ohlc_bars(&[
            (100.0, 105.0, 95.0, 102.0),  // TR = 10
            (102.0, 108.0, 100.0, 106.0), // TR = 8
            (106.0, 107.0, 98.0, 99.0),   // TR = 9
            (99.0, 103.0, 97.0, 101.0),
        ]);
        let series = Supertrend::new(params(3, 2.0)).compute(&bars).unwrap();

        assert_eq!(series.len(), 4);
        assert!(series.get(0).is_none());
        assert!(series.get(1).is_none());

        // ATR seed = mean(10, 8, 9) = 9; hl2 = 102.5
        let seed = series.get(2).unwrap();
        assert_eq!(seed.direction, Direction::Up);
        assert_approx(seed.final_upper, 102.5 + 18.0, DEFAULT_EPSILON);
        assert_approx(seed.final_lower, 102.5 - 18.0, DEFAULT_EPSILON);
        assert_approx(seed.value, 84.5, DEFAULT_EPSILON);
    }

    #[test]
    fn flips_up_exactly_on_breakout_bar() {
        let bars = declining_then_jump();
        let series = Supertrend::new(params(3, 2.0)).compute(&bars).unwrap();
        let dirs = series.directions();

        assert_eq!(dirs[19], Some(Direction::Down));
        assert_eq!(dirs[20], Some(Direction::Up));
        // Final upper held at bar 19's value (190.5 + 4); close 200.5 breaks it.
        assert_approx(series.get(20).unwrap().final_upper, 194.5, DEFAULT_EPSILON);
        assert_approx(series.get(20).unwrap().value, 190.5, DEFAULT_EPSILON);
    }

    #[test]
    fn flips_down_once_close_breaks_lower_band() {
        let bars = declining_then_jump();
        let series = Supertrend::new(params(3, 2.0)).compute(&bars).unwrap();
        let dirs = series.directions();

        // Lower band is pinned at 195 from the seed; close 194.5 on bar 11 breaks it.
        for (i, dir) in dirs.iter().enumerate().take(11).skip(2) {
            assert_eq!(*dir, Some(Direction::Up), "bar {i}");
        }
        for (i, dir) in dirs.iter().enumerate().take(20).skip(11) {
            assert_eq!(*dir, Some(Direction::Down), "bar {i}");
        }
    }

    #[test]
    fn close_equal_to_lower_band_does_not_flip() {
        let bars = declining_then_jump();
        let series = Supertrend::new(params(3, 2.0)).compute(&bars).unwrap();
        let p = series.get(10).unwrap();
        assert_eq!(bars[10].close, p.final_lower);
        assert_eq!(p.direction, Direction::Up);
    }

    #[test]
    fn state_persists_between_bands() {
        let state = SupertrendState {
            final_upper: 110.0,
            final_lower: 90.0,
            direction: Direction::Down,
        };
        let next = state.next(112.0, 88.0, 100.0, 105.0);
        assert_eq!(next.direction, Direction::Down);
        // Basic upper is wider and prior close was below: band holds.
        assert_eq!(next.final_upper, 110.0);
        assert_eq!(next.final_lower, 90.0);
        assert_eq!(next.value(), 110.0);
    }

    #[test]
    fn state_ties_keep_direction() {
        let down = SupertrendState {
            final_upper: 110.0,
            final_lower: 90.0,
            direction: Direction::Down,
        };
        assert_eq!(down.next(115.0, 85.0, 100.0, 110.0).direction, Direction::Down);

        let up = SupertrendState {
            direction: Direction::Up,
            ..down
        };
        assert_eq!(up.next(115.0, 85.0, 100.0, 90.0).direction, Direction::Up);
    }

    #[test]
    fn state_band_resets_after_prior_close_breaks_it() {
        let state = SupertrendState {
            final_upper: 110.0,
            final_lower: 90.0,
            direction: Direction::Up,
        };
        // Previous close 111 was above the upper band: upper resets to basic.
        let next = state.next(120.0, 95.0, 111.0, 112.0);
        assert_eq!(next.final_upper, 120.0);
        // Basic lower 95 is tighter than 90: lower ratchets up.
        assert_eq!(next.final_lower, 95.0);
        assert_eq!(next.value(), 95.0);
    }

    #[test]
    fn value_is_always_the_active_band() {
        let bars = declining_then_jump();
        let series = Supertrend::new(params(3, 2.0)).compute(&bars).unwrap();
        for p in series.points().iter().flatten() {
            let expected = match p.direction {
                Direction::Up => p.final_lower,
                Direction::Down => p.final_upper,
            };
            assert_eq!(p.value, expected);
            assert!(p.final_lower <= p.final_upper);
        }
    }

    #[test]
    fn too_few_bars_is_insufficient_data() {
        let bars = make_ohlc_bars(&[(100.0, 105.0, 95.0, 102.0), (102.0, 104.0, 99.0, 103.0)]);
        let err = Supertrend::new(params(3, 2.0)).compute(&bars).unwrap_err();
        assert_eq!(
            err,
            IndicatorError::InsufficientData {
                needed: 3,
                available: 2
            }
        );
    }

    #[test]
    fn exactly_period_bars_yields_single_point() {
        let bars = make_ohlc_bars(&[
            (100.0, 105.0, 95.0, 102.0),
            (102.0, 104.0, 99.0, 103.0),
            (103.0, 106.0, 101.0, 104.0),
        ]);
        let series = Supertrend::new(params(3, 2.0)).compute(&bars).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.defined_count(), 1);
    }

    #[test]
    fn nan_bar_is_malformed() {
        let mut bars = declining_then_jump();
        bars[5].low = f64::NAN;
        let err = Supertrend::new(params(3, 2.0)).compute(&bars).unwrap_err();
        assert!(matches!(err, IndicatorError::MalformedBar { index: 5, .. }));
    }

    #[test]
    fn inverted_bar_is_malformed() {
        let mut bars = declining_then_jump();
        bars[7].high = bars[7].low - 1.0;
        let err = Supertrend::new(params(3, 2.0)).compute(&bars).unwrap_err();
        assert!(matches!(err, IndicatorError::MalformedBar { index: 7, .. }));
    }

    #[test]
    fn overflowing_prices_are_non_finite_output() {
        let bars = make_ohlc_bars(&[
            (1.0, f64::MAX, -f64::MAX, 1.0),
            (1.0, f64::MAX, -f64::MAX, 1.0),
        ]);
        let err = Supertrend::new(params(1, 3.0)).compute(&bars).unwrap_err();
        assert_eq!(err, IndicatorError::NonFiniteOutput { index: 0 });
    }

    #[test]
    fn indicator_trait_pads_warmup_with_nan() {
        let bars = declining_then_jump();
        let st = Supertrend::new(params(3, 2.0));
        let values = st.compute_values(&bars);
        assert_eq!(values.len(), bars.len());
        assert!(values[0].is_nan() && values[1].is_nan());
        assert!(!values[2].is_nan());
        assert_eq!(st.lookback(), 2);
        assert_eq!(st.name(), "supertrend_3_2");
    }
}
