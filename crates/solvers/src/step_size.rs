//! Step-length selection.
//!
//! Time-span intervals have a fixed step length. Burnup-span intervals are
//! converted to time with the specific power (MW/kgHM), which follows the
//! flux level. The specific power over the coming step is predicted from a
//! low-order least-squares polynomial of its recent history, evaluated at
//! mid-step.

use std::collections::VecDeque;

use burnup_core::{
    config::{Interval, IntervalSpan},
    units::SECONDS_PER_DAY,
};
use thiserror::Error;

/// Points kept for the history fit.
const HISTORY_POINTS: usize = 4;

/// Highest polynomial order used by the history fit.
const MAX_ORDER: usize = 2;

/// Errors raised while choosing a step length.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum StepSizeError {
    #[error("interval {interval} spans burnup but the specific power is {power} MW/kg")]
    NoPower { interval: usize, power: f64 },
}

/// A polynomial in the scaled time `u = (t − origin) / scale`.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    origin: f64,
    scale: f64,
    coefficients: Vec<f64>,
}

impl Polynomial {
    /// Coefficients of `1, u, u², …`.
    #[must_use]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    #[must_use]
    pub fn eval(&self, t: f64) -> f64 {
        let u = (t - self.origin) / self.scale;
        self.coefficients.iter().rev().fold(0.0, |acc, c| acc * u + c)
    }
}

/// Least-squares polynomial of the given order through `points`.
///
/// Times are shifted to the last point and scaled by the spread of the
/// points, which keeps the normal equations well conditioned. Returns `None`
/// if there are not more points than the order or the system is singular.
#[must_use]
pub fn polyfit(points: &[(f64, f64)], order: usize) -> Option<Polynomial> {
    if points.len() <= order {
        return None;
    }
    let origin = points.last().map_or(0.0, |p| p.0);
    let spread = points
        .iter()
        .map(|p| (p.0 - origin).abs())
        .fold(0.0, f64::max);
    let scale = if spread > 0.0 { spread } else { 1.0 };
    let n = order + 1;

    // Normal equations, augmented with the right-hand side.
    let mut system = vec![vec![0.0; n + 1]; n];
    for &(t, y) in points {
        let u = (t - origin) / scale;
        let powers: Vec<f64> = (0..n).map(|k| u.powi(k as i32)).collect();
        for (row, &pr) in system.iter_mut().zip(&powers) {
            for (cell, &pc) in row.iter_mut().zip(&powers) {
                *cell += pr * pc;
            }
            row[n] += pr * y;
        }
    }

    Some(Polynomial {
        origin,
        scale,
        coefficients: solve(system)?,
    })
}

/// Gaussian elimination with partial pivoting on an augmented matrix.
fn solve(mut system: Vec<Vec<f64>>) -> Option<Vec<f64>> {
    let n = system.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&a, &b| system[a][col].abs().total_cmp(&system[b][col].abs()))?;
        if system[pivot][col] == 0.0 {
            return None;
        }
        system.swap(col, pivot);
        for row in col + 1..n {
            let factor = system[row][col] / system[col][col];
            for k in col..=n {
                let delta = factor * system[col][k];
                system[row][k] -= delta;
            }
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| system[row][k] * x[k]).sum();
        x[row] = (system[row][n] - tail) / system[row][row];
    }
    Some(x)
}

/// Recent specific-power values, keyed by burn time (s).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PowerHistory {
    points: VecDeque<(f64, f64)>,
}

impl PowerHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the specific power at `time`, replacing a value at the same
    /// time.
    pub fn push(&mut self, time: f64, power: f64) {
        if self.points.back().is_some_and(|p| p.0 == time) {
            self.points.pop_back();
        }
        if self.points.len() == HISTORY_POINTS {
            self.points.pop_front();
        }
        self.points.push_back((time, power));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Predicted specific power at `time`.
    ///
    /// Uses the highest order the history supports, up to quadratic; with a
    /// single point the latest value is returned.
    #[must_use]
    pub fn predict(&self, time: f64) -> Option<f64> {
        let latest = self.points.back()?.1;
        let points: Vec<(f64, f64)> = self.points.iter().copied().collect();
        let order = (points.len() - 1).min(MAX_ORDER);
        if order == 0 {
            return Some(latest);
        }
        polyfit(&points, order)
            .map(|p| p.eval(time))
            .filter(|p| p.is_finite() && *p > 0.0)
            .or(Some(latest))
    }
}

/// Length (s) of the next step of `interval`.
///
/// For burnup spans, `history` must already hold the beginning-of-step
/// specific power; the step is first sized with that value and then resized
/// with the prediction at its midpoint.
///
/// # Errors
///
/// Returns [`StepSizeError::NoPower`] if a burnup span meets a specific
/// power that is not positive.
pub fn step_length(
    index: usize,
    interval: &Interval,
    history: &PowerHistory,
    time: f64,
) -> Result<f64, StepSizeError> {
    let span = interval.span_per_step();
    match interval.span {
        IntervalSpan::Days(_) => Ok(span * SECONDS_PER_DAY),
        IntervalSpan::Burnup(_) => {
            let power = history.predict(time).unwrap_or(0.0);
            if !(power.is_finite() && power > 0.0) {
                return Err(StepSizeError::NoPower {
                    interval: index,
                    power,
                });
            }
            let first = span / power * SECONDS_PER_DAY;
            let mid = history
                .predict(time + 0.5 * first)
                .filter(|p| *p > 0.0)
                .unwrap_or(power);
            Ok(span / mid * SECONDS_PER_DAY)
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use burnup_core::config::{Normalization, StepType};

    use super::*;

    fn burnup_interval(total: f64, steps: usize) -> Interval {
        Interval {
            step_type: StepType::Burnup,
            span: IntervalSpan::Burnup(total),
            steps,
            normalization: Normalization::Power(1.0e6),
            mass_flows: Vec::new(),
        }
    }

    #[test]
    fn fits_a_quadratic_exactly() {
        let points: Vec<(f64, f64)> = [0.0, 1.0, 2.0, 4.0]
            .iter()
            .map(|&t| (t * 1.0e6, 3.0 - 2.0e-6 * t * 1.0e6 + 0.5 * (t * t)))
            .collect();

        let fit = polyfit(&points, 2).unwrap();
        for &(t, y) in &points {
            assert_relative_eq!(fit.eval(t), y, max_relative = 1e-9);
        }
        assert!(polyfit(&points[..2], 2).is_none());
    }

    #[test]
    fn history_keeps_the_latest_points() {
        let mut history = PowerHistory::new();
        for i in 0..6 {
            history.push(f64::from(i), 40.0);
        }
        history.push(5.0, 41.0);

        assert_eq!(history.len(), HISTORY_POINTS);
        assert_relative_eq!(history.predict(5.0).unwrap(), 41.0, max_relative = 0.05);
    }

    #[test]
    fn time_spans_ignore_power() {
        let interval = Interval {
            step_type: StepType::DecayTotal,
            span: IntervalSpan::Days(30.0),
            steps: 3,
            normalization: Normalization::Power(0.0),
            mass_flows: Vec::new(),
        };
        let dt = step_length(0, &interval, &PowerHistory::new(), 0.0).unwrap();
        assert_eq!(dt, 10.0 * SECONDS_PER_DAY);
    }

    #[test]
    fn burnup_spans_use_specific_power() {
        let mut history = PowerHistory::new();
        history.push(0.0, 0.04);

        // 1 MWd/kg per step at 0.04 MW/kg is 25 days.
        let dt = step_length(0, &burnup_interval(3.0, 3), &history, 0.0).unwrap();
        assert_relative_eq!(dt, 25.0 * SECONDS_PER_DAY, max_relative = 1e-12);

        assert_eq!(
            step_length(2, &burnup_interval(3.0, 3), &PowerHistory::new(), 0.0),
            Err(StepSizeError::NoPower {
                interval: 2,
                power: 0.0
            })
        );
    }

    #[test]
    fn rising_power_shortens_the_step() {
        let mut history = PowerHistory::new();
        let day = SECONDS_PER_DAY;
        history.push(0.0, 0.030);
        history.push(10.0 * day, 0.035);
        history.push(20.0 * day, 0.040);

        let dt = step_length(0, &burnup_interval(1.0, 1), &history, 20.0 * day).unwrap();
        assert!(dt < 25.0 * day);
    }
}
