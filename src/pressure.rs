//! Pressure response shaping: a 4-point cubic Bezier sampled into a lookup
//! table indexed by raw pressure.

use serde::Deserialize;

/// Number of Bezier parameter steps used to sample the curve.
const CURVE_STEPS: usize = 10;

/// Control points in normalized [0,1]×[0,1] space, p0 through p3.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PressureCurve {
    pub p0: [f64; 2],
    pub p1: [f64; 2],
    pub p2: [f64; 2],
    pub p3: [f64; 2],
}

impl Default for PressureCurve {
    /// Identity response: raw pressure passes through unchanged.
    fn default() -> Self {
        Self {
            p0: [0.0, 0.0],
            p1: [1.0 / 3.0, 1.0 / 3.0],
            p2: [2.0 / 3.0, 2.0 / 3.0],
            p3: [1.0, 1.0],
        }
    }
}

/// Shaped-pressure lookup table with `max_pressure + 1` entries.
#[derive(Debug)]
pub struct PressureTable {
    values: Vec<i32>,
}

impl PressureTable {
    /// Sample the curve at `CURVE_STEPS + 1` evenly spaced parameter values
    /// and interpolate a table entry for every integer raw pressure.
    ///
    /// The bracket search requires the sampled x values to be non-decreasing;
    /// a curve that folds back on itself is rejected here rather than leaving
    /// table entries undefined. Raw pressures outside the sampled x span
    /// clamp to the nearest endpoint sample.
    pub fn build(curve: &PressureCurve, max_pressure: i32) -> Result<Self, String> {
        if max_pressure <= 0 {
            return Err(format!("max_pressure must be positive, got {}", max_pressure));
        }
        let max = max_pressure as f64;

        let mut sample_x = [0.0f64; CURVE_STEPS + 1];
        let mut sample_y = [0.0f64; CURVE_STEPS + 1];
        for i in 0..=CURVE_STEPS {
            let t = i as f64 / CURVE_STEPS as f64;
            let u = 1.0 - t;
            let b0 = u * u * u;
            let b1 = 3.0 * t * u * u;
            let b2 = 3.0 * t * t * u;
            let b3 = t * t * t;
            sample_x[i] =
                max * (b0 * curve.p0[0] + b1 * curve.p1[0] + b2 * curve.p2[0] + b3 * curve.p3[0]);
            sample_y[i] =
                max * (b0 * curve.p0[1] + b1 * curve.p1[1] + b2 * curve.p2[1] + b3 * curve.p3[1]);
        }

        for i in 0..CURVE_STEPS {
            if sample_x[i + 1] < sample_x[i] {
                return Err(format!(
                    "pressure curve is not monotonic in x (sample {} = {:.1}, sample {} = {:.1})",
                    i,
                    sample_x[i],
                    i + 1,
                    sample_x[i + 1]
                ));
            }
        }

        let mut values = Vec::with_capacity(max_pressure as usize + 1);
        for raw in 0..=max_pressure {
            let x = raw as f64;
            let mut y = sample_y[CURVE_STEPS];
            if x <= sample_x[0] {
                y = sample_y[0];
            } else {
                for i in 0..CURVE_STEPS {
                    if x <= sample_x[i + 1] {
                        let span = sample_x[i + 1] - sample_x[i];
                        y = if span == 0.0 {
                            sample_y[i]
                        } else {
                            sample_y[i] + (sample_y[i + 1] - sample_y[i]) * (x - sample_x[i]) / span
                        };
                        break;
                    }
                }
            }
            values.push(y.clamp(0.0, max) as i32);
        }

        Ok(Self { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Shaped value for a raw pressure, or None when the raw value falls
    /// outside the table's domain.
    pub fn shape(&self, raw: i32) -> Option<i32> {
        if raw < 0 {
            return None;
        }
        self.values.get(raw as usize).copied()
    }
}
