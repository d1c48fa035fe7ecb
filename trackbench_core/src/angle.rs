//! Modulo-encoder arithmetic.
//!
//! The encoder reports its absolute position as a step count in `[0, 4096)`;
//! step 4095 is adjacent to step 0. Differences of two readings therefore have
//! to be folded back into the shortest signed distance before they can be used
//! as an error signal or converted to degrees.
//!
//! Antipodal readings (exactly half a turn apart) have no shortest direction.
//! The fold always maps them to `-2048`, so `wrap_error(a - b)` and
//! `wrap_error(b - a)` are negations of each other except when
//! `|a - b| == 2048`, where both are `-2048`.

/// Encoder steps per revolution.
pub const STEPS: i32 = 4096;
/// Half a revolution in steps.
pub const HALF_STEPS: i32 = STEPS / 2;
/// Degrees per encoder step (~0.0879).
pub const DEG_PER_STEP: f64 = 360.0 / STEPS as f64;

/// Fold a raw step difference into the shortest signed distance, `[-2048, 2047]`.
///
/// Inputs above `+2048` lose a turn, inputs below `-2048` gain one; the fold
/// is a modular reduction, so it is total over `i32` and idempotent.
#[inline]
pub fn wrap_error(raw_difference: i32) -> i32 {
    // 2^32 is a multiple of 4096, so wrapping keeps the residue intact.
    raw_difference.wrapping_add(HALF_STEPS).rem_euclid(STEPS) - HALF_STEPS
}

/// Signed angle in degrees of `raw_angle` relative to `axis_center`.
///
/// Neither argument is range-checked; only the wrap is guaranteed.
#[inline]
pub fn to_degrees(raw_angle: i32, axis_center: i32) -> f64 {
    f64::from(wrap_error(raw_angle.wrapping_sub(axis_center))) * DEG_PER_STEP
}

/// Encoder zero point: the raw step read with the lever at mechanical zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisFrame {
    pub axis_center: i32,
}

impl AxisFrame {
    pub fn new(axis_center: i32) -> Self {
        Self { axis_center }
    }

    /// Signed step offset of `raw_angle` from the zero point.
    #[inline]
    pub fn offset_steps(&self, raw_angle: i32) -> i32 {
        wrap_error(raw_angle.wrapping_sub(self.axis_center))
    }

    #[inline]
    pub fn to_degrees(&self, raw_angle: i32) -> f64 {
        to_degrees(raw_angle, self.axis_center)
    }
}

impl From<&trackbench_config::EncoderCfg> for AxisFrame {
    fn from(c: &trackbench_config::EncoderCfg) -> Self {
        Self::new(c.axis_center)
    }
}
