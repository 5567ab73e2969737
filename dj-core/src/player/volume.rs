//! Stem volume balancing
//!
//! Vocal stems are mastered quieter than the instrumentals, so the two
//! sliders are skewed in opposite directions.

use crate::sync::StemKind;

pub const VOLUME_ADJUSTMENT_FACTOR: f32 = 1.30;

/// Clamp a slider value into [0, 1]
pub fn clamp_slider(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Output volume for a stem given its slider value
pub fn output_volume(stem: StemKind, slider: f32) -> f32 {
    let slider = clamp_slider(slider);
    match stem {
        StemKind::Instrumental => slider / VOLUME_ADJUSTMENT_FACTOR,
        StemKind::Vocal => (slider * VOLUME_ADJUSTMENT_FACTOR).min(1.0),
    }
}
