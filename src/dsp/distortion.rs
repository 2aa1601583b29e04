//! Soft saturation for the richer facet timbres.
//!
//! The waveshaper is `f(x) = x / (1 + |x|)`, the same curve the old drum
//! voices used. We normalise it so a full-scale input still comes out at full
//! scale: drive only thickens the tone, it never changes the peak, which keeps
//! the envelope in charge of loudness.

/// Raw soft clip, `x·drive / (1 + |x·drive|)`.
#[inline]
pub fn soft_clip(sample: f32, drive: f32) -> f32 {
    let x = sample * drive;
    x / (1.0 + x.abs())
}

/// Soft clip scaled so that ±1.0 maps to ±1.0.
#[inline]
pub fn saturate(sample: f32, drive: f32) -> f32 {
    let drive = drive.max(1.0e-3);
    soft_clip(sample, drive) * (1.0 + drive) / drive
}

pub fn saturate_buffer(buffer: &mut [f32], drive: f32) {
    for sample in buffer.iter_mut() {
        *sample = saturate(*sample, drive);
    }
}
