pub type Scalar = f32;

/// Refresh rate assumed when the display reports none.
pub const FALLBACK_REFRESH_HZ: Scalar = 90.0;
