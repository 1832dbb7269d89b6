use crate::scalar::FALLBACK_REFRESH_HZ;
use crate::Scalar;

/// Explicitly owned session clock. Lives for the VR session.
#[derive(Copy, Clone, Debug)]
pub struct Session {
    pub frame: u64,
    pub elapsed: Scalar,
    refresh_hz: Scalar,
}

impl Session {
    pub fn new(refresh_hz: Scalar) -> Self {
        let refresh_hz = if refresh_hz > 0.0 { refresh_hz } else { FALLBACK_REFRESH_HZ };
        Self { frame: 0, elapsed: 0.0, refresh_hz }
    }
    #[inline] pub fn refresh_hz(&self) -> Scalar { self.refresh_hz }
    pub fn advance(&mut self, dt: Scalar) {
        self.frame += 1;
        self.elapsed += dt;
    }
}
