use peritele_core::Scalar;

/// `t` wrapped into `[0, len]`.
#[inline]
pub fn repeat(t: Scalar, len: Scalar) -> Scalar {
    (t - (t / len).floor() * len).clamp(0.0, len)
}

/// Diagnostic pin of the blend factor.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BlendOverride { None, CurrentOnly, PredictedOnly }

impl BlendOverride {
    /// `current_only` wins when both are set.
    pub fn from_flags(current_only: bool, predicted_only: bool) -> Self {
        match (current_only, predicted_only) {
            (true, _) => BlendOverride::CurrentOnly,
            (false, true) => BlendOverride::PredictedOnly,
            (false, false) => BlendOverride::None,
        }
    }
}

/// Repeating timer driving prediction cycles and the crossfade.
#[derive(Copy, Clone, Debug)]
pub struct TeleportCycle {
    pub timer: Scalar,
    pub interval: Scalar,
    /// Completed prediction cycles this session.
    pub cycles: u64,
}

impl TeleportCycle {
    pub fn new(interval: Scalar) -> Self { Self { timer: 0.0, interval, cycles: 0 } }

    /// Motion (re)started; the next check triggers a first cycle.
    #[inline] pub fn restart(&mut self) { self.timer = 0.0; }
    #[inline] pub fn is_first(&self) -> bool { self.timer == 0.0 }
    #[inline] pub fn due(&self) -> bool { self.timer > self.interval || self.timer == 0.0 }

    /// Close a cycle: wrap overshoot back into the interval.
    pub fn wrap(&mut self) {
        self.timer = repeat(self.timer, self.interval);
        self.cycles += 1;
    }

    #[inline]
    pub fn tick(&mut self, dt: Scalar, paused: bool) {
        if !paused { self.timer += dt; }
    }

    pub fn blend(&self, pin: BlendOverride) -> Scalar {
        match pin {
            BlendOverride::CurrentOnly => 0.0,
            BlendOverride::PredictedOnly => 1.0,
            BlendOverride::None => (self.timer / self.interval).clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test] fn repeat_wraps_overshoot() {
        assert!((repeat(1.25, 1.0) - 0.25).abs() < 1e-6);
        assert_eq!(repeat(0.0, 1.0), 0.0);
        assert!((repeat(2.5, 1.0) - 0.5).abs() < 1e-6);
    }

    #[test] fn due_at_zero_and_past_interval_only() {
        let mut c = TeleportCycle::new(1.0);
        assert!(c.due() && c.is_first());
        c.tick(0.5, false);
        assert!(!c.due());
        c.tick(0.5, false);
        assert!(!c.due(), "exactly at the boundary waits a frame");
        c.tick(0.1, false);
        assert!(c.due());
        c.wrap();
        assert!((c.timer - 0.1).abs() < 1e-5);
        assert_eq!(c.cycles, 1);
    }

    #[test] fn pause_freezes_timer() {
        let mut c = TeleportCycle::new(1.0);
        c.tick(0.3, false);
        c.tick(0.3, true);
        assert!((c.timer - 0.3).abs() < 1e-6);
    }

    #[test] fn overrides_pin_blend() {
        let mut c = TeleportCycle::new(1.0);
        c.tick(0.4, false);
        assert_eq!(c.blend(BlendOverride::from_flags(true, true)), 0.0);
        assert_eq!(c.blend(BlendOverride::from_flags(false, true)), 1.0);
        assert!((c.blend(BlendOverride::None) - 0.4).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn blend_is_clamped_ratio(interval in 0.05f32..5.0, dts in proptest::collection::vec(0.0f32..0.2, 1..200)) {
            let mut c = TeleportCycle::new(interval);
            for dt in dts {
                if c.due() { c.wrap(); }
                prop_assert!(c.timer <= c.interval);
                c.tick(dt, false);
                let b = c.blend(BlendOverride::None);
                prop_assert!((0.0..=1.0).contains(&b));
                prop_assert_eq!(b, (c.timer / interval).clamp(0.0, 1.0));
            }
        }
    }
}
