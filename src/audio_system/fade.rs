//! Volume fades
//!
//! A fade is a linear ramp of logical (pre-category) volume, advanced by the
//! scheduler tick.
use std::time::Duration;

/// Clamp a volume to 0.0-1.0; NaN and infinities become silence
pub fn unit_volume(volume: f32) -> f32 {
    if volume.is_finite() {
        volume.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Fade configuration carried by a play request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeFade {
    /// Volume at admission (0.0-1.0)
    pub initial: f32,

    /// Volume reached after `duration` (0.0-1.0)
    pub target: f32,

    /// Ramp length; zero means set `target` immediately
    pub duration: Duration,
}

impl VolumeFade {
    /// Create a new fade, clamping both ends to 0.0-1.0
    pub fn new(initial: f32, target: f32, duration: Duration) -> Self {
        Self {
            initial: unit_volume(initial),
            target: unit_volume(target),
            duration,
        }
    }

    /// Fixed volume with no ramp
    pub fn constant(volume: f32) -> Self {
        Self::new(volume, volume, Duration::ZERO)
    }

    /// Ramp from silence to `target`
    pub fn fade_in(target: f32, duration: Duration) -> Self {
        Self::new(0.0, target, duration)
    }

    pub fn is_instant(&self) -> bool {
        self.duration.is_zero()
    }

    /// Volume the channel starts at
    pub fn starting_volume(&self) -> f32 {
        if self.is_instant() {
            self.target
        } else {
            self.initial
        }
    }

    /// Linear interpolation at `elapsed`, clamped to the ramp
    pub fn sample(&self, elapsed: Duration) -> f32 {
        if self.is_instant() {
            return self.target;
        }
        let t = (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0);
        self.initial + (self.target - self.initial) * t
    }
}

impl Default for VolumeFade {
    fn default() -> Self {
        Self {
            initial: 0.0,
            target: 1.0,
            duration: Duration::ZERO,
        }
    }
}

/// What happens when a fade completes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeEnd {
    /// Keep playing at the target volume
    Hold,

    /// Stop the channel and release it
    Stop,
}

/// Running fade state machine
#[derive(Debug, Clone)]
pub struct FadeTask {
    fade: VolumeFade,
    elapsed: Duration,
    end: FadeEnd,
}

impl FadeTask {
    pub fn new(fade: VolumeFade, end: FadeEnd) -> Self {
        Self {
            fade,
            elapsed: Duration::ZERO,
            end,
        }
    }

    pub fn fade(&self) -> &VolumeFade {
        &self.fade
    }

    pub fn end(&self) -> FadeEnd {
        self.end
    }

    /// Advance by `delta` and return the new raw volume plus whether the
    /// ramp is complete. The completing sample is exactly `target`.
    pub fn advance(&mut self, delta: Duration) -> (f32, bool) {
        self.elapsed = self.elapsed.saturating_add(delta);
        if self.elapsed >= self.fade.duration {
            (self.fade.target, true)
        } else {
            (self.fade.sample(self.elapsed), false)
        }
    }
}
