//! Sinusoidal parameter animation.

/// Oscillates between `min` and `max` as `sin(t · speed + phase)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationCurve {
    pub min: f32,
    pub max: f32,
    pub speed: f32,
    pub phase: f32,
}

impl Default for AnimationCurve {
    fn default() -> Self {
        Self {
            min: -1.0,
            max: 1.0,
            speed: 1.0,
            phase: 0.0,
        }
    }
}

impl AnimationCurve {
    pub fn new(min: f32, max: f32, speed: f32, phase: f32) -> Self {
        Self {
            min,
            max,
            speed,
            phase,
        }
    }

    pub fn sample(&self, t: f32) -> f32 {
        let half_range = (self.max - self.min) * 0.5;
        t.mul_add(self.speed, self.phase)
            .sin()
            .mul_add(half_range, self.min + half_range)
    }
}
