/// Easing applied to linear animation progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AnimationCurve {
    Linear,
    /// Fast start, slow end.
    #[default]
    SlowDown,
    /// Slow start, fast end.
    SpeedUp,
    /// Smoothstep.
    Bezier,
    /// Gentle ease in and out.
    Smooth,
}

impl AnimationCurve {
    /// Map progress in `0.0..=1.0`. Both ends are fixed points.
    pub fn apply(self, t: f32) -> f32 {
        match self {
            AnimationCurve::Linear => t,
            AnimationCurve::SlowDown => 1.0 - (1.0 - t) * (1.0 - t) * (1.0 - t),
            AnimationCurve::SpeedUp => t * t * t,
            AnimationCurve::Bezier => t * t * (3.0 - 2.0 * t),
            AnimationCurve::Smooth => {
                const A: f32 = 0.6;
                A * t / (2.0 * A * t - A - t + 1.0)
            }
        }
    }

    pub fn parse(s: &str) -> Option<AnimationCurve> {
        match s {
            "linear" => Some(AnimationCurve::Linear),
            "slow-down" => Some(AnimationCurve::SlowDown),
            "speed-up" => Some(AnimationCurve::SpeedUp),
            "bezier" => Some(AnimationCurve::Bezier),
            "smooth" => Some(AnimationCurve::Smooth),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [AnimationCurve; 5] = [
        AnimationCurve::Linear,
        AnimationCurve::SlowDown,
        AnimationCurve::SpeedUp,
        AnimationCurve::Bezier,
        AnimationCurve::Smooth,
    ];

    #[test]
    fn test_curves_fix_endpoints() {
        for curve in ALL {
            assert!(curve.apply(0.0).abs() < 1e-6, "{curve:?} at 0");
            assert!((curve.apply(1.0) - 1.0).abs() < 1e-6, "{curve:?} at 1");
        }
    }

    #[test]
    fn test_curve_shapes() {
        assert!(AnimationCurve::SlowDown.apply(0.5) > 0.5);
        assert!(AnimationCurve::SpeedUp.apply(0.5) < 0.5);
        assert!((AnimationCurve::Bezier.apply(0.5) - 0.5).abs() < 1e-6);
        assert!((AnimationCurve::Smooth.apply(0.5) - 0.6).abs() < 1e-6);
        assert_eq!(AnimationCurve::SpeedUp.apply(0.5), 0.125);
    }

    #[test]
    fn test_parse() {
        assert_eq!(AnimationCurve::parse("speed-up"), Some(AnimationCurve::SpeedUp));
        assert_eq!(AnimationCurve::parse("wobbly"), None);
    }
}
