// SPDX-License-Identifier: MIT OR Apache-2.0
//! Easing functions used to reparameterize keyframe progress.
//!
//! Every function maps `[0, 1]` onto roughly `[0, 1]` with `f(0) = 0` and
//! `f(1) = 1`. The keyframe evaluator picks one through [`Easing::apply`].

use serde::{Deserialize, Serialize};

/// Easing curve attached to a keyframe
///
/// Persisted as its camelCase name. Unknown names load as [`Easing::Linear`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Easing {
    /// No reparameterization
    #[default]
    Linear,
    /// Quadratic acceleration
    EaseIn,
    /// Quadratic deceleration
    EaseOut,
    /// Accelerate then decelerate
    EaseInOut,
    /// Cubic curve driven by the keyframe's control points
    Bezier,
}

impl Easing {
    /// All easing kinds, in picker order
    pub const ALL: [Easing; 5] = [
        Easing::Linear,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
        Easing::Bezier,
    ];

    /// Persisted name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::EaseIn => "easeIn",
            Self::EaseOut => "easeOut",
            Self::EaseInOut => "easeInOut",
            Self::Bezier => "bezier",
        }
    }

    /// Parse a persisted name, falling back to linear for anything unknown
    pub fn from_name(name: &str) -> Self {
        match name {
            "easeIn" => Self::EaseIn,
            "easeOut" => Self::EaseOut,
            "easeInOut" => Self::EaseInOut,
            "bezier" => Self::Bezier,
            _ => Self::Linear,
        }
    }

    /// Apply this easing to `t`.
    ///
    /// `Bezier` needs `control_points`; without them it behaves as linear.
    pub fn apply(&self, t: f64, control_points: Option<[f64; 4]>) -> f64 {
        match self {
            Self::Linear => linear(t),
            Self::EaseIn => ease_in(t),
            Self::EaseOut => ease_out(t),
            Self::EaseInOut => ease_in_out(t),
            Self::Bezier => match control_points {
                Some([p1, p2, p3, p4]) => bezier(p1, p2, p3, p4)(t),
                None => linear(t),
            },
        }
    }
}

impl From<String> for Easing {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<Easing> for String {
    fn from(easing: Easing) -> Self {
        easing.name().to_string()
    }
}

/// `f(t) = t`
pub fn linear(t: f64) -> f64 {
    t
}

/// `f(t) = t²`
pub fn ease_in(t: f64) -> f64 {
    t * t
}

/// `f(t) = t(2 - t)`
pub fn ease_out(t: f64) -> f64 {
    t * (2.0 - t)
}

/// Quadratic in for the first half, quadratic out for the second
pub fn ease_in_out(t: f64) -> f64 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        -1.0 + (4.0 - 2.0 * t) * t
    }
}

/// Single-axis cubic easing with fixed endpoints 0 and 1.
///
/// Only `p1` and `p3` shape the curve; `p2` and `p4` are accepted so the
/// four persisted control points can be passed straight through.
pub fn bezier(p1: f64, _p2: f64, p3: f64, _p4: f64) -> impl Fn(f64) -> f64 {
    move |t| {
        let mt = 1.0 - t;
        // Start point is 0, so its mt³ term drops out; end point is 1
        3.0 * mt * mt * t * p1 + 3.0 * mt * t * t * p3 + t * t * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ease_in_boundaries() {
        assert_eq!(ease_in(0.0), 0.0);
        assert_eq!(ease_in(1.0), 1.0);
        assert_eq!(ease_in(0.5), 0.25);
    }

    #[test]
    fn test_ease_out_boundaries() {
        assert_eq!(ease_out(0.0), 0.0);
        assert_eq!(ease_out(1.0), 1.0);
        assert_eq!(ease_out(0.5), 0.75);
    }

    #[test]
    fn test_ease_in_out_shape() {
        assert_eq!(ease_in_out(0.0), 0.0);
        assert_eq!(ease_in_out(1.0), 1.0);
        assert!(ease_in_out(0.25) < 0.25);
        assert!(ease_in_out(0.75) > 0.75);
        // Both halves meet at 0.5
        assert!((ease_in_out(0.5) - 0.5).abs() < 1e-12);
        assert!((ease_in_out(0.5 - 1e-9) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_bezier_uses_p1_and_p3_only() {
        let a = bezier(0.25, 0.1, 0.75, 0.9);
        let b = bezier(0.25, 100.0, 0.75, -100.0);
        for i in 0..=10 {
            let t = f64::from(i) / 10.0;
            assert_eq!(a(t), b(t));
        }
        assert_eq!(a(0.0), 0.0);
        assert_eq!(a(1.0), 1.0);
        // 3 * 0.25 * 0.25 * 0.5 + 3 * 0.5 * 0.25 * 0.75 + 0.125
        assert!((a(0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_bezier_without_control_points_is_linear() {
        assert_eq!(Easing::Bezier.apply(0.3, None), 0.3);
        let eased = Easing::Bezier.apply(0.5, Some([0.0, 0.0, 1.0, 1.0]));
        assert!((eased - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_names_round_trip() {
        for easing in Easing::ALL {
            assert_eq!(Easing::from_name(easing.name()), easing);
        }
        assert_eq!(Easing::from_name("springy"), Easing::Linear);
    }

    #[test]
    fn test_unknown_easing_deserializes_as_linear() {
        let easing: Easing = serde_json::from_str("\"cubicWobble\"").unwrap();
        assert_eq!(easing, Easing::Linear);
        let json = serde_json::to_string(&Easing::EaseInOut).unwrap();
        assert_eq!(json, "\"easeInOut\"");
    }
}
