// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe definitions, evaluation and copy-on-write editing.
//!
//! Keyframe slices handed to this module may be in any order. Evaluation
//! sorts a borrowed view on every call; editing helpers always return a new,
//! time-sorted `Vec` and leave the input untouched so the editing layer can
//! keep the previous version for undo.

use crate::easing::Easing;
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;

/// Value stored in a keyframe
///
/// Serialized untagged so persisted data reads as a plain number, string or
/// boolean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyframeValue {
    /// Numeric value, interpolated between keyframes
    Number(f64),
    /// Boolean, held until the next keyframe
    Bool(bool),
    /// Text, held until the next keyframe
    Text(String),
}

impl KeyframeValue {
    /// Get as number if possible
    pub fn as_number(&self) -> Option<f64> {
        match self {
            KeyframeValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as text if possible
    pub fn as_text(&self) -> Option<&str> {
        match self {
            KeyframeValue::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Get as bool if possible
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            KeyframeValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Whether the value takes part in numeric interpolation
    pub fn is_numeric(&self) -> bool {
        matches!(self, KeyframeValue::Number(_))
    }
}

impl Default for KeyframeValue {
    fn default() -> Self {
        KeyframeValue::Number(0.0)
    }
}

impl From<f64> for KeyframeValue {
    fn from(value: f64) -> Self {
        KeyframeValue::Number(value)
    }
}

impl From<bool> for KeyframeValue {
    fn from(value: bool) -> Self {
        KeyframeValue::Bool(value)
    }
}

impl From<&str> for KeyframeValue {
    fn from(value: &str) -> Self {
        KeyframeValue::Text(value.to_string())
    }
}

impl From<String> for KeyframeValue {
    fn from(value: String) -> Self {
        KeyframeValue::Text(value)
    }
}

/// A keyframe on an animated property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keyframe {
    /// Time in seconds
    pub time: f64,
    /// Value at this keyframe
    pub value: KeyframeValue,
    /// Easing applied on the way to the next keyframe
    #[serde(default)]
    pub easing: Easing,
    /// Control points for [`Easing::Bezier`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bezier_control_points: Option<[f64; 4]>,
}

impl Keyframe {
    /// Create a new keyframe with linear easing
    pub fn new(time: f64, value: impl Into<KeyframeValue>) -> Self {
        Self {
            time,
            value: value.into(),
            easing: Easing::Linear,
            bezier_control_points: None,
        }
    }

    /// Set easing
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Use bezier easing with the given control points
    pub fn with_bezier(mut self, control_points: [f64; 4]) -> Self {
        self.easing = Easing::Bezier;
        self.bezier_control_points = Some(control_points);
        self
    }

    /// Eased progress towards the next keyframe
    pub fn ease(&self, progress: f64) -> f64 {
        self.easing.apply(progress, self.bezier_control_points)
    }
}

/// Partial keyframe update, merged field by field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyframePatch {
    /// New time
    pub time: Option<f64>,
    /// New value
    pub value: Option<KeyframeValue>,
    /// New easing
    pub easing: Option<Easing>,
    /// New control points; `Some(None)` clears them
    ///
    /// An absent field leaves the points alone and an explicit `null`
    /// clears them.
    #[serde(
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub bezier_control_points: Option<Option<[f64; 4]>>,
}

// Only called when the field is present, so a `null` here means "clear".
fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<[f64; 4]>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::deserialize(deserializer).map(Some)
}

impl KeyframePatch {
    /// Patch that only replaces the value
    pub fn value(value: impl Into<KeyframeValue>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// Patch that only replaces the easing
    pub fn easing(easing: Easing) -> Self {
        Self {
            easing: Some(easing),
            ..Self::default()
        }
    }

    fn apply_to(&self, keyframe: &mut Keyframe) {
        if let Some(time) = self.time {
            keyframe.time = time;
        }
        if let Some(value) = &self.value {
            keyframe.value = value.clone();
        }
        if let Some(easing) = self.easing {
            keyframe.easing = easing;
        }
        if let Some(points) = self.bezier_control_points {
            keyframe.bezier_control_points = points;
        }
    }
}

/// Interpolation utilities
pub struct Interpolation;

impl Interpolation {
    /// Linear interpolation between two floats
    pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
        a + (b - a) * t
    }

    /// Cubic bezier interpolation
    pub fn bezier(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
        let t2 = t * t;
        let t3 = t2 * t;
        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let mt3 = mt2 * mt;

        p0 * mt3 + 3.0 * p1 * mt2 * t + 3.0 * p2 * mt * t2 + p3 * t3
    }

    /// First derivative of [`Interpolation::bezier`] with respect to `t`
    pub fn bezier_derivative(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
        let mt = 1.0 - t;
        3.0 * mt * mt * (p1 - p0) + 6.0 * mt * t * (p2 - p1) + 3.0 * t * t * (p3 - p2)
    }

    /// Normalized position of `time` between `start` and `end`.
    ///
    /// Zero-length or inverted spans yield 0.
    pub fn progress(start: f64, end: f64, time: f64) -> f64 {
        let duration = end - start;
        if duration <= 0.0 {
            0.0
        } else {
            (time - start) / duration
        }
    }
}

pub(crate) fn by_time(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

/// Borrowed view of `keyframes` in ascending time order.
///
/// Stable, so keyframes sharing a time keep their input order.
pub fn sorted_by_time(keyframes: &[Keyframe]) -> Vec<&Keyframe> {
    let mut sorted: Vec<&Keyframe> = keyframes.iter().collect();
    sorted.sort_by(|a, b| by_time(a.time, b.time));
    sorted
}

fn sort_keyframes(keyframes: &mut [Keyframe]) {
    keyframes.sort_by(|a, b| by_time(a.time, b.time));
}

/// Evaluate a property at `time`.
///
/// Returns `Number(0.0)` for an empty slice; use [`evaluate_number`] when
/// "no animation" must be told apart from a zero value. Times outside the
/// keyframe range hold the first or last value. Numeric pairs interpolate
/// through the earlier keyframe's easing; any other pair steps.
pub fn evaluate(keyframes: &[Keyframe], time: f64) -> KeyframeValue {
    let sorted = sorted_by_time(keyframes);

    let (Some(first), Some(last)) = (sorted.first(), sorted.last()) else {
        return KeyframeValue::default();
    };

    if time <= first.time {
        return first.value.clone();
    }
    if time >= last.time {
        return last.value.clone();
    }

    let bracket = sorted
        .windows(2)
        .map(|pair| (pair[0], pair[1]))
        .find(|(current, next)| current.time <= time && time <= next.time);

    match bracket {
        Some((current, next)) => interpolate(current, next, time),
        // Only reachable with NaN times in the input
        None => last.value.clone(),
    }
}

/// Evaluate a numeric property at `time`.
///
/// `None` when there are no keyframes or the sampled value is not a number.
pub fn evaluate_number(keyframes: &[Keyframe], time: f64) -> Option<f64> {
    if keyframes.is_empty() {
        return None;
    }
    evaluate(keyframes, time).as_number()
}

fn interpolate(current: &Keyframe, next: &Keyframe, time: f64) -> KeyframeValue {
    match (&current.value, &next.value) {
        (KeyframeValue::Number(a), KeyframeValue::Number(b)) => {
            let progress = Interpolation::progress(current.time, next.time, time);
            let eased = current.ease(progress);
            KeyframeValue::Number(Interpolation::lerp(*a, *b, eased))
        }
        _ => {
            if time >= next.time {
                next.value.clone()
            } else {
                current.value.clone()
            }
        }
    }
}

/// Create a keyframe
pub fn create_keyframe(time: f64, value: impl Into<KeyframeValue>, easing: Easing) -> Keyframe {
    Keyframe::new(time, value).with_easing(easing)
}

/// Insert `keyframe`, replacing any keyframe at exactly the same time.
pub fn add_keyframe(keyframes: &[Keyframe], keyframe: Keyframe) -> Vec<Keyframe> {
    let mut result: Vec<Keyframe> = keyframes
        .iter()
        .filter(|k| k.time != keyframe.time)
        .cloned()
        .collect();
    result.push(keyframe);
    sort_keyframes(&mut result);
    result
}

/// Remove every keyframe at exactly `time`.
pub fn remove_keyframe(keyframes: &[Keyframe], time: f64) -> Vec<Keyframe> {
    keyframes.iter().filter(|k| k.time != time).cloned().collect()
}

/// Merge `patch` into every keyframe at exactly `time`.
pub fn update_keyframe(keyframes: &[Keyframe], time: f64, patch: &KeyframePatch) -> Vec<Keyframe> {
    let mut result: Vec<Keyframe> = keyframes
        .iter()
        .map(|k| {
            let mut k = k.clone();
            if k.time == time {
                patch.apply_to(&mut k);
            }
            k
        })
        .collect();
    sort_keyframes(&mut result);
    result
}

/// Get keyframe within `threshold` seconds of `time`
pub fn keyframe_at(keyframes: &[Keyframe], time: f64, threshold: f64) -> Option<&Keyframe> {
    keyframes.iter().find(|k| (k.time - time).abs() < threshold)
}

/// Get keyframes in a time range, inclusive, in time order
pub fn keyframes_in_range(keyframes: &[Keyframe], start: f64, end: f64) -> Vec<&Keyframe> {
    sorted_by_time(keyframes)
        .into_iter()
        .filter(|k| k.time >= start && k.time <= end)
        .collect()
}

/// Move the keyframe at exactly `from` to `to`.
///
/// A keyframe already sitting at `to` is replaced. Returns an unchanged copy
/// when nothing sits at `from`.
pub fn move_keyframe(keyframes: &[Keyframe], from: f64, to: f64) -> Vec<Keyframe> {
    let Some(source) = keyframes.iter().find(|k| k.time == from) else {
        return keyframes.to_vec();
    };

    let mut moved = source.clone();
    moved.time = to;
    add_keyframe(&remove_keyframe(keyframes, from), moved)
}

/// Shift every keyframe by `delta` seconds, clamping at zero
pub fn offset_keyframes(keyframes: &[Keyframe], delta: f64) -> Vec<Keyframe> {
    let mut result: Vec<Keyframe> = keyframes
        .iter()
        .map(|k| Keyframe {
            time: (k.time + delta).max(0.0),
            ..k.clone()
        })
        .collect();
    sort_keyframes(&mut result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Vec<Keyframe> {
        vec![Keyframe::new(0.0, 0.0), Keyframe::new(2.0, 100.0)]
    }

    #[test]
    fn test_empty_evaluates_to_zero() {
        assert_eq!(evaluate(&[], 1.0), KeyframeValue::Number(0.0));
        assert_eq!(evaluate_number(&[], 1.0), None);
    }

    #[test]
    fn test_clamped_hold_outside_range() {
        let keyframes = vec![Keyframe::new(1.0, 10.0), Keyframe::new(3.0, 30.0)];
        assert_eq!(evaluate(&keyframes, -5.0), KeyframeValue::Number(10.0));
        assert_eq!(evaluate(&keyframes, 1.0), KeyframeValue::Number(10.0));
        assert_eq!(evaluate(&keyframes, 3.0), KeyframeValue::Number(30.0));
        assert_eq!(evaluate(&keyframes, 99.0), KeyframeValue::Number(30.0));
    }

    #[test]
    fn test_linear_interpolation() {
        assert_eq!(evaluate_number(&ramp(), 1.0), Some(50.0));
        assert_eq!(evaluate_number(&ramp(), 0.5), Some(25.0));
    }

    #[test]
    fn test_unsorted_input_is_sorted_on_read() {
        let keyframes = vec![Keyframe::new(2.0, 100.0), Keyframe::new(0.0, 0.0)];
        assert_eq!(evaluate_number(&keyframes, 1.0), Some(50.0));
        // Input is left as given
        assert_eq!(keyframes[0].time, 2.0);
    }

    #[test]
    fn test_linear_segment_is_monotonic() {
        let keyframes = ramp();
        let mut previous = f64::MIN;
        for i in 0..=200 {
            let t = f64::from(i) / 100.0;
            let value = evaluate_number(&keyframes, t).unwrap();
            assert!(value >= previous);
            previous = value;
        }
    }

    #[test]
    fn test_easing_comes_from_earlier_keyframe() {
        let keyframes = vec![
            Keyframe::new(0.0, 0.0).with_easing(Easing::EaseIn),
            Keyframe::new(1.0, 100.0).with_easing(Easing::EaseOut),
        ];
        assert_eq!(evaluate_number(&keyframes, 0.5), Some(25.0));
    }

    #[test]
    fn test_bezier_easing_interpolation() {
        let keyframes = vec![
            Keyframe::new(0.0, 0.0).with_bezier([0.25, 0.1, 0.75, 0.9]),
            Keyframe::new(1.0, 10.0),
        ];
        let value = evaluate_number(&keyframes, 0.5).unwrap();
        assert!((value - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_step_interpolation_for_text() {
        let keyframes = vec![Keyframe::new(0.0, "red"), Keyframe::new(2.0, "blue")];
        assert_eq!(evaluate(&keyframes, 1.0), KeyframeValue::from("red"));
        assert_eq!(evaluate(&keyframes, 1.999), KeyframeValue::from("red"));
        assert_eq!(evaluate(&keyframes, 2.0), KeyframeValue::from("blue"));
    }

    #[test]
    fn test_step_interpolation_for_mixed_values() {
        let keyframes = vec![
            Keyframe::new(0.0, 1.0),
            Keyframe::new(1.0, true),
            Keyframe::new(2.0, 5.0),
        ];
        assert_eq!(evaluate(&keyframes, 0.5), KeyframeValue::Number(1.0));
        assert_eq!(evaluate(&keyframes, 1.0), KeyframeValue::Bool(true));
        assert_eq!(evaluate(&keyframes, 1.5), KeyframeValue::Bool(true));
        assert_eq!(evaluate_number(&keyframes, 1.5), None);
    }

    #[test]
    fn test_duplicate_times_use_first_match() {
        let keyframes = vec![
            Keyframe::new(0.0, 0.0),
            Keyframe::new(1.0, 10.0),
            Keyframe::new(1.0, 20.0),
            Keyframe::new(2.0, 40.0),
        ];
        // First bracketing pair is (0, 1) with value 10 at t=1
        assert_eq!(evaluate_number(&keyframes, 1.0), Some(10.0));
        assert_eq!(evaluate_number(&keyframes, 1.5), Some(30.0));
    }

    #[test]
    fn test_evaluation_is_pure() {
        let keyframes = ramp();
        let a = evaluate(&keyframes, 0.7);
        let b = evaluate(&keyframes, 0.7);
        assert_eq!(a, b);
        assert_eq!(keyframes, ramp());
    }

    #[test]
    fn test_add_keyframe_replaces_by_time() {
        let keyframes = ramp();
        let updated = add_keyframe(&keyframes, Keyframe::new(2.0, 50.0));
        assert_eq!(updated.len(), 2);
        assert_eq!(evaluate_number(&updated, 2.0), Some(50.0));
        // Input left as given
        assert_eq!(evaluate_number(&keyframes, 2.0), Some(100.0));
    }

    #[test]
    fn test_add_keyframe_keeps_sorted() {
        let keyframes = ramp();
        let updated = add_keyframe(&keyframes, Keyframe::new(1.0, 10.0));
        let times: Vec<f64> = updated.iter().map(|k| k.time).collect();
        assert_eq!(times, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_remove_keyframe() {
        let keyframes = ramp();
        let removed = remove_keyframe(&keyframes, 2.0);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].time, 0.0);

        let untouched = remove_keyframe(&keyframes, 5.0);
        assert_eq!(untouched, keyframes);
    }

    #[test]
    fn test_update_keyframe_merges_patch() {
        let keyframes = ramp();
        let updated = update_keyframe(&keyframes, 0.0, &KeyframePatch::easing(Easing::EaseInOut));
        assert_eq!(updated[0].easing, Easing::EaseInOut);
        assert_eq!(updated[0].value, KeyframeValue::Number(0.0));
        assert_eq!(updated[1], keyframes[1]);

        let revalued = update_keyframe(&keyframes, 2.0, &KeyframePatch::value(7.0));
        assert_eq!(revalued[1].value, KeyframeValue::Number(7.0));
    }

    #[test]
    fn test_update_keyframe_clears_control_points() {
        let keyframes = vec![Keyframe::new(0.0, 0.0).with_bezier([0.1, 0.2, 0.3, 0.4])];
        let patch = KeyframePatch {
            bezier_control_points: Some(None),
            ..KeyframePatch::default()
        };
        let updated = update_keyframe(&keyframes, 0.0, &patch);
        assert_eq!(updated[0].bezier_control_points, None);
        assert_eq!(updated[0].easing, Easing::Bezier);
    }

    #[test]
    fn test_patch_deserialization() {
        let clear: KeyframePatch = serde_json::from_str(r#"{"bezierControlPoints":null}"#).unwrap();
        assert_eq!(clear.bezier_control_points, Some(None));

        let untouched: KeyframePatch = serde_json::from_str(r#"{"time":2}"#).unwrap();
        assert_eq!(untouched.time, Some(2.0));
        assert_eq!(untouched.bezier_control_points, None);

        let set: KeyframePatch =
            serde_json::from_str(r#"{"bezierControlPoints":[0.1,0.2,0.3,0.4]}"#).unwrap();
        assert_eq!(set.bezier_control_points, Some(Some([0.1, 0.2, 0.3, 0.4])));

        // A clearing patch survives a save and reload
        let json = serde_json::to_string(&clear).unwrap();
        let reloaded: KeyframePatch = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, clear);
        let json = serde_json::to_string(&untouched).unwrap();
        assert!(!json.contains("bezierControlPoints"));

        let keyframes = vec![Keyframe::new(0.0, 0.0).with_bezier([0.1, 0.2, 0.3, 0.4])];
        let updated = update_keyframe(&keyframes, 0.0, &clear);
        assert_eq!(updated[0].bezier_control_points, None);
    }

    #[test]
    fn test_move_and_offset() {
        let keyframes = ramp();
        let moved = move_keyframe(&keyframes, 2.0, 0.0);
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].value, KeyframeValue::Number(100.0));

        let shifted = offset_keyframes(&keyframes, -1.0);
        let times: Vec<f64> = shifted.iter().map(|k| k.time).collect();
        assert_eq!(times, vec![0.0, 1.0]);
    }

    #[test]
    fn test_range_queries() {
        let keyframes = vec![
            Keyframe::new(3.0, 3.0),
            Keyframe::new(1.0, 1.0),
            Keyframe::new(2.0, 2.0),
        ];
        let in_range: Vec<f64> = keyframes_in_range(&keyframes, 1.0, 2.0)
            .iter()
            .map(|k| k.time)
            .collect();
        assert_eq!(in_range, vec![1.0, 2.0]);
        assert!(keyframe_at(&keyframes, 2.0005, 0.001).is_some());
        assert!(keyframe_at(&keyframes, 2.5, 0.001).is_none());
    }

    #[test]
    fn test_keyframe_serialization() {
        let keyframe = create_keyframe(1.5, "red", Easing::EaseOut);
        let json = serde_json::to_string(&keyframe).unwrap();
        assert_eq!(json, r#"{"time":1.5,"value":"red","easing":"easeOut"}"#);

        let loaded: Keyframe =
            serde_json::from_str(r#"{"time":1,"value":2,"bezierControlPoints":[0.1,0.2,0.3,0.4]}"#)
                .unwrap();
        assert_eq!(loaded.value, KeyframeValue::Number(2.0));
        assert_eq!(loaded.easing, Easing::Linear);
        assert_eq!(loaded.bezier_control_points, Some([0.1, 0.2, 0.3, 0.4]));
    }

    #[test]
    fn test_keyframe_ron_round_trip() {
        let keyframes = vec![
            Keyframe::new(0.0, true),
            Keyframe::new(1.0, 4.5).with_bezier([0.1, 0.2, 0.3, 0.4]),
        ];
        let ron_str = ron::ser::to_string_pretty(&keyframes, ron::ser::PrettyConfig::default()).unwrap();
        let loaded: Vec<Keyframe> = ron::from_str(&ron_str).unwrap();
        assert_eq!(loaded, keyframes);
    }
}
