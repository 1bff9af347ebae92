// SPDX-License-Identifier: MIT OR Apache-2.0
//! Animation evaluation core for MotionKit timelines.
//!
//! This crate turns timeline data into per-frame values:
//! - Easing curves
//! - Keyframe interpolation with step fallback for non-numeric values
//! - Motion paths mixing linear and cubic bezier segments, with auto-orient
//! - Parent→child layer transform composition
//! - Copy-on-write keyframe editing
//!
//! ## Architecture
//!
//! Everything here is a pure function of its inputs. Evaluators never fail on
//! sparse or odd data; they fall back to neutral values (zero, the nearest
//! keyframe, or the layer's own transform). The only error on the sampling
//! path is a cyclic parent hierarchy.
//!
//! [`document`] ties the pieces together: an [`AnimationDocument`] holds
//! layers and samples all of them into world transforms for a frame.

pub mod easing;
pub mod keyframe;
pub mod motion_path;
pub mod transform;
pub mod document;

pub use easing::Easing;
pub use keyframe::{
    add_keyframe, create_keyframe, remove_keyframe, update_keyframe, Interpolation, Keyframe,
    KeyframePatch, KeyframeValue,
};
pub use motion_path::{MotionPath, MotionPathPoint, PathHandle, PathSample};
pub use transform::{
    compute_world_transform, CompositionError, LayerId, LayerParent, TransformProperties,
    WorldTransformCache,
};
pub use document::{
    AnimatableProperty, AnimationDocument, DocumentError, FrameSample, Layer, LayerSample,
};
