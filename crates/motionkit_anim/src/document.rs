// SPDX-License-Identifier: MIT OR Apache-2.0
//! Layer documents and per-frame sampling.
//!
//! An [`AnimationDocument`] owns an ordered set of [`Layer`]s. Sampling a
//! document at a time evaluates every layer's animated properties and motion
//! path into a local transform, then composes local transforms through the
//! parent hierarchy into world transforms for the compositor.

use crate::keyframe::{self, Keyframe};
use crate::motion_path::MotionPath;
use crate::transform::{
    compute_world_transform, CompositionError, LayerId, LayerParent, TransformProperties,
    WorldTransformCache,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fraction of a frame treated as rounding error in time-to-frame conversion
const FRAME_EPSILON: f64 = 1e-6;

/// Transform field that can carry keyframes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnimatableProperty {
    /// Horizontal position
    X,
    /// Vertical position
    Y,
    /// Horizontal scale
    ScaleX,
    /// Vertical scale
    ScaleY,
    /// Rotation in degrees
    Rotation,
    /// Opacity
    Opacity,
}

impl AnimatableProperty {
    /// All animatable properties
    pub const ALL: [AnimatableProperty; 6] = [
        Self::X,
        Self::Y,
        Self::ScaleX,
        Self::ScaleY,
        Self::Rotation,
        Self::Opacity,
    ];

    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::X => "Position X",
            Self::Y => "Position Y",
            Self::ScaleX => "Scale X",
            Self::ScaleY => "Scale Y",
            Self::Rotation => "Rotation",
            Self::Opacity => "Opacity",
        }
    }

    /// Read this property from a transform
    pub fn get(&self, transform: &TransformProperties) -> f64 {
        match self {
            Self::X => transform.x,
            Self::Y => transform.y,
            Self::ScaleX => transform.scale_x,
            Self::ScaleY => transform.scale_y,
            Self::Rotation => transform.rotation,
            Self::Opacity => transform.opacity,
        }
    }

    /// Write this property into a transform
    pub fn set(&self, transform: &mut TransformProperties, value: f64) {
        match self {
            Self::X => transform.x = value,
            Self::Y => transform.y = value,
            Self::ScaleX => transform.scale_x = value,
            Self::ScaleY => transform.scale_y = value,
            Self::Rotation => transform.rotation = value,
            Self::Opacity => transform.opacity = value,
        }
    }
}

fn default_visible() -> bool {
    true
}

/// A layer on the timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    /// Unique layer ID
    pub id: LayerId,
    /// Layer name
    pub name: String,
    /// Static transform, used for any property without keyframes
    #[serde(default)]
    pub transform: TransformProperties,
    /// Keyframes per animated property
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub keyframes: IndexMap<AnimatableProperty, Vec<Keyframe>>,
    /// Motion path driving position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motion_path: Option<MotionPath>,
    /// Parent layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<LayerId>,
    /// Whether the layer is composited
    #[serde(default = "default_visible")]
    pub visible: bool,
}

impl Layer {
    /// Create a new layer with an identity transform
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: LayerId::new(),
            name: name.into(),
            transform: TransformProperties::IDENTITY,
            keyframes: IndexMap::new(),
            motion_path: None,
            parent_id: None,
            visible: true,
        }
    }

    /// Set the static transform
    pub fn with_transform(mut self, transform: TransformProperties) -> Self {
        self.transform = transform;
        self
    }

    /// Set the motion path
    pub fn with_motion_path(mut self, path: MotionPath) -> Self {
        self.motion_path = Some(path);
        self
    }

    /// Add a keyframe to a property, replacing any at the same time
    pub fn set_keyframe(&mut self, property: AnimatableProperty, keyframe: Keyframe) {
        let current = self.keyframes.get(&property).map(Vec::as_slice).unwrap_or_default();
        let updated = keyframe::add_keyframe(current, keyframe);
        self.keyframes.insert(property, updated);
    }

    /// Remove the keyframe at exactly `time` from a property
    pub fn remove_keyframe(&mut self, property: AnimatableProperty, time: f64) {
        if let Some(current) = self.keyframes.get(&property) {
            let updated = keyframe::remove_keyframe(current, time);
            if updated.is_empty() {
                self.keyframes.shift_remove(&property);
            } else {
                self.keyframes.insert(property, updated);
            }
        }
    }

    /// Keyframes for a property
    pub fn property_keyframes(&self, property: AnimatableProperty) -> &[Keyframe] {
        self.keyframes.get(&property).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether any property or a motion path animates this layer
    pub fn is_animated(&self) -> bool {
        self.keyframes.values().any(|k| !k.is_empty())
            || self.motion_path.as_ref().is_some_and(|p| !p.points.is_empty())
    }

    /// Time of the last keyframe or path point
    pub fn content_duration(&self) -> f64 {
        let keyframe_end = self
            .keyframes
            .values()
            .flatten()
            .map(|k| k.time)
            .fold(0.0, f64::max);
        let path_end = self
            .motion_path
            .as_ref()
            .and_then(MotionPath::time_range)
            .map_or(0.0, |(_, end)| end);
        keyframe_end.max(path_end)
    }

    /// Local transform at `time`.
    ///
    /// Each keyframed property overrides the static value. A motion path
    /// replaces the position, and its auto-orient heading adds to rotation.
    pub fn local_transform_at(&self, time: f64) -> TransformProperties {
        let mut local = self.transform;

        for (property, keyframes) in &self.keyframes {
            if keyframes.is_empty() {
                continue;
            }
            match keyframe::evaluate_number(keyframes, time) {
                Some(value) => property.set(&mut local, value),
                None => tracing::trace!(
                    "Layer '{}' {} is not numeric at {time}, keeping static value",
                    self.name,
                    property.name()
                ),
            }
        }

        if let Some(path) = self.motion_path.as_ref().filter(|p| !p.points.is_empty()) {
            let sample = path.evaluate(time);
            local.x = sample.x;
            local.y = sample.y;
            if let Some(heading) = sample.rotation {
                local.rotation += heading;
            }
        }

        local
    }
}

/// Error from document loading or editing
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// RON text could not be parsed
    #[error("RON parse error: {0}")]
    RonParse(#[from] ron::error::SpannedError),

    /// RON serialization failed
    #[error("RON serialization error: {0}")]
    RonSerialize(#[from] ron::Error),

    /// JSON parsing or serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Layer not found
    #[error("Layer not found: {0:?}")]
    LayerNotFound(LayerId),

    /// Parenting would close a loop
    #[error("Parenting {child:?} to {parent:?} would create a cycle")]
    ParentCycle {
        /// Layer being parented
        child: LayerId,
        /// Requested parent
        parent: LayerId,
    },

    /// Loaded layer is stored under another layer's id
    #[error("Layer {id:?} is stored under key {key:?}")]
    LayerIdMismatch {
        /// Map key in the file
        key: LayerId,
        /// Id inside the layer
        id: LayerId,
    },

    /// Transform composition failed
    #[error(transparent)]
    Composition(#[from] CompositionError),
}

/// Transforms of one layer at a sampled time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerSample {
    /// Transform relative to the parent
    pub local: TransformProperties,
    /// Absolute transform
    pub world: TransformProperties,
}

/// All visible layers of a document at one time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSample {
    /// Frame number
    pub frame: u32,
    /// Time in seconds
    pub time: f64,
    /// Visible layers, in document order
    pub layers: IndexMap<LayerId, LayerSample>,
}

/// An ordered set of layers with timing information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationDocument {
    /// Document name
    pub name: String,
    /// Frame rate
    pub frame_rate: f64,
    /// Duration in seconds (can be longer than the content)
    pub duration: f64,
    /// Layers, bottom to top
    layers: IndexMap<LayerId, Layer>,
}

impl AnimationDocument {
    /// Create an empty document
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            frame_rate: 30.0,
            duration: 10.0,
            layers: IndexMap::new(),
        }
    }

    /// Add a layer on top
    pub fn add_layer(&mut self, layer: Layer) -> LayerId {
        let id = layer.id;
        self.layers.insert(id, layer);
        id
    }

    /// Remove a layer, detaching its children
    pub fn remove_layer(&mut self, layer_id: LayerId) -> Option<Layer> {
        let removed = self.layers.shift_remove(&layer_id)?;
        for layer in self.layers.values_mut() {
            if layer.parent_id == Some(layer_id) {
                layer.parent_id = None;
            }
        }
        Some(removed)
    }

    /// Get a layer
    pub fn layer(&self, layer_id: LayerId) -> Option<&Layer> {
        self.layers.get(&layer_id)
    }

    /// Get a mutable layer
    pub fn layer_mut(&mut self, layer_id: LayerId) -> Option<&mut Layer> {
        self.layers.get_mut(&layer_id)
    }

    /// Get all layers
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.values()
    }

    /// Get layer count
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Set or clear a layer's parent.
    ///
    /// Rejects parents that would make the hierarchy cyclic.
    pub fn set_parent(&mut self, child: LayerId, parent: Option<LayerId>) -> Result<(), DocumentError> {
        if !self.layers.contains_key(&child) {
            return Err(DocumentError::LayerNotFound(child));
        }

        if let Some(parent) = parent {
            if !self.layers.contains_key(&parent) {
                return Err(DocumentError::LayerNotFound(parent));
            }
            let mut ancestor = Some(parent);
            let mut steps = 0;
            while let Some(id) = ancestor {
                if id == child || steps > self.layers.len() {
                    return Err(DocumentError::ParentCycle { child, parent });
                }
                ancestor = self.layers.get(&id).and_then(|l| l.parent_id);
                steps += 1;
            }
        }

        if let Some(layer) = self.layers.get_mut(&child) {
            layer.parent_id = parent;
        }
        Ok(())
    }

    /// Parent edges for every layer
    pub fn parent_edges(&self) -> Vec<LayerParent> {
        self.layers
            .values()
            .map(|layer| LayerParent {
                layer_id: layer.id,
                parent_id: layer.parent_id,
            })
            .collect()
    }

    /// Get the duration based on layer content
    pub fn content_duration(&self) -> f64 {
        self.layers
            .values()
            .map(Layer::content_duration)
            .fold(0.0, f64::max)
    }

    /// Convert time to frame number
    pub fn time_to_frame(&self, time: f64) -> u32 {
        // Absorb rounding error so a frame's own time maps back to it
        (time * self.frame_rate + FRAME_EPSILON).floor().max(0.0) as u32
    }

    /// Convert frame number to time
    pub fn frame_to_time(&self, frame: u32) -> f64 {
        if self.frame_rate <= 0.0 {
            return 0.0;
        }
        f64::from(frame) / self.frame_rate
    }

    /// Number of frames covering the duration, including frame 0
    pub fn frame_count(&self) -> u32 {
        self.time_to_frame(self.duration).saturating_add(1)
    }

    /// Local transform of every layer at `time`
    pub fn local_transforms_at(&self, time: f64) -> HashMap<LayerId, TransformProperties> {
        self.layers
            .values()
            .map(|layer| (layer.id, layer.local_transform_at(time)))
            .collect()
    }

    /// World transform of a single layer at `time`
    pub fn world_transform_at(&self, layer_id: LayerId, time: f64) -> Result<TransformProperties, DocumentError> {
        let layer = self
            .layers
            .get(&layer_id)
            .ok_or(DocumentError::LayerNotFound(layer_id))?;
        let locals = self.local_transforms_at(time);
        let local = layer.local_transform_at(time);
        Ok(compute_world_transform(
            layer_id,
            &local,
            &self.parent_edges(),
            &locals,
        )?)
    }

    /// Sample every visible layer at `time`.
    ///
    /// Hidden layers still move their children.
    pub fn sample(&self, time: f64) -> Result<FrameSample, CompositionError> {
        let locals = self.local_transforms_at(time);
        let edges = self.parent_edges();
        let mut cache = WorldTransformCache::new();
        let mut layers = IndexMap::new();

        for layer in self.layers.values().filter(|l| l.visible) {
            let local = locals
                .get(&layer.id)
                .copied()
                .unwrap_or(layer.transform);
            let world = cache.resolve(layer.id, &local, &edges, &locals)?;
            layers.insert(layer.id, LayerSample { local, world });
        }

        Ok(FrameSample {
            frame: self.time_to_frame(time),
            time,
            layers,
        })
    }

    /// Sample a frame by number
    pub fn sample_frame(&self, frame: u32) -> Result<FrameSample, CompositionError> {
        let mut sample = self.sample(self.frame_to_time(frame))?;
        sample.frame = frame;
        Ok(sample)
    }

    fn validated(document: Self) -> Result<Self, DocumentError> {
        if let Some((key, layer)) = document.layers.iter().find(|(key, layer)| **key != layer.id) {
            return Err(DocumentError::LayerIdMismatch {
                key: *key,
                id: layer.id,
            });
        }
        Ok(document)
    }

    /// Serialize to RON format
    pub fn to_ron(&self) -> Result<String, DocumentError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Deserialize from RON format
    pub fn from_ron(s: &str) -> Result<Self, DocumentError> {
        let document = Self::validated(ron::from_str(s)?)?;
        tracing::debug!(
            "Loaded document '{}' with {} layers",
            document.name,
            document.layer_count()
        );
        Ok(document)
    }

    /// Serialize to JSON format
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON format
    pub fn from_json(s: &str) -> Result<Self, DocumentError> {
        let document = Self::validated(serde_json::from_str(s)?)?;
        tracing::debug!(
            "Loaded document '{}' with {} layers",
            document.name,
            document.layer_count()
        );
        Ok(document)
    }
}

impl Default for AnimationDocument {
    fn default() -> Self {
        Self::new("Untitled")
    }
}
