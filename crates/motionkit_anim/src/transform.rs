// SPDX-License-Identifier: MIT OR Apache-2.0
//! Layer transforms and parent→child composition.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Unique identifier for a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub Uuid);

impl LayerId {
    /// Create a new random layer ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

/// 2D layer transform, either local (relative to the parent) or world
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformProperties {
    /// Horizontal position
    pub x: f64,
    /// Vertical position
    pub y: f64,
    /// Horizontal scale factor
    pub scale_x: f64,
    /// Vertical scale factor
    pub scale_y: f64,
    /// Rotation in degrees
    pub rotation: f64,
    /// Opacity in `[0, 1]`
    pub opacity: f64,
}

impl TransformProperties {
    /// Identity transform
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        scale_x: 1.0,
        scale_y: 1.0,
        rotation: 0.0,
        opacity: 1.0,
    };

    /// Identity transform placed at `(x, y)`
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::IDENTITY
        }
    }

    /// Combine this world transform with a child's local transform.
    ///
    /// The child's offset is scaled by this transform's scale but not
    /// rotated; rotation adds without wrapping and opacity multiplies.
    pub fn compose(&self, local: &TransformProperties) -> TransformProperties {
        TransformProperties {
            x: self.x + local.x * self.scale_x,
            y: self.y + local.y * self.scale_y,
            scale_x: self.scale_x * local.scale_x,
            scale_y: self.scale_y * local.scale_y,
            rotation: self.rotation + local.rotation,
            opacity: self.opacity * local.opacity,
        }
    }
}

impl Default for TransformProperties {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Parent edge for a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerParent {
    /// Child layer
    pub layer_id: LayerId,
    /// Parent layer, if any
    pub parent_id: Option<LayerId>,
}

impl LayerParent {
    /// Edge from `layer_id` to `parent_id`
    pub fn new(layer_id: LayerId, parent_id: LayerId) -> Self {
        Self {
            layer_id,
            parent_id: Some(parent_id),
        }
    }
}

/// Error during transform composition
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompositionError {
    /// Parent chain loops back on itself
    #[error("Layer parent chain contains a cycle at {0:?}")]
    CycleDetected(LayerId),
}

fn parent_of(parents: &[LayerParent], layer_id: LayerId) -> Option<LayerId> {
    parents
        .iter()
        .find(|edge| edge.layer_id == layer_id)
        .and_then(|edge| edge.parent_id)
}

/// Compute a layer's world transform from its local transform and ancestors.
///
/// A layer with no parent edge, or whose parent has no entry in
/// `ancestor_locals`, is its own world transform. Otherwise the parent's world
/// transform is resolved first and the local transform is composed onto it.
/// A parent chain that revisits a layer fails with
/// [`CompositionError::CycleDetected`].
pub fn compute_world_transform(
    layer_id: LayerId,
    local: &TransformProperties,
    parents: &[LayerParent],
    ancestor_locals: &HashMap<LayerId, TransformProperties>,
) -> Result<TransformProperties, CompositionError> {
    // Locals from the layer up to its outermost resolvable ancestor
    let mut chain = vec![*local];
    let mut visited = HashSet::from([layer_id]);
    let mut current = layer_id;

    while let Some(parent_id) = parent_of(parents, current) {
        let Some(parent_local) = ancestor_locals.get(&parent_id) else {
            break;
        };
        if !visited.insert(parent_id) {
            tracing::debug!("Parent cycle detected while resolving {:?}", layer_id);
            return Err(CompositionError::CycleDetected(parent_id));
        }
        chain.push(*parent_local);
        current = parent_id;
    }

    let mut locals = chain.iter().rev();
    let root = locals.next().copied().unwrap_or(*local);
    Ok(locals.fold(root, |world, local| world.compose(local)))
}

/// Per-frame memo of resolved world transforms.
///
/// Siblings under a shared ancestor reuse the ancestor's world transform
/// instead of walking the chain again. Results match
/// [`compute_world_transform`]. Clear it whenever any local transform
/// changes, typically once per frame.
#[derive(Debug, Clone, Default)]
pub struct WorldTransformCache {
    world: HashMap<LayerId, TransformProperties>,
}

impl WorldTransformCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all resolved transforms
    pub fn clear(&mut self) {
        self.world.clear();
    }

    /// Number of resolved layers
    pub fn len(&self) -> usize {
        self.world.len()
    }

    /// Whether nothing has been resolved yet
    pub fn is_empty(&self) -> bool {
        self.world.is_empty()
    }

    /// Previously resolved world transform
    pub fn get(&self, layer_id: LayerId) -> Option<&TransformProperties> {
        self.world.get(&layer_id)
    }

    /// Resolve a world transform, reusing and filling the memo
    pub fn resolve(
        &mut self,
        layer_id: LayerId,
        local: &TransformProperties,
        parents: &[LayerParent],
        ancestor_locals: &HashMap<LayerId, TransformProperties>,
    ) -> Result<TransformProperties, CompositionError> {
        if let Some(world) = self.world.get(&layer_id) {
            return Ok(*world);
        }

        let mut chain = vec![(layer_id, *local)];
        let mut visited = HashSet::from([layer_id]);
        let mut resolved_parent = None;
        let mut current = layer_id;

        while let Some(parent_id) = parent_of(parents, current) {
            let Some(parent_local) = ancestor_locals.get(&parent_id) else {
                break;
            };
            if !visited.insert(parent_id) {
                tracing::debug!("Parent cycle detected while resolving {:?}", layer_id);
                return Err(CompositionError::CycleDetected(parent_id));
            }
            if let Some(world) = self.world.get(&parent_id) {
                resolved_parent = Some(*world);
                break;
            }
            chain.push((parent_id, *parent_local));
            current = parent_id;
        }

        let mut world = resolved_parent;
        for (id, local) in chain.iter().rev() {
            let resolved = match world {
                Some(parent) => parent.compose(local),
                None => *local,
            };
            self.world.insert(*id, resolved);
            world = Some(resolved);
        }

        Ok(world.unwrap_or(*local))
    }
}
