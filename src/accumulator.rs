//! Growable per-category vertex buffers filled during the generation pass.

use core::ops;

use crate::pool::PoolItem;

/// Initial capacity of each accumulator buffer, in elements.
const DEFAULT_CAPACITY: usize = 1000;

/// Output bucket a block's geometry lands in, determining which shader/blend
/// treatment the renderer applies to it. One block contributes to exactly one
/// category.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum RenderCategory {
    /// Fully opaque geometry, drawn with depth writes.
    Opaque = 0,
    /// Partially transparent geometry.
    Translucent = 1,
    /// Water and ice surfaces, drawn with their own refraction-aware pass.
    WaterAndIce = 2,
    /// Double-sided geometry (e.g. foliage crosses) drawn without back-face
    /// culling.
    Billboard = 3,
}

impl RenderCategory {
    /// All the values of [`RenderCategory`].
    pub const ALL: [RenderCategory; 4] = [
        RenderCategory::Opaque,
        RenderCategory::Translucent,
        RenderCategory::WaterAndIce,
        RenderCategory::Billboard,
    ];
}

/// Container for values keyed by [`RenderCategory`]. Always holds exactly
/// four elements, so lookups are plain field reads rather than map lookups.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct CategoryMap<V> {
    /// The value whose key is [`RenderCategory::Opaque`].
    pub opaque: V,
    /// The value whose key is [`RenderCategory::Translucent`].
    pub translucent: V,
    /// The value whose key is [`RenderCategory::WaterAndIce`].
    pub water_and_ice: V,
    /// The value whose key is [`RenderCategory::Billboard`].
    pub billboard: V,
}

impl<V> CategoryMap<V> {
    /// Constructs a [`CategoryMap`] by using the provided function to compute
    /// a value for each [`RenderCategory`] enum variant.
    #[inline]
    pub fn from_fn(mut f: impl FnMut(RenderCategory) -> V) -> Self {
        Self {
            opaque: f(RenderCategory::Opaque),
            translucent: f(RenderCategory::Translucent),
            water_and_ice: f(RenderCategory::WaterAndIce),
            billboard: f(RenderCategory::Billboard),
        }
    }

    /// Iterates over all entries in [`RenderCategory::ALL`] order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (RenderCategory, &V)> {
        RenderCategory::ALL.into_iter().map(|c| (c, &self[c]))
    }
}

impl<V> ops::Index<RenderCategory> for CategoryMap<V> {
    type Output = V;
    #[inline]
    fn index(&self, category: RenderCategory) -> &V {
        match category {
            RenderCategory::Opaque => &self.opaque,
            RenderCategory::Translucent => &self.translucent,
            RenderCategory::WaterAndIce => &self.water_and_ice,
            RenderCategory::Billboard => &self.billboard,
        }
    }
}

impl<V> ops::IndexMut<RenderCategory> for CategoryMap<V> {
    #[inline]
    fn index_mut(&mut self, category: RenderCategory) -> &mut V {
        match category {
            RenderCategory::Opaque => &mut self.opaque,
            RenderCategory::Translucent => &mut self.translucent,
            RenderCategory::WaterAndIce => &mut self.water_and_ice,
            RenderCategory::Billboard => &mut self.billboard,
        }
    }
}

/// Per-vertex render hint, stored alongside the geometry and interpreted by
/// the consumer's shaders (e.g. to animate waving foliage or water surfaces).
///
/// The discriminant values are the wire format seen by the shader and must not
/// be reordered.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u32)]
pub enum VertexFlag {
    /// No special treatment.
    Normal = 0,
    /// Water surface.
    Water = 1,
    /// Lava surface.
    Lava = 2,
    /// Waving geometry attached to double-sided (billboard) blocks.
    Waving = 3,
    /// Waving geometry attached to ordinary blocks.
    WavingBlock = 4,
    /// The texture's color is replaced by the per-vertex tint where masked.
    ColorMask = 5,
}

/// Growable, resettable buffers accumulating the vertex data of one
/// [`RenderCategory`] during the generation pass.
///
/// The buffers are parallel arrays: `positions` and `normals` hold three
/// components per vertex, `tex_coords` two, `colors` four, and `flags` one.
/// `indices` refers to vertices by their ordinal; the running
/// [`vertex_count`](Self::vertex_count) is used to offset indices as parts are
/// appended, so every stored index is less than the vertex count at all times.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VertexAccumulator {
    pub(crate) positions: Vec<f32>,
    pub(crate) normals: Vec<f32>,
    pub(crate) tex_coords: Vec<f32>,
    pub(crate) colors: Vec<f32>,
    pub(crate) flags: Vec<u32>,
    pub(crate) indices: Vec<u32>,
    pub(crate) vertex_count: u32,
}

impl VertexAccumulator {
    /// Constructs an empty accumulator with a modest pre-allocated capacity.
    pub fn new() -> Self {
        Self {
            positions: Vec::with_capacity(DEFAULT_CAPACITY),
            normals: Vec::with_capacity(DEFAULT_CAPACITY),
            tex_coords: Vec::with_capacity(DEFAULT_CAPACITY),
            colors: Vec::with_capacity(DEFAULT_CAPACITY),
            flags: Vec::with_capacity(DEFAULT_CAPACITY),
            indices: Vec::with_capacity(DEFAULT_CAPACITY),
            vertex_count: 0,
        }
    }

    /// The number of vertices appended so far.
    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// The triangle indices appended so far, already offset to refer to this
    /// accumulator's vertices.
    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// True if nothing has been appended since the last
    /// [`clear()`](Self::clear).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertex_count == 0
    }

    /// Empties all buffers and zeroes the vertex count, keeping the backing
    /// storage so the accumulator can be reused for another chunk without
    /// reallocating.
    pub fn clear(&mut self) {
        let Self {
            positions,
            normals,
            tex_coords,
            colors,
            flags,
            indices,
            vertex_count,
        } = self;
        positions.clear();
        normals.clear();
        tex_coords.clear();
        colors.clear();
        flags.clear();
        indices.clear();
        *vertex_count = 0;
    }
}

/// Per-call scratch state of one tessellation pass: one [`VertexAccumulator`]
/// per render category.
///
/// Instances are pooled per worker so that concurrent tessellation calls never
/// share buffers; see [`Pool`](crate::Pool).
#[derive(Clone, Debug, Default)]
pub struct ScratchBuffers {
    /// The accumulators, keyed by the category their geometry belongs to.
    pub(crate) categories: CategoryMap<VertexAccumulator>,
}

impl ScratchBuffers {
    /// Read access to one category's accumulator.
    #[inline]
    pub fn category(&self, category: RenderCategory) -> &VertexAccumulator {
        &self.categories[category]
    }
}

impl PoolItem for ScratchBuffers {
    fn reset(&mut self) {
        for category in RenderCategory::ALL {
            self.categories[category].clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Rgba;
    use crate::mesh_part::MeshPart;
    use euclid::{point2, point3, vec3};
    use pretty_assertions::assert_eq;

    fn triangle() -> MeshPart {
        MeshPart::new(
            vec![
                point3(0.0, 0.0, 0.0),
                point3(1.0, 0.0, 0.0),
                point3(0.0, 0.0, 1.0),
            ],
            vec![vec3(0.0, 1.0, 0.0); 3],
            vec![point2(0.0, 0.0), point2(1.0, 0.0), point2(0.0, 1.0)],
            vec![0, 1, 2],
        )
    }

    /// After appending parts of sizes s₁..sₙ the vertex count is Σsᵢ and every
    /// index refers only to vertices already written at its append time.
    #[test]
    fn append_maintains_index_invariant() {
        let mut out = VertexAccumulator::new();
        let part = triangle();
        let mut expected_count = 0;
        for _ in 0..4 {
            let base = out.vertex_count();
            part.append_to(&mut out, vec3(1, 2, 3), Rgba::WHITE, VertexFlag::Normal);
            expected_count += part.len() as u32;
            assert_eq!(out.vertex_count(), expected_count);
            let appended = &out.indices()[out.indices().len() - part.indices_len()..];
            assert!(appended.iter().all(|&i| i >= base && i < expected_count));
        }
        assert!(out.indices().iter().all(|&i| i < out.vertex_count()));
    }

    #[test]
    fn append_translates_positions_and_tags_vertices() {
        let mut out = VertexAccumulator::new();
        triangle().append_to(&mut out, vec3(2, 3, 4), Rgba::new(0.5, 0.25, 1.0, 1.0), VertexFlag::Lava);
        assert_eq!(&out.positions[0..3], &[2.0, 3.0, 4.0]);
        assert_eq!(&out.colors[0..4], &[0.5, 0.25, 1.0, 1.0]);
        assert_eq!(out.flags, vec![VertexFlag::Lava as u32; 3]);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut out = VertexAccumulator::new();
        for _ in 0..100 {
            triangle().append_to(&mut out, vec3(0, 0, 0), Rgba::WHITE, VertexFlag::Normal);
        }
        let capacity = out.positions.capacity();
        out.clear();
        assert_eq!(out.vertex_count(), 0);
        assert!(out.indices().is_empty());
        assert_eq!(out.positions.capacity(), capacity);
    }
}
