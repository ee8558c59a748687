//! Geometry fragments making up block meshes.

use crate::accumulator::{VertexAccumulator, VertexFlag};
use crate::math::{FreePoint, FreeVector, GridVector, Rgba, Rotation, TexPoint};

/// Texture inset applied by [`MeshPart::map_tex_coords()`], as a fraction of
/// the atlas cell width, to keep sampling away from cell edges at mipmap
/// boundaries.
const BORDER: f32 = 1.0 / 128.0;

/// Describes the geometry composing one part of a block's mesh.
///
/// Multiple parts are patched together to define the appearance of a block in
/// the world: one per visible face, plus optional center geometry. A
/// [`MeshPart`] is immutable; [`map_tex_coords()`](Self::map_tex_coords) and
/// [`rotate()`](Self::rotate) derive new parts rather than modifying in place.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshPart {
    positions: Box<[FreePoint]>,
    normals: Box<[FreeVector]>,
    tex_coords: Box<[TexPoint]>,
    indices: Box<[u32]>,
}

impl MeshPart {
    /// Constructs a part from parallel vertex arrays and a triangle index list.
    ///
    /// `positions`, `normals` and `tex_coords` must be the same length, and
    /// every index must refer to one of those vertices.
    ///
    /// # Panics
    ///
    /// Panics if the parallel arrays disagree in length or an index is out of
    /// range.
    pub fn new(
        positions: Vec<FreePoint>,
        normals: Vec<FreeVector>,
        tex_coords: Vec<TexPoint>,
        indices: Vec<u32>,
    ) -> Self {
        assert_eq!(positions.len(), normals.len());
        assert_eq!(positions.len(), tex_coords.len());
        assert!(
            indices.iter().all(|&i| (i as usize) < positions.len()),
            "index out of range for {} vertices",
            positions.len()
        );
        Self {
            positions: positions.into_boxed_slice(),
            normals: normals.into_boxed_slice(),
            tex_coords: tex_coords.into_boxed_slice(),
            indices: indices.into_boxed_slice(),
        }
    }

    /// The number of vertices in this part.
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// True if this part has no vertices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// The number of triangle indices in this part.
    #[inline]
    pub fn indices_len(&self) -> usize {
        self.indices.len()
    }

    /// Returns the position of the `i`-th vertex.
    #[inline]
    pub fn position(&self, i: usize) -> FreePoint {
        self.positions[i]
    }

    /// Returns the normal of the `i`-th vertex.
    #[inline]
    pub fn normal(&self, i: usize) -> FreeVector {
        self.normals[i]
    }

    /// Returns the texture coordinate of the `i`-th vertex.
    #[inline]
    pub fn tex_coord(&self, i: usize) -> TexPoint {
        self.tex_coords[i]
    }

    /// Returns the `i`-th triangle index.
    #[inline]
    pub fn index(&self, i: usize) -> u32 {
        self.indices[i]
    }

    /// Returns a copy of this part whose texture coordinates are remapped into
    /// the square atlas cell starting at `offset` with edge length `width`.
    ///
    /// The mapping is inset by a border of `width / 128` on each edge, so an
    /// input coordinate `t` becomes `offset + border + t · (width − 2·border)`
    /// per axis. Note that because of the border, applying this twice is *not*
    /// equivalent to applying it once with composed arguments.
    pub fn map_tex_coords(&self, offset: TexPoint, width: f32) -> MeshPart {
        let border = BORDER * width;
        let tex_coords = self
            .tex_coords
            .iter()
            .map(|uv| {
                TexPoint::new(
                    offset.x + border + uv.x * (width - 2.0 * border),
                    offset.y + border + uv.y * (width - 2.0 * border),
                )
            })
            .collect();
        Self {
            positions: self.positions.clone(),
            normals: self.normals.clone(),
            tex_coords,
            indices: self.indices.clone(),
        }
    }

    /// Returns a copy of this part with every vertex position and normal
    /// rotated by `rotation`.
    ///
    /// Normals are renormalized to unit length afterward, since rotating by a
    /// floating-point quaternion does not quite preserve it.
    pub fn rotate(&self, rotation: &Rotation) -> MeshPart {
        let positions = self
            .positions
            .iter()
            .map(|&p| rotation.transform_point3d(p))
            .collect();
        let normals = self
            .normals
            .iter()
            .map(|&n| rotation.transform_vector3d(n).normalize())
            .collect();
        Self {
            positions,
            normals,
            tex_coords: self.tex_coords.clone(),
            indices: self.indices.clone(),
        }
    }

    /// Appends this part's geometry to `out`, translated by the block offset
    /// `offset`, with every vertex tagged with the given tint and render flag.
    ///
    /// Indices are shifted by the accumulator's vertex count at the time of
    /// the call, so they keep referring to this part's vertices; the vertex
    /// count is then advanced by [`len()`](Self::len).
    pub fn append_to(
        &self,
        out: &mut VertexAccumulator,
        offset: GridVector,
        color: Rgba,
        flag: VertexFlag,
    ) {
        for uv in &self.tex_coords {
            out.tex_coords.push(uv.x);
            out.tex_coords.push(uv.y);
        }

        let translation = offset.to_f32();
        let base_index = out.vertex_count;
        for (position, normal) in self.positions.iter().zip(&self.normals) {
            out.colors.push(color.red());
            out.colors.push(color.green());
            out.colors.push(color.blue());
            out.colors.push(color.alpha());
            let position = *position + translation;
            out.positions.push(position.x);
            out.positions.push(position.y);
            out.positions.push(position.z);
            out.normals.push(normal.x);
            out.normals.push(normal.y);
            out.normals.push(normal.z);
            out.flags.push(flag as u32);
        }
        out.vertex_count += self.positions.len() as u32;

        for &index in &self.indices {
            out.indices.push(index + base_index);
        }
    }
}
