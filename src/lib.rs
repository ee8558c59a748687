//! Algorithms for converting chunks of voxel data to triangle meshes, packed
//! into the interleaved vertex format consumed by the renderer's chunk
//! shaders.
//!
//! The entry point is [`Tessellator`]: feed it a [`ChunkView`] (a read-only
//! snapshot of one chunk plus a one-block halo of its neighbors) and it
//! produces a [`PackedMesh`] holding one vertex/index buffer pair per
//! [`RenderCategory`]. Vertex lighting, ambient occlusion and biome tinting
//! are baked into the buffers during packing.
//!
//! Restrictions and caveats:
//! * Meshes are generated per block face, without merging coplanar faces;
//!   hidden-surface removal happens only at block granularity.
//! * The generated meshes are designed for rendering and not for purposes
//!   which require “watertight” geometry.
//! * Output and scratch allocations are recycled through [`Pool`]s, so a
//!   mesh must be dropped (returning it to its pool) once uploaded.
//!
//! Block types are described to the tessellator with [`Block`], built via
//! [`Block::builder()`]; their geometry is supplied as [`MeshPart`]s.

// Crate-specific lint settings.
#![forbid(unsafe_code)]

mod accumulator;
pub use accumulator::*;
mod block;
pub use block::*;
mod math;
pub use math::*;
mod mesh_part;
pub use mesh_part::*;
mod packed;
pub use packed::*;
mod pool;
pub use pool::*;
mod tessellator;
pub use tessellator::*;

#[doc(hidden)]
pub mod testing;

#[cfg(test)]
mod tests;
