//! The tessellation pipeline itself; see [`Tessellator`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use euclid::{point3, vec3};
use itertools::iproduct;

use crate::accumulator::{RenderCategory, ScratchBuffers, VertexFlag};
use crate::block::{Biome, Block, CHUNK_SIZE_X, CHUNK_SIZE_Z, ChunkView};
use crate::math::{BlockPart, FreePoint, FreeVector, GridCoordinate, Rgba, Side, SideMap};
use crate::packed::{PackedMesh, WORDS_PER_VERTEX};
use crate::pool::{Pool, PoolConfig, PoolError, Pooled};

/// Count of completed [`Tessellator::generate_mesh()`] calls, process-wide.
static VERTEX_ARRAY_UPDATE_COUNT: AtomicU64 = AtomicU64::new(0);

/// Returns the total number of meshes generated by all [`Tessellator`]s since
/// the process started. Intended for performance monitoring displays only.
pub fn mesh_update_count() -> u64 {
    VERTEX_ARRAY_UPDATE_COUNT.load(Ordering::Relaxed)
}

/// Errors that may be returned from [`Tessellator::generate_mesh()`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, displaydoc::Display)]
#[non_exhaustive]
pub enum MeshError {
    /// failed to obtain an output mesh: {0}
    OutputPool(PoolError),
    /// failed to obtain scratch buffers: {0}
    ScratchPool(PoolError),
}

impl core::error::Error for MeshError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            MeshError::OutputPool(e) | MeshError::ScratchPool(e) => Some(e),
        }
    }
}

/// Generates render-ready [`PackedMesh`]es from [`ChunkView`]s.
///
/// A `Tessellator` owns no voxel data; each [`generate_mesh()`] call reads one
/// snapshot and produces one mesh. It is cheap to construct and may be shared
/// across worker threads. The output meshes come from the caller-provided
/// pool, so the meshes a consumer has finished with get their allocations
/// reused; scratch state for the intermediate representation lives in a second,
/// internal pool.
///
/// [`generate_mesh()`]: Self::generate_mesh
#[derive(Debug)]
pub struct Tessellator {
    mesh_pool: Arc<Pool<PackedMesh>>,
    scratch_pool: Arc<Pool<ScratchBuffers>>,
}

impl Tessellator {
    /// Constructs a tessellator whose output meshes are drawn from, and
    /// should be returned to, `mesh_pool`.
    pub fn new(mesh_pool: Arc<Pool<PackedMesh>>) -> Self {
        Self {
            mesh_pool,
            scratch_pool: Arc::new(Pool::new(PoolConfig {
                max_idle: 10,
                ..PoolConfig::default()
            })),
        }
    }

    /// Tessellates the volume `0..32 × vertical_offset..vertical_offset+mesh_height × 0..32`
    /// of `view` into packed vertex buffers, one per [`RenderCategory`].
    ///
    /// Fails only if a pool is exhausted, which indicates too many meshes in
    /// flight rather than anything wrong with the input.
    ///
    /// Panics if a liquid block lacks a lowered-surface mesh for a face that
    /// must be drawn, or if a block's appearance lacks a part for a face that
    /// must be drawn.
    pub fn generate_mesh(
        &self,
        view: &dyn ChunkView,
        mesh_height: GridCoordinate,
        vertical_offset: GridCoordinate,
    ) -> Result<Pooled<PackedMesh>, MeshError> {
        let mut mesh = self.mesh_pool.acquire().map_err(MeshError::OutputPool)?;
        let mut scratch = self.scratch_pool.acquire().map_err(MeshError::ScratchPool)?;

        let vertex_start = Instant::now();
        for (x, z, y) in iproduct!(
            0..CHUNK_SIZE_X,
            0..CHUNK_SIZE_Z,
            vertical_offset..vertical_offset + mesh_height
        ) {
            let block = view.block(x, y, z);
            if block.is_invisible() {
                continue;
            }
            let biome = view.biome(x, y, z);
            generate_block_vertices(view, &mut scratch, x, y, z, biome);
        }
        mesh.set_vertex_generation_time(vertex_start.elapsed());

        let packing_start = Instant::now();
        pack_buffers(view, &mut mesh, &scratch);
        mesh.set_packing_time(packing_start.elapsed());

        VERTEX_ARRAY_UPDATE_COUNT.fetch_add(1, Ordering::Relaxed);
        log::debug!(
            "generated chunk mesh: vertices {:?}, packing {:?}",
            mesh.vertex_generation_time(),
            mesh.packing_time(),
        );
        Ok(mesh)
    }
}

/// Emits the geometry of the block at `(x, y, z)` into the scratch buffers of
/// the category it renders in.
fn generate_block_vertices(
    view: &dyn ChunkView,
    scratch: &mut ScratchBuffers,
    x: GridCoordinate,
    y: GridCoordinate,
    z: GridCoordinate,
    biome: Biome,
) {
    let block = view.block(x, y, z);

    let vertex_flag = if block.is_water() {
        VertexFlag::Water
    } else if block.is_lava() {
        VertexFlag::Lava
    } else if block.is_waving() && block.is_double_sided() {
        VertexFlag::Waving
    } else if block.is_waving() {
        VertexFlag::WavingBlock
    } else {
        VertexFlag::Normal
    };

    let neighbors: SideMap<&Block> = SideMap::from_fn(|side| {
        let n = side.normal();
        view.block(x + n.x, y + n.y, z + n.z)
    });

    let appearance = block.appearance(&neighbors);

    let category = if block.is_double_sided() {
        RenderCategory::Billboard
    } else if block.is_water() || block.is_ice() {
        RenderCategory::WaterAndIce
    } else if !block.is_translucent() {
        RenderCategory::Opaque
    } else {
        RenderCategory::Translucent
    };
    let out = &mut scratch.categories[category];

    let offset = vec3(x, y, z);

    if let Some(center) = appearance.part(BlockPart::Center) {
        let color = block.color_offset(BlockPart::Center, biome);
        center.append_to(out, offset, color, vertex_flag);
    }

    let mut draw = SideMap::from_fn(|side| {
        appearance.side(side).is_some() && side_visible(neighbors[side], block, side)
    });

    if block.is_liquid() {
        let below = neighbors[Side::Bottom];

        // A lowered surface exposes slivers of the side faces above the
        // neighboring liquid; draw a side if it is visible from the block
        // below the neighbor but not from directly below this block.
        for side in Side::HORIZONTAL {
            let n = side.normal();
            let adjacent_below = view.block(x + n.x, y - 1, z + n.z);
            let visible = appearance.side(side).is_some()
                && side_visible(adjacent_below, block, side)
                && !side_visible(below, neighbors[side], side.opposite());
            draw[side] |= visible;
        }

        // The lowered top is visible under anything that is not more liquid.
        draw[Side::Top] |= !neighbors[Side::Top].is_liquid();

        if below.is_liquid() || below.is_invisible() {
            for side in Side::ALL {
                if draw[side] {
                    let color = block.color_offset(BlockPart::from_side(side), biome);
                    block
                        .lowered_liquid_mesh(side)
                        .expect("liquid block is missing a lowered-surface mesh")
                        .append_to(out, offset, color, vertex_flag);
                }
            }
            return;
        }
    }

    for side in Side::ALL {
        if draw[side] {
            let flag = if block.is_grass() && side != Side::Top && side != Side::Bottom {
                VertexFlag::ColorMask
            } else {
                vertex_flag
            };
            let color = block.color_offset(BlockPart::from_side(side), biome);
            appearance
                .side(side)
                .expect("block appearance is missing a visible face part")
                .append_to(out, offset, color, flag);
        }
    }
}

/// Whether `current`'s face toward `to_check` needs to be drawn.
fn side_visible(to_check: &Block, current: &Block, side: Side) -> bool {
    // Liquids may be transparent, but two touching liquid blocks never draw
    // the shared face.
    if current.is_liquid() && to_check.is_liquid() {
        return false;
    }

    current.is_waving() != to_check.is_waving()
        || to_check.is_invisible()
        || !to_check.is_full_side(side.opposite())
        || (!current.is_translucent() && to_check.is_translucent())
}

/// Lighting of one vertex, each component normalized to `0..=1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct VertexLight {
    pub(crate) sunlight: f32,
    pub(crate) block_light: f32,
    pub(crate) ambient: f32,
}

/// Samples the view around `position` to light a vertex with the given
/// normal.
///
/// Light levels are averaged over eight points nudged off the vertex (light
/// data is stored per block, and a vertex sits on the boundary of up to four
/// of them, plus the air above). Ambient occlusion comes from the four blocks
/// ahead of the vertex along the normal's dominant axis.
pub(crate) fn vertex_light(
    view: &dyn ChunkView,
    position: FreePoint,
    normal: FreeVector,
) -> VertexLight {
    let mut sun_sum = 0.0f32;
    let mut sun_count = 0u32;
    let mut block_sum = 0.0f32;
    let mut block_count = 0u32;
    for (dy, dx, dz) in iproduct!([0.8f32, -0.1], [0.1f32, -0.1], [0.1f32, -0.1]) {
        let sample = position + vec3(dx, dy, dz);
        let sun = view.sunlight_at(sample);
        if sun > 0 {
            sun_sum += f32::from(sun);
            sun_count += 1;
        }
        let light = view.light_at(sample);
        if light > 0 {
            block_sum += f32::from(light);
            block_count += 1;
        }
    }

    let occluders: [&Block; 4] = match Side::closest_to(normal) {
        Side::Left | Side::Right => [
            view.block_at(position + vec3(0.8 * normal.x, 0.1, 0.1)),
            view.block_at(position + vec3(0.8 * normal.x, 0.1, -0.1)),
            view.block_at(position + vec3(0.8 * normal.x, -0.1, -0.1)),
            view.block_at(position + vec3(0.8 * normal.x, -0.1, 0.1)),
        ],
        Side::Front | Side::Back => [
            view.block_at(position + vec3(0.1, 0.1, 0.8 * normal.z)),
            view.block_at(position + vec3(0.1, -0.1, 0.8 * normal.z)),
            view.block_at(position + vec3(-0.1, -0.1, 0.8 * normal.z)),
            view.block_at(position + vec3(-0.1, 0.1, 0.8 * normal.z)),
        ],
        Side::Top | Side::Bottom => [
            view.block_at(position + vec3(0.1, 0.8 * normal.y, 0.1)),
            view.block_at(position + vec3(0.1, 0.8 * normal.y, -0.1)),
            view.block_at(position + vec3(-0.1, 0.8 * normal.y, -0.1)),
            view.block_at(position + vec3(-0.1, 0.8 * normal.y, 0.1)),
        ],
    };
    let mut opaque_occluders: i32 = 0;
    let mut translucent_occluders: i32 = 0;
    for occluder in occluders {
        if occluder.is_shadow_casting() && !occluder.is_translucent() {
            opaque_occluders += 1;
        } else if occluder.is_shadow_casting() {
            translucent_occluders += 1;
        }
    }

    let mean = |sum: f32, count: u32| {
        if count == 0 { 0.0 } else { sum / count as f32 / 15.0 }
    };
    VertexLight {
        sunlight: mean(sun_sum, sun_count),
        block_light: mean(block_sum, block_count),
        ambient: ((0.40f64.powi(opaque_occluders) + 0.80f64.powi(translucent_occluders)) / 2.0)
            as f32,
    }
}

/// Lights, packs and interleaves the scratch buffers into `mesh`.
fn pack_buffers(view: &dyn ChunkView, mesh: &mut PackedMesh, scratch: &ScratchBuffers) {
    for category in RenderCategory::ALL {
        let input = scratch.category(category);
        let out = mesh.buffers_mut(category);

        let vertex_count = input.vertex_count() as usize;
        out.prepare_vertices(vertex_count * WORDS_PER_VERTEX);

        for i in 0..vertex_count {
            let position: FreePoint = point3(
                input.positions[3 * i],
                input.positions[3 * i + 1],
                input.positions[3 * i + 2],
            );
            let normal: FreeVector = vec3(
                input.normals[3 * i],
                input.normals[3 * i + 1],
                input.normals[3 * i + 2],
            );

            out.vertices.push(position.x.to_bits());
            out.vertices.push(position.y.to_bits());
            out.vertices.push(position.z.to_bits());

            out.vertices.push(input.tex_coords[2 * i].to_bits());
            out.vertices.push(input.tex_coords[2 * i + 1].to_bits());

            // The flag rides in a float attribute; store the numeric value's
            // float representation, not the integer bits.
            out.vertices.push((input.flags[i] as f32).to_bits());

            let light = vertex_light(view, position, normal);
            out.vertices.push(light.sunlight.to_bits());
            out.vertices.push(light.block_light.to_bits());
            out.vertices.push(light.ambient.to_bits());

            let color = Rgba::new(
                input.colors[4 * i],
                input.colors[4 * i + 1],
                input.colors[4 * i + 2],
                input.colors[4 * i + 3],
            );
            out.vertices.push(color.packed());

            out.vertices.push(normal.x.to_bits());
            out.vertices.push(normal.y.to_bits());
            out.vertices.push(normal.z.to_bits());
        }

        out.prepare_indices(input.indices().len());
        out.indices.extend_from_slice(input.indices());
    }
}
