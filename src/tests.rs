//! Tests for the tessellation pipeline as a whole.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use crate::testing::{
    ArrayChunkView, LOWERED_TOP, UnpackedVertex, air, cube_appearance, foliage, grass, stone,
    total_vertex_count, unpack_vertices, water,
};
use crate::{
    Biome, Block, BlockPart, ColorSource, MeshError, PackedMesh, Pool, PoolConfig, PoolError,
    RenderCategory, Rgba, Tessellator, VertexFlag, mesh_update_count,
};

fn tessellator() -> Tessellator {
    Tessellator::new(Arc::new(Pool::new(PoolConfig::default())))
}

#[test]
fn empty_chunk_yields_empty_mesh() {
    let view = ArrayChunkView::empty();
    let mesh = tessellator().generate_mesh(&view, 64, 0).unwrap();
    assert!(mesh.is_empty());
    for category in RenderCategory::ALL {
        assert_eq!(mesh.buffers(category).vertex_count(), 0);
        assert_eq!(mesh.buffers(category).index_data(), &[] as &[u32]);
    }
}

#[test]
fn single_cube_is_six_opaque_faces() {
    let mut view = ArrayChunkView::empty();
    let stone = view.add_block(stone());
    view.set(8, 2, 8, stone);

    let mesh = tessellator().generate_mesh(&view, 64, 0).unwrap();
    let buffers = mesh.buffers(RenderCategory::Opaque);
    assert_eq!(buffers.vertex_count(), 24);
    assert_eq!(buffers.index_data().len(), 36);
    assert!(
        buffers
            .index_data()
            .iter()
            .all(|&i| i < buffers.vertex_count() as u32)
    );
    assert_eq!(total_vertex_count(&mesh), 24);

    for vertex in unpack_vertices(buffers) {
        assert_eq!(vertex.flag, VertexFlag::Normal as u32 as f32);
        assert_eq!(vertex.color, Rgba::WHITE);
        // The cube was placed at (8, 2, 8).
        assert!(vertex.position[0] >= 8.0 && vertex.position[0] <= 9.0);
        assert!(vertex.position[1] >= 2.0 && vertex.position[1] <= 3.0);
    }
}

#[test]
fn faces_between_adjacent_cubes_are_culled() {
    let mut view = ArrayChunkView::empty();
    let stone = view.add_block(stone());
    view.set(8, 2, 8, stone);
    view.set(8, 3, 8, stone);

    let mesh = tessellator().generate_mesh(&view, 64, 0).unwrap();
    let buffers = mesh.buffers(RenderCategory::Opaque);
    // 12 faces total minus the two touching ones.
    assert_eq!(buffers.vertex_count(), 40);
    assert_eq!(buffers.index_data().len(), 60);
}

#[test]
fn opaque_face_toward_translucent_neighbor_is_kept() {
    let glass = Block::builder()
        .translucent(true)
        .appearance(cube_appearance())
        .build();

    let mut view = ArrayChunkView::empty();
    let stone = view.add_block(stone());
    let glass = view.add_block(glass);
    view.set(8, 2, 8, stone);
    view.set(9, 2, 8, glass);

    let mesh = tessellator().generate_mesh(&view, 64, 0).unwrap();
    // The stone still shows through the glass, so all six stone faces exist;
    // the glass's face against the stone is hidden.
    assert_eq!(mesh.buffers(RenderCategory::Opaque).vertex_count(), 24);
    assert_eq!(mesh.buffers(RenderCategory::Translucent).vertex_count(), 20);
}

#[test]
fn vertical_offset_restricts_the_scan() {
    let mut view = ArrayChunkView::empty();
    let stone = view.add_block(stone());
    view.set(8, 1, 8, stone);
    view.set(8, 3, 8, stone);

    let mesh = tessellator().generate_mesh(&view, 4, 2).unwrap();
    // Only the cube at y=3 lies in the scanned slab 2..6.
    assert_eq!(mesh.buffers(RenderCategory::Opaque).vertex_count(), 24);
}

#[test]
fn waving_and_still_blocks_draw_their_shared_face() {
    let waving = Block::builder()
        .waving(true)
        .appearance(cube_appearance())
        .build();

    let mut view = ArrayChunkView::empty();
    let stone = view.add_block(stone());
    let waving = view.add_block(waving);
    view.set(8, 2, 8, stone);
    view.set(8, 3, 8, waving);

    let mesh = tessellator().generate_mesh(&view, 64, 0).unwrap();
    // Unlike two still cubes, the interface faces both stay.
    assert_eq!(mesh.buffers(RenderCategory::Opaque).vertex_count(), 48);

    let flags: Vec<f32> = unpack_vertices(mesh.buffers(RenderCategory::Opaque))
        .iter()
        .map(|v| v.flag)
        .collect();
    assert!(flags.contains(&(VertexFlag::Normal as u32 as f32)));
    assert!(flags.contains(&(VertexFlag::WavingBlock as u32 as f32)));
}

#[test]
fn supported_water_surface_draws_full_height_faces() {
    let mut view = ArrayChunkView::empty();
    let stone = view.add_block(stone());
    let water = view.add_block(water());
    view.set(8, 1, 8, stone);
    view.set(8, 2, 8, water);

    let mesh = tessellator().generate_mesh(&view, 64, 0).unwrap();
    let buffers = mesh.buffers(RenderCategory::WaterAndIce);
    // Top and four sides; the bottom is against the stone.
    assert_eq!(buffers.vertex_count(), 20);

    let vertices = unpack_vertices(buffers);
    let max_y = vertices.iter().map(|v| v.position[1]).fold(0.0, f32::max);
    assert_eq!(max_y, 3.0);
    for vertex in &vertices {
        assert_eq!(vertex.flag, VertexFlag::Water as u32 as f32);
    }
}

#[test]
fn unsupported_water_uses_the_lowered_surface() {
    let mut view = ArrayChunkView::empty();
    let water = view.add_block(water());
    view.set(8, 2, 8, water);

    let mesh = tessellator().generate_mesh(&view, 64, 0).unwrap();
    let buffers = mesh.buffers(RenderCategory::WaterAndIce);
    // All six faces, as the lowered variants.
    assert_eq!(buffers.vertex_count(), 24);

    let vertices = unpack_vertices(buffers);
    let max_y = vertices.iter().map(|v| v.position[1]).fold(0.0, f32::max);
    assert_eq!(max_y, 2.0 + LOWERED_TOP);
}

#[test]
fn stacked_water_hides_the_interface() {
    let mut view = ArrayChunkView::empty();
    let stone = view.add_block(stone());
    let water = view.add_block(water());
    view.set(8, 1, 8, stone);
    view.set(8, 2, 8, water);
    view.set(8, 3, 8, water);

    let mesh = tessellator().generate_mesh(&view, 64, 0).unwrap();
    let buffers = mesh.buffers(RenderCategory::WaterAndIce);
    // Lower block: four full sides (no top against the liquid above, no
    // bottom against the stone). Upper block sits on liquid, so it takes the
    // lowered path: top and four sides.
    assert_eq!(buffers.vertex_count(), 36);

    let vertices = unpack_vertices(buffers);
    let max_y = vertices.iter().map(|v| v.position[1]).fold(0.0, f32::max);
    assert_eq!(max_y, 3.0 + LOWERED_TOP);
}

#[test]
fn grass_sides_are_color_masked() {
    let mut view = ArrayChunkView::empty();
    let grass = view.add_block(grass());
    view.set(8, 2, 8, grass);

    let mesh = tessellator().generate_mesh(&view, 64, 0).unwrap();
    let vertices = unpack_vertices(mesh.buffers(RenderCategory::Opaque));
    assert_eq!(vertices.len(), 24);

    let expected_color =
        Rgba::from_packed(ColorSource::GrassLut.sample(Biome::TEMPERATE).packed());
    for vertex in &vertices {
        let expected_flag = if vertex.normal[1] != 0.0 {
            VertexFlag::Normal
        } else {
            VertexFlag::ColorMask
        };
        assert_eq!(
            vertex.flag, expected_flag as u32 as f32,
            "flag for normal {:?}",
            vertex.normal
        );
        assert_eq!(vertex.color, expected_color);
    }
}

#[test]
fn foliage_is_a_waving_billboard() {
    let mut view = ArrayChunkView::empty();
    let foliage = view.add_block(foliage());
    view.set(8, 2, 8, foliage);

    let mesh = tessellator().generate_mesh(&view, 64, 0).unwrap();
    let buffers = mesh.buffers(RenderCategory::Billboard);
    assert_eq!(buffers.vertex_count(), 8);
    assert_eq!(buffers.index_data().len(), 12);
    for vertex in unpack_vertices(buffers) {
        assert_eq!(vertex.flag, VertexFlag::Waving as u32 as f32);
    }
    assert_eq!(mesh.buffers(RenderCategory::Opaque).vertex_count(), 0);
}

#[test]
fn vertex_lighting_reaches_the_packed_buffer() {
    let mut view = ArrayChunkView::empty();
    let stone = view.add_block(stone());
    view.set(8, 2, 8, stone);
    view.set_sunlight(15);
    view.set_light(10);

    let mesh = tessellator().generate_mesh(&view, 64, 0).unwrap();
    let vertices = unpack_vertices(mesh.buffers(RenderCategory::Opaque));
    let top: Vec<&UnpackedVertex> = vertices
        .iter()
        .filter(|v| v.normal == [0.0, 1.0, 0.0])
        .collect();
    assert_eq!(top.len(), 4);
    for vertex in top {
        assert_eq!(vertex.light, [1.0, 10.0 / 15.0, 1.0]);
    }
}

#[test]
fn a_neighboring_cube_occludes_a_top_vertex() {
    let mut view = ArrayChunkView::empty();
    let stone = view.add_block(stone());
    view.set(8, 2, 8, stone);
    // Diagonally above the (8, 3, 8) corner of the first cube's top face.
    view.set(7, 3, 8, stone);

    let mesh = tessellator().generate_mesh(&view, 64, 0).unwrap();
    let vertices = unpack_vertices(mesh.buffers(RenderCategory::Opaque));
    let corner: Vec<&UnpackedVertex> = vertices
        .iter()
        .filter(|v| v.position == [8.0, 3.0, 8.0] && v.normal == [0.0, 1.0, 0.0])
        .collect();
    assert_eq!(corner.len(), 1);
    // One of the four occlusion samples hits the neighboring cube:
    // (0.4^1 + 0.8^0) / 2.
    assert_eq!(corner[0].light[2], 0.7);
}

#[test]
fn tint_survives_packing() {
    let tint = Rgba::new(0.5, 0.25, 1.0, 1.0);
    let tinted = Block::builder()
        .color_source(ColorSource::Solid(tint))
        .appearance(cube_appearance())
        .build();

    let mut view = ArrayChunkView::empty();
    let tinted = view.add_block(tinted);
    view.set(8, 2, 8, tinted);

    let mesh = tessellator().generate_mesh(&view, 64, 0).unwrap();
    for vertex in unpack_vertices(mesh.buffers(RenderCategory::Opaque)) {
        assert_eq!(vertex.color, Rgba::from_packed(tint.packed()));
    }
}

#[test]
fn each_face_gets_its_own_tint() {
    let red = Rgba::new(1.0, 0.0, 0.0, 1.0);
    // A grass-like cube: tinted top, untinted everything else.
    let capped = Block::builder()
        .appearance(cube_appearance())
        .color_source_for(BlockPart::Top, ColorSource::Solid(red))
        .build();

    let mut view = ArrayChunkView::empty();
    let capped = view.add_block(capped);
    view.set(8, 2, 8, capped);

    let mesh = tessellator().generate_mesh(&view, 64, 0).unwrap();
    let vertices = unpack_vertices(mesh.buffers(RenderCategory::Opaque));
    assert_eq!(vertices.len(), 24);
    for vertex in &vertices {
        let expected = if vertex.normal == [0.0, 1.0, 0.0] {
            Rgba::from_packed(red.packed())
        } else {
            Rgba::WHITE
        };
        assert_eq!(vertex.color, expected, "tint for normal {:?}", vertex.normal);
    }
}

#[test]
fn update_count_is_monotonic() {
    let view = ArrayChunkView::empty();
    let before = mesh_update_count();
    let _mesh = tessellator().generate_mesh(&view, 4, 0).unwrap();
    assert!(mesh_update_count() > before);
}

#[test]
fn mesh_pool_exhaustion_is_reported() {
    let pool = Arc::new(Pool::new(PoolConfig {
        max_total: 1,
        ..PoolConfig::default()
    }));
    let tessellator = Tessellator::new(Arc::clone(&pool));
    let view = ArrayChunkView::empty();

    let held = tessellator.generate_mesh(&view, 4, 0).unwrap();
    assert_eq!(
        tessellator.generate_mesh(&view, 4, 0).unwrap_err(),
        MeshError::OutputPool(PoolError::Exhausted { max_total: 1 })
    );
    drop(held);
    assert!(tessellator.generate_mesh(&view, 4, 0).is_ok());
}

#[test]
fn returned_meshes_come_back_reset() {
    let pool = Arc::new(Pool::new(PoolConfig::default()));
    let tessellator = Tessellator::new(Arc::clone(&pool));

    let mut view = ArrayChunkView::empty();
    let stone = view.add_block(stone());
    view.set(8, 2, 8, stone);

    let mesh = tessellator.generate_mesh(&view, 64, 0).unwrap();
    assert!(!mesh.is_empty());
    drop(mesh);

    assert_eq!(pool.idle_count(), 1);
    let recycled: crate::Pooled<PackedMesh> = pool.acquire().unwrap();
    assert!(recycled.is_empty());
    assert_eq!(recycled.packing_time(), core::time::Duration::ZERO);
}

#[test]
fn missing_lowered_mesh_is_an_invariant_violation() {
    // A liquid block defined without lowered-surface meshes.
    let broken = Block::builder()
        .liquid(true)
        .water(true)
        .translucent(true)
        .appearance(cube_appearance())
        .build();

    let mut view = ArrayChunkView::empty();
    let broken = view.add_block(broken);
    view.set(8, 2, 8, broken);

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        tessellator().generate_mesh(&view, 64, 0).unwrap();
    }));
    assert!(result.is_err());
}
