//! Tools for testing this crate and code using this crate: canned block
//! types with simple geometry, an array-backed [`ChunkView`], and a packed
//! vertex decoder.
//!
//! Do not rely on anything in this module in production code.

use crate::accumulator::RenderCategory;
use crate::block::{
    Biome, Block, BlockAppearance, CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z, ChunkView, ColorSource,
};
use crate::math::{FreePoint, FreeVector, GridCoordinate, Rgba, Side, SideMap, TexPoint};
use crate::mesh_part::MeshPart;
use crate::packed::{PackedBuffers, PackedMesh, WORDS_PER_VERTEX, vertex_layout};

use euclid::{point2, point3, vec3};

/// Builds a quad from four corner positions sharing one normal, with the
/// standard `(0,0)..(1,1)` texture coordinates.
pub fn quad(corners: [[f32; 3]; 4], normal: FreeVector) -> MeshPart {
    let positions: Vec<FreePoint> = corners
        .iter()
        .map(|&[x, y, z]| point3(x, y, z))
        .collect();
    let tex_coords: Vec<TexPoint> = vec![
        point2(0.0, 0.0),
        point2(1.0, 0.0),
        point2(1.0, 1.0),
        point2(0.0, 1.0),
    ];
    MeshPart::new(positions, vec![normal; 4], tex_coords, vec![0, 1, 2, 0, 2, 3])
}

/// One face of the unit cube `[0, 1]³`, with `top` as the Y coordinate of its
/// upper edge (1.0 for a full cube).
fn cube_face(side: Side, top: f32) -> MeshPart {
    let t = top;
    let corners = match side {
        Side::Top => [[0., t, 0.], [1., t, 0.], [1., t, 1.], [0., t, 1.]],
        Side::Bottom => [[0., 0., 0.], [0., 0., 1.], [1., 0., 1.], [1., 0., 0.]],
        Side::Left => [[0., 0., 0.], [0., 0., 1.], [0., t, 1.], [0., t, 0.]],
        Side::Right => [[1., 0., 0.], [1., t, 0.], [1., t, 1.], [1., 0., 1.]],
        Side::Front => [[0., 0., 0.], [0., t, 0.], [1., t, 0.], [1., 0., 0.]],
        Side::Back => [[0., 0., 1.], [1., 0., 1.], [1., t, 1.], [0., t, 1.]],
    };
    quad(corners, side.normal().to_f32())
}

/// A full unit-cube face quad for the given side.
pub fn face_part(side: Side) -> MeshPart {
    cube_face(side, 1.0)
}

/// Y coordinate of a lowered liquid surface.
pub const LOWERED_TOP: f32 = 0.875;

/// The appearance of a plain cube block: six face quads and no center
/// geometry.
pub fn cube_appearance() -> BlockAppearance {
    BlockAppearance::new(None, SideMap::from_fn(|side| Some(face_part(side))))
}

/// Two crossed diagonal quads filling the unit cube, as used by plant
/// billboards. 8 vertices, 12 indices.
pub fn cross_part() -> MeshPart {
    let d = 0.70710678f32;
    let a = quad(
        [[0., 0., 0.], [1., 0., 1.], [1., 1., 1.], [0., 1., 0.]],
        vec3(-d, 0., d),
    );
    let b = quad(
        [[0., 0., 1.], [1., 0., 0.], [1., 1., 0.], [0., 1., 1.]],
        vec3(d, 0., d),
    );

    let positions: Vec<FreePoint> = (0..4)
        .map(|i| a.position(i))
        .chain((0..4).map(|i| b.position(i)))
        .collect();
    let normals: Vec<FreeVector> = (0..4)
        .map(|i| a.normal(i))
        .chain((0..4).map(|i| b.normal(i)))
        .collect();
    let tex_coords: Vec<TexPoint> = (0..4)
        .map(|i| a.tex_coord(i))
        .chain((0..4).map(|i| b.tex_coord(i)))
        .collect();
    let indices: Vec<u32> = (0..6)
        .map(|i| a.index(i))
        .chain((0..6).map(|i| b.index(i) + 4))
        .collect();
    MeshPart::new(positions, normals, tex_coords, indices)
}

/// Air: invisible and unlit-shadowless; hides nothing.
pub fn air() -> Block {
    Block::builder()
        .invisible(true)
        .translucent(true)
        .shadow_casting(false)
        .full_sides(SideMap::splat(false))
        .build()
}

/// An ordinary opaque full cube.
pub fn stone() -> Block {
    Block::builder().appearance(cube_appearance()).build()
}

/// Water: a translucent liquid with lowered-surface meshes on every side.
pub fn water() -> Block {
    Block::builder()
        .liquid(true)
        .water(true)
        .translucent(true)
        .shadow_casting(false)
        .appearance(cube_appearance())
        .lowered_liquid(SideMap::from_fn(|side| Some(cube_face(side, LOWERED_TOP))))
        .build()
}

/// A grass cube: biome-tinted, with the side-face color-mask treatment.
pub fn grass() -> Block {
    Block::builder()
        .grass(true)
        .color_source(ColorSource::GrassLut)
        .appearance(cube_appearance())
        .build()
}

/// A plant billboard: waving crossed quads, biome-tinted.
pub fn foliage() -> Block {
    Block::builder()
        .translucent(true)
        .waving(true)
        .double_sided(true)
        .shadow_casting(false)
        .full_sides(SideMap::splat(false))
        .color_source(ColorSource::FoliageLut)
        .appearance(BlockAppearance::new(Some(cross_part()), SideMap::splat(None)))
        .build()
}

/// A [`ChunkView`] over a dense palette-indexed block array covering one full
/// chunk, with uniform light levels and biome. Positions outside the chunk
/// (the halo) read as the palette's first entry, which is always air.
#[derive(Clone, Debug)]
pub struct ArrayChunkView {
    palette: Vec<Block>,
    contents: Vec<u8>,
    sunlight: u8,
    light: u8,
    biome: Biome,
}

impl ArrayChunkView {
    /// A chunk of nothing but air, under full sunlight.
    pub fn empty() -> Self {
        Self {
            palette: vec![air()],
            contents: vec![0; (CHUNK_SIZE_X * CHUNK_SIZE_Y * CHUNK_SIZE_Z) as usize],
            sunlight: 15,
            light: 0,
            biome: Biome::TEMPERATE,
        }
    }

    /// Registers a block type and returns its palette index for
    /// [`set()`](Self::set).
    pub fn add_block(&mut self, block: Block) -> u8 {
        let index = u8::try_from(self.palette.len()).unwrap();
        self.palette.push(block);
        index
    }

    /// Places the given palette entry at a position.
    ///
    /// Panics if the position is outside the chunk.
    pub fn set(&mut self, x: GridCoordinate, y: GridCoordinate, z: GridCoordinate, index: u8) {
        assert!((index as usize) < self.palette.len(), "unregistered palette index");
        let i = Self::index(x, y, z).expect("position outside the chunk");
        self.contents[i] = index;
    }

    /// Sets the uniform sunlight level.
    pub fn set_sunlight(&mut self, level: u8) {
        self.sunlight = level;
    }

    /// Sets the uniform block-light level.
    pub fn set_light(&mut self, level: u8) {
        self.light = level;
    }

    /// Sets the uniform biome.
    pub fn set_biome(&mut self, biome: Biome) {
        self.biome = biome;
    }

    fn index(x: GridCoordinate, y: GridCoordinate, z: GridCoordinate) -> Option<usize> {
        if (0..CHUNK_SIZE_X).contains(&x)
            && (0..CHUNK_SIZE_Y).contains(&y)
            && (0..CHUNK_SIZE_Z).contains(&z)
        {
            Some(((x * CHUNK_SIZE_Z + z) * CHUNK_SIZE_Y + y) as usize)
        } else {
            None
        }
    }
}

impl ChunkView for ArrayChunkView {
    fn block(&self, x: GridCoordinate, y: GridCoordinate, z: GridCoordinate) -> &Block {
        match Self::index(x, y, z) {
            Some(i) => &self.palette[self.contents[i] as usize],
            None => &self.palette[0],
        }
    }

    fn biome(&self, _x: GridCoordinate, _y: GridCoordinate, _z: GridCoordinate) -> Biome {
        self.biome
    }

    fn sunlight(&self, _x: GridCoordinate, _y: GridCoordinate, _z: GridCoordinate) -> u8 {
        self.sunlight
    }

    fn light(&self, _x: GridCoordinate, _y: GridCoordinate, _z: GridCoordinate) -> u8 {
        self.light
    }
}

/// One vertex decoded back out of a packed buffer, for asserting on mesh
/// contents.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnpackedVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub flag: f32,
    pub light: [f32; 3],
    pub color: Rgba,
    pub normal: [f32; 3],
}

/// Decodes every vertex in `buffers`.
pub fn unpack_vertices(buffers: &PackedBuffers) -> Vec<UnpackedVertex> {
    let f = f32::from_bits;
    buffers
        .vertex_data()
        .chunks_exact(WORDS_PER_VERTEX)
        .map(|words| UnpackedVertex {
            position: [
                f(words[vertex_layout::POSITION]),
                f(words[vertex_layout::POSITION + 1]),
                f(words[vertex_layout::POSITION + 2]),
            ],
            uv: [f(words[vertex_layout::UV0]), f(words[vertex_layout::UV0 + 1])],
            flag: f(words[vertex_layout::FLAGS]),
            light: [
                f(words[vertex_layout::LIGHT]),
                f(words[vertex_layout::LIGHT + 1]),
                f(words[vertex_layout::LIGHT + 2]),
            ],
            color: Rgba::from_packed(words[vertex_layout::PACKED_COLOR]),
            normal: [
                f(words[vertex_layout::NORMAL]),
                f(words[vertex_layout::NORMAL + 1]),
                f(words[vertex_layout::NORMAL + 2]),
            ],
        })
        .collect()
}

/// The total number of vertices across all categories of a mesh.
pub fn total_vertex_count(mesh: &PackedMesh) -> usize {
    RenderCategory::ALL
        .iter()
        .map(|&category| mesh.buffers(category).vertex_count())
        .sum()
}
