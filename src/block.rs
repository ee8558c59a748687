//! Block type descriptors and the chunk data access trait.

use core::fmt;
use std::sync::Arc;

use crate::math::{BlockPart, FreePoint, GridCoordinate, Rgba, Side, SideMap};
use crate::mesh_part::MeshPart;

/// Chunk extent along the X axis, in blocks.
pub const CHUNK_SIZE_X: GridCoordinate = 32;
/// Chunk extent along the Y (vertical) axis, in blocks.
pub const CHUNK_SIZE_Y: GridCoordinate = 64;
/// Chunk extent along the Z axis, in blocks.
pub const CHUNK_SIZE_Z: GridCoordinate = 32;

/// Climate parameters of one column of the world, used to tint
/// biome-sensitive blocks (grass, foliage, water).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Biome {
    /// Normalized temperature in `0..=1`.
    pub temperature: f32,
    /// Normalized humidity in `0..=1`.
    pub humidity: f32,
}

impl Biome {
    /// A middle-of-the-road climate; useful as a default.
    pub const TEMPERATE: Biome = Biome {
        temperature: 0.5,
        humidity: 0.5,
    };
}

/// Read-only access to the voxel volume being tessellated, plus a halo of at
/// least one block of neighboring data in every direction.
///
/// The tessellator samples blocks, biomes and light levels at positions from
/// `-1` to one past each chunk dimension (fractional positions are floored),
/// and treats all returned data as an immutable snapshot for the duration of
/// one [`generate_mesh()`](crate::Tessellator::generate_mesh) call.
pub trait ChunkView {
    /// Returns the block at the given chunk-local position.
    fn block(&self, x: GridCoordinate, y: GridCoordinate, z: GridCoordinate) -> &Block;

    /// Returns the biome at the given chunk-local position.
    fn biome(&self, x: GridCoordinate, y: GridCoordinate, z: GridCoordinate) -> Biome;

    /// Returns the sunlight level (`0..=15`) at the given position.
    fn sunlight(&self, x: GridCoordinate, y: GridCoordinate, z: GridCoordinate) -> u8;

    /// Returns the block-light level (`0..=15`) at the given position.
    fn light(&self, x: GridCoordinate, y: GridCoordinate, z: GridCoordinate) -> u8;

    /// [`block()`](Self::block) at a fractional position, flooring each
    /// coordinate.
    fn block_at(&self, position: FreePoint) -> &Block {
        let p = floor(position);
        self.block(p[0], p[1], p[2])
    }

    /// [`sunlight()`](Self::sunlight) at a fractional position, flooring each
    /// coordinate.
    fn sunlight_at(&self, position: FreePoint) -> u8 {
        let p = floor(position);
        self.sunlight(p[0], p[1], p[2])
    }

    /// [`light()`](Self::light) at a fractional position, flooring each
    /// coordinate.
    fn light_at(&self, position: FreePoint) -> u8 {
        let p = floor(position);
        self.light(p[0], p[1], p[2])
    }
}

#[inline]
fn floor(position: FreePoint) -> [GridCoordinate; 3] {
    [
        position.x.floor() as GridCoordinate,
        position.y.floor() as GridCoordinate,
        position.z.floor() as GridCoordinate,
    ]
}

/// The set of mesh parts a block presents, given its surroundings: optional
/// center geometry plus up to six face parts.
///
/// Cloning is cheap; the parts are shared.
#[derive(Clone, Debug, Default)]
pub struct BlockAppearance {
    center: Option<Arc<MeshPart>>,
    sides: SideMap<Option<Arc<MeshPart>>>,
}

impl BlockAppearance {
    /// Constructs an appearance from its parts.
    pub fn new(center: Option<MeshPart>, sides: SideMap<Option<MeshPart>>) -> Self {
        Self {
            center: center.map(Arc::new),
            sides: sides.map(|_, part| part.map(Arc::new)),
        }
    }

    /// Returns the mesh part for the given block part, if the block has one.
    #[inline]
    pub fn part(&self, part: BlockPart) -> Option<&MeshPart> {
        match part.side() {
            None => self.center.as_deref(),
            Some(side) => self.sides[side].as_deref(),
        }
    }

    /// Returns the mesh part for the given face, if the block has one.
    #[inline]
    pub fn side(&self, side: Side) -> Option<&MeshPart> {
        self.sides[side].as_deref()
    }
}

/// How a block's vertex tint is derived.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColorSource {
    /// A fixed color, unaffected by climate. [`Rgba::WHITE`] leaves the
    /// texture unmodified.
    Solid(Rgba),
    /// The grass color ramp over biome temperature and humidity.
    GrassLut,
    /// The foliage color ramp over biome temperature and humidity.
    FoliageLut,
}

impl ColorSource {
    /// Computes the tint for the given climate.
    pub fn sample(self, biome: Biome) -> Rgba {
        match self {
            ColorSource::Solid(color) => color,
            ColorSource::GrassLut => ramp(
                Rgba::new(0.75, 0.70, 0.33, 1.0),
                Rgba::new(0.35, 0.65, 0.25, 1.0),
                Rgba::new(0.50, 0.70, 0.45, 1.0),
                biome,
            ),
            ColorSource::FoliageLut => ramp(
                Rgba::new(0.68, 0.65, 0.30, 1.0),
                Rgba::new(0.23, 0.52, 0.17, 1.0),
                Rgba::new(0.38, 0.60, 0.35, 1.0),
                biome,
            ),
        }
    }
}

/// Bilinear climate ramp: cold climates pull toward `cold`, warm ones blend
/// from `arid` to `lush` with increasing humidity. Humidity is scaled by
/// temperature, matching the usual triangular climate color map.
fn ramp(arid: Rgba, lush: Rgba, cold: Rgba, biome: Biome) -> Rgba {
    let t = biome.temperature.clamp(0.0, 1.0);
    let h = biome.humidity.clamp(0.0, 1.0) * t;
    cold.lerp(arid.lerp(lush, h), t)
}

/// Appearance selection: either the same parts regardless of surroundings, or
/// a function of the six adjacent blocks (connected/contextual textures).
#[derive(Clone)]
enum AppearanceRule {
    Uniform(BlockAppearance),
    Connected(Arc<dyn Fn(&SideMap<&Block>) -> BlockAppearance + Send + Sync>),
}

impl fmt::Debug for AppearanceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppearanceRule::Uniform(appearance) => {
                f.debug_tuple("Uniform").field(appearance).finish()
            }
            AppearanceRule::Connected(_) => f.write_str("Connected(..)"),
        }
    }
}

/// Immutable description of one block type: its render-relevant flags, its
/// appearance, and its tint behavior.
///
/// Constructed with [`Block::builder()`]; the tessellator only reads it.
#[derive(Clone, Debug)]
pub struct Block {
    invisible: bool,
    translucent: bool,
    liquid: bool,
    water: bool,
    lava: bool,
    ice: bool,
    waving: bool,
    double_sided: bool,
    shadow_casting: bool,
    grass: bool,
    full_sides: SideMap<bool>,
    center_color_source: ColorSource,
    side_color_sources: SideMap<ColorSource>,
    appearance: AppearanceRule,
    lowered_liquid: SideMap<Option<Arc<MeshPart>>>,
}

impl Block {
    /// Starts building a block type. The default is an opaque, shadow-casting
    /// full cube with no mesh parts and a white tint.
    pub fn builder() -> BlockBuilder {
        BlockBuilder::default()
    }

    /// True if the block contributes no geometry at all (e.g. air).
    #[inline]
    pub fn is_invisible(&self) -> bool {
        self.invisible
    }

    /// True if light passes through the block.
    #[inline]
    pub fn is_translucent(&self) -> bool {
        self.translucent
    }

    /// True if the block is a liquid (water, lava, …).
    #[inline]
    pub fn is_liquid(&self) -> bool {
        self.liquid
    }

    /// True if the block is water.
    #[inline]
    pub fn is_water(&self) -> bool {
        self.water
    }

    /// True if the block is lava.
    #[inline]
    pub fn is_lava(&self) -> bool {
        self.lava
    }

    /// True if the block is ice.
    #[inline]
    pub fn is_ice(&self) -> bool {
        self.ice
    }

    /// True if the block's vertices wave in the wind.
    #[inline]
    pub fn is_waving(&self) -> bool {
        self.waving
    }

    /// True if the block is rendered double-sided (billboard foliage).
    #[inline]
    pub fn is_double_sided(&self) -> bool {
        self.double_sided
    }

    /// True if the block occludes light for ambient-occlusion purposes.
    #[inline]
    pub fn is_shadow_casting(&self) -> bool {
        self.shadow_casting
    }

    /// True if the block uses the grass side-tinting special case.
    #[inline]
    pub fn is_grass(&self) -> bool {
        self.grass
    }

    /// True if the given face of this block completely covers the unit square,
    /// so that an adjacent block's touching face is fully hidden behind it.
    #[inline]
    pub fn is_full_side(&self, side: Side) -> bool {
        self.full_sides[side]
    }

    /// Computes this block's appearance given its six neighbors.
    pub fn appearance(&self, neighbors: &SideMap<&Block>) -> BlockAppearance {
        match &self.appearance {
            AppearanceRule::Uniform(appearance) => appearance.clone(),
            AppearanceRule::Connected(f) => f(neighbors),
        }
    }

    /// Returns the tint behavior of the given part of this block's mesh.
    #[inline]
    pub fn color_source(&self, part: BlockPart) -> ColorSource {
        match part.side() {
            None => self.center_color_source,
            Some(side) => self.side_color_sources[side],
        }
    }

    /// Computes the vertex tint for the given part of this block's mesh under
    /// the given climate.
    #[inline]
    pub fn color_offset(&self, part: BlockPart, biome: Biome) -> Rgba {
        self.color_source(part).sample(biome)
    }

    /// Returns the mesh variant used for the given face when this liquid
    /// block's surface is lowered to meet a lower neighboring liquid.
    #[inline]
    pub fn lowered_liquid_mesh(&self, side: Side) -> Option<&MeshPart> {
        self.lowered_liquid[side].as_deref()
    }
}

/// Builder for [`Block`]. See [`Block::builder()`].
#[derive(Clone, Debug)]
#[must_use]
pub struct BlockBuilder {
    block: Block,
}

impl Default for BlockBuilder {
    fn default() -> Self {
        Self {
            block: Block {
                invisible: false,
                translucent: false,
                liquid: false,
                water: false,
                lava: false,
                ice: false,
                waving: false,
                double_sided: false,
                shadow_casting: true,
                grass: false,
                full_sides: SideMap::splat(true),
                center_color_source: ColorSource::Solid(Rgba::WHITE),
                side_color_sources: SideMap::splat(ColorSource::Solid(Rgba::WHITE)),
                appearance: AppearanceRule::Uniform(BlockAppearance::default()),
                lowered_liquid: SideMap::splat(None),
            },
        }
    }
}

impl BlockBuilder {
    /// Sets whether the block is invisible. Invisible blocks are skipped
    /// entirely and never hide neighboring faces.
    pub fn invisible(mut self, invisible: bool) -> Self {
        self.block.invisible = invisible;
        self
    }

    /// Sets whether light passes through the block.
    pub fn translucent(mut self, translucent: bool) -> Self {
        self.block.translucent = translucent;
        self
    }

    /// Sets whether the block is a liquid.
    pub fn liquid(mut self, liquid: bool) -> Self {
        self.block.liquid = liquid;
        self
    }

    /// Sets whether the block is water. Water blocks should also be liquids.
    pub fn water(mut self, water: bool) -> Self {
        self.block.water = water;
        self
    }

    /// Sets whether the block is lava. Lava blocks should also be liquids.
    pub fn lava(mut self, lava: bool) -> Self {
        self.block.lava = lava;
        self
    }

    /// Sets whether the block is ice.
    pub fn ice(mut self, ice: bool) -> Self {
        self.block.ice = ice;
        self
    }

    /// Sets whether the block's vertices wave in the wind.
    pub fn waving(mut self, waving: bool) -> Self {
        self.block.waving = waving;
        self
    }

    /// Sets whether the block renders double-sided.
    pub fn double_sided(mut self, double_sided: bool) -> Self {
        self.block.double_sided = double_sided;
        self
    }

    /// Sets whether the block occludes for ambient occlusion.
    pub fn shadow_casting(mut self, shadow_casting: bool) -> Self {
        self.block.shadow_casting = shadow_casting;
        self
    }

    /// Sets whether the block uses the grass side-tinting special case.
    pub fn grass(mut self, grass: bool) -> Self {
        self.block.grass = grass;
        self
    }

    /// Sets, per face, whether the face completely covers the unit square.
    pub fn full_sides(mut self, full_sides: SideMap<bool>) -> Self {
        self.block.full_sides = full_sides;
        self
    }

    /// Gives the block the same appearance regardless of its surroundings.
    pub fn appearance(mut self, appearance: BlockAppearance) -> Self {
        self.block.appearance = AppearanceRule::Uniform(appearance);
        self
    }

    /// Gives the block an appearance computed from its six adjacent blocks,
    /// for connected/contextual textures.
    pub fn connected_appearance(
        mut self,
        f: impl Fn(&SideMap<&Block>) -> BlockAppearance + Send + Sync + 'static,
    ) -> Self {
        self.block.appearance = AppearanceRule::Connected(Arc::new(f));
        self
    }

    /// Sets the tint behavior of every part of the block.
    pub fn color_source(mut self, color_source: ColorSource) -> Self {
        self.block.center_color_source = color_source;
        self.block.side_color_sources = SideMap::splat(color_source);
        self
    }

    /// Sets the tint behavior of one part of the block, leaving the others
    /// unchanged (a grass cube tints its top but not its bottom).
    pub fn color_source_for(mut self, part: BlockPart, color_source: ColorSource) -> Self {
        match part.side() {
            None => self.block.center_color_source = color_source,
            Some(side) => self.block.side_color_sources[side] = color_source,
        }
        self
    }

    /// Sets the per-face mesh variants used when this liquid block's surface
    /// is lowered. Required for liquid blocks.
    pub fn lowered_liquid(mut self, parts: SideMap<Option<MeshPart>>) -> Self {
        self.block.lowered_liquid = parts.map(|_, part| part.map(Arc::new));
        self
    }

    /// Finishes construction.
    pub fn build(self) -> Block {
        self.block
    }
}
