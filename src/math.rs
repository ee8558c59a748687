//! Coordinate types, cube sides, and color math used throughout the crate.

use core::fmt;
use core::ops;

use euclid::{Point2D, Point3D, Rotation3D, Vector3D, vec3};

/// Unit-of-measure tag for positions and directions in chunk-local space.
///
/// One unit is the edge length of one block; the origin is the lower corner
/// of the chunk being tessellated.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChunkSpace {}

/// Unit-of-measure tag for positions within a texture atlas, in `0..=1`
/// normalized coordinates.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AtlasSpace {}

/// Numeric type for continuous (non-grid-aligned) coordinates.
///
/// This is `f32` rather than `f64` because the packed vertex format stores
/// 32-bit words; using wider intermediates would only introduce double
/// rounding.
pub type FreeCoordinate = f32;

/// Numeric type for grid-aligned (block) coordinates.
pub type GridCoordinate = i32;

/// A continuous position in chunk-local space.
pub type FreePoint = Point3D<FreeCoordinate, ChunkSpace>;

/// A continuous direction or offset in chunk-local space.
pub type FreeVector = Vector3D<FreeCoordinate, ChunkSpace>;

/// A block-aligned offset in chunk-local space.
pub type GridVector = Vector3D<GridCoordinate, ChunkSpace>;

/// A texture coordinate within the block texture atlas.
pub type TexPoint = Point2D<f32, AtlasSpace>;

/// A rotation of chunk-local geometry, stored as a quaternion.
pub type Rotation = Rotation3D<FreeCoordinate, ChunkSpace, ChunkSpace>;

/// Identifies one of the six faces of a block, or equivalently an axis-aligned
/// unit vector.
///
/// See also [`BlockPart`], which adds a “center” variant for geometry that is
/// not attached to any particular face.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum Side {
    /// The face whose outward normal is `(0, 1, 0)`; upward.
    Top = 0,
    /// The face whose outward normal is `(0, -1, 0)`; downward.
    Bottom = 1,
    /// The face whose outward normal is `(-1, 0, 0)`.
    Left = 2,
    /// The face whose outward normal is `(1, 0, 0)`.
    Right = 3,
    /// The face whose outward normal is `(0, 0, -1)`.
    Front = 4,
    /// The face whose outward normal is `(0, 0, 1)`.
    Back = 5,
}

impl Side {
    /// All the values of [`Side`].
    pub const ALL: [Side; 6] = [
        Side::Top,
        Side::Bottom,
        Side::Left,
        Side::Right,
        Side::Front,
        Side::Back,
    ];

    /// The four sides lying in the horizontal plane.
    pub const HORIZONTAL: [Side; 4] = [Side::Left, Side::Right, Side::Front, Side::Back];

    /// Returns the side on the opposite face of the block.
    #[inline]
    pub const fn opposite(self) -> Side {
        match self {
            Side::Top => Side::Bottom,
            Side::Bottom => Side::Top,
            Side::Left => Side::Right,
            Side::Right => Side::Left,
            Side::Front => Side::Back,
            Side::Back => Side::Front,
        }
    }

    /// Returns the outward unit normal of this side as a grid vector.
    #[inline]
    pub fn normal(self) -> GridVector {
        match self {
            Side::Top => vec3(0, 1, 0),
            Side::Bottom => vec3(0, -1, 0),
            Side::Left => vec3(-1, 0, 0),
            Side::Right => vec3(1, 0, 0),
            Side::Front => vec3(0, 0, -1),
            Side::Back => vec3(0, 0, 1),
        }
    }

    /// Returns the [`Side`] whose normal vector is closest in direction to the
    /// given vector.
    ///
    /// Ties are broken by preferring the vertical axis, then the lateral (X)
    /// axis; a zero vector yields [`Side::Bottom`]. The input need not be
    /// normalized.
    #[inline]
    pub fn closest_to(vector: FreeVector) -> Side {
        let Vector3D { x, y, z, _unit } = vector;
        if x.abs() > y.abs() && x.abs() > z.abs() {
            if x > 0.0 { Side::Right } else { Side::Left }
        } else if z.abs() > x.abs() && z.abs() > y.abs() {
            if z > 0.0 { Side::Back } else { Side::Front }
        } else if y > 0.0 {
            Side::Top
        } else {
            Side::Bottom
        }
    }
}

/// Identifies one part of a block's mesh: one of the six faces, or the
/// [`Center`](BlockPart::Center) geometry which is always emitted when the
/// block is visible (used for cross/billboard shapes).
///
/// This is essentially `Option<`[`Side`]`>`, except with part-specific methods
/// provided.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum BlockPart {
    /// Geometry in the interior of the block, not associated with a face.
    Center,
    /// See [`Side::Top`].
    Top,
    /// See [`Side::Bottom`].
    Bottom,
    /// See [`Side::Left`].
    Left,
    /// See [`Side::Right`].
    Right,
    /// See [`Side::Front`].
    Front,
    /// See [`Side::Back`].
    Back,
}

impl BlockPart {
    /// All the values of [`BlockPart`].
    pub const ALL: [BlockPart; 7] = [
        BlockPart::Center,
        BlockPart::Top,
        BlockPart::Bottom,
        BlockPart::Left,
        BlockPart::Right,
        BlockPart::Front,
        BlockPart::Back,
    ];

    /// Returns the part corresponding to the given face.
    #[inline]
    pub const fn from_side(side: Side) -> BlockPart {
        match side {
            Side::Top => BlockPart::Top,
            Side::Bottom => BlockPart::Bottom,
            Side::Left => BlockPart::Left,
            Side::Right => BlockPart::Right,
            Side::Front => BlockPart::Front,
            Side::Back => BlockPart::Back,
        }
    }

    /// Returns the face this part is attached to, or [`None`] for
    /// [`BlockPart::Center`].
    #[inline]
    pub const fn side(self) -> Option<Side> {
        match self {
            BlockPart::Center => None,
            BlockPart::Top => Some(Side::Top),
            BlockPart::Bottom => Some(Side::Bottom),
            BlockPart::Left => Some(Side::Left),
            BlockPart::Right => Some(Side::Right),
            BlockPart::Front => Some(Side::Front),
            BlockPart::Back => Some(Side::Back),
        }
    }
}

/// Container for values keyed by [`Side`]. Always holds exactly six elements.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct SideMap<V> {
    /// The value whose key is [`Side::Top`].
    pub top: V,
    /// The value whose key is [`Side::Bottom`].
    pub bottom: V,
    /// The value whose key is [`Side::Left`].
    pub left: V,
    /// The value whose key is [`Side::Right`].
    pub right: V,
    /// The value whose key is [`Side::Front`].
    pub front: V,
    /// The value whose key is [`Side::Back`].
    pub back: V,
}

impl<V> SideMap<V> {
    /// Constructs a [`SideMap`] by using the provided function to compute
    /// a value for each [`Side`] enum variant.
    #[inline]
    pub fn from_fn(mut f: impl FnMut(Side) -> V) -> Self {
        Self {
            top: f(Side::Top),
            bottom: f(Side::Bottom),
            left: f(Side::Left),
            right: f(Side::Right),
            front: f(Side::Front),
            back: f(Side::Back),
        }
    }

    /// Transforms the values while keeping the keys.
    #[inline]
    pub fn map<U>(self, mut f: impl FnMut(Side, V) -> U) -> SideMap<U> {
        SideMap {
            top: f(Side::Top, self.top),
            bottom: f(Side::Bottom, self.bottom),
            left: f(Side::Left, self.left),
            right: f(Side::Right, self.right),
            front: f(Side::Front, self.front),
            back: f(Side::Back, self.back),
        }
    }
}

impl<V: Clone> SideMap<V> {
    /// Constructs a [`SideMap`] containing clones of the provided value.
    #[inline]
    pub fn splat(value: V) -> Self {
        Self {
            top: value.clone(),
            bottom: value.clone(),
            left: value.clone(),
            right: value.clone(),
            front: value.clone(),
            back: value,
        }
    }
}

impl<V> ops::Index<Side> for SideMap<V> {
    type Output = V;
    #[inline]
    fn index(&self, side: Side) -> &V {
        match side {
            Side::Top => &self.top,
            Side::Bottom => &self.bottom,
            Side::Left => &self.left,
            Side::Right => &self.right,
            Side::Front => &self.front,
            Side::Back => &self.back,
        }
    }
}

impl<V> ops::IndexMut<Side> for SideMap<V> {
    #[inline]
    fn index_mut(&mut self, side: Side) -> &mut V {
        match side {
            Side::Top => &mut self.top,
            Side::Bottom => &mut self.bottom,
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
            Side::Front => &mut self.front,
            Side::Back => &mut self.back,
        }
    }
}

/// A color with red, green, blue and alpha components, each nominally in
/// `0..=1` and not premultiplied.
///
/// Used as the per-vertex tint fed into the packed vertex format; see
/// [`Rgba::packed()`].
#[derive(Clone, Copy, PartialEq)]
pub struct Rgba {
    red: f32,
    green: f32,
    blue: f32,
    alpha: f32,
}

impl Rgba {
    /// White; the identity tint.
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);

    /// Constructs a color from components. Out-of-range components are kept
    /// as-is and clamped only at packing time.
    #[inline]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Returns the red component.
    #[inline]
    pub const fn red(self) -> f32 {
        self.red
    }
    /// Returns the green component.
    #[inline]
    pub const fn green(self) -> f32 {
        self.green
    }
    /// Returns the blue component.
    #[inline]
    pub const fn blue(self) -> f32 {
        self.blue
    }
    /// Returns the alpha component.
    #[inline]
    pub const fn alpha(self) -> f32 {
        self.alpha
    }

    /// Converts each component to 8 bits (clamping and rounding), in
    /// `[r, g, b, a]` order.
    #[inline]
    pub fn to_bytes(self) -> [u8; 4] {
        [
            component_to_byte(self.red),
            component_to_byte(self.green),
            component_to_byte(self.blue),
            component_to_byte(self.alpha),
        ]
    }

    /// Packs this color into a single 32-bit word, 8 bits per channel,
    /// with red in the least significant byte: `r | g << 8 | b << 16 | a << 24`.
    #[inline]
    pub fn packed(self) -> u32 {
        u32::from_le_bytes(self.to_bytes())
    }

    /// Reconstructs a color from the output of [`Rgba::packed()`].
    #[inline]
    pub fn from_packed(word: u32) -> Self {
        let [r, g, b, a] = word.to_le_bytes();
        Self::new(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            f32::from(a) / 255.0,
        )
    }

    /// Componentwise linear interpolation from `self` (`t = 0`) to `other`
    /// (`t = 1`).
    #[inline]
    pub fn lerp(self, other: Rgba, t: f32) -> Rgba {
        Rgba::new(
            self.red + (other.red - self.red) * t,
            self.green + (other.green - self.green) * t,
            self.blue + (other.blue - self.blue) * t,
            self.alpha + (other.alpha - self.alpha) * t,
        )
    }
}

/// Componentwise modulation (tinting).
impl ops::Mul for Rgba {
    type Output = Rgba;
    #[inline]
    fn mul(self, rhs: Rgba) -> Rgba {
        Rgba::new(
            self.red * rhs.red,
            self.green * rhs.green,
            self.blue * rhs.blue,
            self.alpha * rhs.alpha,
        )
    }
}

impl fmt::Debug for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Print compactly on a single line even under prettyprint.
        write!(
            f,
            "Rgba({:?}, {:?}, {:?}, {:?})",
            self.red, self.green, self.blue, self.alpha
        )
    }
}

#[inline]
fn component_to_byte(component: f32) -> u8 {
    (component.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use euclid::vec3;
    use pretty_assertions::assert_eq;

    #[test]
    fn side_opposite_is_involutive() {
        for side in Side::ALL {
            assert_eq!(side.opposite().opposite(), side);
            assert_eq!(side.normal(), -side.opposite().normal());
        }
    }

    #[test]
    fn closest_to_recovers_each_normal() {
        for side in Side::ALL {
            assert_eq!(Side::closest_to(side.normal().to_f32()), side);
        }
    }

    #[test]
    fn closest_to_dominant_axis() {
        assert_eq!(Side::closest_to(vec3(0.9, 0.3, -0.2)), Side::Right);
        assert_eq!(Side::closest_to(vec3(-0.1, -0.2, -0.9)), Side::Front);
        assert_eq!(Side::closest_to(vec3(0.1, 0.7, 0.2)), Side::Top);
    }

    #[test]
    fn side_map_index_matches_from_fn() {
        let map = SideMap::from_fn(|side| side.normal());
        for side in Side::ALL {
            assert_eq!(map[side], side.normal());
        }
    }

    #[test]
    fn packed_color_roundtrips_to_bytes() {
        for bytes in [[0, 0, 0, 0], [255, 255, 255, 255], [1, 2, 3, 4], [
            200, 150, 100, 50,
        ]] {
            let color = Rgba::new(
                f32::from(bytes[0]) / 255.0,
                f32::from(bytes[1]) / 255.0,
                f32::from(bytes[2]) / 255.0,
                f32::from(bytes[3]) / 255.0,
            );
            assert_eq!(color.to_bytes(), bytes);
            assert_eq!(Rgba::from_packed(color.packed()).to_bytes(), bytes);
        }
    }

    #[test]
    fn packed_color_byte_order() {
        assert_eq!(Rgba::new(1.0, 0.0, 0.0, 0.0).packed(), 0x0000_00FF);
        assert_eq!(Rgba::new(0.0, 0.0, 0.0, 1.0).packed(), 0xFF00_0000);
    }
}
