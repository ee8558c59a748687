//! The packed, GPU-ready output format of tessellation.

use core::time::Duration;

use crate::accumulator::{CategoryMap, RenderCategory};
use crate::pool::PoolItem;

/// Field layout of one packed vertex, as offsets (in 32-bit words) into a
/// [`WORDS_PER_VERTEX`]-word record.
///
/// Every floating-point field is stored by bit-reinterpretation
/// ([`f32::to_bits`]), never by numeric conversion, so consumers recover the
/// exact values with [`f32::from_bits`]. [`FLAGS`](vertex_layout::FLAGS) is
/// the [`VertexFlag`](crate::VertexFlag) discriminant converted to `f32` and
/// then bit-reinterpreted, matching what the consuming shader expects to read
/// from a float attribute. [`PACKED_COLOR`](vertex_layout::PACKED_COLOR) is
/// the only integer-valued word; see [`Rgba::packed()`](crate::Rgba::packed).
pub mod vertex_layout {
    /// Vertex position; 3 words (`f32` bits each).
    pub const POSITION: usize = 0;
    /// Texture coordinate; 2 words (`f32` bits each).
    pub const UV0: usize = 3;
    /// Render flag; 1 word (flag value as `f32` bits).
    pub const FLAGS: usize = 5;
    /// Sunlight, block light, ambient occlusion; 3 words (`f32` bits each).
    pub const LIGHT: usize = 6;
    /// Tint color; 1 word (four 8-bit channels).
    pub const PACKED_COLOR: usize = 9;
    /// Vertex normal; 3 words (`f32` bits each).
    pub const NORMAL: usize = 10;
}

/// Size of one packed vertex, in 32-bit words.
pub const WORDS_PER_VERTEX: usize = 13;

/// One render category's packed buffers: the interleaved vertex words and the
/// index list.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PackedBuffers {
    pub(crate) vertices: Vec<u32>,
    pub(crate) indices: Vec<u32>,
}

impl PackedBuffers {
    /// The interleaved vertex words; [`WORDS_PER_VERTEX`] words per vertex in
    /// the [`vertex_layout`] field order.
    #[inline]
    pub fn vertex_data(&self) -> &[u32] {
        &self.vertices
    }

    /// The triangle indices, in emission order.
    #[inline]
    pub fn index_data(&self) -> &[u32] {
        &self.indices
    }

    /// [`vertex_data()`](Self::vertex_data) as raw bytes, for direct upload
    /// into a GPU buffer.
    #[inline]
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// [`index_data()`](Self::index_data) as raw bytes.
    #[inline]
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// The number of packed vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / WORDS_PER_VERTEX
    }

    /// True if there is nothing to draw in this category.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Prepares the vertex buffer to receive exactly `words` words: reuses
    /// the existing allocation only if its capacity matches exactly, else
    /// reallocates. (An exact match is the common steady-state case when a
    /// chunk is re-tessellated without changing.)
    pub(crate) fn prepare_vertices(&mut self, words: usize) {
        if self.vertices.capacity() == words {
            self.vertices.clear();
        } else {
            self.vertices = Vec::with_capacity(words);
        }
    }

    /// As [`prepare_vertices()`](Self::prepare_vertices), for the index
    /// buffer.
    pub(crate) fn prepare_indices(&mut self, len: usize) {
        if self.indices.capacity() == len {
            self.indices.clear();
        } else {
            self.indices = Vec::with_capacity(len);
        }
    }
}

/// The finished product of one tessellation call: packed vertex and index
/// buffers for each render category, plus timing measurements of the two
/// pipeline passes.
///
/// A [`PackedMesh`] is produced on a worker thread and handed to the consumer
/// by value (via its pool guard); the producer never touches it again. The
/// consumer uploads the buffers verbatim and must not mutate the mesh before
/// returning it to its pool, which resets it for reuse.
#[derive(Clone, Debug, Default)]
pub struct PackedMesh {
    buffers: CategoryMap<PackedBuffers>,
    vertex_generation_time: Duration,
    packing_time: Duration,
}

impl PackedMesh {
    /// Read access to one category's packed buffers.
    #[inline]
    pub fn buffers(&self, category: RenderCategory) -> &PackedBuffers {
        &self.buffers[category]
    }

    pub(crate) fn buffers_mut(&mut self, category: RenderCategory) -> &mut PackedBuffers {
        &mut self.buffers[category]
    }

    /// True if every category is empty.
    pub fn is_empty(&self) -> bool {
        self.buffers.iter().all(|(_, b)| b.is_empty())
    }

    /// Time spent generating the unpacked vertex data (the volume scan).
    #[inline]
    pub fn vertex_generation_time(&self) -> Duration {
        self.vertex_generation_time
    }

    /// Time spent packing and lighting the final buffers.
    #[inline]
    pub fn packing_time(&self) -> Duration {
        self.packing_time
    }

    pub(crate) fn set_vertex_generation_time(&mut self, time: Duration) {
        self.vertex_generation_time = time;
    }

    pub(crate) fn set_packing_time(&mut self, time: Duration) {
        self.packing_time = time;
    }
}

impl PoolItem for PackedMesh {
    /// Empties the buffers while keeping their allocations, so a mesh of the
    /// same size can be repacked without reallocating.
    fn reset(&mut self) {
        for category in RenderCategory::ALL {
            let buffers = &mut self.buffers[category];
            buffers.vertices.clear();
            buffers.indices.clear();
        }
        self.vertex_generation_time = Duration::ZERO;
        self.packing_time = Duration::ZERO;
    }
}
