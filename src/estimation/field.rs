//! Motion vectors and the per-frame motion field.

use blake3::Hasher;

/// Domain separator for field digests.
const FIELD_DIGEST_DOMAIN: &[u8] = b"block-motion-field-v1";

/// Displacement of one block.
///
/// `(x, y)` is the block origin in the target frame; the best match
/// lies at `(x + dx, y + dy)` in the reference frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MotionVector {
    /// Block column origin in the target frame.
    pub x: u32,
    /// Block row origin in the target frame.
    pub y: u32,
    /// Horizontal displacement.
    pub dx: i32,
    /// Vertical displacement.
    pub dy: i32,
}

impl MotionVector {
    /// Creates the vector for the block at `(x, y)` displaced by `(dx, dy)`.
    pub fn new(x: u32, y: u32, dx: i32, dy: i32) -> Self {
        Self { x, y, dx, dy }
    }

    /// A zero displacement for the block at `(x, y)`.
    pub fn zero(x: u32, y: u32) -> Self {
        Self::new(x, y, 0, 0)
    }

    /// True if the displacement is `(0, 0)`.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.dx == 0 && self.dy == 0
    }

    /// Origin of the matched block in the reference frame.
    #[inline]
    pub fn destination(&self) -> (i64, i64) {
        (
            self.x as i64 + self.dx as i64,
            self.y as i64 + self.dy as i64,
        )
    }

    /// Euclidean length of the displacement.
    pub fn magnitude(&self) -> f64 {
        ((self.dx as f64).powi(2) + (self.dy as f64).powi(2)).sqrt()
    }
}

impl From<MotionVector> for (u32, u32, i32, i32) {
    fn from(mv: MotionVector) -> Self {
        (mv.x, mv.y, mv.dx, mv.dy)
    }
}

/// Motion vectors for every block of a frame, in raster order.
///
/// Also remembers the frame geometry the vectors were computed for, so
/// prediction can refuse a field that belongs to another frame size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotionField {
    vectors: Vec<MotionVector>,
    width: u32,
    height: u32,
    block_size: u32,
}

impl MotionField {
    /// Wraps raster-ordered vectors with their frame geometry.
    pub fn new(width: u32, height: u32, block_size: u32, vectors: Vec<MotionVector>) -> Self {
        debug_assert_eq!(
            vectors.len(),
            (width.div_ceil(block_size) * height.div_ceil(block_size)) as usize
        );
        Self {
            vectors,
            width,
            height,
            block_size,
        }
    }

    /// A field where every block has zero displacement.
    pub fn zero(width: u32, height: u32, block_size: u32) -> Self {
        let vectors = block_origins(width, height, block_size)
            .map(|(x, y)| MotionVector::zero(x, y))
            .collect();
        Self::new(width, height, block_size, vectors)
    }

    /// Frame width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Block edge length.
    #[inline]
    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Number of block columns.
    #[inline]
    pub fn blocks_x(&self) -> u32 {
        self.width.div_ceil(self.block_size)
    }

    /// Number of block rows.
    #[inline]
    pub fn blocks_y(&self) -> u32 {
        self.height.div_ceil(self.block_size)
    }

    /// Number of vectors, one per block.
    #[inline]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// True if the field holds no vectors.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Vectors in raster order.
    #[inline]
    pub fn vectors(&self) -> &[MotionVector] {
        &self.vectors
    }

    /// Iterates the vectors in raster order.
    pub fn iter(&self) -> std::slice::Iter<'_, MotionVector> {
        self.vectors.iter()
    }

    /// Vector of the block in column `bx`, row `by`.
    pub fn get(&self, bx: u32, by: u32) -> Option<&MotionVector> {
        if bx < self.blocks_x() && by < self.blocks_y() {
            self.vectors.get((by * self.blocks_x() + bx) as usize)
        } else {
            None
        }
    }

    /// BLAKE3 digest over geometry and vectors.
    ///
    /// Two runs with equal inputs produce equal digests.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Hasher::new();
        hasher.update(FIELD_DIGEST_DOMAIN);
        hasher.update(&self.width.to_le_bytes());
        hasher.update(&self.height.to_le_bytes());
        hasher.update(&self.block_size.to_le_bytes());
        for mv in &self.vectors {
            hasher.update(&mv.x.to_le_bytes());
            hasher.update(&mv.y.to_le_bytes());
            hasher.update(&mv.dx.to_le_bytes());
            hasher.update(&mv.dy.to_le_bytes());
        }
        *hasher.finalize().as_bytes()
    }

    /// Hex form of [`MotionField::digest`].
    pub fn digest_hex(&self) -> String {
        self.digest().iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl<'a> IntoIterator for &'a MotionField {
    type Item = &'a MotionVector;
    type IntoIter = std::slice::Iter<'a, MotionVector>;

    fn into_iter(self) -> Self::IntoIter {
        self.vectors.iter()
    }
}

/// Block origins in raster order: rows top to bottom, columns left to right.
pub fn block_origins(width: u32, height: u32, block_size: u32) -> impl Iterator<Item = (u32, u32)> {
    let step = block_size.max(1) as usize;
    (0..height)
        .step_by(step)
        .flat_map(move |y| (0..width).step_by(step).map(move |x| (x, y)))
}
