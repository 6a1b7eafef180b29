//! Grayscale frame types and borrowed block views.

use crate::error::ParameterError;

/// A single 8-bit grayscale frame.
///
/// Samples are stored row-major with no padding between rows.
/// Frames handed to the estimator are read-only; predicted and
/// reconstructed frames are freshly allocated by the stage that
/// produces them.
#[derive(Clone)]
pub struct Frame {
    /// Row-major intensity samples.
    pixels: Vec<u8>,
    /// Frame width in pixels.
    width: u32,
    /// Frame height in pixels.
    height: u32,
    /// Monotonic sequence number assigned by the source.
    sequence: u64,
}

impl Frame {
    /// Creates a new frame with the given parameters.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        Self {
            pixels,
            width,
            height,
            sequence,
        }
    }

    /// Creates an all-zero frame.
    pub fn zeroed(width: u32, height: u32) -> Self {
        let len = (width as usize) * (height as usize);
        Self::new(vec![0u8; len], width, height, 0)
    }

    /// Builds a frame by evaluating `f(x, y)` for every sample.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> u8) -> Self {
        let mut pixels = Vec::with_capacity((width as usize) * (height as usize));
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self::new(pixels, width, height, 0)
    }

    /// Returns a copy of this frame carrying a different sequence number.
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Returns a reference to the raw pixel data.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns the frame width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the frame height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the sequence number.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the total number of pixels (width * height).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Returns the sample at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is outside the frame.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.pixels[self.index(x, y)]
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    /// Returns `len` samples of row `y` starting at column `x`.
    #[inline]
    pub fn row(&self, x: u32, y: u32, len: u32) -> &[u8] {
        let start = self.index(x, y);
        &self.pixels[start..start + len as usize]
    }

    #[inline]
    pub(crate) fn row_mut(&mut self, x: u32, y: u32, len: u32) -> &mut [u8] {
        let start = self.index(x, y);
        &mut self.pixels[start..start + len as usize]
    }

    /// Validates that the pixel buffer size matches dimensions.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && self.pixels.len() == self.pixel_count()
    }

    /// Like [`Frame::is_valid`], but reports what is wrong.
    pub fn check(&self) -> Result<(), ParameterError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ParameterError::MalformedFrame {
                width: self.width,
                height: self.height,
                len: self.pixels.len(),
            })
        }
    }

    /// Returns true if both frames share width and height.
    #[inline]
    pub fn same_dimensions(&self, other: &Frame) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Returns true if a full `size × size` block at `(x, y)` lies inside the frame.
    ///
    /// Coordinates are signed so that displaced candidates can be tested
    /// before they are known to be non-negative.
    #[inline]
    pub fn contains_block(&self, x: i64, y: i64, size: u32) -> bool {
        x >= 0
            && y >= 0
            && x + size as i64 <= self.width as i64
            && y + size as i64 <= self.height as i64
    }

    /// Returns a view of the `width × height` region at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the region is not inside the frame.
    pub fn block(&self, x: u32, y: u32, width: u32, height: u32) -> Block<'_> {
        assert!(
            x + width <= self.width && y + height <= self.height,
            "block {}x{} at ({}, {}) outside {}x{} frame",
            width,
            height,
            x,
            y,
            self.width,
            self.height
        );
        Block {
            frame: self,
            x,
            y,
            width,
            height,
        }
    }

    /// Returns the region of a `block_size` tile at `(x, y)`, truncated at the frame edge.
    #[inline]
    pub fn tile_extent(&self, x: u32, y: u32, block_size: u32) -> (u32, u32) {
        (
            block_size.min(self.width - x),
            block_size.min(self.height - y),
        )
    }
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.same_dimensions(other) && self.pixels == other.pixels
    }
}

impl Eq for Frame {}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .field("pixel_bytes", &self.pixels.len())
            .finish()
    }
}

/// A rectangular, borrowed region of a [`Frame`].
#[derive(Clone, Copy)]
pub struct Block<'a> {
    frame: &'a Frame,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl<'a> Block<'a> {
    /// Left column in the frame.
    #[inline]
    pub fn x(&self) -> u32 {
        self.x
    }

    /// Top row in the frame.
    #[inline]
    pub fn y(&self) -> u32 {
        self.y
    }

    /// Columns covered.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Rows covered.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns true if both blocks cover the same number of rows and columns.
    #[inline]
    pub fn same_shape(&self, other: &Block<'_>) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Iterates the block's rows as contiguous slices.
    pub fn rows(&self) -> impl Iterator<Item = &'a [u8]> + 'a {
        let frame = self.frame;
        let (x, y, width) = (self.x, self.y, self.width);
        (0..self.height).map(move |row| frame.row(x, y + row, width))
    }
}

impl std::fmt::Debug for Block<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Block")
            .field("x", &self.x)
            .field("y", &self.y)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// A frame of signed samples, used for residuals.
///
/// Holds the exact difference of two 8-bit frames, so every
/// sample lies in `[-255, 255]`.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedFrame {
    samples: Vec<i16>,
    width: u32,
    height: u32,
}

impl SignedFrame {
    /// Creates a signed frame from row-major samples.
    pub fn new(samples: Vec<i16>, width: u32, height: u32) -> Self {
        Self {
            samples,
            width,
            height,
        }
    }

    /// Row-major samples.
    #[inline]
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Width in samples.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in samples.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the sample at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is outside the frame.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> i16 {
        self.samples[(y as usize) * (self.width as usize) + (x as usize)]
    }

    /// Returns true if every sample is zero.
    pub fn is_zero(&self) -> bool {
        self.samples.iter().all(|&s| s == 0)
    }
}

impl std::fmt::Debug for SignedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("nonzero", &self.samples.iter().filter(|&&s| s != 0).count())
            .finish()
    }
}
