use ndarray::{s, ArrayView3, ArrayViewMut3, Axis};

use crate::shared::region::PixelBounds;

/// A single video/image frame: contiguous RGB bytes in row-major order.
///
/// Format conversion happens at I/O boundaries only; the domain layer
/// treats pixel data as opaque.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    /// An RGB frame with every pixel set to `color`.
    pub fn filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let pixels = (width as usize) * (height as usize);
        let data = color.iter().copied().cycle().take(pixels * 3).collect();
        Self::new(data, width, height, 3, 0)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Channel values of the pixel at `(col, row)`, or `None` outside the frame.
    pub fn pixel(&self, col: u32, row: u32) -> Option<&[u8]> {
        if col >= self.width || row >= self.height {
            return None;
        }
        let channels = self.channels as usize;
        let start = (row as usize * self.width as usize + col as usize) * channels;
        Some(&self.data[start..start + channels])
    }

    /// Paints every pixel inside `bounds` with `color`.
    ///
    /// `bounds` must come from [`Region::clamp_to`](crate::shared::region::Region::clamp_to)
    /// against this frame's dimensions.
    pub fn fill_rect(&mut self, bounds: &PixelBounds, color: [u8; 3]) {
        let mut pixels = self.as_ndarray_mut();
        let rows = bounds.top..bounds.bottom;
        let cols = bounds.left..bounds.right;
        let mut roi = pixels.slice_mut(s![rows, cols, ..]);
        for (channel, value) in color.iter().enumerate() {
            if channel < roi.len_of(Axis(2)) {
                roi.index_axis_mut(Axis(2), channel).fill(*value);
            }
        }
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
