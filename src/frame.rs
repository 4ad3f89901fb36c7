use ndarray::Array3;

use crate::detection::Detection;

/// A decoded video frame together with the detections the tracker produced for it.
///
/// `pixels` is a `height x width x 3` BGR buffer; it may be absent when only
/// geometry is replayed, in which case no colors can be extracted.
pub struct Frame {
    pub index: u64,
    pub dims: (u32, u32),
    pub detections: Vec<Detection>,
    pub pixels: Option<Array3<u8>>,
}

impl Frame {
    pub fn new(index: u64, dims: (u32, u32), detections: Vec<Detection>) -> Self {
        Self {
            index,
            dims,
            detections,
            pixels: None,
        }
    }

    /// Attaches a BGR buffer; the frame dims follow the buffer shape.
    pub fn with_pixels(mut self, pixels: Array3<u8>) -> Self {
        let (h, w, _) = pixels.dim();
        self.dims = (w as u32, h as u32);
        self.pixels = Some(pixels);
        self
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Detection> {
        self.detections.iter()
    }
}
