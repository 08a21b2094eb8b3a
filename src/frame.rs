use crate::error::FrameError;
use image::DynamicImage;
use std::path::Path;
use std::time::SystemTime;

/// Bytes per RGBA sample
pub const BYTES_PER_PIXEL: usize = 4;

/// One decoded video frame in RGBA layout.
///
/// Width, height and the sample buffer are fixed at construction; a frame can
/// only be built with positive dimensions and a buffer of exactly
/// `width * height * 4` bytes, so detectors never divide by a zero area.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Sequence number assigned by the frame source
    pub id: u64,
    /// Timestamp when the frame was captured
    pub timestamp: SystemTime,
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    /// Build a frame from raw RGBA samples
    pub fn from_rgba(
        id: u64,
        timestamp: SystemTime,
        data: Vec<u8>,
        width: u32,
        height: u32,
    ) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::ZeroArea { width, height });
        }

        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if data.len() != expected {
            return Err(FrameError::BufferSize {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            id,
            timestamp,
            width,
            height,
            data,
        })
    }

    /// Convert a decoded still image into a frame
    pub fn from_image(id: u64, image: &DynamicImage) -> Result<Self, FrameError> {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba(id, SystemTime::now(), rgba.into_raw(), width, height)
    }

    /// Decode an image file (PNG, JPEG, BMP) into a frame
    pub fn load<P: AsRef<Path>>(id: u64, path: P) -> crate::Result<Self> {
        let image = image::open(path.as_ref())?;
        tracing::debug!(
            "Decoded {} as frame {} ({}x{})",
            path.as_ref().display(),
            id,
            image.width(),
            image.height()
        );
        Ok(Self::from_image(id, &image)?)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of pixels (never zero)
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Raw RGBA samples
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// RGB channels of the pixel at a row-major index
    pub fn rgb(&self, index: usize) -> (u8, u8, u8) {
        let offset = index * BYTES_PER_PIXEL;
        (
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
        )
    }

    /// Iterate RGBA pixels in row-major order
    pub fn pixels(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.data.chunks_exact(BYTES_PER_PIXEL)
    }

    /// Overwrite this frame's samples with another frame's, reusing the buffer
    pub(crate) fn copy_from(&mut self, other: &Frame) {
        self.id = other.id;
        self.timestamp = other.timestamp;
        self.width = other.width;
        self.height = other.height;
        self.data.clear();
        self.data.extend_from_slice(&other.data);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Frame filled with one RGB colour (alpha 255)
    pub fn solid_frame(id: u64, width: u32, height: u32, rgb: (u8, u8, u8)) -> Frame {
        let mut data = Vec::with_capacity(width as usize * height as usize * BYTES_PER_PIXEL);
        for _ in 0..width * height {
            data.extend_from_slice(&[rgb.0, rgb.1, rgb.2, 255]);
        }
        Frame::from_rgba(id, SystemTime::now(), data, width, height).unwrap()
    }

    /// Copy of `base` with the rectangle at (x, y, w, h) painted in `rgb`
    pub fn paint_rect(base: &Frame, x: u32, y: u32, w: u32, h: u32, rgb: (u8, u8, u8)) -> Frame {
        let mut data = base.data().to_vec();
        for row in y..y + h {
            for col in x..x + w {
                let offset = (row * base.width() + col) as usize * BYTES_PER_PIXEL;
                data[offset] = rgb.0;
                data[offset + 1] = rgb.1;
                data[offset + 2] = rgb.2;
            }
        }
        Frame::from_rgba(base.id + 1, base.timestamp, data, base.width(), base.height()).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_creation() {
        let frame = Frame::from_rgba(1, SystemTime::now(), vec![0u8; 64 * 48 * 4], 64, 48).unwrap();

        assert_eq!(frame.id, 1);
        assert_eq!(frame.dimensions(), (64, 48));
        assert_eq!(frame.pixel_count(), 64 * 48);
        assert_eq!(frame.pixels().count(), 64 * 48);
    }

    #[test]
    fn test_zero_area_rejected() {
        let err = Frame::from_rgba(1, SystemTime::now(), Vec::new(), 0, 0).unwrap_err();
        assert_eq!(err, FrameError::ZeroArea { width: 0, height: 0 });

        let err = Frame::from_rgba(1, SystemTime::now(), Vec::new(), 10, 0).unwrap_err();
        assert!(matches!(err, FrameError::ZeroArea { .. }));
    }

    #[test]
    fn test_buffer_size_validation() {
        let err = Frame::from_rgba(2, SystemTime::now(), vec![0u8; 100], 640, 480).unwrap_err();
        match err {
            FrameError::BufferSize {
                expected, actual, ..
            } => {
                assert_eq!(expected, 640 * 480 * 4);
                assert_eq!(actual, 100);
            }
            other => panic!("Unexpected error: {}", other),
        }
    }

    #[test]
    fn test_from_image_converts_to_rgba() {
        let rgb = image::RgbImage::from_pixel(8, 4, image::Rgb([180, 120, 90]));
        let frame = Frame::from_image(7, &DynamicImage::ImageRgb8(rgb)).unwrap();

        assert_eq!(frame.dimensions(), (8, 4));
        assert_eq!(frame.rgb(0), (180, 120, 90));
        assert_eq!(frame.data()[3], 255);
    }

    #[test]
    fn test_copy_from_replaces_contents() {
        let mut target = test_support::solid_frame(1, 4, 4, (0, 0, 0));
        let source = test_support::solid_frame(9, 2, 2, (10, 20, 30));

        target.copy_from(&source);
        assert_eq!(target, source);
    }
}
