//! Camera images and the calibration they are rectified with.

use std::sync::{Arc, OnceLock, Weak};

use crate::error::{ImageError, ImageResult};
use crate::handle::{Handle, Implementation};
use crate::list::List;
use crate::math::Vector;
use crate::records::{ImageFormat, ImageRecord, Perspective, SharedBuffer};

/// A camera image.
pub type Image = Handle<ImageImpl>;
/// Ordered images.
pub type ImageList = List<ImageImpl>;

/// Returned by [`Image::rectify`] and [`Image::warp`] when no calibration is reachable.
const NO_CALIBRATION: Vector = Vector::new(0.0, 0.0, 1.0);

/// Maps between camera pixels and rays for one device.
///
/// Implemented by whatever produced the image, usually the controller. Images
/// hold it weakly, so they never keep a controller alive.
pub trait Calibration: Send + Sync {
    /// Ray slopes for pixel coordinates `uv` seen from `perspective`.
    fn rectify(&self, perspective: Perspective, uv: Vector) -> Vector;

    /// Pixel coordinates for the ray slopes `xy` seen from `perspective`.
    fn warp(&self, perspective: Perspective, xy: Vector) -> Vector;
}

/// Backing data of an [`Image`].
#[derive(Default)]
pub struct ImageImpl {
    calibration: Option<Weak<dyn Calibration>>,
    record: Option<ImageRecord>,
    data: Option<SharedBuffer>,
}

impl ImageImpl {
    /// Image built from service data.
    ///
    /// `calibration` is the producer to rectify and warp against; `data` is
    /// the pixel buffer, if the service still holds it.
    #[must_use]
    pub fn new(calibration: Option<Weak<dyn Calibration>>, record: ImageRecord, data: Option<SharedBuffer>) -> Self {
        Self {
            calibration,
            record: Some(record),
            data,
        }
    }

    fn record(&self) -> &ImageRecord {
        static INVALID: OnceLock<ImageRecord> = OnceLock::new();
        self.record
            .as_ref()
            .unwrap_or_else(|| INVALID.get_or_init(ImageRecord::invalid))
    }

    fn calibration(&self) -> Option<Arc<dyn Calibration>> {
        self.calibration.as_ref().and_then(Weak::upgrade)
    }
}

impl Implementation for ImageImpl {
    fn is_valid(&self) -> bool {
        self.record.is_some()
    }

    fn describe(&self) -> String {
        match &self.record {
            Some(r) => format!("Image Frame Id:{}, Id: {}", r.frame_id, r.perspective_index),
            None => "Invalid Image".to_string(),
        }
    }

    fn sentinel() -> &'static Image {
        static INVALID: OnceLock<Image> = OnceLock::new();
        INVALID.get_or_init(Handle::default)
    }
}

impl Handle<ImageImpl> {
    /// Monotonic image sequence number; -1 when invalid.
    #[must_use]
    pub fn sequence_id(&self) -> i64 {
        self.implementation().record().sequence_id
    }

    /// Position in the stereo pair; -1 when invalid.
    #[must_use]
    pub fn id(&self) -> i32 {
        self.implementation().record().perspective_index
    }

    /// Id of the tracking frame this image belongs to; -1 when invalid.
    #[must_use]
    pub fn frame_id(&self) -> i64 {
        self.implementation().record().frame_id
    }

    /// Capture time, microseconds.
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        self.implementation().record().timestamp_us
    }

    /// Which camera took the image.
    #[must_use]
    pub fn perspective(&self) -> Perspective {
        Perspective::from_index(self.id())
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> i32 {
        self.implementation().record().width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> i32 {
        self.implementation().record().height
    }

    /// Bytes per pixel; 1 when invalid.
    #[must_use]
    pub fn bytes_per_pixel(&self) -> i32 {
        self.implementation().record().bytes_per_pixel
    }

    /// Pixel layout.
    #[must_use]
    pub fn format(&self) -> ImageFormat {
        self.implementation().record().format
    }

    /// Pixel bytes, if the buffer was still held by the service.
    #[must_use]
    pub fn data(&self) -> Option<&[u8]> {
        self.implementation().data.as_deref()
    }

    /// Calibration grid of interleaved `(x, y)` ray slopes.
    ///
    /// # Errors
    ///
    /// [`ImageError::InvalidImage`] for an invalid image, and
    /// [`ImageError::MalformedDistortion`] if the grid size disagrees with
    /// its declared dimensions.
    pub fn distortion(&self) -> ImageResult<&[f32]> {
        let record = self
            .implementation()
            .record
            .as_ref()
            .ok_or(ImageError::InvalidImage)?;
        let expected = record.expected_distortion_len();
        if record.distortion.len() != expected {
            return Err(ImageError::MalformedDistortion {
                got: record.distortion.len(),
                expected,
            });
        }
        Ok(&record.distortion)
    }

    /// Calibration grid width, in `(x, y)` pairs.
    #[must_use]
    pub fn distortion_width(&self) -> i32 {
        self.implementation().record().distortion_width
    }

    /// Calibration grid height, in rows.
    #[must_use]
    pub fn distortion_height(&self) -> i32 {
        self.implementation().record().distortion_height
    }

    /// Horizontal ray offset.
    #[must_use]
    pub fn ray_offset_x(&self) -> f32 {
        self.implementation().record().ray_offset[0]
    }

    /// Vertical ray offset.
    #[must_use]
    pub fn ray_offset_y(&self) -> f32 {
        self.implementation().record().ray_offset[1]
    }

    /// Horizontal ray scale.
    #[must_use]
    pub fn ray_scale_x(&self) -> f32 {
        self.implementation().record().ray_scale[0]
    }

    /// Vertical ray scale.
    #[must_use]
    pub fn ray_scale_y(&self) -> f32 {
        self.implementation().record().ray_scale[1]
    }

    /// Ray slopes for pixel `uv`; `(0, 0, 1)` once the producer is gone.
    #[must_use]
    pub fn rectify(&self, uv: Vector) -> Vector {
        self.implementation()
            .calibration()
            .map_or(NO_CALIBRATION, |c| c.rectify(self.perspective(), uv))
    }

    /// Pixel for ray slopes `xy`; `(0, 0, 1)` once the producer is gone.
    #[must_use]
    pub fn warp(&self, xy: Vector) -> Vector {
        self.implementation()
            .calibration()
            .map_or(NO_CALIBRATION, |c| c.warp(self.perspective(), xy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Doubling;

    impl Calibration for Doubling {
        fn rectify(&self, perspective: Perspective, uv: Vector) -> Vector {
            let side = if perspective == Perspective::StereoLeft { 0.0 } else { 1.0 };
            Vector::new(uv.x * 2.0, uv.y * 2.0, side)
        }

        fn warp(&self, _perspective: Perspective, xy: Vector) -> Vector {
            Vector::new(xy.x * 0.5, xy.y * 0.5, 0.0)
        }
    }

    fn record(index: i32) -> ImageRecord {
        ImageRecord {
            frame_id: 9,
            sequence_id: 100,
            timestamp_us: 1_000,
            perspective_index: index,
            width: 4,
            height: 2,
            bytes_per_pixel: 1,
            format: ImageFormat::Infrared,
            buffer: None,
            distortion: vec![0.5; 2 * 2 * 2],
            distortion_width: 2,
            distortion_height: 2,
            ray_offset: [0.5, 0.25],
            ray_scale: [0.125, 0.0625],
        }
    }

    #[test]
    fn test_invalid_image_neutral_values() {
        let image = Image::invalid();
        assert_eq!(image.id(), -1);
        assert_eq!(image.sequence_id(), -1);
        assert_eq!(image.width(), 0);
        assert_eq!(image.height(), 0);
        assert_eq!(image.timestamp(), 0);
        assert_eq!(image.bytes_per_pixel(), 1);
        assert_eq!(image.format(), ImageFormat::Infrared);
        assert!(image.data().is_none());
        assert_eq!(image.distortion(), Err(ImageError::InvalidImage));
        assert_eq!(image.rectify(Vector::new(1.0, 1.0, 0.0)), NO_CALIBRATION);
        assert_eq!(image.warp(Vector::new(1.0, 1.0, 0.0)), NO_CALIBRATION);
        assert_eq!(image.to_string(), "Invalid Image");
    }

    #[test]
    fn test_image_properties() {
        let pixels: SharedBuffer = Arc::from(vec![1u8, 2, 3, 4, 5, 6, 7, 8]);
        let image = Image::new(Arc::new(ImageImpl::new(None, record(1), Some(pixels))));
        assert_eq!(image.id(), 1);
        assert_eq!(image.perspective(), Perspective::StereoRight);
        assert_eq!(image.data().map(<[u8]>::len), Some(8));
        assert_eq!(image.distortion().map(<[f32]>::len), Ok(8));
        assert_eq!(image.ray_offset_x(), 0.5);
        assert_eq!(image.ray_scale_y(), 0.0625);
        assert_eq!(image.to_string(), "Image Frame Id:9, Id: 1");
    }

    #[test]
    fn test_malformed_distortion_is_reported() {
        let mut bad = record(0);
        bad.distortion.pop();
        let image = Image::new(Arc::new(ImageImpl::new(None, bad, None)));
        assert_eq!(
            image.distortion(),
            Err(ImageError::MalformedDistortion { got: 7, expected: 8 })
        );
    }

    #[test]
    fn test_rectify_delegates_until_calibration_dropped() {
        let calibration: Arc<dyn Calibration> = Arc::new(Doubling);
        let left = Image::new(Arc::new(ImageImpl::new(
            Some(Arc::downgrade(&calibration)),
            record(0),
            None,
        )));
        assert_eq!(left.rectify(Vector::new(1.0, 2.0, 0.0)), Vector::new(2.0, 4.0, 0.0));
        assert_eq!(left.warp(Vector::new(2.0, 4.0, 0.0)), Vector::new(1.0, 2.0, 0.0));

        drop(calibration);
        assert_eq!(left.rectify(Vector::new(1.0, 2.0, 0.0)), NO_CALIBRATION);
        assert_eq!(left.warp(Vector::new(1.0, 2.0, 0.0)), NO_CALIBRATION);
    }
}
