/// Errors from wrapping a raw grayscale buffer.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageBufferError {
    #[error("invalid grayscale image buffer length (expected {expected} bytes, got {got})")]
    InvalidLength { expected: usize, got: usize },
    #[error("invalid grayscale image dimensions (width={width}, height={height})")]
    InvalidDimensions { width: usize, height: usize },
}

/// Borrowed 8-bit grayscale bitmap handed to a [`crate::ContourExtractor`].
#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

impl<'a> GrayImageView<'a> {
    /// Wrap a row-major buffer, checking its length against the dimensions.
    pub fn new(width: usize, height: usize, data: &'a [u8]) -> Result<Self, ImageBufferError> {
        let view = Self {
            width,
            height,
            data,
        };
        view.validate()?;
        Ok(view)
    }

    /// Re-check a view whose fields were filled in directly.
    pub fn validate(&self) -> Result<(), ImageBufferError> {
        let expected = self
            .width
            .checked_mul(self.height)
            .ok_or(ImageBufferError::InvalidDimensions {
                width: self.width,
                height: self.height,
            })?;
        if self.data.len() != expected {
            return Err(ImageBufferError::InvalidLength {
                expected,
                got: self.data.len(),
            });
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_checks_buffer_length() {
        let data = [0u8; 6];
        assert!(GrayImageView::new(3, 2, &data).is_ok());
        assert_eq!(
            GrayImageView::new(4, 2, &data).unwrap_err(),
            ImageBufferError::InvalidLength {
                expected: 8,
                got: 6
            }
        );
        assert!(matches!(
            GrayImageView::new(usize::MAX, 2, &data),
            Err(ImageBufferError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn hand_built_view_is_revalidated() {
        let data = [0u8; 3];
        let view = GrayImageView {
            width: 2,
            height: 2,
            data: &data,
        };
        assert!(view.validate().is_err());
        assert!(GrayImageView::new(0, 5, &[]).unwrap().is_empty());
    }
}
