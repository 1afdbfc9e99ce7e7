//! Loading 2-D images through the `image` crate.
//!
//! Available when the `image-io` feature is enabled. Images load with unit
//! spacing and zero origin; attach real geometry with [`Image::with_grid`].

use crate::image::{Grid, Image2};
use crate::util::{FftRegError, FftRegResult};
use std::path::Path;

/// Converts a grayscale buffer to an `f32` image (x fastest, y rows).
pub fn image2_from_gray(img: &image::GrayImage) -> FftRegResult<Image2> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    let grid = Grid::new([width, height])?;
    Image2::from_u8(grid, img.as_raw())
}

/// Converts any decoded image to grayscale and then to an `f32` image.
pub fn image2_from_dynamic(img: &image::DynamicImage) -> FftRegResult<Image2> {
    image2_from_gray(&img.to_luma8())
}

/// Loads an image from disk as a grayscale `f32` image.
pub fn load_gray_image<P: AsRef<Path>>(path: P) -> FftRegResult<Image2> {
    let img = image::open(path).map_err(|err| FftRegError::ImageIo {
        reason: err.to_string(),
    })?;
    image2_from_dynamic(&img)
}
