use image::{GrayImage, Luma, RgbImage};
use ndarray::Array2;

/// Fixed-point luminance weights (0.299, 0.587, 0.114) scaled by 2^14.
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;
const LUMA_SHIFT: u32 = 14;

/// 4-neighbour discrete Laplacian.
pub const LAPLACIAN_KERNEL: [[f64; 3]; 3] = [
    [0.0, 1.0, 0.0],
    [1.0, -4.0, 1.0],
    [0.0, 1.0, 0.0],
];

/// Rounded perceptual luminance of an RGB raster.
pub fn rgb_to_gray(image: &RgbImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut gray = GrayImage::new(width, height);

    for (x, y, pixel) in image.enumerate_pixels() {
        let weighted =
            pixel[0] as u32 * LUMA_R + pixel[1] as u32 * LUMA_G + pixel[2] as u32 * LUMA_B;
        let lum = (weighted + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT;
        gray.put_pixel(x, y, Luma([lum.min(255) as u8]));
    }

    gray
}

pub fn gray_to_array(image: &GrayImage) -> Array2<f64> {
    let (width, height) = image.dimensions();
    let mut arr = Array2::zeros((height as usize, width as usize));

    for (x, y, pixel) in image.enumerate_pixels() {
        arr[[y as usize, x as usize]] = pixel[0] as f64;
    }

    arr
}

/// Rounds and saturates every value into a gray raster.
pub fn array_to_gray(arr: &Array2<f64>) -> GrayImage {
    let (height, width) = arr.dim();
    let mut image = GrayImage::new(width as u32, height as u32);

    for ((y, x), &value) in arr.indexed_iter() {
        let value = if value.is_finite() { value.round().clamp(0.0, 255.0) } else { 0.0 };
        image.put_pixel(x as u32, y as u32, Luma([value as u8]));
    }

    image
}

/// Mirrors an out-of-range index without repeating the border sample (`gfedcb|abcdefgh|gfedcba`).
fn reflect_101(index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    let mirrored = if index < 0 {
        -index
    } else if index > last {
        2 * last - index
    } else {
        index
    };

    mirrored.clamp(0, last) as usize
}

/// 3x3 convolution at float precision. Borders use reflect-101 so every
/// output pixel is defined and the result keeps the input dimensions.
pub fn convolve_reflect(input: &Array2<f64>, kernel: &[[f64; 3]; 3]) -> Array2<f64> {
    let (height, width) = input.dim();

    Array2::from_shape_fn((height, width), |(y, x)| {
        let mut sum = 0.0;

        for (ky, row) in kernel.iter().enumerate() {
            let sy = reflect_101(y as isize + ky as isize - 1, height);
            for (kx, &weight) in row.iter().enumerate() {
                if weight == 0.0 {
                    continue;
                }
                let sx = reflect_101(x as isize + kx as isize - 1, width);
                sum += input[[sy, sx]] * weight;
            }
        }

        sum
    })
}

/// Signed Laplacian response of a gray raster.
pub fn laplacian(gray: &GrayImage) -> Array2<f64> {
    convolve_reflect(&gray_to_array(gray), &LAPLACIAN_KERNEL)
}

/// Absolute Laplacian response, the shared quantity behind the noise and focus maps.
pub fn laplacian_magnitude(gray: &GrayImage) -> Array2<f64> {
    laplacian(gray).mapv(f64::abs)
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;

    #[test]
    fn test_gray_weights_match_primaries() {
        let image = RgbImage::from_fn(3, 1, |x, _| match x {
            0 => Rgb([255, 0, 0]),
            1 => Rgb([0, 255, 0]),
            _ => Rgb([0, 0, 255]),
        });
        let gray = rgb_to_gray(&image);

        assert_eq!(gray.get_pixel(0, 0)[0], 76);
        assert_eq!(gray.get_pixel(1, 0)[0], 150);
        assert_eq!(gray.get_pixel(2, 0)[0], 29);
    }

    #[test]
    fn test_gray_preserves_neutral_values() {
        let image = RgbImage::from_pixel(4, 4, Rgb([200, 200, 200]));
        assert!(rgb_to_gray(&image).pixels().all(|p| p[0] == 200));
    }

    #[test]
    fn test_reflect_101() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(2, 5), 2);
        assert_eq!(reflect_101(-1, 1), 0);
        assert_eq!(reflect_101(1, 2), 1);
        assert_eq!(reflect_101(2, 2), 0);
    }

    #[test]
    fn test_laplacian_flat_is_zero() {
        let gray = GrayImage::from_pixel(7, 5, Luma([90]));
        assert!(laplacian(&gray).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_laplacian_single_spike() {
        let mut gray = GrayImage::new(5, 5);
        gray.put_pixel(2, 2, Luma([10]));
        let lap = laplacian(&gray);

        assert_eq!(lap[[2, 2]], -40.0);
        assert_eq!(lap[[1, 2]], 10.0);
        assert_eq!(lap[[2, 3]], 10.0);
        assert_eq!(lap[[1, 1]], 0.0);
    }

    #[test]
    fn test_laplacian_border_reflects() {
        let gray = GrayImage::from_fn(4, 1, |x, _| Luma([[0u8, 10, 20, 30][x as usize]]));
        let lap = laplacian(&gray);

        // x=0 sees neighbours 10 and 10; rows reflect onto themselves.
        assert_eq!(lap[[0, 0]], 20.0);
        assert_eq!(lap[[0, 1]], 0.0);
        assert_eq!(lap[[0, 3]], -20.0);
    }

    #[test]
    fn test_array_to_gray_saturates() {
        let arr = Array2::from_shape_vec((1, 4), vec![-3.0, 12.4, 300.0, f64::NAN]).unwrap();
        let gray = array_to_gray(&arr);

        assert_eq!(gray.get_pixel(0, 0)[0], 0);
        assert_eq!(gray.get_pixel(1, 0)[0], 12);
        assert_eq!(gray.get_pixel(2, 0)[0], 255);
        assert_eq!(gray.get_pixel(3, 0)[0], 0);
    }
}
