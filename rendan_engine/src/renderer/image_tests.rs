//! Unit tests for image.rs

use crate::error::Error;
use crate::renderer::image::*;

#[test]
fn test_white_default_texture() {
    let white = ImageData::white();
    assert_eq!((white.width, white.height, white.channels), (1, 1, 4));
    assert_eq!(white.pixels, vec![255, 255, 255, 255]);
    assert!(white.validate().is_ok());
}

#[test]
fn test_checkerboard_alternates_cells() {
    let black = [0, 0, 0, 255];
    let white = [255, 255, 255, 255];
    let board = ImageData::checkerboard(4, 2, black, white);

    assert!(board.validate().is_ok());
    let pixel = |x: usize, y: usize| &board.pixels[(y * 4 + x) * 4..(y * 4 + x) * 4 + 4];
    assert_eq!(pixel(0, 0), &black);
    assert_eq!(pixel(2, 0), &white);
    assert_eq!(pixel(0, 2), &white);
    assert_eq!(pixel(3, 3), &black);
}

#[test]
fn test_new_rejects_size_mismatch() {
    let result = ImageData::new(vec![0; 10], 2, 2, 4);
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
fn test_new_rejects_zero_extent() {
    assert!(ImageData::new(Vec::new(), 0, 4, 4).is_err());
}

#[test]
fn test_new_rejects_bad_channel_count() {
    assert!(ImageData::new(vec![0; 20], 2, 2, 5).is_err());
    assert!(ImageData::new(Vec::new(), 2, 2, 0).is_err());
}

#[test]
fn test_rgb_expanded_to_rgba() {
    let data = ImageData::new(vec![10, 20, 30, 40, 50, 60], 2, 1, 3).unwrap();
    assert_eq!(data.to_rgba8().unwrap(), vec![10, 20, 30, 255, 40, 50, 60, 255]);
}

#[test]
fn test_gray_alpha_expanded_to_rgba() {
    let data = ImageData::new(vec![7, 128], 1, 1, 2).unwrap();
    assert_eq!(data.to_rgba8().unwrap(), vec![7, 7, 7, 128]);
}

#[test]
fn test_gray_expanded_to_rgba() {
    let data = ImageData::new(vec![9], 1, 1, 1).unwrap();
    assert_eq!(data.to_rgba8().unwrap(), vec![9, 9, 9, 255]);
}

#[test]
fn test_default_sampler() {
    let desc = SamplerDesc::default();
    assert_eq!(desc.mag_filter, FilterMode::Linear);
    assert_eq!(desc.address_mode, AddressMode::Repeat);
    assert_eq!(desc.max_anisotropy, Some(16.0));
}
