use super::*;

#[test]
fn decode_png_dimensions() {
    let img = RgbaImage::from_raw(2, 1, vec![100, 50, 200, 255, 1, 2, 3, 255]).unwrap();
    let bytes = encode_png(&img).unwrap();
    let back = decode_image(&bytes).unwrap();
    assert_eq!(back.dimensions(), (2, 1));
    assert_eq!(back.get_pixel(0, 0).0, [100, 50, 200, 255]);
}

#[test]
fn translucent_images_keep_alpha() {
    let img = RgbaImage::from_raw(1, 1, vec![10, 20, 30, 128]).unwrap();
    let bytes = encode_png(&img).unwrap();
    assert_eq!(decode_image(&bytes).unwrap().get_pixel(0, 0).0[3], 128);
}

#[test]
fn garbage_fails_to_decode() {
    assert!(decode_image(b"definitely not an image").is_err());
}
