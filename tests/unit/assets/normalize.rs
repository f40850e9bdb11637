use super::*;

fn checker(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, y| {
        if (x / 3 + y / 3) % 2 == 0 {
            image::Rgba([255, 255, 255, 255])
        } else {
            image::Rgba([0, 0, 0, 255])
        }
    })
}

#[test]
fn output_always_matches_canvas() {
    let canvas = Canvas::DEFAULT;
    for (w, h) in [(1, 1), (200, 200), (1920, 1080), (480, 800), (801, 479), (3, 1000)] {
        let out = normalize_to_canvas(checker(w, h), canvas);
        assert_eq!(out.dimensions(), (800, 480), "input {w}x{h}");
    }
}

#[test]
fn already_sized_image_is_unchanged() {
    let canvas = Canvas::new(40, 24).unwrap();
    let img = checker(40, 24);
    let out = normalize_to_canvas(img.clone(), canvas);
    assert_eq!(out.as_raw(), img.as_raw());
}

#[test]
fn crop_is_centered() {
    // Left third red, middle green, right third blue; a square canvas keeps only the middle.
    let img = RgbaImage::from_fn(300, 100, |x, _| match x {
        0..100 => image::Rgba([255, 0, 0, 255]),
        100..200 => image::Rgba([0, 255, 0, 255]),
        _ => image::Rgba([0, 0, 255, 255]),
    });
    let out = normalize_to_canvas(img, Canvas::new(100, 100).unwrap());
    assert_eq!(out.get_pixel(50, 50).0, [0, 255, 0, 255]);
    assert_eq!(out.get_pixel(5, 50).0, [0, 255, 0, 255]);
}

#[test]
fn empty_input_yields_blank_canvas() {
    let out = normalize_to_canvas(RgbaImage::new(0, 0), Canvas::new(8, 4).unwrap());
    assert_eq!(out.dimensions(), (8, 4));
}
