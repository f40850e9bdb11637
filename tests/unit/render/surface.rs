use super::*;

fn canvas(w: u32, h: u32) -> Canvas {
    Canvas::new(w, h).unwrap()
}

#[test]
fn empty_painter_is_transparent() {
    let out = Painter::new(canvas(4, 3)).unwrap().finish().unwrap();
    assert_eq!(out.dimensions(), (4, 3));
    assert!(out.pixels().all(|p| p.0 == [0, 0, 0, 0]));
}

#[test]
fn image_blit_preserves_pixels() {
    let img = RgbaImage::from_fn(8, 8, |x, _| {
        if x < 4 {
            image::Rgba([200, 10, 10, 255])
        } else {
            image::Rgba([10, 10, 200, 255])
        }
    });
    let mut p = Painter::new(canvas(8, 8)).unwrap();
    p.draw_image(&img, 0.0, 0.0).unwrap();
    let out = p.finish().unwrap();
    assert_eq!(out.get_pixel(1, 4).0, [200, 10, 10, 255]);
    assert_eq!(out.get_pixel(6, 4).0, [10, 10, 200, 255]);
}

#[test]
fn later_fills_cover_earlier_ones() {
    let mut p = Painter::new(canvas(16, 16)).unwrap();
    p.fill(&kurbo::Rect::new(0.0, 0.0, 16.0, 16.0), Rgba8::opaque(255, 0, 0));
    p.fill(&kurbo::Rect::new(4.0, 4.0, 12.0, 12.0), Rgba8::opaque(0, 0, 255));
    let out = p.finish().unwrap();
    assert_eq!(out.get_pixel(1, 1).0, [255, 0, 0, 255]);
    assert_eq!(out.get_pixel(8, 8).0, [0, 0, 255, 255]);
}

#[test]
fn translucent_fill_blends_over_background() {
    let bg = RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 0, 255]));
    let mut p = Painter::new(canvas(4, 4)).unwrap();
    p.draw_image(&bg, 0.0, 0.0).unwrap();
    p.fill(&kurbo::Rect::new(0.0, 0.0, 4.0, 4.0), Rgba8::WHITE.with_alpha(128));
    let out = p.finish().unwrap();
    let px = out.get_pixel(2, 2).0;
    assert_eq!(px[3], 255);
    assert!((110..=145).contains(&px[0]), "got {px:?}");
}

#[test]
fn draws_outside_the_canvas_are_clipped() {
    let mut p = Painter::new(canvas(4, 4)).unwrap();
    p.fill(&kurbo::Rect::new(-10.0, -10.0, 100.0, 2.0), Rgba8::BLACK);
    let out = p.finish().unwrap();
    assert_eq!(out.dimensions(), (4, 4));
    assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0, 255]);
    assert_eq!(out.get_pixel(0, 3).0[3], 0);
}
