use super::*;
use crate::assets::decode::encode_png;
use crate::data::weather::WeatherSnapshot;
use crate::foundation::config::FontPaths;
use crate::layout::color::LayoutColor;

fn canvas() -> Canvas {
    Canvas::new(200, 120).unwrap()
}

fn black() -> RgbaImage {
    RgbaImage::from_pixel(200, 120, image::Rgba([0, 0, 0, 255]))
}

fn ctx() -> RenderContext {
    RenderContext {
        weather: WeatherSnapshot::stub("Darwin,AU"),
        joke: "Why did the scarecrow win an award? He was outstanding in his field.".to_owned(),
        date: "Wednesday, Jun 04".to_owned(),
        theme: "abstract".to_owned(),
        device: "test".to_owned(),
    }
}

fn doc(elements: Vec<Element>) -> LayoutDocument {
    LayoutDocument {
        device_id: "test".to_owned(),
        mode: "default".to_owned(),
        city: None,
        elements,
    }
}

fn system_fonts() -> Option<FontCache> {
    let fonts = FontCache::load(&FontPaths {
        regular: None,
        bold: None,
        system_fallback: true,
    });
    (!fonts.is_empty()).then_some(fonts)
}

#[test]
fn background_must_match_canvas() {
    let fonts = FontCache::empty();
    let r = LayoutRenderer::new(canvas(), &fonts);
    let small = RgbaImage::new(10, 10);
    assert!(r.render(&small, &doc(vec![]), &ctx()).is_err());
}

#[test]
fn empty_layout_reproduces_background() {
    let fonts = FontCache::empty();
    let bg = RgbaImage::from_fn(200, 120, |x, y| image::Rgba([x as u8, y as u8, 77, 255]));
    let out = LayoutRenderer::new(canvas(), &fonts)
        .render(&bg, &doc(vec![]), &ctx())
        .unwrap();
    let max_diff = out
        .image
        .as_raw()
        .iter()
        .zip(bg.as_raw())
        .map(|(a, b)| a.abs_diff(*b))
        .max()
        .unwrap();
    assert!(max_diff <= 1, "background drifted by {max_diff}");
}

#[test]
fn panel_is_translucent_white() {
    let fonts = FontCache::empty();
    let out = LayoutRenderer::new(canvas(), &fonts)
        .render(
            &black(),
            &doc(vec![Element::new(ElementKind::Box, 20.0, 20.0, 100.0, 60.0)]),
            &ctx(),
        )
        .unwrap();
    let px = out.image.get_pixel(70, 50).0;
    assert!((105..=125).contains(&px[0]), "{px:?}");
    assert_eq!(px[3], 255);
    // Rounded corner leaves the exact corner untouched.
    assert_eq!(out.image.get_pixel(20, 20).0, [0, 0, 0, 255]);
    assert_eq!(out.image.get_pixel(10, 10).0, [0, 0, 0, 255]);
}

#[test]
fn later_elements_draw_on_top() {
    let fonts = FontCache::empty();
    let red = LayoutColor {
        r: 255,
        g: 0,
        b: 0,
        alpha: Some(255),
    };
    let blue = LayoutColor {
        r: 0,
        g: 0,
        b: 255,
        alpha: Some(255),
    };
    let out = LayoutRenderer::new(canvas(), &fonts)
        .render(
            &black(),
            &doc(vec![
                Element::new(ElementKind::Box, 10.0, 10.0, 100.0, 100.0).with_color(red),
                Element::new(ElementKind::Box, 60.0, 10.0, 100.0, 100.0).with_color(blue),
            ]),
            &ctx(),
        )
        .unwrap();
    assert_eq!(out.image.get_pixel(40, 60).0, [255, 0, 0, 255]);
    assert_eq!(out.image.get_pixel(85, 60).0, [0, 0, 255, 255]);
    assert_eq!(out.drawn, 2);
}

#[test]
fn bad_elements_are_skipped_not_fatal() {
    let fonts = FontCache::empty();
    let out = LayoutRenderer::new(canvas(), &fonts)
        .render(
            &black(),
            &doc(vec![
                Element::new(ElementKind::Icon, 0.0, 0.0, 50.0, 50.0).with_content(ContentType::Joke),
                Element::new(ElementKind::Box, 500.0, 500.0, 10.0, 10.0),
                Element::new(ElementKind::Box, 0.0, 0.0, f64::INFINITY, 10.0),
                Element::new(ElementKind::Text, 0.0, 0.0, 100.0, 40.0).with_content(ContentType::Date),
                Element::new(ElementKind::Icon, 100.0, 10.0, 80.0, 80.0)
                    .with_content(ContentType::WeatherIcon),
            ]),
            &ctx(),
        )
        .unwrap();
    // Text is skipped as well: no fonts are loaded.
    assert_eq!(out.skipped, 4);
    assert_eq!(out.drawn, 1);
    assert_eq!(out.image.dimensions(), (200, 120));
}

#[test]
fn partially_offscreen_panels_are_clipped() {
    let fonts = FontCache::empty();
    let out = LayoutRenderer::new(canvas(), &fonts)
        .render(
            &black(),
            &doc(vec![Element::new(ElementKind::Box, 150.0, 80.0, 400.0, 400.0)]),
            &ctx(),
        )
        .unwrap();
    assert_eq!(out.skipped, 0);
    assert!(out.image.get_pixel(175, 100).0[0] > 90);
}

#[test]
fn text_stays_inside_its_element() {
    let Some(fonts) = system_fonts() else {
        eprintln!("skipping: no system fonts");
        return;
    };
    let white = RgbaImage::from_pixel(200, 120, image::Rgba([255, 255, 255, 255]));
    let el = Element::new(ElementKind::Text, 20.0, 10.0, 120.0, 70.0).with_content(ContentType::Joke);
    let out = LayoutRenderer::new(canvas(), &fonts)
        .render(&white, &doc(vec![el]), &ctx())
        .unwrap();
    assert_eq!(out.skipped, 0);

    let mut inked = 0;
    for (x, y, px) in out.image.enumerate_pixels() {
        if px[0] < 200 {
            assert!((20..=140).contains(&x) && (10..=80).contains(&y), "ink at {x},{y}");
            inked += 1;
        }
    }
    assert!(inked > 20, "expected some text ink, got {inked}");
}

#[test]
fn literal_text_is_used_for_unknown_types() {
    let Some(fonts) = system_fonts() else {
        eprintln!("skipping: no system fonts");
        return;
    };
    let white = RgbaImage::from_pixel(200, 120, image::Rgba([255, 255, 255, 255]));
    let mut el = Element::new(ElementKind::Text, 10.0, 10.0, 180.0, 40.0).with_text("Hello");
    el.content = Some("CALENDAR".to_owned());
    let out = LayoutRenderer::new(canvas(), &fonts)
        .render(&white, &doc(vec![el]), &ctx())
        .unwrap();
    assert!(out.image.pixels().any(|p| p[0] < 128));
}

struct GreenIcons;

impl IconSource for GreenIcons {
    fn fetch(&self, _code: &str) -> InkframeResult<Vec<u8>> {
        encode_png(&RgbaImage::from_pixel(10, 10, image::Rgba([0, 255, 0, 255])))
    }
}

#[test]
fn bitmap_icons_are_scaled_into_the_element() {
    let fonts = FontCache::empty();
    let cache = IconCache::new(4);
    let source = GreenIcons;
    let out = LayoutRenderer::new(canvas(), &fonts)
        .with_bitmap_icons(&cache, &source)
        .render(
            &black(),
            &doc(vec![
                Element::new(ElementKind::Icon, 100.0, 20.0, 80.0, 40.0)
                    .with_content(ContentType::WeatherIcon),
            ]),
            &ctx(),
        )
        .unwrap();
    // 40x40 icon centered in an 80x40 box.
    assert_eq!(out.image.get_pixel(140, 40).0, [0, 255, 0, 255]);
    assert_eq!(out.image.get_pixel(105, 40).0, [0, 0, 0, 255]);
    assert_eq!(cache.len(), 1);
}
