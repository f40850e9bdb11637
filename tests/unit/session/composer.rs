use std::sync::Mutex;

use image::RgbaImage;
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::*;
use crate::assets::decode::decode_image;
use crate::data::weather::WeatherReport;
use crate::foundation::core::Canvas;
use crate::store::MemoryStore;

#[derive(Default)]
struct RecordingWeather {
    cities: Mutex<Vec<String>>,
}

impl WeatherProvider for RecordingWeather {
    fn current(&self, city: &str, _units: &str) -> InkframeResult<WeatherReport> {
        self.cities.lock().unwrap().push(city.to_owned());
        Err(InkframeError::upstream("offline"))
    }
}

fn config() -> InkframeConfig {
    let mut c = InkframeConfig::default();
    c.canvas = Canvas::new(80, 48).unwrap();
    c.fallback_dir = std::path::PathBuf::from("/nonexistent/inkframe-fallback");
    c
}

fn composer_with(config: InkframeConfig, store: Arc<MemoryStore>) -> FrameComposer {
    FrameComposer::builder(config, store)
        .fonts(Arc::new(FontCache::empty()))
        .build()
        .unwrap()
}

fn png(rgb: [u8; 3], w: u32, h: u32) -> Vec<u8> {
    encode_png(&RgbaImage::from_pixel(w, h, image::Rgba([rgb[0], rgb[1], rgb[2], 255]))).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn composer_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<FrameComposer>();
}

#[test]
fn week_start_is_monday() {
    assert_eq!(week_start(date(2025, 6, 4)), date(2025, 6, 2));
    assert_eq!(week_start(date(2025, 6, 2)), date(2025, 6, 2));
    assert_eq!(week_start(date(2025, 6, 8)), date(2025, 6, 2));
}

#[test]
fn fresh_background_reports_diagnostics() {
    let store = Arc::new(MemoryStore::new());
    store
        .write("weekly-art/2025-06-02_2_1.png", &png([200, 30, 30], 160, 96), "image/png")
        .unwrap();
    let composer = composer_with(config(), store);

    let mut req = FrameRequest::for_date("familydisplay", date(2025, 6, 4));
    req.variant_index = 1;
    req.theme = Some("geometric".to_owned());
    let frame = composer.render_frame(&req).unwrap();

    assert_eq!((frame.width, frame.height), (80, 48));
    let img = decode_image(&frame.png).unwrap();
    assert_eq!(img.dimensions(), (80, 48));

    let d = &frame.diagnostics;
    assert_eq!(d.tier, SourceTier::Fresh);
    assert_eq!(d.layout_key, None);
    assert!(!d.quantized);
    assert_eq!(
        d.headers(),
        vec![
            ("X-Background-Tier", "fresh".to_owned()),
            ("X-Background-Key", "weekly-art/2025-06-02_2_1.png".to_owned()),
            ("X-Theme", "geometric".to_owned()),
            ("X-Variant", "2_1".to_owned()),
        ]
    );
}

#[test]
fn empty_store_still_produces_a_frame() {
    let composer = composer_with(config(), Arc::new(MemoryStore::new()));
    let frame = composer
        .render_frame(&FrameRequest::for_date("familydisplay", date(2025, 6, 4)))
        .unwrap();
    assert_eq!(frame.diagnostics.tier, SourceTier::Placeholder);
    assert_eq!(frame.diagnostics.background_origin, "placeholder");
    assert_eq!(decode_image(&frame.png).unwrap().dimensions(), (80, 48));
}

#[test]
fn unavailable_store_aborts() {
    let store = Arc::new(MemoryStore::new());
    store.set_offline(true);
    let composer = composer_with(config(), store);
    let err = composer
        .render_frame(&FrameRequest::for_date("familydisplay", date(2025, 6, 4)))
        .unwrap_err();
    assert!(err.is_store_unavailable());
}

#[test]
fn out_of_range_day_is_rejected() {
    let composer = composer_with(config(), Arc::new(MemoryStore::new()));
    let mut req = FrameRequest::for_date("familydisplay", date(2025, 6, 4));
    req.day_index = 7;
    assert!(composer.render_frame(&req).is_err());
}

#[test]
fn quantized_frames_use_only_palette_colors() {
    let store = Arc::new(MemoryStore::new());
    store
        .write("weekly-art/2025-06-02_0_0.png", &png([120, 140, 90], 80, 48), "image/png")
        .unwrap();
    let composer = composer_with(config(), store);
    let mut req = FrameRequest::for_date("familydisplay", date(2025, 6, 2));
    req.quantize = Some(true);
    let frame = composer.render_frame(&req).unwrap();
    assert!(frame.diagnostics.quantized);

    let palette = &composer.config().palette;
    let img = decode_image(&frame.png).unwrap();
    assert!(img.pixels().all(|p| palette.contains([p[0], p[1], p[2]])));
}

#[test]
fn renders_are_persisted_when_enabled() {
    let store = Arc::new(MemoryStore::new());
    let mut cfg = config();
    cfg.features.persist_renders = true;
    let composer = composer_with(cfg, store.clone());
    let frame = composer
        .render_frame(&FrameRequest::for_date("kitchen", date(2025, 6, 4)))
        .unwrap();
    assert_eq!(store.read("renders/kitchen/latest.png").unwrap(), frame.png);
    assert_eq!(store.read("renders/kitchen/2025-06-04.png").unwrap(), frame.png);
}

#[test]
fn renders_are_not_persisted_by_default() {
    let store = Arc::new(MemoryStore::new());
    let composer = composer_with(config(), store.clone());
    composer
        .render_frame(&FrameRequest::for_date("kitchen", date(2025, 6, 4)))
        .unwrap();
    assert!(store.list("renders/").unwrap().is_empty());
}

#[test]
fn missing_theme_is_picked_from_config() {
    let composer = composer_with(config(), Arc::new(MemoryStore::new()));
    let req = FrameRequest::for_date("familydisplay", date(2025, 6, 4));
    for seed in 0..10 {
        let frame = composer
            .render_frame_with(&req, &mut StdRng::seed_from_u64(seed))
            .unwrap();
        assert!(composer.config().themes.contains(&frame.diagnostics.theme));
    }
}

#[test]
fn city_precedence_request_then_layout_then_default() {
    let store = Arc::new(MemoryStore::new());
    let weather = Arc::new(RecordingWeather::default());
    let composer = FrameComposer::builder(config(), store.clone())
        .fonts(Arc::new(FontCache::empty()))
        .weather(weather.clone())
        .build()
        .unwrap();

    let mut req = FrameRequest::for_date("familydisplay", date(2025, 6, 4));
    let ctx = composer.render_data(&req).unwrap();
    assert_eq!(ctx.weather.city, "Darwin");

    let layout = serde_json::json!({"device_id": "familydisplay", "city": "Hobart", "elements": []});
    composer.layouts().save("familydisplay", None, &layout).unwrap();
    assert_eq!(composer.render_data(&req).unwrap().weather.city, "Hobart");

    req.city = Some("Perth".to_owned());
    let ctx = composer.render_data(&req).unwrap();
    assert_eq!(ctx.weather.city, "Perth");
    assert_eq!(ctx.device, "familydisplay");

    let cities = weather.cities.lock().unwrap();
    assert_eq!(cities.as_slice(), ["Darwin", "Hobart", "Perth"]);
}

#[test]
fn stored_layout_key_is_reported() {
    let store = Arc::new(MemoryStore::new());
    let composer = composer_with(config(), store);
    let layout = serde_json::json!({"elements": [{"kind": "box", "x": 4, "y": 4, "w": 20, "h": 10}]});
    composer.layouts().save("familydisplay", None, &layout).unwrap();
    let frame = composer
        .render_frame(&FrameRequest::for_date("familydisplay", date(2025, 6, 4)))
        .unwrap();
    assert_eq!(
        frame.diagnostics.layout_key.as_deref(),
        Some("layouts/familydisplay.json")
    );
    assert_eq!(frame.diagnostics.skipped_elements, 0);
}

#[test]
fn empty_device_uses_the_default_device() {
    let store = Arc::new(MemoryStore::new());
    let composer = composer_with(config(), store);
    let layout = serde_json::json!({"elements": [{"kind": "box", "x": 4, "y": 4, "w": 20, "h": 10}]});
    composer.layouts().save(DEFAULT_DEVICE, None, &layout).unwrap();

    let req = FrameRequest::for_date("", date(2025, 6, 4));
    let frame = composer.render_frame(&req).unwrap();
    assert_eq!(
        frame.diagnostics.layout_key.as_deref(),
        Some("layouts/familydisplay.json")
    );
    assert_eq!(composer.render_data(&req).unwrap().device, DEFAULT_DEVICE);
    assert!(composer.render_frame(&FrameRequest::default()).is_ok());
}

#[test]
fn unsafe_device_renders_but_is_not_persisted() {
    let store = Arc::new(MemoryStore::new());
    let mut cfg = config();
    cfg.features.persist_renders = true;
    let composer = composer_with(cfg, store.clone());
    for device in ["family display", "../kitchen"] {
        let frame = composer
            .render_frame(&FrameRequest::for_date(device, date(2025, 6, 4)))
            .unwrap();
        assert_eq!(frame.diagnostics.layout_key, None);
        assert_eq!(decode_image(&frame.png).unwrap().dimensions(), (80, 48));
    }
    assert!(store.list("renders/").unwrap().is_empty());
}

#[test]
fn traversing_theme_is_replaced_by_a_configured_one() {
    let composer = composer_with(config(), Arc::new(MemoryStore::new()));
    let mut req = FrameRequest::for_date("familydisplay", date(2025, 6, 4));
    for theme in ["../outside", "kids/../../etc", "a\\b"] {
        req.theme = Some(theme.to_owned());
        let frame = composer
            .render_frame_with(&req, &mut StdRng::seed_from_u64(3))
            .unwrap();
        let d = &frame.diagnostics;
        assert!(composer.config().themes.contains(&d.theme), "{theme}");
        assert!(d.headers().iter().all(|(_, v)| !v.contains("..")));
    }
}
