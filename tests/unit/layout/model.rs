use super::*;
use crate::data::weather::WeatherSnapshot;

fn ctx() -> RenderContext {
    RenderContext {
        weather: WeatherSnapshot::stub("Darwin,AU"),
        joke: "A joke.".to_owned(),
        date: "Wednesday, Jun 04".to_owned(),
        theme: "abstract".to_owned(),
        device: "familydisplay".to_owned(),
    }
}

#[test]
fn content_type_tags_round_trip() {
    for t in ContentType::ALL {
        assert_eq!(t.tag().parse::<ContentType>().unwrap(), t);
    }
    assert_eq!("weather-minmax".parse::<ContentType>().unwrap(), ContentType::WeatherMinMax);
    assert!("CALENDAR".parse::<ContentType>().is_err());
}

#[test]
fn resolution_covers_every_type() {
    let c = ctx();
    assert_eq!(ContentType::WeatherCity.resolve(&c), "Darwin,AU");
    assert_eq!(ContentType::WeatherMinMax.resolve(&c), "23\u{b0} / 31\u{b0}");
    assert_eq!(ContentType::WeatherNote.resolve(&c), "Sunny");
    assert_eq!(ContentType::WeatherIcon.resolve(&c), "sunny");
    assert_eq!(ContentType::WeatherTemp.resolve(&c), "33\u{b0}");
    assert_eq!(ContentType::Forecast.resolve(&c), "");
    assert_eq!(ContentType::Date.resolve(&c), "Wednesday, Jun 04");
    assert_eq!(ContentType::Joke.resolve(&c), "A joke.");
    assert_eq!(ContentType::Theme.resolve(&c), "abstract");
    assert_eq!(ContentType::Device.resolve(&c), "familydisplay");
}

#[test]
fn weight_threshold() {
    assert!(Weight::Numeric(600.0).is_bold());
    assert!(!Weight::Numeric(599.0).is_bold());
    assert!(Weight::Named("Bold".to_owned()).is_bold());
    assert!(Weight::Named("700".to_owned()).is_bold());
    assert!(!Weight::Named("normal".to_owned()).is_bold());
}

#[test]
fn malformed_elements_are_dropped_individually() {
    let doc = LayoutDocument::from_json_slice(
        br##"{
            "device_id": "kitchen",
            "city": "Hobart",
            "elements": [
                {"kind": "box", "x": 0, "y": 0, "w": 10, "h": 10},
                {"kind": "sparkle", "x": 0, "y": 0, "w": 10, "h": 10},
                {"kind": "text", "x": "left", "y": 0, "w": 10, "h": 10},
                {"kind": "text", "x": 1, "y": 2, "w": 3, "h": 4, "type": "JOKE", "color": "#112233", "weight": 700},
                {"kind": "icon", "x": 1, "y": 2, "w": 3, "h": 4, "color": "nope"}
            ]
        }"##,
    )
    .unwrap();
    assert_eq!(doc.device_id, "kitchen");
    assert_eq!(doc.mode, "default");
    assert_eq!(doc.city.as_deref(), Some("Hobart"));
    assert_eq!(doc.elements.len(), 2);
    assert_eq!(doc.elements[1].content_type(), Some(ContentType::Joke));
    assert!(doc.elements[1].is_bold());
}

#[test]
fn documents_without_elements_fail() {
    assert!(LayoutDocument::from_json_slice(b"[]").is_err());
    assert!(LayoutDocument::from_json_slice(br#"{"device_id":"x"}"#).is_err());
    assert!(LayoutDocument::from_json_slice(b"not json").is_err());
}

#[test]
fn visible_rect_clips_and_rejects() {
    let canvas = Canvas::DEFAULT;
    let el = Element::new(ElementKind::Box, 700.0, 400.0, 200.0, 200.0);
    let r = el.visible_rect(canvas).unwrap();
    assert_eq!((r.x1, r.y1), (800.0, 480.0));

    for bad in [
        Element::new(ElementKind::Box, 900.0, 0.0, 10.0, 10.0),
        Element::new(ElementKind::Box, 0.0, 0.0, 0.0, 10.0),
        Element::new(ElementKind::Box, 0.0, 0.0, -5.0, 10.0),
        Element::new(ElementKind::Box, f64::NAN, 0.0, 5.0, 10.0),
    ] {
        assert!(bad.visible_rect(canvas).is_err(), "{bad:?}");
    }
}

#[test]
fn default_layout_fits_the_canvas() {
    let doc = LayoutDocument::default_for("familydisplay");
    assert_eq!(doc.device_id, "familydisplay");
    for el in &doc.elements {
        let r = el.visible_rect(Canvas::DEFAULT).unwrap();
        assert_eq!((r.width(), r.height()), (el.w, el.h));
    }
    let types: Vec<_> = doc.elements.iter().filter_map(Element::content_type).collect();
    for t in [
        ContentType::Date,
        ContentType::WeatherCity,
        ContentType::WeatherMinMax,
        ContentType::WeatherNote,
        ContentType::WeatherIcon,
        ContentType::Joke,
    ] {
        assert!(types.contains(&t), "{t:?}");
    }
}

#[test]
fn default_layout_survives_serialization() {
    let doc = LayoutDocument::default_for("d");
    let bytes = serde_json::to_vec(&doc).unwrap();
    assert_eq!(LayoutDocument::from_json_slice(&bytes).unwrap(), doc);
}
