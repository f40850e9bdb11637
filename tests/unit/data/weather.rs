use super::*;

fn d(m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, m, day).unwrap()
}

#[test]
fn classification_table() {
    let cases = [
        ("Thunderstorm with rain", IconKind::Storm),
        ("light rain", IconKind::Rain),
        ("Drizzle", IconKind::Rain),
        ("shower sleet", IconKind::Rain),
        ("Heavy SNOW", IconKind::Snow),
        ("hail", IconKind::Snow),
        ("Mist", IconKind::Fog),
        ("smoke", IconKind::Fog),
        ("few clouds", IconKind::Partly),
        ("Broken clouds", IconKind::Partly),
        ("overcast clouds", IconKind::Cloudy),
        ("Clear sky", IconKind::Sunny),
        ("Sunny", IconKind::Sunny),
        ("", IconKind::Cloudy),
        ("volcanic ash", IconKind::Cloudy),
    ];
    for (desc, want) in cases {
        assert_eq!(classify(desc), want, "{desc:?}");
    }
}

#[test]
fn storm_outranks_everything() {
    assert_eq!(classify("thunder, rain, snow and fog"), IconKind::Storm);
    assert_eq!(classify("sunny spells with snow"), IconKind::Snow);
}

#[test]
fn stub_values() {
    let s = WeatherSnapshot::stub("Darwin,AU");
    assert_eq!(s.city, "Darwin,AU");
    assert_eq!(s.description, "Sunny");
    assert_eq!((s.min, s.max, s.temp), (23, 31, Some(33)));
    assert_eq!(s.icon_code.as_deref(), Some("01d"));
    assert_eq!(s.icon_kind, IconKind::Sunny);
    assert_eq!(s.minmax(), "23\u{b0} / 31\u{b0}");
}

#[test]
fn report_is_rounded_and_classified() {
    let r = WeatherReport {
        temp: Some(27.6),
        min: 22.4,
        max: 31.5,
        description: "scattered clouds".to_owned(),
        icon_code: Some("03d".to_owned()),
    };
    let s = WeatherSnapshot::from_report("Darwin", &r, Vec::new());
    assert_eq!((s.min, s.max, s.temp), (22, 32, Some(28)));
    assert_eq!(s.description, "Scattered clouds");
    assert_eq!(s.icon_kind, IconKind::Partly);
}

fn sample(date: NaiveDate, temp: f64, desc: &str) -> ForecastSample {
    ForecastSample {
        date,
        temp: Some(temp),
        description: desc.to_owned(),
        icon_code: Some("10d".to_owned()),
    }
}

#[test]
fn forecast_skips_today_and_keeps_two_days() {
    let today = d(6, 2);
    let samples = vec![
        sample(today, 40.0, "Clear"),
        sample(d(6, 3), 21.2, "Rain"),
        sample(d(6, 3), 29.7, "Clouds"),
        sample(d(6, 3), 25.0, "Sun"),
        sample(d(6, 4), 22.0, "Mist"),
        sample(d(6, 5), 10.0, "Snow"),
    ];
    let out = summarize_forecast(&samples, today, 2);
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].date, d(6, 3));
    assert_eq!((out[0].min, out[0].max), (21, 30));
    assert_eq!(out[0].description, "Clouds");
    assert_eq!(out[1].date, d(6, 4));
}

#[test]
fn forecast_days_without_temps_are_dropped() {
    let mut s = sample(d(6, 3), 0.0, "x");
    s.temp = None;
    assert!(summarize_forecast(&[s], d(6, 2), 2).is_empty());
}

#[test]
fn forecast_line_formats_weekdays() {
    let mut s = WeatherSnapshot::stub("X");
    s.forecast = summarize_forecast(
        &[sample(d(6, 3), 21.0, "a"), sample(d(6, 4), 22.0, "b")],
        d(6, 2),
        2,
    );
    assert_eq!(s.forecast_line(), "Tue 21\u{b0}/21\u{b0}  Wed 22\u{b0}/22\u{b0}");
}
