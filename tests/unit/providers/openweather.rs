use super::*;

#[test]
fn current_conditions_parse() {
    let value = serde_json::json!({
        "weather": [{"id": 802, "main": "Clouds", "description": "scattered clouds", "icon": "03d"}],
        "main": {"temp": 30.4, "feels_like": 35.0, "temp_min": 28.9, "temp_max": 31.6},
        "name": "Darwin"
    });
    let r = parse_current(value).unwrap();
    assert_eq!(r.temp, Some(30.4));
    assert_eq!((r.min, r.max), (28.9, 31.6));
    assert_eq!(r.description, "scattered clouds");
    assert_eq!(r.icon_code.as_deref(), Some("03d"));
}

#[test]
fn min_max_default_to_temp() {
    let value = serde_json::json!({
        "weather": [{"description": "clear sky", "icon": "01n"}],
        "main": {"temp": 25.0}
    });
    let r = parse_current(value).unwrap();
    assert_eq!((r.min, r.max), (25.0, 25.0));
}

#[test]
fn current_without_conditions_is_upstream_error() {
    let value = serde_json::json!({"weather": [], "main": {"temp": 1.0}});
    assert!(matches!(parse_current(value), Err(InkframeError::Upstream(_))));
}

#[test]
fn forecast_groups_three_hourly_samples() {
    let value = serde_json::json!({
        "list": [
            {"dt_txt": "2025-06-02 21:00:00", "main": {"temp": 26.0}, "weather": [{"description": "clear sky", "icon": "01n"}]},
            {"dt_txt": "2025-06-03 00:00:00", "main": {"temp": 24.2}, "weather": [{"description": "light rain", "icon": "10n"}]},
            {"dt_txt": "2025-06-03 12:00:00", "main": {"temp": 31.0}, "weather": [{"description": "broken clouds", "icon": "04d"}]},
            {"dt_txt": "2025-06-04 12:00:00", "main": {"temp": 30.0}, "weather": [{"description": "few clouds", "icon": "02d"}]},
            {"dt_txt": "2025-06-05 12:00:00", "main": {"temp": 29.0}, "weather": [{"description": "mist", "icon": "50d"}]},
            {"main": {"temp": 99.0}, "weather": []}
        ]
    });
    let today = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
    let days = parse_forecast(value, today, 2).unwrap();
    assert_eq!(days.len(), 2);
    assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2025, 6, 3).unwrap());
    assert_eq!((days[0].min, days[0].max), (24, 31));
    assert_eq!(days[0].description, "Broken Clouds");
    assert_eq!(days[0].icon_code, "04d");
    assert_eq!(days[1].description, "Few Clouds");
}

#[test]
fn icon_codes_are_validated() {
    let icons = OpenWeatherIcons::new(HttpClient::new(std::time::Duration::from_secs(1)));
    assert!(icons.fetch("../etc").is_err());
    assert!(icons.fetch("").is_err());
}
