//! Exercises `HttpFetcher` and `WeatherService` against a mock WeatherAPI server.

use std::{sync::Arc, time::Duration};

use chrono::NaiveDate;
use dashboard_core::{
    ForecastParams, HttpFetcher, RequestPlanner, WeatherError, WeatherService,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

fn forecast_day(date: &str, avg_pressure: Option<f64>, hourly_pressures: &[f64]) -> serde_json::Value {
    let hours: Vec<serde_json::Value> = hourly_pressures
        .iter()
        .enumerate()
        .map(|(h, p)| {
            serde_json::json!({
                "time_epoch": 0,
                "time": format!("{date} {h:02}:00"),
                "temp_c": 3.2,
                "wind_kph": 14.4,
                "pressure_mb": p,
                "chance_of_rain": 0
            })
        })
        .collect();

    let mut day = serde_json::json!({
        "maxtemp_c": 6.1,
        "mintemp_c": 0.4,
        "avgtemp_c": 3.3,
        "avghumidity": 88,
        "daily_will_it_rain": 1,
        "daily_chance_of_rain": 75,
        "condition": {
            "text": "Light rain",
            "icon": "//cdn.weatherapi.com/weather/64x64/day/296.png",
            "code": 1183
        }
    });
    if let Some(p) = avg_pressure {
        day["avgpressure_mb"] = serde_json::json!(p);
    }

    serde_json::json!({ "date": date, "date_epoch": 0, "day": day, "hour": hours })
}

fn create_service(mock_server: &MockServer) -> WeatherService {
    let planner = RequestPlanner::new(mock_server.uri(), "TEST_KEY").with_max_range_days(Some(14));
    #[allow(clippy::expect_used)]
    let fetcher = HttpFetcher::new(Duration::from_secs(5)).expect("Failed to create fetcher");
    WeatherService::new(planner, Arc::new(fetcher))
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[tokio::test]
async fn test_forecast_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast.json"))
        .and(query_param("key", "TEST_KEY"))
        .and(query_param("q", "London"))
        .and(query_param("days", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "location": { "name": "London", "country": "United Kingdom" },
            "forecast": { "forecastday": [
                forecast_day("2024-01-15", Some(1011.0), &[1010.0]),
                forecast_day("2024-01-16", Some(1012.0), &[1010.0]),
                forecast_day("2024-01-17", Some(1013.0), &[1010.0]),
            ] }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = create_service(&mock_server);
    let params = ForecastParams { city: Some("London".into()), days: Some(3), ..Default::default() };

    let records = service.get_forecast(&params).await.unwrap();

    assert_eq!(records.len(), 3);
    let pressures: Vec<f64> = records.iter().map(|r| r.pressure).collect();
    assert_eq!(pressures, [1011.0, 1012.0, 1013.0]);
    assert_eq!(records[0].date, date("2024-01-15"));
    assert_eq!(records[0].condition, "Light rain");
    assert_eq!(records[0].hourly.len(), 1);
}

#[tokio::test]
async fn test_history_range_uses_hourly_pressure_fallback() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/history.json"))
        .and(query_param("dt", "2024-01-05"))
        .and(query_param("end_dt", "2024-01-06"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "location": { "name": "Paris" },
            "forecast": { "forecastday": [
                forecast_day("2024-01-05", None, &[1000.0, 1010.0, 1020.0]),
                forecast_day("2024-01-06", None, &[990.0, 1000.0]),
            ] }
        })))
        .mount(&mock_server)
        .await;

    let service = create_service(&mock_server);
    let params = ForecastParams {
        city: Some("Paris".into()),
        start_date: Some(date("2024-01-05")),
        end_date: Some(date("2024-01-06")),
        ..Default::default()
    };

    let records = service.get_forecast(&params).await.unwrap();

    assert_eq!(records[0].pressure, 1010.0);
    assert_eq!(records[1].pressure, 995.0);
    assert_eq!(records[0].hourly.len(), 3);
}

#[tokio::test]
async fn test_inverted_range_never_reaches_upstream() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let service = create_service(&mock_server);
    let params = ForecastParams {
        city: Some("Paris".into()),
        start_date: Some(date("2024-01-10")),
        end_date: Some(date("2024-01-05")),
        ..Default::default()
    };

    let err = service.get_forecast(&params).await.unwrap_err();
    assert!(matches!(err, WeatherError::InvalidRange(_)));
}

#[tokio::test]
async fn test_range_longer_than_limit_is_rejected() {
    let mock_server = MockServer::start().await;
    let service = create_service(&mock_server);

    let params = ForecastParams {
        start_date: Some(date("2024-01-01")),
        end_date: Some(date("2024-01-20")),
        ..Default::default()
    };

    let err = service.get_forecast(&params).await.unwrap_err();
    assert!(err.is_client_error());
}

#[tokio::test]
async fn test_current_single_sensor() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/current.json"))
        .and(query_param("q", "Tokyo"))
        .and(query_param("aqi", "no"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "location": { "name": "Tokyo" },
            "current": { "temp_c": 18.0, "humidity": 55, "pressure_mb": 1009.0, "wind_kph": 7.2 }
        })))
        .mount(&mock_server)
        .await;

    let service = create_service(&mock_server);
    let records = service.get_current(Some("Tokyo")).await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].sensor_id, "sensor1");
    assert_eq!(records[0].temperature, 18.0);
    assert_eq!(records[0].humidity, 55.0);
    assert_eq!(records[0].pressure, 1009.0);
}

#[tokio::test]
async fn test_current_missing_object_is_shape_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/current.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "location": { "name": "London" }
        })))
        .mount(&mock_server)
        .await;

    let service = create_service(&mock_server);
    let err = service.get_current(None).await.unwrap_err();

    assert!(matches!(err, WeatherError::UpstreamShape(_)));
}

#[tokio::test]
async fn test_unknown_city_surfaces_upstream_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast.json"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": { "code": 1006, "message": "No matching location found." }
        })))
        .mount(&mock_server)
        .await;

    let service = create_service(&mock_server);
    let params = ForecastParams { city: Some("Atlantis".into()), ..Default::default() };

    let err = service.get_forecast(&params).await.unwrap_err();

    assert_eq!(err.kind(), "transport");
    assert_eq!(err.upstream_status(), Some(400));
    assert!(err.to_string().contains("No matching location found."));
}

#[tokio::test]
async fn test_non_json_body_is_shape_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&mock_server)
        .await;

    let service = create_service(&mock_server);
    let err = service.get_forecast(&ForecastParams::default()).await.unwrap_err();

    assert!(matches!(err, WeatherError::UpstreamShape(_)));
}

#[tokio::test]
async fn test_unreachable_upstream_is_transport_error() {
    // Nothing listens on port 1.
    let planner = RequestPlanner::new("http://127.0.0.1:1", "TEST_KEY");
    let fetcher = HttpFetcher::new(Duration::from_secs(2)).unwrap();
    let service = WeatherService::new(planner, Arc::new(fetcher));

    let err = service.get_current(None).await.unwrap_err();
    assert!(matches!(err, WeatherError::Transport { status: None, .. }));

    // The reqwest cause follows the summary instead of being dropped.
    let summary = "Failed to send request to WeatherAPI.com (current): ";
    let message = err.to_string();
    let cause = message.split(summary).nth(1).unwrap_or_default();
    assert!(!cause.trim().is_empty(), "no cause in: {message}");
}
