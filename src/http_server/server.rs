//! read-only http interface
//! `GET /` returns the current device snapshot as one flat json object

use std::net::TcpListener;
use std::sync::Arc;
use actix_web::{get, web, App, HttpResponse, HttpServer, Responder};
use crate::device_controller::device_state::DeviceState;
use crate::{info, warn};

const LOG_TAG: &str = "http_server";

#[get("/")]
async fn index(state: web::Data<DeviceState>) -> impl Responder {
    HttpResponse::Ok().json(state.to_dto())
}

/// bind every host that is available, fails only if none can be bound
fn bind_all(hosts: &[String], port: u16) -> std::io::Result<Vec<TcpListener>> {
    let mut listeners = Vec::new();
    let mut last_error = None;
    for host in hosts {
        match TcpListener::bind((host.as_str(), port)) {
            Ok(listener) => {
                info!(LOG_TAG, "listening on {}:{}", host, port);
                listeners.push(listener);
            }
            Err(e) => {
                warn!(LOG_TAG, "cannot bind {}:{}, error: {}", host, port, e);
                last_error = Some(e);
            }
        }
    }
    match (listeners.is_empty(), last_error) {
        (true, Some(e)) => Err(e),
        (true, None) => Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, "no web host configured")),
        _ => Ok(listeners),
    }
}

// run server until the process is stopped
pub async fn run(hosts: &[String], port: u16, state: Arc<DeviceState>) -> std::io::Result<()> {
    let data = web::Data::from(state);
    let mut server = HttpServer::new(move || App::new().app_data(data.clone()).service(index));
    for listener in bind_all(hosts, port)? {
        server = server.listen(listener)?;
    }
    server.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test as actix_test;
    use serde_json::{json, Value};
    use crate::device_controller::field_mapping::FieldMapping;
    use crate::entity::bo::telemetry_frame_bo::TelemetryFrame;

    fn state() -> Arc<DeviceState> {
        Arc::new(DeviceState::new("abc123", FieldMapping::heat_pump()))
    }

    #[actix_web::test]
    async fn test_disconnected_snapshot() {
        let state = state();
        let app = actix_test::init_service(App::new().app_data(web::Data::from(state)).service(index)).await;
        let req = actix_test::TestRequest::get().uri("/").to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["device_id"], "abc123");
        assert_eq!(body["connected"], 0);
        assert!(body["timestamp"].as_i64().unwrap() > 0);
        assert_eq!(body.as_object().unwrap().len(), 3);
    }

    #[actix_web::test]
    async fn test_connected_snapshot() {
        let state = state();
        state.update(&TelemetryFrame::from_json(&json!({"dps": {
            "1": true, "2": "Cooling", "4": 215, "5": "Smart", "15": 0,
            "16": 223, "17": "on", "25": 18
        }})));
        let app = actix_test::init_service(App::new().app_data(web::Data::from(state.clone())).service(index)).await;
        let req = actix_test::TestRequest::get().uri("/").to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["connected"], 1);
        assert_eq!(body["switch"], 1);
        assert_eq!(body["mode"], 0);
        assert_eq!(body["work_mode"], 1);
        assert_eq!(body["fault"], 0);
        assert_eq!(body["work_state"], "on");
        assert_eq!(body["effluent_temp"], 18);
        assert!((body["temp_set"].as_f64().unwrap() - 21.5).abs() < 1e-9);
        assert!((body["temp_current"].as_f64().unwrap() - 22.3).abs() < 1e-9);

        // dropped connection keeps the last known values
        state.set_connected(false);
        let req = actix_test::TestRequest::get().uri("/").to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["connected"], 0);
        assert_eq!(body["switch"], 1);
    }

    #[test]
    fn test_bind_all_skips_unavailable_hosts() {
        let hosts = vec!["203.0.113.1".to_string(), "127.0.0.1".to_string()];
        let listeners = bind_all(&hosts, 0).unwrap();
        assert_eq!(listeners.len(), 1);
        assert!(bind_all(&[], 0).is_err());
    }
}
