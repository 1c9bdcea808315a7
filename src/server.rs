use crate::data::{TimetableRequest, TimetableResponse};
use crate::generator;
use axum::{Json, Router, routing::post};
use itertools::Itertools;
use log::info;

async fn generate_handler(
    Json(request): Json<TimetableRequest>,
) -> Result<Json<TimetableResponse>, (axum::http::StatusCode, String)> {
    let config = request
        .to_config()
        .map_err(|e| (axum::http::StatusCode::BAD_REQUEST, e))?;
    info!(
        "Timetable request: subjects [{}], classes [{}]",
        config.subjects.iter().map(|s| s.name.as_str()).join(", "),
        config.classes.iter().join(", ")
    );

    let timetable = generator::generate_timetable(&config);
    Ok(Json(TimetableResponse {
        timetable,
        start_time: request.start_time,
    }))
}

pub async fn run_server() {
    let app = Router::new().route("/api/generate-timetable", post(generate_handler));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:5000")
        .await
        .unwrap();

    println!("Server running at http://{}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
