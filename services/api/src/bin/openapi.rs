//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI document for the meal planner REST API.
//!
//! Usage: `openapi [OUTPUT]` (defaults to `openapi.json`).

use meal_planner_api::web::rest::ApiDoc;
use std::path::PathBuf;
use utoipa::OpenApi;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("openapi.json"));

    let mut doc = ApiDoc::openapi();
    doc.info.title = "Meal Planner API".to_string();
    doc.info.version = env!("CARGO_PKG_VERSION").to_string();

    std::fs::write(&output, doc.to_pretty_json()?)?;
    println!("OpenAPI document written to {}", output.display());
    Ok(())
}
