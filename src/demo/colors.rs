//! In-memory colors API.
//!
//! # Responsibilities
//! - Serve a small CRUD resource with JSON bodies in both directions
//! - Produce a spread of status codes (200, 201, 302, 404) for capture
//!
//! # Design Decisions
//! - Names are case-insensitive; keys are stored lowercased
//! - Storage sits behind [`ColorStore`] so handlers never see the map

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::capture::CorrelationId;

/// A named RGB color. Serialized with PascalCase keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Color {
    pub name: String,
    #[serde(default)]
    pub red: u8,
    #[serde(default)]
    pub green: u8,
    #[serde(default)]
    pub blue: u8,
}

impl Color {
    pub fn new(name: impl Into<String>, red: u8, green: u8, blue: u8) -> Self {
        Self {
            name: name.into(),
            red,
            green,
            blue,
        }
    }
}

/// Storage for colors, keyed case-insensitively by name.
pub trait ColorStore: Send + Sync {
    /// All colors, ordered by name.
    fn list(&self) -> Vec<Color>;

    /// Look up a color by name.
    fn get(&self, name: &str) -> Option<Color>;

    /// Insert a new color. Returns `false` if the name is taken.
    fn insert(&self, color: Color) -> bool;

    /// Replace an existing color. Returns `false` if the name is unknown.
    fn update(&self, color: Color) -> bool;
}

/// [`ColorStore`] backed by a concurrent map.
#[derive(Debug, Default)]
pub struct InMemoryColorStore {
    colors: DashMap<String, Color>,
}

impl InMemoryColorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with red, green and blue.
    pub fn seeded() -> Self {
        let store = Self::new();
        store.insert(Color::new("red", 255, 0, 0));
        store.insert(Color::new("green", 0, 255, 0));
        store.insert(Color::new("blue", 0, 0, 255));
        store
    }
}

fn key(name: &str) -> String {
    name.to_lowercase()
}

impl ColorStore for InMemoryColorStore {
    fn list(&self) -> Vec<Color> {
        let mut colors: Vec<Color> = self.colors.iter().map(|c| c.value().clone()).collect();
        colors.sort_by(|a, b| key(&a.name).cmp(&key(&b.name)));
        colors
    }

    fn get(&self, name: &str) -> Option<Color> {
        self.colors.get(&key(name)).map(|c| c.value().clone())
    }

    fn insert(&self, color: Color) -> bool {
        match self.colors.entry(key(&color.name)) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(color);
                true
            }
        }
    }

    fn update(&self, color: Color) -> bool {
        match self.colors.get_mut(&key(&color.name)) {
            Some(mut existing) => {
                *existing = color;
                true
            }
            None => false,
        }
    }
}

/// Shared store handle injected into handlers.
pub type SharedStore = Arc<dyn ColorStore>;

/// Routes for the colors API.
pub fn routes(store: SharedStore) -> Router {
    Router::new()
        .route("/api/colors", get(list_colors).post(create_color).put(update_color))
        .route("/api/color", get(get_color))
        .with_state(store)
}

#[derive(Debug, Deserialize)]
pub struct ColorQuery {
    pub color: Option<String>,
}

async fn list_colors(State(store): State<SharedStore>) -> Json<Vec<Color>> {
    Json(store.list())
}

async fn get_color(State(store): State<SharedStore>, Query(query): Query<ColorQuery>) -> Response {
    match query.color.as_deref().and_then(|name| store.get(name)) {
        Some(color) => Json(color).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn create_color(
    id: CorrelationId,
    State(store): State<SharedStore>,
    Json(color): Json<Color>,
) -> Response {
    let location = format!("/api/color/{}", color.name);
    if !store.insert(color.clone()) {
        tracing::debug!(correlation_id = %id, name = %color.name, "Color already exists");
        return StatusCode::FOUND.into_response();
    }

    tracing::debug!(correlation_id = %id, name = %color.name, "Color created");
    (StatusCode::CREATED, [(header::LOCATION, location)], Json(color)).into_response()
}

async fn update_color(State(store): State<SharedStore>, Json(color): Json<Color>) -> Response {
    if store.update(color.clone()) {
        Json(color).into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app() -> Router {
        routes(Arc::new(InMemoryColorStore::seeded()))
    }

    fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap();
        request.extensions_mut().insert(CorrelationId::new());
        request
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn store_is_case_insensitive() {
        let store = InMemoryColorStore::seeded();
        assert_eq!(store.get("RED"), Some(Color::new("red", 255, 0, 0)));
        assert!(!store.insert(Color::new("Blue", 1, 1, 1)));
        assert!(store.update(Color::new("GREEN", 0, 128, 0)));
        assert_eq!(store.get("green").unwrap().name, "GREEN");
        assert!(!store.update(Color::new("purple", 0, 0, 0)));
    }

    #[test]
    fn color_uses_pascal_case_keys() {
        let json = serde_json::to_string(&Color::new("red", 255, 0, 0)).unwrap();
        assert_eq!(json, r#"{"Name":"red","Red":255,"Green":0,"Blue":0}"#);
    }

    #[tokio::test]
    async fn lists_seeded_colors() {
        let response = app()
            .oneshot(Request::get("/api/colors").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let names: Vec<String> = body_json(response)
            .await
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["Name"].as_str().unwrap().to_owned())
            .collect();
        assert_eq!(names, ["blue", "green", "red"]);
    }

    #[tokio::test]
    async fn gets_single_color_or_404() {
        let response = app()
            .oneshot(Request::get("/api/color?color=Red").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["Red"], 255);

        let response = app()
            .oneshot(Request::get("/api/color?color=mauve").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app()
            .oneshot(Request::get("/api/color").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn post_creates_then_reports_found() {
        let app = app();
        let body = r#"{"Name":"teal","Red":0,"Green":128,"Blue":128}"#;

        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/colors", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::LOCATION], "/api/color/teal");
        assert_eq!(body_json(response).await["Green"], 128);

        let response = app
            .oneshot(json_request("POST", "/api/colors", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
    }

    #[tokio::test]
    async fn put_updates_existing_only() {
        let app = app();

        let response = app
            .clone()
            .oneshot(json_request("PUT", "/api/colors", r#"{"Name":"red","Red":200}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(json_request("PUT", "/api/colors", r#"{"Name":"mauve"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
