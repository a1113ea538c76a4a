use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize)]
struct ToggleResponse {
    discount_id: String,
    is_favorite: bool,
    source: String,
    message: String,
    card_html: String,
}

#[derive(Debug, Deserialize)]
struct RemoveResponse {
    discount_id: String,
    remaining: usize,
    message: String,
}

#[derive(Debug, Deserialize)]
struct FavoritesResponse {
    favorites: Vec<String>,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static SPAWNED: Lazy<Mutex<Vec<u32>>> = Lazy::new(|| Mutex::new(Vec::new()));

#[cfg(unix)]
mod cleanup {
    use super::SPAWNED;
    use std::sync::Once;

    static REGISTER: Once = Once::new();

    pub fn register(pid: u32) {
        if let Ok(mut pids) = SPAWNED.lock() {
            pids.push(pid);
        }
        REGISTER.call_once(|| unsafe {
            libc::atexit(on_exit);
        });
    }

    extern "C" fn on_exit() {
        if let Ok(pids) = SPAWNED.lock() {
            for pid in pids.iter() {
                unsafe {
                    libc::kill(*pid as i32, libc::SIGTERM);
                }
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_path(kind: &str) -> std::path::PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("coupon_board_http_{kind}_{}_{}.json", std::process::id(), nanos));
    path
}

fn write_coupons() -> std::path::PathBuf {
    let path = unique_path("coupons");
    let coupons = serde_json::json!([
        {
            "discount_id": "c1",
            "title": "Pizza night",
            "description": "Two pizzas for the price of one",
            "discount_type": "percentage",
            "price": 50,
            "valid_until": "2000-01-01",
            "provider_link": "http://insecure.example.com"
        },
        {
            "discount_id": 2,
            "title": "Cinema",
            "discount_type": "fixed_amount",
            "price": 30,
            "discount_link": "https://cinema.example.com/deal",
            "coupon_code": "MOVIE30"
        }
    ]);
    std::fs::write(&path, serde_json::to_vec(&coupons).unwrap()).expect("write coupons");
    path
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/favorites")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server(backend_url: &str) -> TestServer {
    let port = pick_free_port();
    let child = Command::new(env!("CARGO_BIN_EXE_coupon_board"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", unique_path("storage"))
        .env("COUPONS_PATH", write_coupons())
        .env("BACKEND_URL", backend_url)
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn favorites(client: &Client, server: &TestServer) -> Vec<String> {
    let body: FavoritesResponse = client
        .get(format!("{}/api/favorites", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    body.favorites
}

async fn toggle(client: &Client, server: &TestServer, id: &str) -> reqwest::Response {
    client
        .post(format!("{}/api/favorites/toggle", server.base_url))
        .header("Cookie", "sessionid=s1; csrftoken=tok-abc")
        .json(&serde_json::json!({ "discount_id": id }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_listing_page_renders_cards() {
    let backend = MockServer::start().await;
    let server = spawn_server(&backend.uri()).await;
    let client = Client::new();

    let html = client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(html.contains(r#"data-discount-id="c1""#));
    assert!(html.contains(r#"data-discount-id="2""#));
    assert!(html.contains("expired-label"));
    assert!(html.contains("https://cinema.example.com/deal"));
    assert!(!html.contains("http://insecure.example.com"));
    assert!(html.contains(r#"data-code="MOVIE30""#));
}

#[tokio::test]
async fn http_toggle_forwards_csrf_and_persists() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/add_favorite/"))
        .and(header("X-CSRFToken", "tok-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "message": "Added to favorites"
        })))
        .expect(1)
        .mount(&backend)
        .await;
    let server = spawn_server(&backend.uri()).await;
    let client = Client::new();

    let response = toggle(&client, &server, "c1").await;
    assert!(response.status().is_success());
    let body: ToggleResponse = response.json().await.unwrap();
    assert_eq!(body.discount_id, "c1");
    assert!(body.is_favorite);
    assert_eq!(body.source, "backend");
    assert_eq!(body.message, "Added to favorites");
    assert!(body.card_html.contains("favorite-active"));

    assert_eq!(favorites(&client, &server).await, vec!["c1".to_string()]);

    let html = client
        .get(format!("{}/favorites", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("Total Favorites: 1"));
    assert!(html.contains("favorite-item"));
}

#[tokio::test]
async fn http_unauthorized_backend_keeps_local_favorite() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/add_favorite/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": "User not authenticated"
        })))
        .mount(&backend)
        .await;
    let server = spawn_server(&backend.uri()).await;
    let client = Client::new();

    let body: ToggleResponse = toggle(&client, &server, "2").await.json().await.unwrap();
    assert!(body.is_favorite);
    assert_eq!(body.source, "local_only");
    assert_eq!(body.message, "Added to favorites!");
    assert_eq!(favorites(&client, &server).await, vec!["2".to_string()]);
}

#[tokio::test]
async fn http_backend_failure_is_bad_gateway() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal server error"))
        .mount(&backend)
        .await;
    let server = spawn_server(&backend.uri()).await;
    let client = Client::new();

    let response = toggle(&client, &server, "c1").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(favorites(&client, &server).await.is_empty());
}

#[tokio::test]
async fn http_unknown_coupon_is_not_found() {
    let backend = MockServer::start().await;
    let server = spawn_server(&backend.uri()).await;
    let client = Client::new();

    let response = toggle(&client, &server, "missing").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_status_check_reflects_backend() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/check_favorite/c1/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "is_favorite": true })),
        )
        .mount(&backend)
        .await;
    let server = spawn_server(&backend.uri()).await;
    let client = Client::new();

    let body: serde_json::Value = client
        .get(format!("{}/api/favorites/c1/status", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["is_favorite"], serde_json::json!(true));
    assert!(body["card_html"].as_str().unwrap().contains("favorite-active"));
    assert!(!body["card_html"].as_str().unwrap().contains("favorite-item"));

    let body: serde_json::Value = client
        .get(format!("{}/api/favorites/c1/status?view=favorites", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["card_html"].as_str().unwrap().contains("favorite-item"));
}

#[tokio::test]
async fn http_remove_drops_favorite_and_reports_remaining() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/add_favorite/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success"
        })))
        .mount(&backend)
        .await;
    Mock::given(method("POST"))
        .and(path("/remove_favorite/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "message": "Removed from favorites"
        })))
        .expect(1)
        .mount(&backend)
        .await;
    let server = spawn_server(&backend.uri()).await;
    let client = Client::new();

    assert!(toggle(&client, &server, "c1").await.status().is_success());
    assert_eq!(favorites(&client, &server).await, vec!["c1".to_string()]);

    let response = client
        .post(format!("{}/api/favorites/remove", server.base_url))
        .header("Cookie", "csrftoken=tok-abc")
        .json(&serde_json::json!({ "discount_id": "c1" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let body: RemoveResponse = response.json().await.unwrap();
    assert_eq!(body.discount_id, "c1");
    assert_eq!(body.remaining, 0);
    assert_eq!(body.message, "Removed from favorites");

    assert!(favorites(&client, &server).await.is_empty());
    let html = client
        .get(format!("{}/favorites", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("Total Favorites: 0"));
    assert!(html.contains("no-results"));
}

#[tokio::test]
async fn http_reads_are_served_while_a_toggle_waits_on_backend() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/add_favorite/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "status": "success" }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&backend)
        .await;
    let server = spawn_server(&backend.uri()).await;

    let toggle_url = format!("{}/api/favorites/toggle", server.base_url);
    let pending = tokio::spawn(async move {
        Client::new()
            .post(toggle_url)
            .json(&serde_json::json!({ "discount_id": "c1" }))
            .send()
            .await
            .unwrap()
            .status()
    });
    sleep(Duration::from_millis(300)).await;

    let quick = Client::builder()
        .timeout(Duration::from_secs(1))
        .build()
        .unwrap();
    let started = Instant::now();
    assert!(favorites(&quick, &server).await.is_empty());
    let listing = quick
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(listing.status().is_success());
    assert!(started.elapsed() < Duration::from_secs(1));

    assert!(pending.await.unwrap().is_success());
    assert_eq!(favorites(&quick, &server).await, vec!["c1".to_string()]);
}
