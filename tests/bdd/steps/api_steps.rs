use cucumber::{given, then, when};
use serde_json::Value;

use crate::PubtrackWorld;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Start an in-process axum test server using the world's temp database.
/// Binds to a random free port (port 0), stores the port and task handle
/// in the world for later use and cleanup.
pub async fn start_test_server(world: &mut PubtrackWorld) -> u16 {
    let db_path = world
        .db_path
        .as_ref()
        .expect("db_path not set — did you forget 'Given a pubtrack database is initialized'?")
        .clone();

    let db = pubtrack::db::Database::open(&db_path)
        .expect("failed to open database for web server");
    let app = pubtrack::web::create_router(pubtrack::web::AppState::new(db));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind to ephemeral port");
    let port = listener
        .local_addr()
        .expect("failed to get local addr")
        .port();

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("web server error in test");
    });

    world.server_port = Some(port);
    world.server_handle = Some(handle);

    // Poll until the server accepts connections (up to 20 tries).
    for _ in 0..20 {
        if world
            .http_client
            .get(format!("http://127.0.0.1:{port}/"))
            .send()
            .await
            .is_ok()
        {
            break;
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
    }

    port
}

/// Send a request to the running test server and record status, headers,
/// and body on the world. `@alias` in `path` and `body` becomes the id.
async fn send(world: &mut PubtrackWorld, method: reqwest::Method, path: &str, body: Option<&str>) {
    let port = world
        .server_port
        .expect("server not started — add 'Given the web server is running'");
    let url = format!("http://127.0.0.1:{port}{}", world.resolve(path));

    let mut request = world.http_client.request(method.clone(), &url);
    if let Some(raw) = body {
        let resolved = world.resolve(raw);
        let json: Value = serde_json::from_str(&resolved)
            .unwrap_or_else(|e| panic!("step body {resolved:?} is not valid JSON: {e}"));
        request = request.json(&json);
    }
    let resp = request
        .send()
        .await
        .unwrap_or_else(|e| panic!("{method} {url} failed: {e}"));

    let header = |name: reqwest::header::HeaderName| {
        resp.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
    };
    world.last_response_status = Some(resp.status().as_u16());
    world.last_response_content_type = header(reqwest::header::CONTENT_TYPE);
    world.last_response_disposition = header(reqwest::header::CONTENT_DISPOSITION);
    world.last_response_body = Some(
        resp.text()
            .await
            .unwrap_or_else(|e| panic!("failed to read response body: {e}")),
    );
}

/// Parse the last response body as JSON.
fn parse_last_response(world: &PubtrackWorld) -> Value {
    let body = world
        .last_response_body
        .as_deref()
        .expect("no HTTP response body recorded");
    serde_json::from_str(body)
        .unwrap_or_else(|e| panic!("response body is not valid JSON: {e}\nbody: {body}"))
}

// ---------------------------------------------------------------------------
// Given steps
// ---------------------------------------------------------------------------

/// Start the in-process web server backed by the world's temp database.
#[given("the web server is running")]
async fn the_web_server_is_running(world: &mut PubtrackWorld) {
    start_test_server(world).await;
}

// ---------------------------------------------------------------------------
// When steps
// ---------------------------------------------------------------------------

#[when(expr = "I GET {string}")]
async fn i_get(world: &mut PubtrackWorld, path: String) {
    send(world, reqwest::Method::GET, &path, None).await;
}

#[when(expr = "I DELETE {string}")]
async fn i_delete(world: &mut PubtrackWorld, path: String) {
    send(world, reqwest::Method::DELETE, &path, None).await;
}

#[when(expr = "I POST {string} with body {string}")]
async fn i_post_with_body(world: &mut PubtrackWorld, path: String, body: String) {
    send(world, reqwest::Method::POST, &path, Some(&body)).await;
}

#[when(expr = "I PUT {string} with body {string}")]
async fn i_put_with_body(world: &mut PubtrackWorld, path: String, body: String) {
    send(world, reqwest::Method::PUT, &path, Some(&body)).await;
}

/// POST, assert 201, and remember the created id under `alias`.
#[given(expr = "I created via API at {string} with body {string} as {string}")]
async fn i_created_via_api(world: &mut PubtrackWorld, path: String, body: String, alias: String) {
    send(world, reqwest::Method::POST, &path, Some(&body)).await;
    assert_eq!(
        world.last_response_status,
        Some(201),
        "expected 201 from POST {path}: {:?}",
        world.last_response_body
    );
    let id = parse_last_response(world)["id"]
        .as_i64()
        .expect("created record has no numeric id");
    world.ids.insert(alias, id);
}

// ---------------------------------------------------------------------------
// Then steps
// ---------------------------------------------------------------------------

#[then(expr = "the response status is {int}")]
async fn the_response_status_is(world: &mut PubtrackWorld, expected: u16) {
    let actual = world
        .last_response_status
        .expect("no HTTP response recorded — did you make a request?");
    assert_eq!(
        actual, expected,
        "expected HTTP status {expected} but got {actual}: {:?}",
        world.last_response_body
    );
}

#[then(expr = "the response body contains {string}")]
async fn the_response_body_contains(world: &mut PubtrackWorld, expected: String) {
    let body = world
        .last_response_body
        .as_deref()
        .expect("no HTTP response body recorded — did you make a request?");
    assert!(
        body.contains(&expected),
        "expected response body to contain {expected:?}, but body was:\n{body}"
    );
}

/// Partial match, e.g. "text/xml" against "text/xml; charset=utf-8".
#[then(expr = "the response content type is {string}")]
async fn the_response_content_type_is(world: &mut PubtrackWorld, expected: String) {
    let actual = world
        .last_response_content_type
        .as_deref()
        .unwrap_or("<no content-type header>");
    assert!(
        actual.contains(&expected),
        "expected Content-Type to contain {expected:?} but got {actual:?}"
    );
}

#[then(expr = "the response disposition contains {string}")]
async fn the_response_disposition_contains(world: &mut PubtrackWorld, expected: String) {
    let actual = world
        .last_response_disposition
        .as_deref()
        .unwrap_or("<no content-disposition header>");
    assert!(
        actual.contains(&expected),
        "expected Content-Disposition to contain {expected:?} but got {actual:?}"
    );
}

#[then(expr = "the response JSON has {int} items")]
async fn the_response_json_has_items(world: &mut PubtrackWorld, expected: usize) {
    let json = parse_last_response(world);
    let items = json.as_array().expect("response JSON is not an array");
    assert_eq!(items.len(), expected, "unexpected item count in {json}");
}

/// Comma-separated `title` values of the response array, in order.
#[then(expr = "the response JSON titles are {string}")]
async fn the_response_json_titles_are(world: &mut PubtrackWorld, expected: String) {
    let json = parse_last_response(world);
    let titles: Vec<&str> = json
        .as_array()
        .expect("response JSON is not an array")
        .iter()
        .map(|p| p["title"].as_str().unwrap_or_default())
        .collect();
    assert_eq!(titles.join(","), expected);
}

/// Comma-separated `last_name` values of the response array, in order.
#[then(expr = "the response JSON last names are {string}")]
async fn the_response_json_last_names_are(world: &mut PubtrackWorld, expected: String) {
    let json = parse_last_response(world);
    let names: Vec<&str> = json
        .as_array()
        .expect("response JSON is not an array")
        .iter()
        .map(|e| e["last_name"].as_str().unwrap_or_default())
        .collect();
    assert_eq!(names.join(","), expected);
}

/// Compare a top-level field; non-string values compare by their JSON text.
#[then(expr = "the response JSON field {string} is {string}")]
async fn the_response_json_field_is(world: &mut PubtrackWorld, field: String, expected: String) {
    let json = parse_last_response(world);
    let value = &json[&field];
    let actual = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    assert_eq!(actual, expected, "field {field:?} in {json}");
}

/// Comma-separated author names of a single publication response.
#[then(expr = "the response author names are {string}")]
async fn the_response_author_names_are(world: &mut PubtrackWorld, expected: String) {
    let json = parse_last_response(world);
    let names: Vec<&str> = json["authors"]
        .as_array()
        .expect("response JSON has no authors array")
        .iter()
        .map(|a| a["name"].as_str().unwrap_or_default())
        .collect();
    assert_eq!(names.join(","), expected);
}
