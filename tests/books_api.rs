use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use shelf_db::Database;
use shelf_kernel::settings::Settings;
use tower::ServiceExt;

async fn app() -> Router {
    let db = Database::open_in_memory().await.unwrap();
    let registry = shelf_app::app::build_registry(&db);
    registry.run_migrations(&db).await.unwrap();
    let app = shelf_http::build_router(&registry, &Settings::default());

    let (status, _) = send(&app, "POST", "/books", Some(power_up())).await;
    assert_eq!(status, StatusCode::CREATED);
    app
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn power_up() -> Value {
    json!({
        "isbn": "0681161018",
        "amazon_url": "http://a.co/eobPtX2",
        "author": "Matthew Lane",
        "language": "english",
        "pages": 264,
        "publisher": "Princeton University Press",
        "title": "Power-Up: Unlocking the Hidden Mathematics in Video Games",
        "year": 2017
    })
}

fn lunch() -> Value {
    json!({
        "isbn": "000",
        "amazon_url": "http://a.co/eobPtX2",
        "author": "Phoenix",
        "language": "english",
        "pages": 2,
        "publisher": "Self",
        "title": "Almost Time for Lunch",
        "year": 2023
    })
}

#[tokio::test]
async fn lists_books() {
    let app = app().await;

    let (status, body) = send(&app, "GET", "/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "books": [power_up()] }));
}

#[tokio::test]
async fn list_matches_storage_and_get_shape() {
    let app = app().await;
    send(&app, "POST", "/books", Some(lunch())).await;

    let (_, body) = send(&app, "GET", "/books", None).await;
    let books = body["books"].as_array().unwrap();
    assert_eq!(books.len(), 2);

    for book in books {
        let isbn = book["isbn"].as_str().unwrap();
        let (status, single) = send(&app, "GET", &format!("/books/{isbn}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&single["book"], book);
    }
}

#[tokio::test]
async fn gets_a_book() {
    let app = app().await;

    let (status, body) = send(&app, "GET", "/books/0681161018", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "book": power_up() }));
}

#[tokio::test]
async fn missing_book_is_404() {
    let app = app().await;

    let (status, body) = send(&app, "GET", "/books/wrong", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({
            "error": {
                "message": "There is no book with an isbn of 'wrong'",
                "status": 404
            }
        })
    );
}

#[tokio::test]
async fn creates_a_book_and_echoes_it() {
    let app = app().await;

    let (status, body) = send(&app, "POST", "/books", Some(lunch())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "book": lunch() }));
}

#[tokio::test]
async fn rejects_book_with_eight_problems() {
    let app = app().await;
    let bad_book = json!({
        "isbn": 0,
        "amazon_url": 0,
        "author": 0,
        "language": 0,
        "pages": "2",
        "publisher": 0,
        "title": 0
    });

    let (status, body) = send(&app, "POST", "/books", Some(bad_book)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["status"], 400);
    assert_eq!(body["error"]["message"].as_array().unwrap().len(), 8);
}

#[tokio::test]
async fn rejects_numeral_string_pages() {
    let app = app().await;
    let mut book = lunch();
    book["pages"] = json!("2");

    let (status, body) = send(&app, "POST", "/books", Some(book)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"]["message"],
        json!(["instance.pages is not of a type(s) integer"])
    );

    let (status, _) = send(&app, "GET", "/books/000", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn whole_number_float_pages_are_accepted() {
    let app = app().await;
    let mut book = lunch();
    book["pages"] = json!(2.0);

    let (status, body) = send(&app, "POST", "/books", Some(book)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "book": lunch() }));

    let (status, body) = send(&app, "PUT", "/books/000", Some(json!({ "pages": 2.5 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"]["message"],
        json!(["instance.pages is not of a type(s) integer"])
    );
}

#[tokio::test]
async fn duplicate_isbn_is_a_server_error() {
    let app = app().await;

    let (status, body) = send(&app, "POST", "/books", Some(power_up())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["status"], 500);
    assert!(body["error"]["message"].is_string());
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/books")
        .header("content-type", "application/json")
        .body(Body::from("{\"isbn\": "))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"]["message"].is_string());
}

#[tokio::test]
async fn updates_a_book() {
    let app = app().await;
    let mut update = power_up();
    update["author"] = json!("");

    let (status, body) = send(&app, "PUT", "/books/0681161018", Some(update.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "book": update }));
}

#[tokio::test]
async fn partial_update_keeps_other_fields() {
    let app = app().await;

    let (status, body) = send(
        &app,
        "PUT",
        "/books/0681161018",
        Some(json!({ "title": "Power-Up", "year": 2018 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let mut expected = power_up();
    expected["title"] = json!("Power-Up");
    expected["year"] = json!(2018);
    assert_eq!(body["book"], expected);
}

#[tokio::test]
async fn invalid_update_changes_nothing() {
    let app = app().await;
    let mut update = power_up();
    update["author"] = json!("");
    update["pages"] = json!("264");

    let (status, body) = send(&app, "PUT", "/books/0681161018", Some(update)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"].as_array().unwrap().len(), 1);

    let (_, body) = send(&app, "GET", "/books/0681161018", None).await;
    assert_eq!(body["book"], power_up());
}

#[tokio::test]
async fn update_of_missing_book_is_404() {
    let app = app().await;

    let (status, _) = send(&app, "PUT", "/books/wrong", Some(json!({ "year": 2000 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deletes_a_book_once() {
    let app = app().await;

    let (status, body) = send(&app, "DELETE", "/books/0681161018", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Book deleted" }));

    let (status, _) = send(&app, "GET", "/books/0681161018", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "DELETE", "/books/0681161018", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["status"], 404);
}

#[tokio::test]
async fn openapi_document_describes_books() {
    let app = app().await;

    let (status, body) = send(&app, "GET", "/docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/books"]["post"].is_object());
    assert!(body["paths"]["/books/{isbn}"]["delete"].is_object());
    assert_eq!(
        body["components"]["schemas"]["Book"]["required"]
            .as_array()
            .unwrap()
            .len(),
        8
    );
}

#[tokio::test]
async fn unknown_route_uses_error_shape() {
    let app = app().await;

    let (status, body) = send(&app, "GET", "/authors", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Not Found");
}

#[tokio::test]
async fn unsupported_method_uses_error_shape() {
    let app = app().await;

    let (status, body) = send(&app, "PATCH", "/books/0681161018", Some(json!({}))).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        body,
        json!({ "error": { "message": "Method Not Allowed", "status": 405 } })
    );
}

#[tokio::test]
async fn missing_content_type_is_415() {
    let app = app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/books")
        .body(Body::from(lunch().to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["status"], 415);
}
