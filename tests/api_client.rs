//! Status and body mapping of the HTTP backend.

use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{
    body_json, body_string, header, header_exists, method, path, query_param,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

use studyscope::api::{ApiError, HttpBackend, SearchBackend};
use studyscope::credentials::CredentialStore;
use studyscope::model::types::{NewAccount, NewCollection};
use studyscope::search::query::{QueryState, SearchRequest};

mod util;
use util::{TempDataDir, product_json, search_json, study_json};

fn backend(server: &MockServer, data: &TempDataDir) -> HttpBackend {
    HttpBackend::new(
        &server.uri(),
        CredentialStore::in_data_dir(&data.path()),
        Duration::from_secs(5),
    )
    .unwrap()
}

fn request(terms: &[&str]) -> SearchRequest {
    let mut state = QueryState::new();
    for t in terms {
        state.add_term(t).unwrap();
    }
    SearchRequest::from_state(&state).unwrap()
}

#[tokio::test]
async fn search_decodes_results_without_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/search"))
        .and(query_param("q", "insulin"))
        .and(query_param("per_page", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_json(
            1,
            vec![study_json("Insulin pumps", vec![product_json(3, "Glucose")])],
        )))
        .expect(1)
        .mount(&server)
        .await;

    let data = TempDataDir::new();
    let response = backend(&server, &data)
        .search(&request(&["insulin"]))
        .await
        .unwrap();
    assert_eq!(response.total, Some(1));
    let first = &response.results()[0];
    assert_eq!(first.title, "Insulin pumps");
    assert_eq!(first.data_products.as_ref().unwrap()[0].id, 3);
}

#[tokio::test]
async fn unauthorized_maps_to_login_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/search-history"))
        .and(header("authorization", "Bearer old"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "expired" })))
        .mount(&server)
        .await;

    let data = TempDataDir::signed_in("old");
    let err = backend(&server, &data).search_history().await.unwrap_err();
    assert_eq!(err, ApiError::Unauthorized);
    assert!(err.requires_login());
}

#[tokio::test]
async fn string_detail_is_kept_and_structured_detail_dropped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/collections/41/items"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "detail": "Collection not found" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/collections"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [{ "loc": ["body", "title"], "msg": "field required" }]
        })))
        .mount(&server)
        .await;

    let data = TempDataDir::signed_in("tok");
    let http = backend(&server, &data);

    let err = http
        .add_collection_items(
            41,
            &studyscope::model::types::CollectionItems {
                data_product_ids: vec![1],
            },
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ApiError::Status {
            status: 404,
            detail: Some("Collection not found".into())
        }
    );

    let err = http
        .create_collection(&NewCollection {
            title: "x".into(),
            description: None,
        })
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ApiError::Status {
            status: 422,
            detail: None
        }
    );
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let data = TempDataDir::new();
    let err = backend(&server, &data)
        .search(&request(&["statin"]))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn suggest_attaches_token_when_present() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/suggest"))
        .and(query_param("q", "hep"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "suggestions": [{ "text": "heparin", "type": "drug" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let data = TempDataDir::signed_in("tok");
    let suggestions = backend(&server, &data).suggest("hep").await.unwrap();
    assert_eq!(suggestions[0].text, "heparin");
    assert_eq!(suggestions[0].kind, "drug");
}

#[tokio::test]
async fn login_posts_form_encoded_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("username=ada%40example.org&password=p%26ss"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let data = TempDataDir::new();
    let token = backend(&server, &data)
        .login("ada@example.org", "p&ss")
        .await
        .unwrap();
    assert_eq!(token.access_token, "fresh");
}

#[tokio::test]
async fn listings_keep_rows_with_null_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/saved-searches"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "query": "aspirin", "category": "studies", "results_count": 3 },
            { "id": 2, "query": null, "category": null, "results_count": null }
        ])))
        .mount(&server)
        .await;

    let data = TempDataDir::signed_in("tok");
    let saved = backend(&server, &data).saved_searches().await.unwrap();
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0].query.as_deref(), Some("aspirin"));
    assert_eq!(saved[1].query, None);
    assert_eq!(saved[1].results_count, None);
}

#[tokio::test]
async fn rejected_login_keeps_server_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "detail": "Incorrect email or password" })),
        )
        .mount(&server)
        .await;

    let data = TempDataDir::new();
    let err = backend(&server, &data)
        .login("a@b.c", "wrong")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ApiError::Status {
            status: 401,
            detail: Some("Incorrect email or password".into())
        }
    );
    assert!(!err.requires_login());
}

fn account() -> NewAccount {
    NewAccount {
        email: "ada@example.org".into(),
        username: "ada".into(),
        password: "s3cret".into(),
    }
}

#[tokio::test]
async fn register_posts_account_and_returns_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .and(body_json(json!({
            "email": "ada@example.org",
            "username": "ada",
            "password": "s3cret"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "welcome",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let data = TempDataDir::new();
    let token = backend(&server, &data).register(&account()).await.unwrap();
    assert_eq!(token.access_token, "welcome");
}

#[tokio::test]
async fn duplicate_registration_surfaces_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "detail": "Email already registered" })),
        )
        .mount(&server)
        .await;

    let data = TempDataDir::new();
    let err = backend(&server, &data)
        .register(&account())
        .await
        .unwrap_err();
    assert_eq!(err.user_message("Registration failed"), "Email already registered");
}

#[tokio::test]
async fn health_is_false_for_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let data = TempDataDir::new();
    assert!(!backend(&server, &data).health().await.unwrap());
}
