use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use clap::CommandFactory;
use studyscope::Cli;

mod util;
use util::{TempDataDir, product_json, search_json, study_json};

fn base_cmd(server: &str, data: &TempDataDir, config_home: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("studyscope");
    cmd.env_remove("STUDYSCOPE_BASE_URL")
        .env("XDG_CONFIG_HOME", config_home.path())
        .env("NO_COLOR", "1")
        .args(["--base-url", server, "--data-dir"])
        .arg(data.path());
    cmd
}

#[test]
fn cli_debug_assert_passes() {
    Cli::command().debug_assert();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn search_json_renders_page_view() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/search"))
        .and(query_param("q", "aspirin OR statin"))
        .and(query_param("page", "2"))
        .and(query_param("status", "Completed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_json(
            25,
            vec![study_json("Statin outcomes", vec![product_json(7, "Lipids")])],
        )))
        .expect(1)
        .mount(&server)
        .await;

    let data = TempDataDir::new();
    let cfg = TempDir::new().unwrap();
    let output = base_cmd(&server.uri(), &data, &cfg)
        .args([
            "--json",
            "search",
            "aspirin",
            "statin",
            "--filter",
            "status=Completed",
            "--page",
            "2",
        ])
        .assert()
        .success()
        .get_output()
        .clone();

    let json: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(json["terms"], json!(["aspirin", "statin"]));
    assert_eq!(json["results"]["state"], "results");
    assert_eq!(json["results"]["items"][0]["badges"][0], "Phase: III");
    assert_eq!(json["pagination"]["current"], 2);
    assert_eq!(json["pagination"]["prev_disabled"], false);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn fourth_term_is_a_validation_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let data = TempDataDir::new();
    let cfg = TempDir::new().unwrap();
    base_cmd(&server.uri(), &data, &cfg)
        .args(["search", "a1", "b2", "c3", "d4"])
        .assert()
        .code(2)
        .stderr(contains("Maximum 3 search terms allowed"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn collections_without_login_exit_with_redirect() {
    let server = MockServer::start().await;
    let data = TempDataDir::new();
    let cfg = TempDir::new().unwrap();
    base_cmd(&server.uri(), &data, &cfg)
        .args(["collections", "list"])
        .assert()
        .code(3)
        .stderr(contains("/auth/login?next=%2Fcollections"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn empty_collection_title_is_rejected_locally() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let data = TempDataDir::signed_in("tok");
    let cfg = TempDir::new().unwrap();
    base_cmd(&server.uri(), &data, &cfg)
        .args(["collections", "create", ""])
        .assert()
        .code(2)
        .stderr(contains("Title is required"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn login_token_is_sent_as_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/collections"))
        .and(header("authorization", "Bearer abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "title": "Trial Batch A", "description": "Phase III cohorts" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let data = TempDataDir::new();
    let cfg = TempDir::new().unwrap();
    base_cmd(&server.uri(), &data, &cfg)
        .args(["login", "--token", "abc123"])
        .assert()
        .success();
    assert!(data.path().join("credentials.json").exists());

    base_cmd(&server.uri(), &data, &cfg)
        .args(["collections", "list"])
        .assert()
        .success()
        .stdout(contains("Trial Batch A"));

    base_cmd(&server.uri(), &data, &cfg)
        .arg("logout")
        .assert()
        .success()
        .stdout(contains("Signed out."));
    assert!(!data.path().join("credentials.json").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn wrong_password_is_a_plain_failure() {
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
    let cfg = TempDir::new().unwrap();
    base_cmd(&server.uri(), &data, &cfg)
        .args(["login", "--email", "a@b.c", "--password", "wrong"])
        .assert()
        .code(1)
        .stderr(contains("Incorrect email or password"));
    assert!(!data.path().join("credentials.json").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn register_stores_token_and_reports_duplicates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "welcome",
            "token_type": "bearer"
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "detail": "Email already registered" })),
        )
        .mount(&server)
        .await;

    let data = TempDataDir::new();
    let cfg = TempDir::new().unwrap();
    let args = [
        "register",
        "--email",
        "ada@example.org",
        "--username",
        "ada",
        "--password",
        "s3cret",
    ];
    base_cmd(&server.uri(), &data, &cfg)
        .env_remove("STUDYSCOPE_PASSWORD")
        .args(args)
        .assert()
        .success()
        .stdout(contains("Account created"));
    let stored = std::fs::read_to_string(data.path().join("credentials.json")).unwrap();
    assert!(stored.contains("welcome"));

    base_cmd(&server.uri(), &data, &cfg)
        .args(args)
        .assert()
        .code(1)
        .stderr(contains("Email already registered"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unauthorized_response_exits_with_login_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/saved-searches"))
        .respond_with(ResponseTemplate::new(401).set_body_string("not json at all"))
        .mount(&server)
        .await;

    let data = TempDataDir::signed_in("stale");
    let cfg = TempDir::new().unwrap();
    base_cmd(&server.uri(), &data, &cfg)
        .args(["saved", "list"])
        .assert()
        .code(3)
        .stderr(contains("next=%2Fsaved-searches"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn short_suggest_input_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/suggest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "suggestions": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let data = TempDataDir::new();
    let cfg = TempDir::new().unwrap();
    let output = base_cmd(&server.uri(), &data, &cfg)
        .args(["--json", "suggest", "a"])
        .assert()
        .success()
        .get_output()
        .clone();
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["suggestions"], json!([]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn health_reports_reachability() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .mount(&server)
        .await;

    let data = TempDataDir::new();
    let cfg = TempDir::new().unwrap();
    base_cmd(&server.uri(), &data, &cfg)
        .args(["--json", "health"])
        .assert()
        .success()
        .stdout(contains("\"healthy\": true"));

    base_cmd("http://127.0.0.1:9", &data, &cfg)
        .arg("health")
        .assert()
        .code(1)
        .stderr(contains("not reachable"));
}

#[test]
fn completions_mention_binary_name() {
    cargo_bin_cmd!("studyscope")
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(contains("studyscope"));
}
