use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use httpmock::prelude::*;
use predicates::prelude::*;
use std::path::PathBuf;
use std::process::Command;

fn cargo_bin() -> Command {
    let mut cmd = Command::cargo_bin("apiharness").expect("binary exists");
    cmd.env_remove("ENV")
        .env_remove("APIHARNESS_LOG")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

fn repo_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative)
}

fn write_settings(temp: &assert_fs::TempDir, base_url: &str) -> PathBuf {
    let settings = temp.child("settings.json");
    settings
        .write_str(&format!(
            r#"{{
  "default": {{"timeout": 5, "retries": 1, "retry_backoff": 0.01, "default_env": "dev"}},
  "envs": {{
    "dev": {{"base_url": "{base_url}"}},
    "qa": {{"base_url": "{base_url}"}},
    "prod": {{"base_url": "{base_url}"}}
  }}
}}"#
        ))
        .unwrap();
    settings.path().to_path_buf()
}

fn write_search_cases(temp: &assert_fs::TempDir) -> PathBuf {
    let data = temp.child("data");
    data.child("search_products.json")
        .write_str(
            r#"[{"name": "search_top", "payload": {"search_product": "top"}, "expected_status": 200}]"#,
        )
        .unwrap();
    data.path().to_path_buf()
}

#[test]
fn displays_help() {
    let mut cmd = cargo_bin();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("API test harness"))
        .stdout(predicate::str::contains("--report-dir"));
}

#[test]
fn displays_version() {
    let mut cmd = cargo_bin();
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn unknown_environment_fails_before_any_request() {
    let temp = assert_fs::TempDir::new().unwrap();
    let server = MockServer::start();
    let catch_all = server.mock(|when, then| {
        when.path_contains("/api");
        then.status(200);
    });
    let settings = write_settings(&temp, &server.url("/api"));

    let mut cmd = cargo_bin();
    cmd.current_dir(temp.path())
        .arg("--config")
        .arg(&settings)
        .arg("--data-dir")
        .arg(repo_path("data"))
        .arg("--env")
        .arg("staging");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains(
            "Invalid --env 'staging'. Use one of: dev, prod, qa",
        ));
    catch_all.assert_hits(0);
}

#[test]
fn environment_variable_selects_environment() {
    let temp = assert_fs::TempDir::new().unwrap();

    let mut cmd = cargo_bin();
    cmd.current_dir(temp.path())
        .env("ENV", "Staging")
        .arg("--config")
        .arg(repo_path("config/settings.json"))
        .arg("--list");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid --env 'staging'"));
}

#[test]
fn lists_shipped_scenarios() {
    let temp = assert_fs::TempDir::new().unwrap();

    let mut cmd = cargo_bin();
    cmd.current_dir(temp.path())
        .arg("--config")
        .arg(repo_path("config/settings.json"))
        .arg("--data-dir")
        .arg(repo_path("data"))
        .arg("--list");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("brands_list"))
        .stdout(predicate::str::contains("single_product"))
        .stdout(predicate::str::contains("search_product[search_jean]"))
        .stdout(predicate::str::contains("7 scenario(s)"));
}

#[test]
fn tag_filter_narrows_listing() {
    let temp = assert_fs::TempDir::new().unwrap();

    let mut cmd = cargo_bin();
    cmd.current_dir(temp.path())
        .arg("--config")
        .arg(repo_path("config/settings.json"))
        .arg("--data-dir")
        .arg(repo_path("data"))
        .arg("--tag")
        .arg("regression")
        .arg("--list");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("products_list"))
        .stdout(predicate::str::contains("brands_list").not())
        .stdout(predicate::str::contains("1 scenario(s)"));
}

#[test]
fn runs_suite_against_mocked_api() {
    let temp = assert_fs::TempDir::new().unwrap();
    let server = MockServer::start();
    let products = r#"{"responseCode":200,"products":[{"id":1,"name":"Blue Top","price":"Rs. 500","brand":"Polo","category":{"usertype":{"usertype":"Women"},"category":"Tops"}}]}"#;

    let brands = server.mock(|when, then| {
        when.method(GET).path("/api/brandsList");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(r#"{"responseCode":200,"brands":[{"id":1,"brand":"Polo"}]}"#);
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/categories");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(r#"{"categories":["Tops","Dress"]}"#);
    });
    let products_mock = server.mock(|when, then| {
        when.method(GET).path("/api/productsList");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(products);
    });
    let search = server.mock(|when, then| {
        when.method(POST)
            .path("/api/searchProduct")
            .header("content-type", "application/x-www-form-urlencoded")
            .body("search_product=top");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(products);
    });

    let settings = write_settings(&temp, &server.url("/api"));
    let data_dir = write_search_cases(&temp);

    let mut cmd = cargo_bin();
    cmd.current_dir(temp.path())
        .arg("--config")
        .arg(&settings)
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--env")
        .arg("QA")
        .arg("--report-dir")
        .arg("allure-results");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("PASSED brands_list"))
        .stdout(predicate::str::contains("5 passed"))
        .stdout(predicate::str::contains("All scenarios passed"));

    brands.assert();
    products_mock.assert_hits(2);
    search.assert();

    let results = temp.child("allure-results");
    results
        .child("environment.properties")
        .assert(predicate::str::contains("env=qa"));
    let written = std::fs::read_dir(results.path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with("-result.json"))
        .count();
    assert_eq!(written, 5);

    let logs: Vec<_> = std::fs::read_dir(temp.child("logs").path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .collect();
    assert_eq!(logs.len(), 1, "{logs:?}");
    let name = logs[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("run.") && name.ends_with(".log"), "{name}");
    assert!(std::fs::read_to_string(&logs[0])
        .unwrap()
        .contains("Using base URL"));
}

#[test]
fn failing_scenario_exits_with_one() {
    let temp = assert_fs::TempDir::new().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/brandsList");
        then.status(500).body("upstream exploded");
    });

    let settings = write_settings(&temp, &server.url("/api"));
    let data_dir = write_search_cases(&temp);

    let mut cmd = cargo_bin();
    cmd.current_dir(temp.path())
        .arg("--config")
        .arg(&settings)
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--filter")
        .arg("^brands");

    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("FAILED brands_list"))
        .stdout(predicate::str::contains("Expected status 200, but got 500"));
}

#[test]
fn filter_without_matches_is_an_error() {
    let temp = assert_fs::TempDir::new().unwrap();

    let mut cmd = cargo_bin();
    cmd.current_dir(temp.path())
        .arg("--config")
        .arg(repo_path("config/settings.json"))
        .arg("--data-dir")
        .arg(repo_path("data"))
        .arg("--filter")
        .arg("^nothing$");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("No scenarios match"));
}
