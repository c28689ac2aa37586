//! Acceptance tests for the repopulse binary
//!
//! Each test runs the real binary in a scratch XDG environment with the
//! API base URL pointed at a mock GitHub server.

use repopulse_core::types::{Metric, PopularKind};
use repopulse_core::Database;
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_data: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new(api_url: &str, repos: &[&str]) -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_data = base.join("xdg-data");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_data).expect("failed to create XDG_DATA_HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        write_config(&xdg_config, api_url, repos);

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_data,
            xdg_config,
            xdg_state,
        }
    }

    fn db_path(&self) -> PathBuf {
        self.xdg_data.join("repopulse/traffic.db")
    }

    fn csv_path(&self) -> PathBuf {
        self.xdg_data.join("repopulse/traffic.csv")
    }

    fn open_db(&self) -> Database {
        let db = Database::open(&self.db_path()).expect("failed to open database");
        db.migrate().expect("failed to run migrations");
        db
    }
}

fn write_config(xdg_config: &std::path::Path, api_url: &str, repos: &[&str]) {
    let repo_list = repos
        .iter()
        .map(|r| format!("\"{}\"", r))
        .collect::<Vec<_>>()
        .join(", ");
    let content = format!(
        "repos = [{}]\n\n[github]\ntoken = \"test-token\"\napi_url = \"{}\"\ntimeout_secs = 5\n",
        repo_list, api_url
    );

    let config_dir = xdg_config.join("repopulse");
    fs::create_dir_all(&config_dir).expect("failed to create config dir");
    fs::write(config_dir.join("config.toml"), content).expect("failed to write config");
}

fn run_bin(env: &CliTestEnv, args: &[&str]) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("repopulse"));

    Command::new(bin_path)
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_DATA_HOME", &env.xdg_data)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .env_remove("GITHUB_TOKEN")
        .output()
        .unwrap_or_else(|e| panic!("failed to execute repopulse: {e}"))
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let rendered_args = args
        .iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "repopulse {rendered_args} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        output.status, stdout, stderr
    );
}

/// Mount the four traffic endpoints for one repo with a fixed dataset.
async fn mount_repo(server: &MockServer, repo: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{}/traffic/views", repo)))
        .and(query_param("per", "day"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "count": 16, "uniques": 12,
            "views": [
                {"timestamp": "2026-08-01T00:00:00Z", "count": 3, "uniques": 2},
                {"timestamp": "2026-08-02T00:00:00Z", "count": 5, "uniques": 4},
                {"timestamp": "2026-08-03T00:00:00Z", "count": 0, "uniques": 0},
                {"timestamp": "2026-08-04T00:00:00Z", "count": 8, "uniques": 6}
            ]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/repos/{}/traffic/clones", repo)))
        .and(query_param("per", "day"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "count": 3, "uniques": 2,
            "clones": [
                {"timestamp": "2026-08-01T00:00:00Z", "count": 1, "uniques": 1},
                {"timestamp": "2026-08-02T00:00:00Z", "count": 2, "uniques": 1}
            ]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/repos/{}/traffic/popular/referrers", repo)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"referrer": "news.ycombinator.com", "count": 30, "uniques": 20}
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/repos/{}/traffic/popular/paths", repo)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"path": format!("/{}/blob/main/README.md", repo), "count": 9, "uniques": 7}
        ])))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn fetch_populates_db_and_csv() {
    let server = MockServer::start().await;
    mount_repo(&server, "alice/alpha").await;

    let env = CliTestEnv::new(&server.uri(), &["alice/alpha"]);
    let output = run_bin(&env, &["fetch"]);
    assert_success(&["fetch"], &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Repositories fetched: 1"));

    let db = env.open_db();
    let rows = db.list_traffic().unwrap();
    assert_eq!(rows.len(), 6);

    let repo = "alice/alpha".parse().unwrap();
    let views = db.traffic_for(&repo, Metric::Views).unwrap();
    assert_eq!(views.iter().map(|r| r.count).sum::<i64>(), 16);
    assert_eq!(
        db.list_popular(&repo, PopularKind::Referrers).unwrap().len(),
        1
    );

    let csv = fs::read_to_string(env.csv_path()).unwrap();
    assert!(csv.starts_with("repo,date,metric,count,uniques\n"));
    assert!(csv.contains("alice/alpha,2026-08-04,views,8,6"));
}

#[tokio::test(flavor = "multi_thread")]
async fn fetch_exits_nonzero_on_partial_failure_but_keeps_good_repos() {
    let server = MockServer::start().await;
    mount_repo(&server, "alice/alpha").await;
    // alice/missing has no mounts; the mock server answers 404.

    let env = CliTestEnv::new(&server.uri(), &["alice/alpha", "alice/missing"]);
    let output = run_bin(&env, &["fetch"]);

    assert!(
        !output.status.success(),
        "fetch must exit non-zero when a repository fails"
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Repositories fetched: 1"));
    assert!(stdout.contains("Repositories skipped: 1"));
    assert!(stdout.contains("alice/missing"));

    // The repository that succeeded is still committed.
    let db = env.open_db();
    let repos = db.repos_with_traffic().unwrap();
    assert_eq!(repos.len(), 1);
    assert_eq!(repos[0].full_name(), "alice/alpha");
}

#[tokio::test(flavor = "multi_thread")]
async fn report_renders_persisted_aggregates() {
    let server = MockServer::start().await;
    mount_repo(&server, "alice/alpha").await;

    let env = CliTestEnv::new(&server.uri(), &["alice/alpha"]);
    assert_success(&["fetch"], &run_bin(&env, &["fetch"]));

    // The report reads the store only; shut the mock down first to
    // prove no network is involved.
    drop(server);

    let output = run_bin(&env, &["report"]);
    assert_success(&["report"], &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("alice/alpha views: 16 total"));
    assert!(stdout.contains("4.00/day"));
    assert!(stdout.contains("best 2026-08-04 (8)"));
}

#[tokio::test(flavor = "multi_thread")]
async fn referrers_prints_ranked_snapshot() {
    let server = MockServer::start().await;
    mount_repo(&server, "alice/alpha").await;

    let env = CliTestEnv::new(&server.uri(), &["alice/alpha"]);
    let output = run_bin(&env, &["referrers", "alice/alpha"]);
    assert_success(&["referrers", "alice/alpha"], &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("news.ycombinator.com: 30 hits, 20 uniques"));
}

#[tokio::test(flavor = "multi_thread")]
async fn rate_limit_prints_quota() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rate_limit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "resources": {
                "core": {"limit": 5000, "remaining": 4991, "reset": 1754400000}
            }
        })))
        .mount(&server)
        .await;

    let env = CliTestEnv::new(&server.uri(), &[]);
    let output = run_bin(&env, &["rate-limit"]);
    assert_success(&["rate-limit"], &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Rate limit: 5000 calls/hr"));
    assert!(stdout.contains("Remaining:  4991"));
}

#[tokio::test(flavor = "multi_thread")]
async fn dashboard_writes_html_from_store() {
    let server = MockServer::start().await;
    mount_repo(&server, "alice/alpha").await;

    let env = CliTestEnv::new(&server.uri(), &["alice/alpha"]);
    assert_success(&["fetch"], &run_bin(&env, &["fetch"]));

    let out = env.xdg_data.join("dashboard.html");
    let out_arg = out.to_str().unwrap();
    let output = run_bin(&env, &["dashboard", "--out", out_arg]);
    assert_success(&["dashboard", "--out", out_arg], &output);

    let html = fs::read_to_string(&out).unwrap();
    assert!(html.contains("chart.js"));
    assert!(html.contains("2026-08-04"));
}

#[tokio::test(flavor = "multi_thread")]
async fn fetch_without_token_fails() {
    let server = MockServer::start().await;

    let env = CliTestEnv::new(&server.uri(), &["alice/alpha"]);
    // Rewrite the config without a token.
    write_config_without_token(&env, &server.uri());

    let output = run_bin(&env, &["fetch"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("token"));
}

fn write_config_without_token(env: &CliTestEnv, api_url: &str) {
    let content = format!(
        "repos = [\"alice/alpha\"]\n\n[github]\napi_url = \"{}\"\n",
        api_url
    );
    fs::write(env.xdg_config.join("repopulse/config.toml"), content)
        .expect("failed to rewrite config");
}
