use std::io::Write;

use critic_core::{CriticConfig, CriticError, ReviewMode};
use critic_review::pipeline::{fetch_diff, run, RunOptions, RunStats};
use critic_review::reviewer::FALLBACK_REVIEW;
use wiremock::matchers::{any, body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FILES_PATH: &str = "/repos/octo/hello/pulls/7/files";
const COMMENTS_PATH: &str = "/repos/octo/hello/pulls/7/comments";
const ISSUE_COMMENTS_PATH: &str = "/repos/octo/hello/issues/7/comments";
const COMPLETIONS_PATH: &str = "/v1/chat/completions";
const HEAD_SHA: &str = "6dcb09b5b57875f334f61aebed695e2e4193db5e";

struct Harness {
    server: MockServer,
    event_file: tempfile::NamedTempFile,
}

impl Harness {
    async fn start() -> Self {
        let server = MockServer::start().await;
        let event = serde_json::json!({
            "action": "synchronize",
            "pull_request": {
                "number": 7,
                "url": format!("{}/repos/octo/hello/pulls/7", server.uri()),
                "head": { "sha": HEAD_SHA },
            },
        });
        let event_file = write_event(&event.to_string());
        Self { server, event_file }
    }

    fn options(&self, mode: ReviewMode, dry_run: bool) -> RunOptions {
        let mut config = CriticConfig::default();
        config.github.api_url = self.server.uri();
        config.llm.base_url = Some(self.server.uri());
        config.review.mode = mode;
        RunOptions {
            event_path: Some(self.event_file.path().to_path_buf()),
            config,
            dry_run,
        }
    }

    async fn list_files(&self, files: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(FILES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(files))
            .expect(1)
            .mount(&self.server)
            .await;
    }
}

fn write_event(json: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

fn env(key: &str) -> Option<String> {
    match key {
        "GITHUB_REPOSITORY" => Some("octo/hello".into()),
        "GITHUB_TOKEN" => Some("ghs_test".into()),
        "OPENAI_API_KEY" => Some("sk-test".into()),
        _ => None,
    }
}

fn completion(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": text } }]
    }))
}

#[tokio::test]
async fn event_without_pull_request_makes_no_network_calls() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let event_file = write_event(r#"{"ref":"refs/heads/main","pusher":{"name":"octo"}}"#);
    let mut config = CriticConfig::default();
    config.github.api_url = server.uri();
    config.llm.base_url = Some(server.uri());
    let options = RunOptions {
        event_path: Some(event_file.path().to_path_buf()),
        config,
        dry_run: false,
    };

    let err = run(&options, env).await.unwrap_err();
    assert!(matches!(err, CriticError::MissingEventData(_)));
    assert!(err.is_configuration());
}

#[tokio::test]
async fn missing_token_makes_no_network_calls() {
    let h = Harness::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&h.server)
        .await;

    let err = run(&h.options(ReviewMode::Inline, false), |k| {
        if k == "GITHUB_TOKEN" { None } else { env(k) }
    })
    .await
    .unwrap_err();
    assert!(matches!(err, CriticError::MissingCredentials(m) if m == "GITHUB_TOKEN"));
}

#[tokio::test]
async fn only_the_file_with_a_patch_is_reviewed_and_posted() {
    let h = Harness::start().await;
    h.list_files(serde_json::json!([
        { "filename": "a.py", "patch": "+x" },
        { "filename": "b.py", "patch": null },
    ]))
    .await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .and(body_string_contains("Please review the following code diff:\\n\\n+x"))
        .respond_with(completion("Consider a docstring."))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path(COMMENTS_PATH))
        .and(body_partial_json(serde_json::json!({
            "body": "Consider a docstring.",
            "commit_id": HEAD_SHA,
            "path": "a.py",
            "line": 1,
            "side": "RIGHT",
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&h.server)
        .await;

    let report = run(&h.options(ReviewMode::Inline, false), env).await.unwrap();

    assert_eq!(
        report.stats,
        RunStats {
            files_listed: 2,
            files_skipped: 1,
            reviews_generated: 1,
            fallbacks: 0,
            comments_posted: 1,
            comments_failed: 0,
        }
    );
    assert_eq!(report.reviews.len(), 1);
    assert_eq!(report.reviews[0].file_path, "a.py");
}

#[tokio::test]
async fn post_attempts_match_files_with_non_empty_patches() {
    let h = Harness::start().await;
    h.list_files(serde_json::json!([
        { "filename": "one.rs", "patch": "+1" },
        { "filename": "logo.png" },
        { "filename": "empty.txt", "patch": "" },
        { "filename": "two.rs", "patch": "+2" },
        { "filename": "big.lock", "patch": null },
        { "filename": "three.rs", "patch": "+3" },
    ]))
    .await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(completion("ok"))
        .expect(3)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path(COMMENTS_PATH))
        .respond_with(ResponseTemplate::new(201))
        .expect(3)
        .mount(&h.server)
        .await;

    let report = run(&h.options(ReviewMode::Inline, false), env).await.unwrap();

    let reviewed: Vec<_> = report.reviews.iter().map(|r| r.file_path.as_str()).collect();
    assert_eq!(reviewed, ["one.rs", "two.rs", "three.rs"]);
    assert_eq!(report.stats.files_skipped, 3);
    assert_eq!(report.stats.comments_posted, 3);
}

#[tokio::test]
async fn completion_failure_posts_fallback_and_continues() {
    let h = Harness::start().await;
    h.list_files(serde_json::json!([
        { "filename": "first.rs", "patch": "+first" },
        { "filename": "second.rs", "patch": "+second" },
    ]))
    .await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .and(body_string_contains("+first"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_api_key"))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .and(body_string_contains("+second"))
        .respond_with(completion("  Nice change.\n"))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path(COMMENTS_PATH))
        .and(body_partial_json(serde_json::json!({ "path": "first.rs", "body": FALLBACK_REVIEW })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path(COMMENTS_PATH))
        .and(body_partial_json(serde_json::json!({ "path": "second.rs", "body": "Nice change." })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&h.server)
        .await;

    let report = run(&h.options(ReviewMode::Inline, false), env).await.unwrap();

    assert_eq!(report.reviews[0].comment_body, "Unable to generate review comment.");
    assert_eq!(report.reviews[1].comment_body, "Nice change.");
    assert_eq!(report.stats.fallbacks, 1);
    assert_eq!(report.stats.comments_posted, 2);
}

#[tokio::test]
async fn rejected_comment_does_not_stop_the_run() {
    let h = Harness::start().await;
    h.list_files(serde_json::json!([
        { "filename": "a.rs", "patch": "+a" },
        { "filename": "b.rs", "patch": "+b" },
        { "filename": "c.rs", "patch": "+c" },
    ]))
    .await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(completion("ok"))
        .expect(3)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path(COMMENTS_PATH))
        .and(body_partial_json(serde_json::json!({ "path": "a.rs" })))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_string(r#"{"message":"Validation Failed","errors":["line must be part of the diff"]}"#),
        )
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path(COMMENTS_PATH))
        .and(body_partial_json(serde_json::json!({ "path": "b.rs" })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path(COMMENTS_PATH))
        .and(body_partial_json(serde_json::json!({ "path": "c.rs" })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&h.server)
        .await;

    let report = run(&h.options(ReviewMode::Inline, false), env).await.unwrap();

    assert_eq!(report.stats.comments_failed, 1);
    assert_eq!(report.stats.comments_posted, 2);
}

#[tokio::test]
async fn listing_not_found_ends_quietly() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .and(path(FILES_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"message":"Not Found"}"#))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&h.server)
        .await;

    let report = run(&h.options(ReviewMode::Inline, false), env).await.unwrap();

    assert_eq!(report.stats, RunStats::default());
    assert!(report.reviews.is_empty());
}

#[tokio::test]
async fn summary_mode_posts_one_issue_comment() {
    let h = Harness::start().await;
    h.list_files(serde_json::json!([
        { "filename": "a.py", "patch": "+x" },
        { "filename": "b.py", "patch": null },
        { "filename": "c.py", "patch": "+y" },
    ]))
    .await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .and(body_string_contains("\\n--- a.py ---\\n+x\\n\\n--- c.py ---\\n+y\\n"))
        .respond_with(completion("Overall fine."))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path(ISSUE_COMMENTS_PATH))
        .and(body_partial_json(serde_json::json!({ "body": "Overall fine." })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path(COMMENTS_PATH))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&h.server)
        .await;

    let report = run(&h.options(ReviewMode::Summary, false), env).await.unwrap();

    assert_eq!(report.summary.as_deref(), Some("Overall fine."));
    assert_eq!(report.stats.files_skipped, 1);
    assert_eq!(report.stats.reviews_generated, 1);
    assert_eq!(report.stats.comments_posted, 1);
}

#[tokio::test]
async fn summary_mode_without_patches_reviews_nothing() {
    let h = Harness::start().await;
    h.list_files(serde_json::json!([{ "filename": "logo.png" }])).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&h.server)
        .await;

    let report = run(&h.options(ReviewMode::Summary, false), env).await.unwrap();

    assert!(report.summary.is_none());
    assert_eq!(report.stats.files_skipped, 1);
}

#[tokio::test]
async fn dry_run_generates_but_never_posts() {
    let h = Harness::start().await;
    h.list_files(serde_json::json!([{ "filename": "a.py", "patch": "+x" }])).await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(completion("dry"))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path(COMMENTS_PATH))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&h.server)
        .await;

    let report = run(&h.options(ReviewMode::Inline, true), env).await.unwrap();

    assert_eq!(report.reviews[0].comment_body, "dry");
    assert_eq!(report.stats.comments_posted, 0);
    assert_eq!(report.stats.comments_failed, 0);
}

#[tokio::test]
async fn diff_command_returns_the_whole_pr_diff() {
    let h = Harness::start().await;
    let diff = "diff --git a/a.py b/a.py\n+x\ndiff --git a/b.py b/b.py\n+y\n";
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/pulls/7"))
        .respond_with(ResponseTemplate::new(200).set_body_string(diff))
        .expect(1)
        .mount(&h.server)
        .await;

    let fetched = fetch_diff(&h.options(ReviewMode::Inline, false), env).await.unwrap();
    assert_eq!(fetched, diff);
}
