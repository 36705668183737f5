use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use studio_app::downloads::download_artifacts;
use studio_app::{format_view, Renderer, Session};
use studio_core::{
    AppViewModel, ArtifactListView, OriginSlot, Payload, SessionConfig, StatusState,
};
use studio_engine::{ClientSettings, JobApi, OriginPool, ReqwestJobApi};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct RecordingRenderer {
    views: Vec<(AppViewModel, String)>,
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, view: &AppViewModel, origin: &str) {
        self.views.push((view.clone(), origin.to_string()));
    }
}

impl RecordingRenderer {
    fn statuses(&self) -> Vec<StatusState> {
        let mut seen: Vec<StatusState> = Vec::new();
        for (view, _) in &self.views {
            if seen.last() != Some(&view.status) {
                seen.push(view.status);
            }
        }
        seen
    }
}

fn fast_config() -> SessionConfig {
    SessionConfig {
        poll_interval: Duration::from_millis(20),
        max_not_ready_polls: None,
    }
}

async fn mount_happy_path(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/run/protocol-positioning"))
        .and(body_json(serde_json::json!({ "url": "example.com" })))
        .respond_with(ResponseTemplate::new(202).set_body_string(r#"{"job_id":"j1"}"#))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/j1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"id":"j1","status":"running","logs":"starting"}"#),
        )
        .up_to_n_times(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/j1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"id":"j1","status":"succeeded","logs":["starting","done"],
                "artifacts":[{"id":"a1","name":"report.md"}]}"#,
        ))
        .mount(server)
        .await;
}

fn payload() -> Payload {
    Payload::from([("url".to_string(), "example.com".to_string())])
}

fn run_session(
    origins: Arc<OriginPool>,
) -> (AppViewModel, Vec<StatusState>, Vec<(AppViewModel, String)>) {
    let api: Arc<dyn JobApi> = Arc::new(
        ReqwestJobApi::new(ClientSettings::default(), origins.clone(), None).unwrap(),
    );
    let mut session = Session::new(api, origins, fast_config(), RecordingRenderer::default());
    session.select_tool("protocol-positioning");
    let view = session.run_job("protocol-positioning", payload()).unwrap();
    let statuses = session.renderer().statuses();
    let views = session.renderer().views.clone();
    (view, statuses, views)
}

#[tokio::test(flavor = "multi_thread")]
async fn job_runs_from_submission_to_artifacts() {
    let server = MockServer::start().await;
    mount_happy_path(&server).await;
    let origins = Arc::new(OriginPool::new(server.uri(), None));

    let (view, statuses, views) = {
        let origins = origins.clone();
        tokio::task::spawn_blocking(move || run_session(origins))
            .await
            .unwrap()
    };

    assert_eq!(
        statuses,
        vec![
            StatusState::Idle,
            StatusState::Submitting,
            StatusState::Accepted,
            StatusState::Running,
            StatusState::Succeeded,
        ]
    );
    assert_eq!(view.status, StatusState::Succeeded);
    assert_eq!(view.log_text, "starting\ndone");
    assert!(!view.forms_locked);
    assert_eq!(view.active_job.as_deref(), Some("j1"));
    let ArtifactListView::Rows(rows) = &view.artifacts else {
        panic!("expected artifact rows, got {:?}", view.artifacts);
    };
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].label, "File");
    assert_eq!(rows[0].name, "report.md");

    let (_, origin) = views.last().unwrap();
    let lines = format_view(&view, origin);
    assert!(lines
        .last()
        .unwrap()
        .ends_with(&format!("{}/api/jobs/j1/artifacts/a1", server.uri())));
}

#[tokio::test(flavor = "multi_thread")]
async fn connection_failure_moves_session_to_backup() {
    let server = MockServer::start().await;
    mount_happy_path(&server).await;
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let dead = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    let origins = Arc::new(OriginPool::new(dead, Some(server.uri())));

    let (view, _, views) = {
        let origins = origins.clone();
        tokio::task::spawn_blocking(move || run_session(origins))
            .await
            .unwrap()
    };

    assert_eq!(view.status, StatusState::Succeeded);
    assert_eq!(origins.slot(), OriginSlot::Backup);
    let (_, origin) = views.last().unwrap();
    assert_eq!(origin, &server.uri());
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_submission_ends_in_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/run/protocol-positioning"))
        .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"error":"url is required"}"#))
        .mount(&server)
        .await;
    let origins = Arc::new(OriginPool::new(server.uri(), None));

    let (view, statuses, _) = tokio::task::spawn_blocking(move || run_session(origins))
        .await
        .unwrap();

    assert_eq!(view.status, StatusState::Error);
    assert_eq!(view.status_detail.as_deref(), Some("url is required"));
    assert!(!view.forms_locked);
    assert_eq!(statuses.last(), Some(&StatusState::Error));
}

#[tokio::test(flavor = "multi_thread")]
async fn completed_artifacts_are_saved() {
    let server = MockServer::start().await;
    mount_happy_path(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/j1/artifacts/a1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("# Report"))
        .mount(&server)
        .await;
    let origins = Arc::new(OriginPool::new(server.uri(), None));
    let dir = tempfile::tempdir().unwrap();

    let (view, _, _) = {
        let origins = origins.clone();
        tokio::task::spawn_blocking(move || run_session(origins))
            .await
            .unwrap()
    };
    let api = ReqwestJobApi::new(ClientSettings::default(), origins, None).unwrap();
    let saved = download_artifacts(&api, &view, dir.path()).await.unwrap();

    assert_eq!(saved, vec![dir.path().join("report.md")]);
    assert_eq!(std::fs::read_to_string(&saved[0]).unwrap(), "# Report");
}
