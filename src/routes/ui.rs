use askama::Template;
use axum::{
    Form,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::AppState;
use crate::clients::{ClientError, Mutation};
use crate::config::Config;
use crate::helpers::scanned_display;
use crate::models::slackwatch::{
    Container, ImageUpdate, PodInfo, Settings, UpdateStatus, Workload, sort_by_status,
};
use crate::models::views::*;

// --- Layout ---

#[derive(Debug, Clone)]
struct Layout {
    title: String,
    app_title: String,
    version: String,
    current_nav: &'static str,
}

impl Layout {
    fn new(config: &Config, title: &str, current_nav: &'static str) -> Self {
        Self {
            title: title.to_string(),
            app_title: config.title.clone(),
            version: config.version.clone(),
            current_nav,
        }
    }
}

fn render_template(tmpl: &impl Template) -> Response {
    match tmpl.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("template error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

fn render_with_status(status: StatusCode, tmpl: &impl Template) -> Response {
    let mut resp = render_template(tmpl);
    if resp.status().is_success() {
        *resp.status_mut() = status;
    }
    resp
}

// --- View Builders ---

fn build_workload_card(w: &Workload) -> WorkloadCardView {
    let update_available = w.update_available.is_available();
    WorkloadCardView {
        name: w.name.clone(),
        namespace: w.namespace.clone(),
        image: w.image.clone(),
        current_version: w.current_version.clone(),
        latest_version: w.latest_version.clone(),
        last_scanned: w.last_scanned.clone(),
        last_scanned_display: scanned_display(&w.last_scanned),
        update_available,
        status: w.update_available.as_str().to_string(),
        status_class: status_class(w.update_available).to_string(),
        card_class: if update_available {
            "workload-card-update-available"
        } else {
            "workload-card"
        }
        .to_string(),
        include_pattern: w.include_pattern.clone().unwrap_or_default(),
        exclude_pattern: w.exclude_pattern.clone().unwrap_or_default(),
        git_ops_repo: w.git_ops_repo.clone().unwrap_or_default(),
        git_directory: w.git_directory.clone().unwrap_or_default(),
    }
}

fn status_class(status: UpdateStatus) -> &'static str {
    match status {
        UpdateStatus::Available => "badge-success",
        UpdateStatus::NotAvailable => "badge-info",
        UpdateStatus::Unknown => "badge-warning",
    }
}

fn build_container_view(c: &Container) -> ContainerView {
    ContainerView {
        name: c.name.clone(),
        image: c.image.clone(),
        pod_name: c.pod_name.clone(),
        last_scanned: scanned_display(&c.last_scanned),
        include_pattern: c.include_pattern.clone(),
        exclude_pattern: c.exclude_pattern.clone(),
    }
}

fn build_update_view(u: &ImageUpdate) -> UpdateView {
    let update_available = u.update_available.is_available();
    UpdateView {
        container_name: u.container_name.clone(),
        current_tag: u.current_tag.clone(),
        new_tag: u.new_tag.clone(),
        image: u.image.clone(),
        pod_name: u.pod_name.clone(),
        found_at: scanned_display(&u.found_at),
        show_update: update_available && !u.new_tag.is_empty(),
        sent_time: u.sent_time.clone().unwrap_or_default(),
        card_class: if update_available {
            "update-card update-card-available"
        } else {
            "update-card"
        }
        .to_string(),
    }
}

fn build_pod_view(p: &PodInfo) -> PodView {
    PodView {
        name: p.name.clone(),
        time_scanned: scanned_display(&p.time_scanned),
    }
}

fn build_settings_view(s: &Settings) -> SettingsView {
    let gitops = s
        .gitops
        .iter()
        .flatten()
        .map(|g| GitopsView {
            name: g.name.clone(),
            repository_url: g.repository_url.clone(),
            branch: g.branch.clone().unwrap_or_default(),
        })
        .collect();

    let mut notifications = Vec::new();
    if let Some(ref n) = s.notifications {
        let hooks = [
            ("Slack", n.slack_webhook_url.as_deref()),
            ("Discord", n.discord_webhook_url.as_deref()),
        ];
        for (kind, url) in hooks {
            if let Some(url) = url.filter(|u| !u.is_empty()) {
                notifications.push(NotificationView {
                    kind: kind.to_string(),
                    target: webhook_display(url),
                });
            }
        }
        if let Some(ref ntfy) = n.ntfy {
            notifications.push(NotificationView {
                kind: "ntfy".to_string(),
                target: format!("{}/{}", ntfy.url.trim_end_matches('/'), ntfy.topic),
            });
        }
    }

    SettingsView {
        schedule: s.system.schedule.clone(),
        data_dir: s.system.data_dir.clone(),
        run_at_startup: s.system.run_at_startup.to_string(),
        gitops,
        notifications,
    }
}

// Webhook URLs carry their token in the path; only the host is shown.
fn webhook_display(url: &str) -> String {
    match reqwest::Url::parse(url).ok().as_ref().and_then(|u| u.host_str()) {
        Some(host) => format!("configured ({})", host),
        None => "configured".to_string(),
    }
}

const RETURN_PATHS: &[&str] = &["/", "/combined", "/updates", "/watched", "/pods"];

// Redirect targets are limited to the list pages.
fn local_path(candidate: Option<&str>, fallback: &'static str) -> String {
    match candidate {
        Some(p) if RETURN_PATHS.contains(&p) => p.to_string(),
        _ => fallback.to_string(),
    }
}

// --- Home ---

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    layout: Layout,
    page: PageState<WorkloadCardView>,
    system: SystemInfoView,
    sorted: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct HomeQuery {
    #[serde(default)]
    pub sort: Option<String>,
}

pub async fn handle_home(
    State(state): State<AppState>,
    query: Result<Query<HomeQuery>, QueryRejection>,
) -> Response {
    let query = query.map(|Query(q)| q).unwrap_or_else(|e| {
        warn!("ignoring home query: {}", e);
        HomeQuery::default()
    });
    let sorted = query.sort.as_deref() == Some("status");

    let (workloads, next_run) = tokio::join!(
        state.client.get_all_workloads(),
        state.client.get_next_schedule_time(),
    );

    let cards = workloads.map(|mut ws| {
        if sorted {
            sort_by_status(&mut ws);
        }
        ws.iter().map(build_workload_card).collect::<Vec<_>>()
    });
    let page = PageState::default().settle(cards, "workloads");

    let mut system = SystemInfoView {
        watched: page.count(),
        ..Default::default()
    };
    match next_run {
        Ok(t) => system.next_run = t,
        Err(e) => {
            error!("fetching next schedule time: {}", e);
            system.next_run_error = Some("Failed to fetch next schedule time".to_string());
        }
    }

    let tmpl = HomeTemplate {
        layout: Layout::new(&state.config, "Workloads", "home"),
        page,
        system,
        sorted,
    };

    render_template(&tmpl)
}

// --- Settings ---

#[derive(Template)]
#[template(path = "settings.html")]
struct SettingsTemplate {
    layout: Layout,
    page: Result<SettingsView, String>,
}

pub async fn handle_settings(State(state): State<AppState>) -> Response {
    let page = match state.client.get_settings().await {
        Ok(s) => Ok(build_settings_view(&s)),
        Err(e) => {
            error!("fetching settings: {}", e);
            Err("Failed to fetch settings".to_string())
        }
    };

    let tmpl = SettingsTemplate {
        layout: Layout::new(&state.config, "Settings", "settings"),
        page,
    };

    render_template(&tmpl)
}

// --- Refresh all ---

#[derive(Template)]
#[template(path = "refresh_all.html")]
struct RefreshAllTemplate {
    layout: Layout,
    error: Option<String>,
}

pub async fn handle_refresh_all(State(state): State<AppState>) -> Response {
    let error = match state.client.refresh_all().await {
        Ok(()) => {
            info!("refresh of all workloads requested");
            None
        }
        Err(e) => {
            error!("refreshing all workloads: {}", e);
            Some("Failed to refresh workloads".to_string())
        }
    };

    let tmpl = RefreshAllTemplate {
        layout: Layout::new(&state.config, "Refresh All", "home"),
        error,
    };

    render_template(&tmpl)
}

// --- Watched containers ---

#[derive(Template)]
#[template(path = "watched.html")]
struct WatchedTemplate {
    layout: Layout,
    page: PageState<ContainerView>,
}

pub async fn handle_watched(State(state): State<AppState>) -> Response {
    let containers = state
        .client
        .get_containers()
        .await
        .map(|cs| cs.iter().map(build_container_view).collect::<Vec<_>>());

    let tmpl = WatchedTemplate {
        layout: Layout::new(&state.config, "Watched Containers", "watched"),
        page: PageState::default().settle(containers, "containers"),
    };

    render_template(&tmpl)
}

// --- Image updates ---

#[derive(Template)]
#[template(path = "updates.html")]
struct UpdatesTemplate {
    layout: Layout,
    page: PageState<UpdateView>,
}

pub async fn handle_updates(State(state): State<AppState>) -> Response {
    let updates = state
        .client
        .get_image_updates()
        .await
        .map(|us| us.iter().map(build_update_view).collect::<Vec<_>>());

    let tmpl = UpdatesTemplate {
        layout: Layout::new(&state.config, "Available Updates", "updates"),
        page: PageState::default().settle(updates, "image updates"),
    };

    render_template(&tmpl)
}

// --- Combined scan results ---

#[derive(Template)]
#[template(path = "combined.html")]
struct CombinedTemplate {
    layout: Layout,
    page: PageState<WorkloadCardView>,
}

pub async fn handle_combined(State(state): State<AppState>) -> Response {
    let combined = state
        .client
        .get_combined()
        .await
        .map(|ws| ws.iter().map(build_workload_card).collect::<Vec<_>>());

    let tmpl = CombinedTemplate {
        layout: Layout::new(&state.config, "Scan Results", "combined"),
        page: PageState::default().settle(combined, "scan results"),
    };

    render_template(&tmpl)
}

// --- Pods ---

#[derive(Template)]
#[template(path = "pods.html")]
struct PodsTemplate {
    layout: Layout,
    page: PageState<PodView>,
}

pub async fn handle_pods(State(state): State<AppState>) -> Response {
    let pods = state
        .client
        .fetch_pods()
        .await
        .map(|ps| ps.iter().map(build_pod_view).collect::<Vec<_>>());

    let tmpl = PodsTemplate {
        layout: Layout::new(&state.config, "Pods", "pods"),
        page: PageState::default().settle(pods, "pods"),
    };

    render_template(&tmpl)
}

// --- Mutations ---

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate {
    layout: Layout,
    message: String,
    back: String,
}

fn redirect_or_error(
    state: &AppState,
    mutation: Mutation<'_>,
    result: Result<(), ClientError>,
    to: &str,
) -> Response {
    match result {
        Ok(()) => {
            info!("{} {}", mutation.label(), mutation.target());
            Redirect::to(to).into_response()
        }
        Err(e) => {
            error!("{} {}: {}", mutation.label(), mutation.target(), e);
            let tmpl = ErrorTemplate {
                layout: Layout::new(&state.config, "Error", ""),
                message: format!("Failed to {}", mutation.label()),
                back: to.to_string(),
            };
            render_with_status(StatusCode::BAD_GATEWAY, &tmpl)
        }
    }
}

pub async fn handle_refresh_workload(
    State(state): State<AppState>,
    Form(workload): Form<Workload>,
) -> Response {
    let result = state.client.update_workload(&workload).await;
    redirect_or_error(&state, Mutation::Refresh(&workload), result, "/")
}

pub async fn handle_upgrade_workload(
    State(state): State<AppState>,
    Form(workload): Form<Workload>,
) -> Response {
    let result = state.client.upgrade_workload(&workload).await;
    redirect_or_error(&state, Mutation::Upgrade(&workload), result, "/")
}

#[derive(Debug, Deserialize)]
pub struct RefreshSingleForm {
    #[serde(flatten)]
    pub workload: Workload,
    #[serde(default)]
    pub return_to: Option<String>,
}

pub async fn handle_refresh_single(
    State(state): State<AppState>,
    Form(form): Form<RefreshSingleForm>,
) -> Response {
    let to = local_path(form.return_to.as_deref(), "/combined");
    let result = state.client.refresh_single(&form.workload).await;
    redirect_or_error(&state, Mutation::RefreshSingle(&form.workload), result, &to)
}

// --- Not found ---

#[derive(Template)]
#[template(path = "not_found.html")]
struct NotFoundTemplate {
    layout: Layout,
}

pub async fn handle_not_found(State(state): State<AppState>) -> Response {
    let tmpl = NotFoundTemplate {
        layout: Layout::new(&state.config, "404 - Not Found", ""),
    };
    render_with_status(StatusCode::NOT_FOUND, &tmpl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::BackendClient;
    use crate::clients::tests::spawn_backend;
    use crate::routes::build_router;
    use axum::{
        Json, Router,
        body::Body,
        extract::RawQuery,
        http::{Request, header},
        routing::{get, post},
    };
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use tower::util::ServiceExt;

    fn app(base_url: Option<String>) -> Router {
        build_router(AppState {
            client: Arc::new(BackendClient::new(base_url).unwrap()),
            config: Arc::new(Config::default()),
        })
    }

    async fn app_with(backend: Router) -> Router {
        app(Some(spawn_backend(backend).await))
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, String, Option<String>) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let location = resp
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap(), location)
    }

    async fn get_page(app: Router, uri: &str) -> (StatusCode, String) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (status, body, _) = send(app, req).await;
        (status, body)
    }

    fn post_form(uri: &str, form: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap()
    }

    fn backend_with_workloads(workloads: serde_json::Value) -> Router {
        Router::new()
            .route(
                "/api/workloads",
                get(move || {
                    let workloads = workloads.clone();
                    async move { Json(workloads) }
                }),
            )
            .route(
                "/api/settings/next-schedule-time",
                get(|| async { Json("2024-05-01 12:00:00 UTC") }),
            )
    }

    fn card_names(body: &str) -> Vec<String> {
        body.split("data-workload=\"")
            .skip(1)
            .filter_map(|rest| rest.split('"').next())
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn home_renders_one_card_per_workload_in_backend_order() {
        let backend = backend_with_workloads(json!([
            {"name": "web", "namespace": "default", "image": "nginx:1.25",
             "current_version": "1.25", "latest_version": "1.27",
             "last_scanned": "2024-05-01T10:00:00Z", "update_available": "NotAvailable"},
            {"name": "api", "namespace": "prod", "image": "api:2.0",
             "current_version": "2.0", "latest_version": "2.1",
             "last_scanned": "2024-05-01T10:00:00Z", "update_available": "Available"}
        ]));
        let (status, body) = get_page(app_with(backend).await, "/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(card_names(&body), ["web", "api"]);
        assert!(body.contains("Watched Workloads: 2"));
        assert!(body.contains("Next Run: 2024-05-01 12:00:00 UTC"));
        assert!(body.contains("Latest Version Available: 2.1"));
        assert_eq!(body.matches("class=\"upgrade-button\"").count(), 1);
        assert_eq!(body.matches("class=\"workload-update-single\"").count(), 2);
    }

    #[tokio::test]
    async fn home_sorted_by_status_puts_available_first() {
        let backend = backend_with_workloads(json!([
            {"name": "a", "namespace": "x", "update_available": "NotAvailable"},
            {"name": "b", "namespace": "x", "update_available": "Available"},
            {"name": "c", "namespace": "x", "update_available": false},
            {"name": "d", "namespace": "x", "update_available": true}
        ]));
        let (_, body) = get_page(app_with(backend).await, "/?sort=status").await;
        assert_eq!(card_names(&body), ["b", "d", "a", "c"]);
    }

    #[tokio::test]
    async fn home_backend_failure_shows_error_without_rows() {
        let backend = Router::new().route(
            "/api/workloads",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let (status, body) = get_page(app_with(backend).await, "/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Error: Failed to fetch workloads"));
        assert!(card_names(&body).is_empty());
    }

    #[tokio::test]
    async fn home_empty_links_to_refresh_all() {
        let backend = backend_with_workloads(json!([]));
        let (_, body) = get_page(app_with(backend).await, "/").await;

        assert!(body.contains("No workloads found"));
        assert!(body.contains("href=\"/refresh-all\""));
        assert!(card_names(&body).is_empty());
    }

    #[tokio::test]
    async fn home_without_backend_url_degrades_to_empty() {
        let (status, body) = get_page(app(None), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("No workloads found"));
    }

    #[tokio::test]
    async fn schedule_failure_stays_inside_system_info() {
        let backend = Router::new()
            .route(
                "/api/workloads",
                get(|| async { Json(json!([{"name": "web", "namespace": "default"}])) }),
            )
            .route(
                "/api/settings/next-schedule-time",
                get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
            );
        let (_, body) = get_page(app_with(backend).await, "/").await;

        assert_eq!(card_names(&body), ["web"]);
        assert!(body.contains("Error: Failed to fetch next schedule time"));
        assert!(!body.contains("Click to Run Now"));
    }

    #[tokio::test]
    async fn refresh_single_sends_exactly_one_request_for_that_item() {
        let seen: Arc<Mutex<Vec<String>>> = Arc::default();
        let sink = seen.clone();
        let backend = Router::new().route(
            "/api/workloads/update",
            get(move |RawQuery(q): RawQuery| {
                let sink = sink.clone();
                async move {
                    sink.lock().unwrap().push(q.unwrap_or_default());
                    Json(json!({"status": "success"}))
                }
            }),
        );
        let app = app_with(backend).await;

        let form = "name=api&namespace=prod&image=api%3A2.0&current_version=2.0\
                    &latest_version=2.1&last_scanned=&update_available=Available\
                    &include_pattern=&exclude_pattern=&git_ops_repo=infra\
                    &git_directory=apps%2Fapi&return_to=%2Fcombined";
        let (status, _, location) = send(app, post_form("/workloads/refresh-single", form)).await;

        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location.as_deref(), Some("/combined"));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let q = &seen[0];
        assert!(q.contains("name=api"));
        assert!(q.contains("namespace=prod"));
        assert!(q.contains("latest_version=2.1"));
        assert!(q.contains("update_available=Available"));
        assert!(q.contains("git_ops_repo=infra"));
        assert!(q.contains("git_directory=apps%2Fapi"));
    }

    #[tokio::test]
    async fn refresh_single_rejects_offsite_return_path() {
        let backend = Router::new().route("/api/workloads/update", get(|| async { "ok" }));
        let app = app_with(backend).await;
        for target in ["%2F%2Fevil.example", "%2F%5Cevil.example", "https%3A%2F%2Fevil.example"] {
            let form = format!("name=api&namespace=prod&return_to={}", target);
            let (status, _, location) =
                send(app.clone(), post_form("/workloads/refresh-single", &form)).await;
            assert_eq!(status, StatusCode::SEE_OTHER);
            assert_eq!(location.as_deref(), Some("/combined"), "return_to={}", target);
        }
    }

    #[tokio::test]
    async fn home_ignores_malformed_query() {
        let backend = backend_with_workloads(json!([
            {"name": "a", "namespace": "x", "update_available": "NotAvailable"},
            {"name": "b", "namespace": "x", "update_available": "Available"}
        ]));
        let (status, body) = get_page(app_with(backend).await, "/?sort=status&sort=x").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(card_names(&body), ["a", "b"]);
    }

    #[tokio::test]
    async fn upgrade_posts_workload_and_redirects_home() {
        let seen: Arc<Mutex<Vec<serde_json::Value>>> = Arc::default();
        let sink = seen.clone();
        let backend = Router::new().route(
            "/api/workloads/upgrade",
            post(move |Json(body): Json<serde_json::Value>| {
                let sink = sink.clone();
                async move {
                    sink.lock().unwrap().push(body);
                    Json(json!({"status": "success"}))
                }
            }),
        );
        let form = "name=api&namespace=prod&latest_version=2.1&update_available=Available\
                    &git_ops_repo=&git_directory=";
        let (status, _, location) = send(
            app_with(backend).await,
            post_form("/workloads/upgrade", form),
        )
        .await;

        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location.as_deref(), Some("/"));
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0]["name"], "api");
        assert_eq!(seen[0]["update_available"], "Available");
        assert!(seen[0].get("git_ops_repo").is_none());
    }

    #[tokio::test]
    async fn failed_refresh_renders_error_page() {
        let backend = Router::new().route(
            "/api/workloads/update",
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let (status, body, _) = send(
            app_with(backend).await,
            post_form("/workloads/refresh", "name=web&namespace=default"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.contains("Failed to refresh workload"));
    }

    #[tokio::test]
    async fn settings_page_lists_system_and_gitops() {
        let backend = Router::new().route(
            "/api/settings",
            get(|| async {
                Json(json!({
                    "system": {"schedule": "0 0 * * * *", "data_dir": "/data", "run_at_startup": true},
                    "gitops": [{"name": "infra", "repository_url": "https://git.example/infra.git"}],
                    "notifications": {
                        "slack_webhook_url": "https://hooks.slack.com/services/T000/B000/SECRETTOKEN"
                    }
                }))
            }),
        );
        let (status, body) = get_page(app_with(backend).await, "/settings").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("0 0 * * * *"));
        assert!(body.contains("Run at Startup: </span>"));
        assert!(body.contains(">true<"));
        assert!(body.contains("Gitops Settings"));
        assert!(body.contains("infra"));
        assert!(body.contains("configured (hooks.slack.com)"));
        assert!(!body.contains("SECRETTOKEN"));
        assert!(!body.contains("/services/"));
    }

    #[tokio::test]
    async fn settings_without_gitops_hides_section() {
        let backend = Router::new().route(
            "/api/settings",
            get(|| async { Json(json!({"system": {}})) }),
        );
        let (_, body) = get_page(app_with(backend).await, "/settings").await;
        assert!(body.contains("Schedule: "));
        assert!(!body.contains("Gitops Settings"));
    }

    #[tokio::test]
    async fn settings_with_null_system_uses_defaults() {
        let backend = Router::new().route(
            "/api/settings",
            get(|| async { Json(json!({"system": null})) }),
        );
        let (_, body) = get_page(app_with(backend).await, "/settings").await;
        assert!(!body.contains("Failed to fetch settings"));
        assert!(body.contains("Data Directory: "));
    }

    #[tokio::test]
    async fn settings_failure_is_reported() {
        let backend = Router::new().route(
            "/api/settings",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let (_, body) = get_page(app_with(backend).await, "/settings").await;
        assert!(body.contains("Error: Failed to fetch settings"));
    }

    #[tokio::test]
    async fn refresh_all_page_reports_success_and_failure() {
        let ok = Router::new().route(
            "/api/workloads/refresh-all",
            post(|| async { Json(json!({"status": "success"})) }),
        );
        let (_, body) = get_page(app_with(ok).await, "/refresh-all").await;
        assert!(body.contains("Refreshed"));
        assert!(body.contains("Go back to Home"));

        let failing = Router::new().route(
            "/api/workloads/refresh-all",
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let (_, body) = get_page(app_with(failing).await, "/refresh-all").await;
        assert!(body.contains("Error: Failed to refresh workloads"));
    }

    #[tokio::test]
    async fn watched_lists_containers() {
        let backend = Router::new().route(
            "/api/containers",
            get(|| async {
                Json(json!([
                    {"containerName": "redis", "image": "redis:7", "podName": "cache-0",
                     "timeScanned": "", "includePattern": "^7\\.", "excludePattern": "rc"},
                    {"containerName": "nginx", "image": "nginx:1.25", "podName": "web-1"}
                ]))
            }),
        );
        let (_, body) = get_page(app_with(backend).await, "/watched").await;
        assert_eq!(body.matches("data-container=").count(), 2);
        assert!(body.contains("cache-0"));
    }

    #[tokio::test]
    async fn updates_show_notification_time_only_when_sent() {
        let backend = Router::new().route(
            "/api/imageUpdates",
            get(|| async {
                Json(json!([
                    {"containerName": "redis", "currentTag": "7.0", "newTag": "7.2",
                     "updateAvailable": true, "sentTime": "2024-05-01 09:00:00"},
                    {"containerName": "nginx", "currentTag": "1.25", "updateAvailable": false}
                ]))
            }),
        );
        let (_, body) = get_page(app_with(backend).await, "/updates").await;
        assert_eq!(body.matches("data-update=").count(), 2);
        assert_eq!(body.matches("Notification Sent At").count(), 1);
        assert_eq!(body.matches("class=\"update-badge\"").count(), 1);
    }

    #[tokio::test]
    async fn combined_cards_carry_refresh_single_forms() {
        let backend = Router::new().route(
            "/api/data/combined",
            get(|| async {
                Json(json!([
                    {"name": "web", "namespace": "default", "update_available": "Available",
                     "git_ops_repo": "infra", "git_directory": "apps/web"}
                ]))
            }),
        );
        let (_, body) = get_page(app_with(backend).await, "/combined").await;
        assert_eq!(card_names(&body), ["web"]);
        assert!(body.contains("action=\"/workloads/refresh-single\""));
        assert!(body.contains("name=\"git_ops_repo\" value=\"infra\""));
    }

    #[tokio::test]
    async fn pods_page_handles_failure() {
        let backend = Router::new().route(
            "/api/pods",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let (_, body) = get_page(app_with(backend).await, "/pods").await;
        assert!(body.contains("Error: Failed to fetch pods"));
    }

    #[tokio::test]
    async fn unknown_route_is_404_with_link_home() {
        let (status, body) = get_page(app(None), "/no/such/page").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("404 - Not Found"));
        assert!(body.contains("Go back to Home"));
    }

    #[test]
    fn local_path_only_accepts_same_site_paths() {
        assert_eq!(local_path(Some("/watched"), "/"), "/watched");
        assert_eq!(local_path(Some("/pods"), "/combined"), "/pods");
        assert_eq!(local_path(Some("//evil"), "/"), "/");
        assert_eq!(local_path(Some("/\\evil.example"), "/"), "/");
        assert_eq!(local_path(Some("/combined\r\nX: y"), "/"), "/");
        assert_eq!(local_path(Some("/settings"), "/combined"), "/combined");
        assert_eq!(local_path(Some("https://evil"), "/"), "/");
        assert_eq!(local_path(None, "/combined"), "/combined");
    }

    #[test]
    fn settings_view_collects_notification_targets() {
        let s: Settings = serde_json::from_value(json!({
            "notifications": {
                "discord_webhook_url": "https://discord.example/hook",
                "slack_webhook_url": "",
                "ntfy": {"url": "https://ntfy.sh/", "topic": "slackwatch"}
            }
        }))
        .unwrap();
        let v = build_settings_view(&s);
        let kinds: Vec<&str> = v.notifications.iter().map(|n| n.kind.as_str()).collect();
        assert_eq!(kinds, ["Discord", "ntfy"]);
        assert_eq!(v.notifications[0].target, "configured (discord.example)");
        assert_eq!(v.notifications[1].target, "https://ntfy.sh/slackwatch");
    }
}
