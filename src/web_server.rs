use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    serve, Form, Json, Router,
};
use minijinja::{context, path_loader, Environment};
use minijinja_autoreload::AutoReloader;
use serde::{Deserialize, Serialize};
use std::{
    net::SocketAddr,
    path::{Path as FsPath, PathBuf},
    sync::Arc,
};
use tokio::sync::Mutex;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{debug, error, info, warn};

use crate::breakdown::Estimate;
use crate::constants::{CONSTRUCTION_TYPES, ERROR_MESSAGE, MAX_TEAM_MEMBERS, TECHNOLOGIES};
use crate::estimation::Estimator;
use crate::form::{ProjectDetails, ProjectKind, ProjectSpec, Task};
use crate::workspace::{LoadingFlags, ProjectSession, Workspace};

const PAGE_TITLE: &str = "Project Time Estimate Calculator";
const NOT_READY_NOTICE: &str =
    "Add at least one task and choose the project details before calculating.";
const BUSY_NOTICE: &str = "A request is already running, please wait for it to finish.";
const NO_RESULT_NOTICE: &str = "Calculate an estimate before asking for a quotation.";

// Shared application state
#[derive(Clone)]
pub struct AppState {
    templates: Arc<AutoReloader>,
    estimator: Arc<Estimator>,
    workspace: Arc<Mutex<Workspace>>,
    loading: Arc<LoadingFlags>,
}

impl AppState {
    pub fn new(estimator: Estimator, templates_dir: impl Into<PathBuf>) -> Self {
        Self {
            templates: Arc::new(create_minijinja_env(templates_dir.into())),
            estimator: Arc::new(estimator),
            workspace: Arc::new(Mutex::new(Workspace::new())),
            loading: Arc::new(LoadingFlags::default()),
        }
    }
}

// Minijinja Environment setup
fn create_minijinja_env(templates_dir: PathBuf) -> AutoReloader {
    AutoReloader::new(move |notifier| {
        let mut env = Environment::new();
        env.set_loader(path_loader(templates_dir.clone()));
        // Watch the templates directory for changes
        notifier.watch_path(&templates_dir, true);
        Ok(env)
    })
}

fn render(state: &AppState, name: &str, ctx: minijinja::Value) -> Response {
    state
        .templates
        .acquire_env()
        .and_then(|env| env.get_template(name).and_then(|tmpl| tmpl.render(ctx)))
        .map(|html| Html(html).into_response())
        .unwrap_or_else(|e| {
            error!("Failed to get or render template {}: {}", name, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(format!("Internal Server Error: {}", e)),
            )
                .into_response()
        })
}

#[derive(Serialize)]
struct KindLink {
    slug: &'static str,
    title: &'static str,
}

async fn index_handler(State(state): State<AppState>) -> Response {
    let kinds: Vec<KindLink> = ProjectKind::ALL
        .iter()
        .map(|kind| KindLink {
            slug: kind.slug(),
            title: kind.title(),
        })
        .collect();
    render(
        &state,
        "index.html",
        context! {
            title => PAGE_TITLE,
            kinds => kinds,
        },
    )
}

#[derive(Serialize)]
struct Choice {
    name: &'static str,
    selected: bool,
}

#[derive(Serialize)]
struct TeamLevel {
    name: &'static str,
    count: u32,
}

/// Everything `project.html` needs, flattened out of the session.
#[derive(Serialize)]
struct ProjectView {
    kind: &'static str,
    title: &'static str,
    member_noun: &'static str,
    max_team: u32,
    team: Vec<TeamLevel>,
    technologies: Vec<Choice>,
    construction_types: Vec<Choice>,
    area: Option<String>,
    tasks: Vec<Task>,
    pending_task: String,
    pending_description: String,
    show_input_error: bool,
    can_calculate: bool,
    loading: bool,
    result: Option<Estimate>,
    quotation: Option<String>,
    notice: Option<String>,
}

impl ProjectView {
    fn new(
        kind: ProjectKind,
        session: &ProjectSession,
        notice: Option<String>,
        loading: bool,
    ) -> Self {
        let form = &session.form;
        let (technologies, construction_types, area) = match &form.spec.details {
            ProjectDetails::Software { technologies } => (
                choices(TECHNOLOGIES, |name| technologies.iter().any(|t| t == name)),
                Vec::new(),
                None,
            ),
            ProjectDetails::Construction {
                construction_type,
                area,
            } => (
                Vec::new(),
                choices(CONSTRUCTION_TYPES, |name| construction_type == name),
                area.map(|a| a.to_string()),
            ),
        };

        Self {
            kind: kind.slug(),
            title: kind.title(),
            member_noun: kind.member_noun(),
            max_team: MAX_TEAM_MEMBERS,
            team: form
                .spec
                .team
                .levels()
                .into_iter()
                .map(|(name, count)| TeamLevel { name, count })
                .collect(),
            technologies,
            construction_types,
            area,
            tasks: form.spec.tasks.clone(),
            pending_task: form.pending_task.clone(),
            pending_description: form.pending_description.clone(),
            show_input_error: form.show_input_error,
            can_calculate: form.is_ready(),
            loading,
            result: session.result.clone(),
            quotation: session.quotation.clone(),
            notice,
        }
    }
}

fn choices(catalogue: &[&'static str], is_selected: impl Fn(&str) -> bool) -> Vec<Choice> {
    catalogue
        .iter()
        .map(|&name| Choice {
            name,
            selected: is_selected(name),
        })
        .collect()
}

async fn project_handler(
    State(state): State<AppState>,
    Path(kind): Path<ProjectKind>,
) -> Response {
    let view = {
        let mut workspace = state.workspace.lock().await;
        let session = workspace.session_mut(kind);
        let notice = session.take_notice();
        ProjectView::new(kind, session, notice, state.loading.get(kind).is_busy())
    };
    render(
        &state,
        "project.html",
        context! {
            title => PAGE_TITLE,
            page => view,
        },
    )
}

/// The submit button that posted the project form.
#[derive(Debug, PartialEq, Eq)]
enum FormAction {
    Update,
    AddTask,
    DeleteTask(usize),
    Calculate,
    Quotation,
}

impl FormAction {
    fn from_fields(fields: &[(String, String)]) -> Self {
        let action = fields
            .iter()
            .find(|(key, _)| key == "action")
            .map(|(_, value)| value.as_str())
            .unwrap_or("update");
        match action {
            "add_task" => FormAction::AddTask,
            "calculate" => FormAction::Calculate,
            "quotation" => FormAction::Quotation,
            other => other
                .strip_prefix("delete:")
                .and_then(|index| index.parse().ok())
                .map(FormAction::DeleteTask)
                .unwrap_or(FormAction::Update),
        }
    }
}

async fn submit_handler(
    State(state): State<AppState>,
    Path(kind): Path<ProjectKind>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Redirect {
    let action = FormAction::from_fields(&fields);
    debug!(%kind, ?action, "Project form submitted");

    let mut workspace = state.workspace.lock().await;
    let session = workspace.session_mut(kind);
    session.form.apply_fields(&fields);

    let anchor = match action {
        FormAction::Update => "",
        FormAction::AddTask => {
            if let Err(e) = session.form.add_task() {
                debug!("Task not added: {}", e);
            }
            "#tasks"
        }
        FormAction::DeleteTask(index) => {
            if let Err(e) = session.form.delete_task(index) {
                warn!("Ignoring delete: {}", e);
            }
            "#tasks"
        }
        FormAction::Calculate => {
            if !session.form.is_ready() {
                session.notice = Some(NOT_READY_NOTICE.to_string());
                ""
            } else {
                let spec = session.form.spec.clone();
                drop(workspace);
                run_calculation(&state, kind, spec).await
            }
        }
        FormAction::Quotation => {
            if session.result.is_none() {
                session.notice = Some(NO_RESULT_NOTICE.to_string());
                ""
            } else {
                drop(workspace);
                run_quotation(&state, kind).await
            }
        }
    };

    Redirect::to(&format!("/{}{}", kind, anchor))
}

// The workspace lock is never held across the upstream call.
async fn run_calculation(state: &AppState, kind: ProjectKind, spec: ProjectSpec) -> &'static str {
    let Some(_guard) = state.loading.get(kind).try_begin() else {
        state.workspace.lock().await.session_mut(kind).notice = Some(BUSY_NOTICE.to_string());
        return "";
    };
    let estimate = state.estimator.estimate(&spec).await;
    state.workspace.lock().await.session_mut(kind).result = Some(estimate);
    "#result"
}

async fn run_quotation(state: &AppState, kind: ProjectKind) -> &'static str {
    let Some(_guard) = state.loading.get(kind).try_begin() else {
        state.workspace.lock().await.session_mut(kind).notice = Some(BUSY_NOTICE.to_string());
        return "";
    };
    let quotation = state.estimator.quotation().await;
    state.workspace.lock().await.session_mut(kind).quotation = Some(quotation);
    "#quotation"
}

#[derive(Serialize)]
struct ApiError {
    error: String,
}

fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ApiError {
            error: message.into(),
        }),
    )
        .into_response()
}

async fn api_estimate_handler(
    State(state): State<AppState>,
    Json(spec): Json<ProjectSpec>,
) -> Response {
    let spec = spec.normalized();
    if !spec.is_ready() {
        return api_error(StatusCode::UNPROCESSABLE_ENTITY, NOT_READY_NOTICE);
    }
    let Some(_guard) = state.loading.get(spec.kind()).try_begin() else {
        return api_error(StatusCode::CONFLICT, BUSY_NOTICE);
    };
    match state.estimator.try_estimate(&spec).await {
        Ok(estimate) => Json(estimate).into_response(),
        Err(e) => {
            error!("Estimate request failed: {}", e);
            api_error(StatusCode::BAD_GATEWAY, ERROR_MESSAGE)
        }
    }
}

#[derive(Deserialize)]
struct QuotationQuery {
    kind: Option<ProjectKind>,
}

#[derive(Serialize)]
struct QuotationResponse {
    quotation: String,
}

async fn api_quotation_handler(
    State(state): State<AppState>,
    Query(query): Query<QuotationQuery>,
) -> Response {
    let kind = query.kind.unwrap_or(ProjectKind::Software);
    let Some(_guard) = state.loading.get(kind).try_begin() else {
        return api_error(StatusCode::CONFLICT, BUSY_NOTICE);
    };
    match state.estimator.try_quotation().await {
        Ok(quotation) => Json(QuotationResponse { quotation }).into_response(),
        Err(e) => {
            error!("Quotation request failed: {}", e);
            api_error(StatusCode::BAD_GATEWAY, ERROR_MESSAGE)
        }
    }
}

pub fn build_router(state: AppState, static_dir: impl AsRef<FsPath>) -> Router {
    // Serve static files from the `static` directory
    let static_files_service = ServeDir::new(static_dir.as_ref()).not_found_service(
        tower::service_fn(|_req: axum::extract::Request| async {
            Ok::<_, std::convert::Infallible>((StatusCode::NOT_FOUND, "Not Found").into_response())
        }),
    );

    Router::new()
        .route("/", get(index_handler))
        .route("/api/estimate", post(api_estimate_handler))
        .route("/api/quotation", post(api_quotation_handler))
        .route("/:kind", get(project_handler).post(submit_handler))
        .nest_service("/static", static_files_service)
        .with_state(state)
        .layer(TraceLayer::new_for_http()) // Add request logging
}

pub async fn start_web_server(
    port: u16,
    state: AppState,
    static_dir: impl AsRef<FsPath>,
) -> Result<()> {
    let app = build_router(state, static_dir);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind to address {}", addr))?;

    serve(listener, app.into_make_service())
        .await
        .context("Web server failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_form_action_from_fields() {
        assert_eq!(FormAction::from_fields(&[]), FormAction::Update);
        assert_eq!(
            FormAction::from_fields(&fields(&[("task", "x"), ("action", "add_task")])),
            FormAction::AddTask
        );
        assert_eq!(
            FormAction::from_fields(&fields(&[("action", "delete:3")])),
            FormAction::DeleteTask(3)
        );
        assert_eq!(
            FormAction::from_fields(&fields(&[("action", "delete:x")])),
            FormAction::Update
        );
        assert_eq!(
            FormAction::from_fields(&fields(&[("action", "calculate")])),
            FormAction::Calculate
        );
        assert_eq!(
            FormAction::from_fields(&fields(&[("action", "quotation")])),
            FormAction::Quotation
        );
    }
}
