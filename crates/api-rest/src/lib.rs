//! # API REST
//!
//! REST API implementation for the school clinic record system.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - Bearer-token authentication against the core session service
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON wire types, CORS, error-to-status mapping)
//!
//! All business rules, including the role-based access policy, live in
//! `sickbay-core`; this crate translates between HTTP and core calls.

#![warn(rust_2018_idioms)]

pub mod dto;

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use dto::{
    ClinicalDetailsReq, CreateVisitReq, DashboardRes, FollowUpReportReq, HealthRes, LoginReq,
    LoginRes, MarkViewedRes, MessageRes, RegisterStaffReq, ReviewReq, StaffProfileRes,
    StudentDistributionRes, StudentReq, StudentRes, StudentUpdateReq, UnreadCountRes,
    UpdateVisitReq, VisitRes,
};
use sickbay_core::dashboard::DashboardService;
use sickbay_core::sessions::SessionService;
use sickbay_core::staff::StaffService;
use sickbay_core::students::StudentService;
use sickbay_core::visits::VisitService;
use sickbay_core::{Caller, ClinicError, CoreConfig, EmailAddress, RecordUuid};

/// Application state for the REST API server.
///
/// Holds the core services shared by all request handlers. Everything is
/// cheaply cloneable; the services share one [`CoreConfig`].
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionService,
    pub staff: StaffService,
    pub students: StudentService,
    pub visits: VisitService,
    pub dashboard: DashboardService,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        let staff = StaffService::new(cfg.clone());
        let students = StudentService::new(cfg.clone());
        let visits = VisitService::new(
            cfg.clone(),
            Arc::new(students.clone()),
            Arc::new(staff.clone()),
        );
        let dashboard = DashboardService::new(students.clone(), staff.clone(), visits.clone());
        let sessions = SessionService::new(cfg, staff.clone());

        Self {
            sessions,
            staff,
            students,
            visits,
            dashboard,
        }
    }
}

/// Maps core errors onto HTTP statuses with a `{"message": ...}` body.
///
/// Both authentication failures and role mismatches surface as 401 so the
/// wire contract stays stable; the distinction is preserved in the logs.
pub struct ApiError(ClinicError);

impl From<ClinicError> for ApiError {
    fn from(err: ClinicError) -> Self {
        ApiError(err)
    }
}

impl From<sickbay_core::TextError> for ApiError {
    fn from(err: sickbay_core::TextError) -> Self {
        ApiError(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            ClinicError::InvalidInput(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ClinicError::InvalidReference(id) => (
                StatusCode::BAD_REQUEST,
                format!("referenced record does not exist: {id}"),
            ),
            ClinicError::DuplicateAdmissionNo(no) => (
                StatusCode::BAD_REQUEST,
                format!("admission number already registered: {no}"),
            ),
            ClinicError::DuplicateEmail(email) => (
                StatusCode::BAD_REQUEST,
                format!("email already registered: {email}"),
            ),
            ClinicError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
            ClinicError::AuthenticationMissing => {
                (StatusCode::UNAUTHORIZED, "authentication required".into())
            }
            ClinicError::Unauthorized { required } => (
                StatusCode::UNAUTHORIZED,
                format!("this operation requires {required}"),
            ),
            err => {
                tracing::error!("request failed: {err:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".into())
            }
        };
        (status, Json(MessageRes { message })).into_response()
    }
}

/// Resolves the `Authorization: Bearer <token>` header to a caller identity.
fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Caller, ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError(ClinicError::AuthenticationMissing))?;
    Ok(state.sessions.resolve_caller(token)?)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        login,
        register_staff,
        list_staff,
        create_student,
        list_students,
        get_student,
        update_student,
        delete_student,
        create_visit,
        list_visits,
        unread_visit_count,
        mark_visits_viewed,
        get_visit,
        update_visit,
        review_visit,
        update_clinical_details,
        add_follow_up_report,
        dashboard_stats,
    ),
    components(schemas(
        dto::MessageRes,
        dto::HealthRes,
        dto::LoginReq,
        dto::LoginRes,
        dto::StaffProfileRes,
        dto::RegisterStaffReq,
        dto::StudentReq,
        dto::StudentUpdateReq,
        dto::StudentRes,
        dto::CreateVisitReq,
        dto::UpdateVisitReq,
        dto::ClinicalDetailsReq,
        dto::ReviewReq,
        dto::FollowUpReportReq,
        dto::StaffNameRes,
        dto::StudentSummaryRes,
        dto::FollowUpReportRes,
        dto::VisitRes,
        dto::UnreadCountRes,
        dto::MarkViewedRes,
        dto::StudentDistributionRes,
        dto::DashboardRes,
    ))
)]
struct ApiDoc;

/// Builds the full application router.
///
/// Route order matters: the literal `/visits/unread` and `/visits/viewed`
/// paths are registered before `/visits/:id` so they are never captured as
/// identifiers.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/users/login", post(login))
        .route("/users", post(register_staff).get(list_staff))
        .route("/students", post(create_student).get(list_students))
        .route(
            "/students/:id",
            get(get_student).put(update_student).delete(delete_student),
        )
        .route("/visits", post(create_visit).get(list_visits))
        .route("/visits/unread", get(unread_visit_count))
        .route("/visits/viewed", put(mark_visits_viewed))
        .route("/visits/:id", get(get_visit).put(update_visit))
        .route("/visits/:id/review", put(review_visit))
        .route("/visits/:id/clinical-details", put(update_clinical_details))
        .route("/visits/:id/follow-up-report", put(add_follow_up_report))
        .route("/dashboard", get(dashboard_stats))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint, used by monitoring and load balancers.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Sickbay REST API is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/users/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Session issued", body = LoginRes),
        (status = 401, description = "Unknown email or wrong password", body = MessageRes)
    )
)]
/// Verifies staff credentials and issues a bearer token.
#[axum::debug_handler]
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginReq>,
) -> Result<Json<LoginRes>, ApiError> {
    let email = EmailAddress::parse(&req.email)?;
    let session = state.sessions.login(&email, &req.password)?;
    Ok(Json(LoginRes {
        token: session.token,
        staff: session.staff.into(),
    }))
}

#[utoipa::path(
    post,
    path = "/users",
    request_body = RegisterStaffReq,
    responses(
        (status = 201, description = "Staff account created", body = StaffProfileRes),
        (status = 400, description = "Invalid input or duplicate email", body = MessageRes),
        (status = 401, description = "Not an admin", body = MessageRes)
    )
)]
/// Registers a staff account. Admin only.
#[axum::debug_handler]
async fn register_staff(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RegisterStaffReq>,
) -> Result<(StatusCode, Json<StaffProfileRes>), ApiError> {
    let caller = authenticate(&state, &headers)?;
    let profile = state.staff.register(&caller, req.into_new_staff()?)?;
    Ok((StatusCode::CREATED, Json(profile.into())))
}

#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "All staff profiles", body = [StaffProfileRes]),
        (status = 401, description = "Not an admin", body = MessageRes)
    )
)]
/// Lists staff profiles. Admin only.
#[axum::debug_handler]
async fn list_staff(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<StaffProfileRes>>, ApiError> {
    let caller = authenticate(&state, &headers)?;
    let profiles = state.staff.list(&caller)?;
    Ok(Json(profiles.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/students",
    request_body = StudentReq,
    responses(
        (status = 201, description = "Student created", body = StudentRes),
        (status = 400, description = "Invalid input or duplicate admission number", body = MessageRes),
        (status = 401, description = "Not an admin", body = MessageRes)
    )
)]
/// Creates a student record. Admin only.
#[axum::debug_handler]
async fn create_student(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<StudentReq>,
) -> Result<(StatusCode, Json<StudentRes>), ApiError> {
    let caller = authenticate(&state, &headers)?;
    let student = state.students.create(&caller, req.into_new_student()?)?;
    Ok((StatusCode::CREATED, Json(student.into())))
}

#[utoipa::path(
    get,
    path = "/students",
    responses(
        (status = 200, description = "All students, sorted by name", body = [StudentRes]),
        (status = 401, description = "Not authenticated", body = MessageRes)
    )
)]
/// Lists all students. Any authenticated role.
#[axum::debug_handler]
async fn list_students(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<StudentRes>>, ApiError> {
    let caller = authenticate(&state, &headers)?;
    let students = state.students.list(&caller)?;
    Ok(Json(students.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/students/{id}",
    responses(
        (status = 200, description = "Student record", body = StudentRes),
        (status = 404, description = "Unknown student", body = MessageRes)
    )
)]
/// Returns one student. Any authenticated role.
#[axum::debug_handler]
async fn get_student(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<StudentRes>, ApiError> {
    let caller = authenticate(&state, &headers)?;
    let id = RecordUuid::parse(&id)?;
    let student = state.students.get(&caller, &id)?;
    Ok(Json(student.into()))
}

#[utoipa::path(
    put,
    path = "/students/{id}",
    request_body = StudentUpdateReq,
    responses(
        (status = 200, description = "Student updated", body = StudentRes),
        (status = 401, description = "Not an admin", body = MessageRes),
        (status = 404, description = "Unknown student", body = MessageRes)
    )
)]
/// Applies a partial update to a student. Admin only.
#[axum::debug_handler]
async fn update_student(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<StudentUpdateReq>,
) -> Result<Json<StudentRes>, ApiError> {
    let caller = authenticate(&state, &headers)?;
    let id = RecordUuid::parse(&id)?;
    let student = state.students.update(&caller, &id, req.into_update()?)?;
    Ok(Json(student.into()))
}

#[utoipa::path(
    delete,
    path = "/students/{id}",
    responses(
        (status = 200, description = "Student deleted", body = MessageRes),
        (status = 401, description = "Not an admin", body = MessageRes),
        (status = 404, description = "Unknown student", body = MessageRes)
    )
)]
/// Deletes a student record. Admin only. Visits keep their identifier
/// reference and simply stop resolving it.
#[axum::debug_handler]
async fn delete_student(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<MessageRes>, ApiError> {
    let caller = authenticate(&state, &headers)?;
    let id = RecordUuid::parse(&id)?;
    state.students.delete(&caller, &id)?;
    Ok(Json(MessageRes {
        message: "Student deleted".into(),
    }))
}

#[utoipa::path(
    post,
    path = "/visits",
    request_body = CreateVisitReq,
    responses(
        (status = 201, description = "Visit created", body = VisitRes),
        (status = 400, description = "Invalid input or unknown student reference", body = MessageRes),
        (status = 401, description = "Not a nurse", body = MessageRes)
    )
)]
/// Creates a clinic visit. Nurse only.
#[axum::debug_handler]
async fn create_visit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateVisitReq>,
) -> Result<(StatusCode, Json<VisitRes>), ApiError> {
    let caller = authenticate(&state, &headers)?;
    let visit = state.visits.create(&caller, req.into_new_visit()?)?;
    let view = state.visits.get(&caller, &visit.id)?;
    Ok((StatusCode::CREATED, Json(view.into())))
}

#[derive(Debug, Deserialize)]
struct VisitListQuery {
    #[serde(default, rename = "studentId")]
    student_id: Option<String>,
}

#[utoipa::path(
    get,
    path = "/visits",
    params(
        ("studentId" = Option<String>, Query, description = "Restrict to one student's visits")
    ),
    responses(
        (status = 200, description = "Visits, newest first", body = [VisitRes]),
        (status = 401, description = "Not authenticated", body = MessageRes)
    )
)]
/// Lists visits, newest first. Any authenticated role.
#[axum::debug_handler]
async fn list_visits(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<VisitListQuery>,
) -> Result<Json<Vec<VisitRes>>, ApiError> {
    let caller = authenticate(&state, &headers)?;
    let student_id = match query.student_id {
        Some(s) => Some(RecordUuid::parse(&s)?),
        None => None,
    };
    let views = state.visits.list(&caller, student_id.as_ref())?;
    Ok(Json(views.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/visits/unread",
    responses(
        (status = 200, description = "Number of unviewed visits", body = UnreadCountRes),
        (status = 401, description = "Not an admin", body = MessageRes)
    )
)]
/// Returns the unread-visit count for the admin notification badge.
#[axum::debug_handler]
async fn unread_visit_count(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UnreadCountRes>, ApiError> {
    let caller = authenticate(&state, &headers)?;
    let count = state.visits.count_unread(&caller)?;
    Ok(Json(UnreadCountRes { count }))
}

#[utoipa::path(
    put,
    path = "/visits/viewed",
    responses(
        (status = 200, description = "All visits marked viewed", body = MarkViewedRes),
        (status = 401, description = "Not an admin", body = MessageRes)
    )
)]
/// Marks every unviewed visit as viewed. Admin only; idempotent.
#[axum::debug_handler]
async fn mark_visits_viewed(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MarkViewedRes>, ApiError> {
    let caller = authenticate(&state, &headers)?;
    let updated = state.visits.mark_all_viewed(&caller)?;
    Ok(Json(MarkViewedRes { updated }))
}

#[utoipa::path(
    get,
    path = "/visits/{id}",
    responses(
        (status = 200, description = "Visit with resolved references", body = VisitRes),
        (status = 404, description = "Unknown visit", body = MessageRes)
    )
)]
/// Returns one visit with student and staff references resolved.
#[axum::debug_handler]
async fn get_visit(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<VisitRes>, ApiError> {
    let caller = authenticate(&state, &headers)?;
    let id = RecordUuid::parse(&id)?;
    let view = state.visits.get(&caller, &id)?;
    Ok(Json(view.into()))
}

#[utoipa::path(
    put,
    path = "/visits/{id}",
    request_body = UpdateVisitReq,
    responses(
        (status = 200, description = "Visit amended", body = VisitRes),
        (status = 401, description = "Not a nurse", body = MessageRes),
        (status = 404, description = "Unknown visit", body = MessageRes)
    )
)]
/// Applies a full amendment to a visit. Nurse only.
#[axum::debug_handler]
async fn update_visit(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<UpdateVisitReq>,
) -> Result<Json<VisitRes>, ApiError> {
    let caller = authenticate(&state, &headers)?;
    let id = RecordUuid::parse(&id)?;
    state.visits.amend_full(&caller, &id, req.into_amendment()?)?;
    let view = state.visits.get(&caller, &id)?;
    Ok(Json(view.into()))
}

#[utoipa::path(
    put,
    path = "/visits/{id}/review",
    request_body = ReviewReq,
    responses(
        (status = 200, description = "Review recorded", body = VisitRes),
        (status = 400, description = "Empty comment", body = MessageRes),
        (status = 401, description = "Not a doctor", body = MessageRes),
        (status = 404, description = "Unknown visit", body = MessageRes)
    )
)]
/// Records the doctor's review annotation. Doctor only; a repeat review
/// overwrites the previous one.
#[axum::debug_handler]
async fn review_visit(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<ReviewReq>,
) -> Result<Json<VisitRes>, ApiError> {
    let caller = authenticate(&state, &headers)?;
    let id = RecordUuid::parse(&id)?;
    state.visits.review(&caller, &id, &req.doctor_comment)?;
    let view = state.visits.get(&caller, &id)?;
    Ok(Json(view.into()))
}

#[utoipa::path(
    put,
    path = "/visits/{id}/clinical-details",
    request_body = ClinicalDetailsReq,
    responses(
        (status = 200, description = "Clinical details amended", body = VisitRes),
        (status = 401, description = "Not a doctor", body = MessageRes),
        (status = 404, description = "Unknown visit", body = MessageRes)
    )
)]
/// Amends diagnosis and drugs only. Doctor only.
#[axum::debug_handler]
async fn update_clinical_details(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<ClinicalDetailsReq>,
) -> Result<Json<VisitRes>, ApiError> {
    let caller = authenticate(&state, &headers)?;
    let id = RecordUuid::parse(&id)?;
    state
        .visits
        .amend_clinical(&caller, &id, req.diagnosis, req.drugs)?;
    let view = state.visits.get(&caller, &id)?;
    Ok(Json(view.into()))
}

#[utoipa::path(
    put,
    path = "/visits/{id}/follow-up-report",
    request_body = FollowUpReportReq,
    responses(
        (status = 200, description = "Report appended", body = VisitRes),
        (status = 400, description = "Empty report", body = MessageRes),
        (status = 401, description = "Not a nurse", body = MessageRes),
        (status = 404, description = "Unknown visit", body = MessageRes)
    )
)]
/// Appends a follow-up report to a visit. Nurse only.
#[axum::debug_handler]
async fn add_follow_up_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<FollowUpReportReq>,
) -> Result<Json<VisitRes>, ApiError> {
    let caller = authenticate(&state, &headers)?;
    let id = RecordUuid::parse(&id)?;
    state.visits.add_follow_up_report(&caller, &id, &req.report)?;
    let view = state.visits.get(&caller, &id)?;
    Ok(Json(view.into()))
}

#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Headline counts", body = DashboardRes),
        (status = 401, description = "Not an admin", body = MessageRes)
    )
)]
/// Returns the dashboard counts. Admin only.
#[axum::debug_handler]
async fn dashboard_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DashboardRes>, ApiError> {
    let caller = authenticate(&state, &headers)?;
    let stats = state.dashboard.stats(&caller)?;
    Ok(Json(DashboardRes {
        total_students: stats.total_students,
        total_visits: stats.total_visits,
        total_nurses: stats.total_nurses,
        student_distribution: StudentDistributionRes {
            boarders: stats.boarders,
            day_students: stats.day_students,
        },
    }))
}
