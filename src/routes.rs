// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, questions, quizzes, results},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware, staff_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, questions, quizzes, results, admin).
/// * Public, authenticated, staff and admin routes are layered separately.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let authenticated = || middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .merge(
            Router::new()
                .route("/profile", put(auth::update_profile))
                .layer(authenticated()),
        );

    let question_routes = Router::new()
        .route(
            "/",
            get(questions::list_questions).post(questions::create_question),
        )
        .route("/import", post(questions::import_questions))
        .route("/batches", get(questions::list_batches))
        .route("/batches/{id}", delete(questions::delete_batch))
        .route(
            "/{id}",
            put(questions::update_question).delete(questions::delete_question),
        )
        .layer(middleware::from_fn(staff_middleware))
        .layer(authenticated())
        // Wiping the bank is reserved to admins
        .merge(
            Router::new()
                .route("/", delete(questions::delete_all_questions))
                .layer(middleware::from_fn(admin_middleware))
                .layer(authenticated()),
        );

    let quiz_routes = Router::new()
        .route("/", get(quizzes::list_quizzes))
        .route("/demo/{category}", get(quizzes::demo_quiz))
        .route("/{id}", get(quizzes::get_quiz))
        .merge(
            Router::new()
                .route("/", post(quizzes::create_quiz))
                .route("/{id}", delete(quizzes::delete_quiz))
                .layer(middleware::from_fn(staff_middleware))
                .layer(authenticated()),
        );

    let result_routes = Router::new()
        .route("/", post(results::record_result))
        .route("/student/{name}", get(results::list_results_by_student))
        .route("/{id}", get(results::get_result))
        .layer(authenticated())
        .merge(
            Router::new()
                .route("/", get(results::list_results))
                .route("/quiz/{id}", get(results::list_results_by_quiz))
                .layer(middleware::from_fn(staff_middleware))
                .layer(authenticated()),
        )
        .merge(
            Router::new()
                .route("/{id}", delete(results::delete_result))
                .layer(middleware::from_fn(admin_middleware))
                .layer(authenticated()),
        );

    let admin_routes = Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/{id}", delete(admin::delete_user))
        .route("/summary", get(admin::summary))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(authenticated());

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/questions", question_routes)
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/results", result_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
