use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use dotenvy::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use sporthub::database::schema;
use sporthub::web::middleware::auth as auth_middleware;
use sporthub::web::routes::{activities, auth, comments, registrations};

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt::init();

    let db_url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://sporthub.db".to_string());
    // WAL + busy timeout: concurrent registration transactions queue on the
    // write lock instead of erroring out.
    let options = SqliteConnectOptions::from_str(&db_url)
        .expect("invalid DATABASE_URL")
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .expect("cannot connect to database");

    schema::apply(&pool).await.expect("cannot apply schema");

    let public_routes = Router::new()
        .route("/api/register", post(auth::register_handler))
        .route("/api/login", post(auth::login_handler))
        .route("/api/activities", get(activities::list_handler))
        .route("/api/activities/search", get(activities::search_handler))
        .route("/api/activities/popular", get(activities::popular_handler))
        .route(
            "/api/activities/upcoming",
            get(activities::upcoming_handler),
        )
        .route("/api/activities/:activity_id", get(activities::get_handler))
        .route(
            "/api/comments/activity/:activity_id",
            get(comments::list_for_activity_handler),
        )
        .route(
            "/api/comments/stats/:activity_id",
            get(comments::rating_stats_handler),
        )
        .route("/api/comments/:comment_id", get(comments::get_handler));

    let protected_routes = Router::new()
        .route("/api/activities", post(activities::create_handler))
        .route(
            "/api/activities/user/my",
            get(activities::my_activities_handler),
        )
        .route(
            "/api/activities/:activity_id",
            put(activities::update_handler).delete(activities::delete_handler),
        )
        .route(
            "/api/registrations/register",
            post(registrations::register_handler),
        )
        .route(
            "/api/registrations/cancel/:activity_id",
            delete(registrations::cancel_handler),
        )
        .route(
            "/api/registrations/user",
            get(registrations::my_registrations_handler),
        )
        .route(
            "/api/registrations/check/:activity_id",
            get(registrations::check_handler),
        )
        .route(
            "/api/registrations/activity/:activity_id",
            get(registrations::activity_registrations_handler),
        )
        .route(
            "/api/registrations/stats/:activity_id",
            get(registrations::stats_handler),
        )
        .route("/api/comments/add", post(comments::add_handler))
        .route(
            "/api/comments/user/comments",
            get(comments::my_comments_handler),
        )
        .route(
            "/api/comments/:comment_id",
            put(comments::update_handler).delete(comments::delete_handler),
        )
        .layer(middleware::from_fn(auth_middleware::require_auth));

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .with_state(pool);

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(5000);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .expect("cannot parse host/port");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("cannot bind listener");
    info!("listening on http://{}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
