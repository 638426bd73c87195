use anyhow::Context;
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use structopt::StructOpt;
use tower_http::trace::TraceLayer;
use withdami_api::{AuthToken, Uuid};

mod db;
mod error;
mod extractors;
mod fuzz;
mod handlers;

pub use error::Error;
use extractors::{AppState, PgPool};

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

#[derive(Debug, StructOpt)]
#[structopt(name = "withdami-server", about = "Backend for the withdami content site")]
struct Opt {
    /// Address to listen on
    #[structopt(long, default_value = "127.0.0.1:3000")]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opt = Opt::from_args();
    tracing_subscriber::fmt::init();

    let db_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let admin_token = match std::env::var("ADMIN_TOKEN") {
        Ok(token) => Some(AuthToken(
            Uuid::try_from(&token as &str).context("ADMIN_TOKEN must be a uuid")?,
        )),
        Err(_) => None,
    };

    let pool = create_sqlx_pool(&db_url).await?;
    MIGRATOR
        .run(&mut *pool.acquire().await?)
        .await
        .context("applying migrations")?;

    tracing::info!("listening on {}", opt.bind);
    axum::Server::bind(&opt.bind)
        .serve(app(pool, admin_token).into_make_service())
        .await
        .context("serving axum webserver")
}

pub async fn create_sqlx_pool(db_url: &str) -> anyhow::Result<PgPool> {
    Ok(PgPool::new(
        sqlx::postgres::PgPoolOptions::new()
            .max_connections(8)
            .connect(db_url)
            .await
            .with_context(|| format!("opening database {db_url:?}"))?,
    ))
}

pub fn app(db: PgPool, admin_token: Option<AuthToken>) -> Router {
    Router::new()
        .route("/api/auth", post(handlers::auth))
        .route("/api/unauth", post(handlers::unauth))
        .route("/api/whoami", get(handlers::whoami))
        .route("/api/admin/create-admin", post(handlers::admin_create_admin))
        .route(
            "/api/articles",
            get(handlers::fetch_articles).post(handlers::create_article),
        )
        .route(
            "/api/articles/categories",
            get(handlers::article_categories),
        )
        .route(
            "/api/articles/:id",
            get(handlers::fetch_article)
                .put(handlers::update_article)
                .delete(handlers::delete_article),
        )
        .route(
            "/api/articles/:id/viewed",
            post(handlers::mark_article_viewed),
        )
        .route(
            "/api/videos",
            get(handlers::fetch_videos).post(handlers::create_video),
        )
        .route("/api/videos/categories", get(handlers::video_categories))
        .route(
            "/api/videos/:id",
            get(handlers::fetch_video)
                .put(handlers::update_video)
                .delete(handlers::delete_video),
        )
        .route("/api/videos/:id/viewed", post(handlers::mark_video_viewed))
        .route("/api/search", get(handlers::search))
        .route("/api/stats", get(handlers::stats))
        .route(
            "/api/comments",
            get(handlers::fetch_comments).post(handlers::create_comment),
        )
        .route("/api/admin/comments", get(handlers::admin_fetch_comments))
        .route(
            "/api/admin/comments/:id/approved",
            post(handlers::admin_set_comment_approved),
        )
        .route(
            "/api/admin/comments/:id",
            delete(handlers::admin_delete_comment),
        )
        .route("/api/likes/state", get(handlers::like_state))
        .route(
            "/api/likes",
            post(handlers::create_like).delete(handlers::delete_like),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { db, admin_token })
}
