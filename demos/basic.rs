//! Minimal ovenjoy example: a small user API with router middleware.
//!
//! Run with:
//!   cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/api/users/42
//!   curl 'http://localhost:3000/api/users?limit=5&tag=a&tag=b'
//!   curl -X POST http://localhost:3000/api/users \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"alice"}'
//!   curl -X DELETE http://localhost:3000/api/users/42 -H 'authorization: yes'
//!   curl http://localhost:3000/static/css/site.css

use http::StatusCode;
use ovenjoy::handler::sync_fn;
use ovenjoy::{App, HandlerError, HandlerResult, Next, Request, Response, Router, Server, handlers};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), ovenjoy::Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let users = Router::new()
        .get("/", list_users)
        .get("/:id", get_user)
        .post("/", create_user)
        .delete("/:id", handlers![require_auth, delete_user]);

    let api = Router::new()
        .middleware(log_request)
        .mount("/users", users)
        .middleware(sync_fn(|_req, res| {
            res.set_header("x-api-version", "1");
            Ok(())
        }));

    let assets = Router::at("/static").get("/**", serve_asset);

    let mut app = App::new();
    app.attach("/api", api)?.attach("/", assets)?;

    Server::bind("0.0.0.0:3000").serve(app).await
}

async fn log_request(req: Request, res: Response, next: Next) -> HandlerResult {
    info!(method = %req.method(), path = req.path(), "api request");
    next.run(req, res).await
}

// GET /api/users?limit=&tag=
async fn list_users(req: Request, mut res: Response, _next: Next) -> HandlerResult {
    let query = req.query().cloned().unwrap_or_default();
    let limit: usize = query.get("limit").and_then(|l| l.parse().ok()).unwrap_or(10);
    res.json(&serde_json::json!({
        "limit": limit,
        "tags": query.get_all("tag"),
        "users": [],
    }))?;
    Ok(res)
}

// GET /api/users/:id
async fn get_user(req: Request, mut res: Response, _next: Next) -> HandlerResult {
    let id = req.param("id").unwrap_or("unknown");
    res.json(&serde_json::json!({ "id": id, "name": "alice" }))?;
    Ok(res)
}

// POST /api/users, body parsed by the built-in JSON middleware
async fn create_user(req: Request, mut res: Response, _next: Next) -> HandlerResult {
    let Some(name) = req.json().and_then(|v| v["name"].as_str()) else {
        return Err(HandlerError::with_status(StatusCode::UNPROCESSABLE_ENTITY, "`name` is required"));
    };
    res.set_status(StatusCode::CREATED)
        .set_header("location", "/api/users/99");
    res.json(&serde_json::json!({ "id": "99", "name": name }))?;
    Ok(res)
}

async fn require_auth(req: Request, res: Response, next: Next) -> HandlerResult {
    if req.header("authorization").is_none() {
        return Err(HandlerError::with_status(StatusCode::UNAUTHORIZED, "missing authorization"));
    }
    next.run(req, res).await
}

// DELETE /api/users/:id → 204 No Content
async fn delete_user(_req: Request, mut res: Response, _next: Next) -> HandlerResult {
    res.set_status(StatusCode::NO_CONTENT).end();
    Ok(res)
}

// GET /static/**
async fn serve_asset(req: Request, mut res: Response, _next: Next) -> HandlerResult {
    res.text(format!("would serve {}", req.path()));
    Ok(res)
}
