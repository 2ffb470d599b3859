pub mod cache;
pub mod client;
pub mod crop;
pub mod error;
pub mod filter;
pub mod local;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod routes;
pub mod selector;
pub mod table;
pub mod traversal;

use worker::{Context, Env, Request, Response, Result, event};

#[event(start)]
fn start() {
    logging::init();
}

#[event(fetch)]
async fn fetch(req: Request, env: Env, ctx: Context) -> Result<Response> {
    routes::handle(req, env, ctx).await
}
