pub mod auth;
pub mod base;
pub mod comments;
pub mod config;
pub mod feeds;
pub mod follow;
pub mod forms;
pub mod groups;
pub mod models;
pub mod pagination;
pub mod posts;
pub mod router;
pub mod users;
pub mod views;

// === Component entrypoint ===
#[cfg(target_arch = "wasm32")]
#[spin_sdk::http_component]
fn handle(req: spin_sdk::http::Request) -> anyhow::Result<impl spin_sdk::http::IntoResponse> {
    let store = spin_sdk::key_value::Store::open_default()?;
    if config::seed_demo_data() {
        base::db::init_demo_data(&store)?;
    }
    Ok(router::route(&store, req))
}
