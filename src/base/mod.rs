pub mod db;
pub mod errors;
pub mod helpers;
pub mod page_cache;
pub mod query_params;
pub mod store;
