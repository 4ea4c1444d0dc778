//! Crawler module: the host side of the spider
//!
//! This module contains:
//! - Pending requests and fetched responses
//! - The callback registry that maps continuation names to handlers
//! - HTTP fetching
//! - The engine that drains the request queue and dispatches pages

mod context;
mod engine;
mod fetcher;
mod registry;
mod request;

pub use context::{Context, RequestQueue};
pub use engine::Engine;
pub use fetcher::{build_http_client, fetch};
pub use registry::{CallbackRegistry, Handler};
pub use request::{PendingRequest, Response};
