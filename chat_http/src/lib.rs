//! HTTP front door of the chat service.
//!
//! `POST /chat` takes a conversation and answers its last message through a
//! `RequestHandler`, `POST /completion` answers a single prompt. Every response
//! carries permissive CORS headers so the browser front-end can call it from anywhere.

mod config;
pub use config::{ServerConfig, DEFAULT_HOST, DEFAULT_PORT};
mod error;
pub use error::{ApiError, ApiResult};
mod handlers;
pub use handlers::{
    create_router, AppState, ChatRequest, ChatResponse, PromptRequest, CHAT_PATH,
    COMPLETION_PATH, HEALTH_PATH,
};
mod server;
pub use server::{bind, serve, ServerError};
