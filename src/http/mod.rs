//! HTTP API module for Garbanzo
//!
//! Provides the read-only REST endpoints over the lookup core.

pub mod server;

pub use server::{
    create_server, start_server, ApiError, AppState, ErrorResponse, StatementsParams,
    SuccessResponse, UPSTREAM_FAILURE,
};
