//! # Meridian Shared
//!
//! Types shared between the API server and its clients: request/response
//! DTOs and the standardized response envelope.

pub mod dto;
pub mod response;

pub use response::{ApiResponse, ErrorResponse};
