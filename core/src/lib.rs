//! Client core for the todo service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). On top of that sits a
//! `TodoService` that drives CRUD through a caller-supplied `Transport` and
//! keeps an observable `Store` in step with the server.
//!
//! # Design
//! - `TodoClient` is stateless; it holds only `base_url`.
//! - Each CRUD operation is split into `build_*` (produces request) and
//!   `parse_*` (consumes response), so the I/O boundary is explicit.
//! - `Store` is owned by the front-end and lent to the service `&mut` per
//!   call; subscribers are an explicit callback list.
//! - Records are validated before any request is built.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod service;
pub mod store;
pub mod types;
pub mod validation;

pub use client::TodoClient;
pub use config::ClientConfig;
pub use error::{ApiError, ConfigError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
pub use service::TodoService;
pub use store::{FetchTicket, Store, StoreState, SubscriptionId};
pub use types::{Todo, TodoId, TodoPayload};
pub use validation::{Field, FieldError, ValidationErrors};
