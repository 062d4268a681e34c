//! Core library for calapp.
//!
//! This crate holds everything between the terminal front end and the
//! calendar API:
//! - `session` and `calendar`: the two pieces of client state and their reducers
//! - `store`: the shared store both live in
//! - `controller`: the operations the front end calls
//! - `gateway` and `http`: the remote API boundary and its reqwest implementation
//! - `storage`: the token and view preference kept between runs

pub mod calendar;
pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod gateway;
pub mod http;
pub mod ids;
pub mod session;
pub mod storage;
pub mod store;
pub mod user;
pub mod view;

pub use error::{CalAppError, CalAppResult};
pub use event::{CalendarEvent, EventDraft};
pub use ids::{EventId, UserId};
pub use user::User;
