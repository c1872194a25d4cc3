pub mod actor;
pub mod auth;
pub mod config;
pub mod handler;
pub mod lifecycle;
pub mod observability;
pub mod server;
pub mod store;
pub mod web;

pub use auth::{Authenticator, PasswordHasher, SessionCookie};
pub use handler::BaseHandler;
pub use lifecycle::Stores;
pub use store::{RecordStore, SessionStore, StoreError};
pub use web::WebHandler;
