pub mod affiliates;
pub mod auth;
pub mod forms;
pub mod media;
pub mod posts;
pub mod roles;
mod router;
pub mod users;

pub use router::router;
