pub mod auth;
pub mod expense;
pub mod material;
pub mod notification;
pub mod phase;
pub mod project;
