pub mod base;
pub mod expense;
pub mod material;
pub mod phase;
pub mod profile;
pub mod project;
pub mod user;

pub use base::BaseDao;
