pub mod expense;
pub mod material;
pub mod notification;
pub mod phase;
pub mod profile;
pub mod project;
pub mod user;

pub use expense::{Expense, LedgerEntry};
pub use material::Material;
pub use notification::{Notification, NotificationKind};
pub use phase::Phase;
pub use profile::Profile;
pub use project::Project;
pub use user::{User, UserRole};
