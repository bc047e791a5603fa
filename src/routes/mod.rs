mod auth;
mod health_check;
mod users;

pub use auth::{login, logout, refresh, register};
pub use health_check::health_check;
pub use users::{admin_greeting, get_current_user, user_greeting};
