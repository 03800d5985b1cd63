//! Domain model (IDs, tasks, identities, cookies, errors).

pub mod cookie;
pub mod errors;
pub mod ids;
pub mod task;
pub mod user;

pub use self::cookie::{CookieMutation, CookieOptions, RequestCookies, SameSite};
pub use self::errors::{SessionError, StoreError};
pub use self::ids::{TaskId, ViewId};
pub use self::task::{Task, TaskDraft, TaskField};
pub use self::user::User;
