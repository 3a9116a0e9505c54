pub mod auth;
pub mod response;

pub use auth::{clear_session_cookie, require_session, require_staff, session_cookie, session_user, AuthUser};
pub use response::{ApiResponse, ApiResult};
