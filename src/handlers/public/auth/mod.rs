// handlers/public/auth/mod.rs - Public account handlers
//
// Sign-up and session endpoints. Sessions travel as an HttpOnly cookie; the
// login body repeats the token for clients that prefer a Bearer header.

pub mod login; // POST /auth/login - check credentials, set session cookie
pub mod logout; // POST /auth/logout - clear session cookie
pub mod register; // POST /auth/register - create account for any plan type

pub use login::login;
pub use logout::logout;
pub use register::register;
