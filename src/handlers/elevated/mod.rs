// handlers/elevated/mod.rs - Elevated handlers (staff session required)
//
// Security Level: moderator or admin session
// Middleware: require_session (outer) then require_staff
//
// Missing or invalid sessions are rejected with 401 before the role check;
// valid sessions without a staff role get 403. No write starts before both
// checks pass.

pub mod content; // About sections and file uploads
pub mod hubs; // Hub management
pub mod plans; // Plan management
pub mod routes; // Map route management
pub mod users; // Bulk user deletion
