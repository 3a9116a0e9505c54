// handlers/protected/mod.rs - Protected handlers (session required)
//
// Security Level: any valid session (cookie or Bearer token)
// Middleware: require_session, which injects `AuthUser` as an extension
//
// Ownership is checked in the services: users manage their own records and
// events they organise; moderators and admins manage everyone's.

pub mod events; // Event writes
pub mod participants; // Participant self-service records
pub mod users; // Combined user view
