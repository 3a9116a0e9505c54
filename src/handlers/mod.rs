// handlers/mod.rs - 3-Tier Handler Architecture
//
// Public (no session) → Protected (any valid session) → Elevated (moderator
// or admin session). The tiers only differ in the middleware the router puts
// in front of them; every handler delegates to `services`.

pub mod elevated; // Tier 3: staff session required
pub mod protected; // Tier 2: session required
pub mod public; // Tier 1: no session required

use uuid::Uuid;

use crate::error::ApiError;

/// Path ids are parsed here so a malformed id gets the usual `{error}` body.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::bad_request(format!("Invalid {} id '{}'", what, raw)))
}

// Directory structure:
// src/handlers/
// ├── mod.rs              ← This file
// ├── public/
// │   ├── mod.rs          ← GET /, GET /health
// │   ├── auth/           ← register, login, logout
// │   └── site.rs         ← read-only site data, display number check, file reads
// ├── protected/
// │   ├── users.rs        ← GET /users/:id
// │   ├── participants.rs ← /users/participants/:user_id/...
// │   └── events.rs       ← event writes
// └── elevated/
//     ├── plans.rs, content.rs, hubs.rs, routes.rs, users.rs
