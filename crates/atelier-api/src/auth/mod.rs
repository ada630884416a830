//! Bearer authentication.
//!
//! The middleware resolves the JWT into an [`Actor`](atelier_core::models::Actor)
//! once per request; handlers receive it through [`CurrentActor`].

pub mod jwt;
pub mod middleware;
pub mod models;

pub use jwt::{JwtClaims, JwtService};
pub use middleware::auth_middleware;
pub use models::CurrentActor;
