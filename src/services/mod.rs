//! Business logic services.
//!
//! Services contain the repository queries and credential handling, separated
//! from HTTP handlers.

pub mod account_service;
pub mod guestbook_service;
pub mod lds_service;
pub mod mail_service;
pub mod movie_service;
pub mod passkey_service;
pub mod token_service;
