//! Data models representing database entities and API payloads.

/// Confirmation and password-reset tokens
pub mod account_token;
/// Guestbook entries
pub mod guestbook;
/// LDS content catalogue
pub mod lds;
/// Movie catalogue
pub mod movie;
/// Stored WebAuthn credentials
pub mod passkey;
/// User accounts and collections
pub mod user;
