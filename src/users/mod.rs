//! Account creation and plaintext-credential sign-in.
//!
//! Passwords are stored and compared verbatim, and sign-in hands back the
//! full user record. No session or token is issued.

mod handler;
mod routes;

pub use routes::routes;
