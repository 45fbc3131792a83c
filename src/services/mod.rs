//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own validation and persistence so route handlers stay
//! focused on request decoding, auth, and status mapping.

pub mod draft;
pub mod otp;
pub mod password;
pub mod token;
pub mod upload;
pub mod user;
pub mod wall_design;
