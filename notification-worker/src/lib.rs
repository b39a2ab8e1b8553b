//! Sends the deferred upload notification emails

#![deny(clippy::all, clippy::pedantic, clippy::nursery, dead_code)]

pub mod health;
pub mod mailer;
pub mod types;
pub mod worker;
