//! HTTP route handlers for Leadbox.
//!
//! Routes are organized by audience:
//! - `contact`: public intake endpoint (`POST /api/contact`)
//! - `admin`: request listing, stats, and status updates (`/api/admin/*`)
//! - `health`: liveness probe

pub mod admin;
pub mod contact;
pub mod health;
