//! Pollution incident reporting: submission, automatic moderation and the
//! aggregated views (public map, review queue, leaderboard) built on top of the
//! report store.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
