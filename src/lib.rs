//! Boardwalk: project boards with ordered lists and cards, checklists,
//! comments, an append-only activity log, time tracking, sprints and
//! analytics, served over HTTP and MCP.

pub mod analytics;
pub mod api;
pub mod client;
pub mod db;
pub mod mcp;
pub mod models;
