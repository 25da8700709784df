//! Atrium: the tenant-aware core of a multi-organization dashboard.
//!
//! The crate is organized in layers. `db` owns persistence behind
//! repository traits, `services` orchestrate the repositories, `auth`
//! issues and resolves sessions with tenant claims baked into the
//! token, `authz` holds the static role and permission matrix, and
//! `domains` expose the form-shaped actions a UI drives.

pub mod auth;
pub mod authz;
pub mod config;
pub mod db;
pub mod domains;
pub mod models;
pub mod services;
