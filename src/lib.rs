//! An ownership-scoped task tracking backend: accounts authenticate with
//! bearer tokens, and every task and profile mutation is strictly scoped
//! to the owning account. This crate holds the domain models, the token
//! and password primitives, the account and task services, the HTTP
//! routing configuration, and the error taxonomy. The binary (`main.rs`)
//! wires it all together.

pub mod auth;
pub mod config;
pub mod error;
pub mod mailer;
pub mod models;
pub mod routes;
pub mod services;
