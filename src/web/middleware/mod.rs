//! # Web API Middleware

pub mod auth;
