//! d2l-export library
//!
//! This crate provides the core functionality for the `d2l-export` binary.
//! Keep the crate root minimal; implementation and tests live in their modules.
//!
//! ## Overview
//!
//! The library is organized into modules that handle the steps of one export run:
//!
//! - [`credentials`] - Active configuration and durable storage of the rotating refresh token
//! - [`auth`] - Trades the refresh token for a fresh access/refresh token pair
//! - [`export`] - Submits the export job, polls it, streams the archive to disk and prunes old archives
//! - [`cli`] - Command-line interface and the sequential run controller
//! - [`config`] - TOML configuration with run defaults
//! - [`models`] - Tokens, export requests, job statuses and report files
//! - [`errors`] - Error types and their process exit codes
//!
//! ## Example Usage
//!
//! ```no_run
//! use d2l_export::{cli, credentials::FileCredentialStore, errors::AppResult};
//! use std::path::Path;
//!
//! # async fn example() -> AppResult<()> {
//! let mut store = FileCredentialStore::open(Path::new("export.toml"))?;
//! let client = reqwest::Client::new();
//! let today = chrono::Local::now().date_naive();
//!
//! let archive = cli::run_export(&mut store, &client, today).await?;
//! println!("Saved {}", archive.display());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod cli;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod errors;
pub mod export;
pub mod models;
