pub mod archive;
pub mod auth;
pub mod cleanup;
pub mod config;
pub mod error;
pub mod job_controller;
pub mod object_store;
pub mod post_commit;
pub mod reconcile;
pub mod services;
pub mod state;
pub mod store;
