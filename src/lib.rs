//! A small HTTP relay between a public subscription form and a
//! marketing-email provider.
//!
//! `POST /subscribe` checks whether the address is already a contact, then
//! either adds it straight away (`direct`) or emails a single-use link first
//! (`double_opt_in`, see `GET /confirm`).

pub mod configuration;
pub mod domain;
pub mod middleware;
pub mod provider_client;
pub mod routes;
pub mod startup;
pub mod telemetry;
pub mod token_store;
pub mod utils;
