//! Folio: a bilingual portfolio and blog server.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
