//! HTTP API for reading and accumulating WooCommerce points balances

pub mod adapters;
pub mod commands;
pub mod config;
pub mod domain;
pub mod http;
pub mod ports;
