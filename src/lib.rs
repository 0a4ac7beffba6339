pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod relayer;
pub mod rpc;
pub mod store;
pub mod wallet;
