pub mod board;
pub mod constants;
pub mod ledger;
pub mod protocol;
pub mod registry;
pub mod rng;
pub mod server_utils;
pub mod session;
pub mod types;
