//! Inbound adapters: REST handlers under `http`, the live history feed under
//! `ws`. Both depend on domain ports only.

pub mod http;
pub mod ws;
