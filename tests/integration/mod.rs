//! Integration test modules

mod common;
mod reload;
mod tag_flow;
