//! Integration tests for Estate-Sweep

mod common;
mod config_tests;
mod crawl_tests;
