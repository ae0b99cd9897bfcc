//! Integration tests for segskip

mod helpers;

mod cli_test;
mod config_test;
mod session_test;
