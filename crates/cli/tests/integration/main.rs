mod common;
mod list_tests;
mod resolve_tests;
