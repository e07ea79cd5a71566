mod common;
mod manifest_tests;
