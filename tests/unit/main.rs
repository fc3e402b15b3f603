//! Unit-level integration tests

mod request_test;
