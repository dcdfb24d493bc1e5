//! SFTP integration tests
//!
//! These tests need a reachable SFTP server with a writable directory.
//!
//! ## Running the tests
//!
//! ```bash
//! REPORT_SFTP_TEST_HOST=127.0.0.1 \
//! REPORT_SFTP_TEST_PORT=2222 \
//! REPORT_SFTP_TEST_USER=testuser \
//! REPORT_SFTP_TEST_PASSWORD=testpass123 \
//! REPORT_SFTP_TEST_DIR=upload \
//! cargo test --test sftp_integration
//! ```
//!
//! Set `REPORT_SFTP_TEST_KEY` to a private key path accepted by the server to
//! also run the key file test.

#[macro_use]
pub mod fixtures;

mod auth_tests;
mod upload_tests;
