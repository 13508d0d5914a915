//! Integration tests for kiosk.
//!
//! The tests in `tests/` drive a running `kiosk-web` server over HTTP and
//! are `#[ignore]`d by default.
//!
//! # Running Tests
//!
//! ```bash
//! # Start PostgreSQL, migrate, seed a staff user
//! cargo run -p kiosk-cli -- migrate
//! cargo run -p kiosk-cli -- admin create -u admin -p <password>
//!
//! # Start the server
//! cargo run -p kiosk-web
//!
//! # Run integration tests against it
//! KIOSK_BASE_URL=http://localhost:8000 \
//! KIOSK_TEST_STAFF_USERNAME=admin \
//! KIOSK_TEST_STAFF_PASSWORD=<password> \
//! cargo test -p kiosk-integration-tests -- --ignored
//! ```

/// Base URL of the server under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("KIOSK_BASE_URL").unwrap_or_else(|_| "http://localhost:8000".to_string())
}

/// Staff credentials used by tests that need a staff session.
#[must_use]
pub fn staff_credentials() -> (String, String) {
    (
        std::env::var("KIOSK_TEST_STAFF_USERNAME").unwrap_or_else(|_| "admin".to_string()),
        std::env::var("KIOSK_TEST_STAFF_PASSWORD").unwrap_or_else(|_| "password123".to_string()),
    )
}
