//! Cross-host conformance harness.
//!
//! The checks in this crate only see the common views, so a single test body
//! can be run against the macro, build and editor hosts:
//!
//! ```ignore
//! each_host(fixture::ACCOUNTS, |host, _env| {
//!     let user = host.find_class("crate::User")?;
//!     assert_order(user, &["id", "name", "email", "roles", "history"])?;
//!     assert_back_references(user)
//! })?;
//! ```

mod checks;
pub mod fixture;
mod generator;
mod hosts;

pub use checks::{
    MethodRecord, ParityRecord, assert_back_references, assert_idempotent, assert_order,
    assert_repeatable, describe, method_records, parity_records, truth_table,
};
pub use generator::SchemaGenerator;
pub use hosts::{each_host, each_host_in};
