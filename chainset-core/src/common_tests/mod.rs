//! Reusable test bodies shared by every set implementation.
//!
//! Integration tests here and in downstream crates instantiate these with a
//! concrete set type; the bodies assume nothing beyond the
//! [`crate::ConcurrentSet`] contract, so one suite exercises the whole
//! family.

pub mod set_contract_tests;
pub mod set_stress_tests;
