//! Bonding Protocol Integration Tests
//!
//! Scenarios run against the Odra VM with the real token, oracle and engine
//! contracts deployed side by side.


#[cfg(test)]
mod bonding_tests;
