/// Food Waste Hub - surplus food listings, claims and canned reports
///
/// This is the root crate that provides workspace-level documentation.
/// Actual implementation is in the subcrates:
/// - `food-waste-core`: record stores, CSV mirrors, seeding and the query catalog
/// - `food-waste-cli`: the `food-hub` command-line front end

/// This module is intentionally empty as the actual implementation
/// is in the subcrates.
/// Returns the version of the package.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
