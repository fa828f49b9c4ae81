//! Shared test utilities for the OWS Context workspace.
//!
//! This crate provides common testing infrastructure including:
//! - The "Karte RP" layer tree as raw entries and as a GeoJSON document
//! - Sample WMS capabilities documents
//! - Assertion macros for folder paths and floating-point values
//!
//! Fixtures are plain data (strings and `serde_json::Value`) so this crate
//! does not depend on the crates it is used to test.
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{assert_folders, fixtures};
//! ```

pub mod fixtures;

pub use fixtures::*;

/// Assert the folder path of a single resource, looked up by id.
///
/// Works with any context type that has `get(&ResourceId)` returning an
/// `Option` of something with `folder()`.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_folder;
///
/// assert_folder!(ctx, "wald", "/0/1");
/// ```
#[macro_export]
macro_rules! assert_folder {
    ($ctx:expr, $id:expr, $folder:expr) => {{
        let id = $id;
        match $ctx.get(&id.into()) {
            Some(resource) => assert_eq!(
                resource.folder().to_string(),
                $folder,
                "folder of resource '{}'",
                id
            ),
            None => panic!("resource '{}' not found", id),
        }
    }};
}

/// Assert the folder paths of several resources at once.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_folders;
///
/// assert_folders!(ctx, {
///     "karte-rp" => "/0",
///     "wald" => "/0/1",
/// });
/// ```
#[macro_export]
macro_rules! assert_folders {
    ($ctx:expr, { $($id:expr => $folder:expr),+ $(,)? }) => {{
        $(
            $crate::assert_folder!($ctx, $id, $folder);
        )+
    }};
}

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Entry(String);

    impl Entry {
        fn folder(&self) -> &str {
            &self.0
        }
    }

    struct Lookup(Vec<FixtureEntry>);

    impl Lookup {
        fn get(&self, id: &String) -> Option<Entry> {
            self.0
                .iter()
                .find(|e| e.id == id.as_str())
                .map(|e| Entry(e.folder.to_string()))
        }
    }

    #[test]
    fn test_assert_folders_passes() {
        let lookup = Lookup(karte_rp_entries());
        assert_folders!(lookup, {
            "karte-rp" => "/0",
            "land-3" => "/0/0/3",
            "topographie" => "/1/1",
        });
    }

    #[test]
    #[should_panic(expected = "folder of resource 'wald'")]
    fn test_assert_folder_fails() {
        let lookup = Lookup(karte_rp_entries());
        assert_folder!(lookup, "wald", "/0/2");
    }

    #[test]
    fn test_assert_approx_eq_passes() {
        assert_approx_eq!(1.0001, 1.0, 0.001);
        assert_approx_eq!(-5.5, -5.500001, 0.0001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }
}
