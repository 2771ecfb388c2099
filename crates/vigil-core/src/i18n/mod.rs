//! Localization support for failure messages
//!
//! - `locale`: locale identifiers and bundle fallback order
//! - `properties`: the `.properties` format used by bundles and rule files
//! - `bundle`: bundle base-name derivation and chained bundle loading

pub mod bundle;
pub mod locale;
pub mod properties;

pub use bundle::{bundle_base_name, BundleLoader, MessageBundle, BUNDLE_EXTENSION};
pub use locale::Locale;
