//! Build version information.

/// Human-readable build identifier, baked in at compile time.
pub fn build_info() -> &'static str {
    concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"))
}
