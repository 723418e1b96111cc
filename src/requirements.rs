//! Library requirements sent alongside uploaded models.
//!
//! The listing is generated by the build script from `Cargo.lock` and pins the crates
//! that decide how a model blob is encoded. The server treats it as opaque text.

const BUILD_REQUIREMENTS: &str = include_str!(concat!(env!("OUT_DIR"), "/requirements.txt"));

/// Requirements listing captured when this crate was built.
///
/// The first line is always `giskard-client==<version>`. The pinned crates follow only
/// when a `Cargo.lock` sits next to this crate's manifest, which is the case for a
/// workspace build but not when the crate is compiled as a dependency of another
/// project. Use `ClientBuilder::requirements` to send a complete listing from there.
pub fn capture() -> String {
    BUILD_REQUIREMENTS.to_string()
}
