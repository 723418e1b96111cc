//! Random tokens for multipart boundaries.
//!
//! Format: 32-char nanoid
//! Alphabet: lowercase alphanumeric (0-9, a-z), valid in an unquoted boundary parameter

/// Custom lowercase alphabet
const TOKEN_ALPHABET: [char; 36] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i',
    'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// Length of a generated boundary token.
pub const BOUNDARY_LENGTH: usize = 32;

/// Generate a 32-char boundary token (lowercase alphanumeric).
pub fn generate_boundary() -> String {
    nanoid::nanoid!(BOUNDARY_LENGTH, &TOKEN_ALPHABET)
}
