//! Macro for implementing Display and FromStr for simple string-backed enums
//!
//! Used for configuration switches and state labels that are written to
//! config files, log fields and CLI output. Parsing is case-insensitive,
//! output is always the canonical lowercase form.
//!
//! # Example
//!
//! ```rust
//! use kickstream_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Grant {
//!     AuthorizationCode,
//!     RefreshToken,
//! }
//!
//! impl_domain_status_conversions!(Grant {
//!     AuthorizationCode => "authorization_code",
//!     RefreshToken => "refresh_token",
//! });
//!
//! assert_eq!(Grant::RefreshToken.to_string(), "refresh_token");
//! ```

/// Implements Display and FromStr traits for string-backed enums
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl ::std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
