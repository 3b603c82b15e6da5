// src/models/mod.rs
// DOCUMENTATION: Models module organization
// PURPOSE: Re-export model components

/// Declares a closed set of lowercase string values stored in VARCHAR columns
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!(
                        "invalid value '{}', expected one of: {}",
                        other,
                        [$($text),+].join(", ")
                    )),
                }
            }
        }
    };
}

pub mod contact;
pub mod dynamic_field;
pub mod inquiry;
pub mod media;
pub mod property;
pub mod response;
pub mod trim;
pub mod stats;
pub mod user;
pub mod user_type;

pub use contact::*;
pub use dynamic_field::*;
pub use inquiry::*;
pub use media::*;
pub use property::*;
pub use response::*;
pub use stats::*;
pub use user::*;
pub use user_type::*;
