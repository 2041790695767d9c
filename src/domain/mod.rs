//! Core domain types and logic.

/// Declares a closed set of labels stored verbatim in the journal's JSON.
///
/// Each variant serializes as its label, displays as its label, and parses
/// from the label (or any listed alias) case-insensitively.
macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) {
            $($variant:ident => $label:literal $(| $alias:literal)*),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.pad(self.label())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::domain::error::ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim();
                $(
                    if needle.eq_ignore_ascii_case($label) $(|| needle.eq_ignore_ascii_case($alias))* {
                        return Ok($name::$variant);
                    }
                )+
                Err(crate::domain::error::ParseEnumError {
                    kind: $kind,
                    value: s.to_string(),
                    expected: Self::ALL
                        .iter()
                        .map(|v| v.label())
                        .collect::<Vec<_>>()
                        .join(", "),
                })
            }
        }
    };
}

pub mod error;
pub mod id;
pub mod trade;
pub mod strategy;
pub mod record_store;
pub mod statistics;
pub mod journal;
pub mod config_validation;

/// Trims free text and maps blank input to absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
