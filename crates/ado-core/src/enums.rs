//! Closed sets of string tokens accepted by the tools
//!
//! Every enum is backed by a lookup table of `(input token, variant)` pairs
//! so the accepted set is explicit and exhaustively testable. Unrecognized
//! tokens fail with [`Error::InvalidEnumValue`]; nothing silently defaults.
//! A `#[default]` variant only stands in for an omitted parameter.

use std::fmt;

use crate::{Error, Result};

macro_rules! token_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $input:literal, $backend:literal;)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
        }

        impl $name {
            /// Input token to variant table
            pub const TABLE: &'static [(&'static str, $name)] = &[
                $(($input, $name::$variant),)+
            ];

            /// Every variant, in table order
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            /// Parse an input token for the parameter named `field`
            pub fn parse(field: &str, token: &str) -> Result<Self> {
                Self::TABLE
                    .iter()
                    .find(|(input, _)| *input == token)
                    .map(|(_, variant)| *variant)
                    .ok_or_else(|| Error::InvalidEnumValue {
                        field: field.to_string(),
                        value: token.to_string(),
                        allowed: Self::allowed(),
                    })
            }

            /// Accepted input tokens
            pub fn allowed() -> Vec<&'static str> {
                Self::TABLE.iter().map(|(input, _)| *input).collect()
            }

            /// Token as accepted from callers
            pub fn as_input(&self) -> &'static str {
                match self {
                    $($name::$variant => $input,)+
                }
            }

            /// Token as sent to the backend
            pub fn backend_token(&self) -> &'static str {
                match self {
                    $($name::$variant => $backend,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_input())
            }
        }
    };
}

token_enum! {
    /// Pull request status filter
    PullRequestStatus {
        Abandoned => "Abandoned", "abandoned";
        #[default]
        Active => "Active", "active";
        All => "All", "all";
        Completed => "Completed", "completed";
        NotSet => "NotSet", "notSet";
    }
}

token_enum! {
    /// Kind of the version a commit search is anchored to
    VersionType {
        #[default]
        Branch => "Branch", "branch";
        Tag => "Tag", "tag";
        Commit => "Commit", "commit";
    }
}

token_enum! {
    /// How commits are matched to pull requests
    PullRequestQueryType {
        NotSet => "NotSet", "notSet";
        #[default]
        LastMergeCommit => "LastMergeCommit", "lastMergeCommit";
        Commit => "Commit", "commit";
    }
}

token_enum! {
    /// Comment thread status
    ///
    /// Backend tokens are capitalized; `byDesign` and `wontFix` keep their
    /// inner capital.
    ThreadStatus {
        #[default]
        Active => "active", "Active";
        ByDesign => "byDesign", "ByDesign";
        Closed => "closed", "Closed";
        Fixed => "fixed", "Fixed";
        Pending => "pending", "Pending";
        Unknown => "unknown", "Unknown";
        WontFix => "wontFix", "WontFix";
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("active", "Active")]
    #[case("byDesign", "ByDesign")]
    #[case("closed", "Closed")]
    #[case("fixed", "Fixed")]
    #[case("pending", "Pending")]
    #[case("unknown", "Unknown")]
    #[case("wontFix", "WontFix")]
    fn test_thread_status_backend_tokens(#[case] input: &str, #[case] expected: &str) {
        let status = ThreadStatus::parse("status", input).unwrap();
        assert_eq!(status.backend_token(), expected);
    }

    #[test]
    fn test_thread_status_table_is_exhaustive() {
        assert_eq!(ThreadStatus::TABLE.len(), ThreadStatus::ALL.len());
        for status in ThreadStatus::ALL {
            assert_eq!(
                ThreadStatus::parse("status", status.as_input()).unwrap(),
                *status
            );
        }
    }

    #[test]
    fn test_unknown_pull_request_status_is_rejected() {
        let err = PullRequestStatus::parse("status", "Merged").unwrap_err();
        match err {
            Error::InvalidEnumValue {
                field,
                value,
                allowed,
            } => {
                assert_eq!(field, "status");
                assert_eq!(value, "Merged");
                assert_eq!(
                    allowed,
                    vec!["Abandoned", "Active", "All", "Completed", "NotSet"]
                );
            }
            other => panic!("expected InvalidEnumValue, got {other:?}"),
        }
    }

    #[test]
    fn test_tokens_are_case_sensitive() {
        assert!(PullRequestStatus::parse("status", "active").is_err());
        assert!(ThreadStatus::parse("status", "Closed").is_err());
        assert!(VersionType::parse("versionType", "branch").is_err());
    }

    #[rstest]
    #[case(VersionType::Branch, "branch")]
    #[case(VersionType::Tag, "tag")]
    #[case(VersionType::Commit, "commit")]
    fn test_version_type_backend_tokens(#[case] version: VersionType, #[case] expected: &str) {
        assert_eq!(version.backend_token(), expected);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(PullRequestStatus::default(), PullRequestStatus::Active);
        assert_eq!(VersionType::default(), VersionType::Branch);
        assert_eq!(
            PullRequestQueryType::default(),
            PullRequestQueryType::LastMergeCommit
        );
        assert_eq!(ThreadStatus::default(), ThreadStatus::Active);
    }
}
