// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Student profile derived from loosely-shaped user metadata.
//!
//! Each field is resolved by walking an ordered list of extractors and taking
//! the first non-empty result. Nothing here can fail: absent or oddly-typed
//! metadata simply yields an empty string.

use serde::Serialize;

use super::User;

/// Shown when nothing better is known about the user.
pub const FALLBACK_DISPLAY_NAME: &str = "Student";

/// Normalized view of a student's name and ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub first_name: String,
    pub last_name: String,
    pub student_id: String,
}

/// One step of a metadata fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractor {
    /// The metadata value stored under this key.
    Key(&'static str),
    /// Everything after the first space-separated word of this key's value.
    TrailingWords(&'static str),
}

impl Extractor {
    /// Apply this extractor, returning `None` when it yields nothing usable.
    pub fn extract(&self, user: &User) -> Option<String> {
        match *self {
            Extractor::Key(key) => user.metadata_text(key),
            Extractor::TrailingWords(key) => {
                let full = user.metadata_text(key)?;
                let rest = full.split(' ').skip(1).collect::<Vec<_>>().join(" ");
                (!rest.is_empty()).then_some(rest)
            }
        }
    }
}

pub const FIRST_NAME_CHAIN: &[Extractor] = &[
    Extractor::Key("first_name"),
    Extractor::Key("firstName"),
    Extractor::Key("fullName"),
];

pub const LAST_NAME_CHAIN: &[Extractor] = &[
    Extractor::Key("last_name"),
    Extractor::Key("lastName"),
    Extractor::TrailingWords("full_name"),
];

pub const STUDENT_ID_CHAIN: &[Extractor] =
    &[Extractor::Key("studentId"), Extractor::Key("student_id")];

pub const DISPLAY_NAME_CHAIN: &[Extractor] = &[
    Extractor::Key("full_name"),
    Extractor::Key("fullName"),
    Extractor::Key("name"),
    Extractor::Key("display_name"),
];

/// First non-empty result of `chain`, if any.
pub fn first_match(user: &User, chain: &[Extractor]) -> Option<String> {
    chain.iter().find_map(|extractor| extractor.extract(user))
}

/// Derive the student profile from user metadata.
pub fn derive_profile(user: &User) -> Profile {
    Profile {
        first_name: first_match(user, FIRST_NAME_CHAIN).unwrap_or_default(),
        last_name: first_match(user, LAST_NAME_CHAIN).unwrap_or_default(),
        student_id: first_match(user, STUDENT_ID_CHAIN).unwrap_or_default(),
    }
}

/// Pick the name shown to the user.
///
/// Explicit name metadata wins, then the profile's first + last name, then the
/// local part of the email address, then [`FALLBACK_DISPLAY_NAME`].
pub fn derive_display_name(user: &User, profile: &Profile) -> String {
    if let Some(name) = first_match(user, DISPLAY_NAME_CHAIN) {
        return name;
    }

    let combined = format!("{} {}", profile.first_name, profile.last_name);
    let combined = combined.trim();
    if !combined.is_empty() {
        return combined.to_string();
    }

    user.email_local_part()
        .unwrap_or(FALLBACK_DISPLAY_NAME)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn user(metadata: Value, email: Option<&str>) -> User {
        User {
            id: "u-123".to_string(),
            email: email.map(str::to_string),
            metadata: metadata.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn test_unrecognized_metadata_yields_empty_profile_and_fallback_name() {
        for metadata in [
            json!({}),
            json!({"nickname": "ada", "age": 36}),
            json!({"first_name": "", "studentId": null, "full_name": ""}),
        ] {
            let user = user(metadata, None);
            let profile = derive_profile(&user);
            assert_eq!(profile, Profile::default());
            assert_eq!(derive_display_name(&user, &profile), "Student");
        }
    }

    #[test]
    fn test_full_name_wins_display_name() {
        let user = user(
            json!({
                "full_name": "Ada Lovelace",
                "fullName": "Someone Else",
                "name": "ada",
                "first_name": "Augusta",
                "last_name": "King",
            }),
            Some("countess@example.com"),
        );
        let profile = derive_profile(&user);
        assert_eq!(derive_display_name(&user, &profile), "Ada Lovelace");
    }

    #[test]
    fn test_email_local_part_display_name() {
        let user = user(json!({}), Some("ada@example.com"));
        let profile = derive_profile(&user);
        assert_eq!(derive_display_name(&user, &profile), "ada");
    }

    #[test]
    fn test_combined_profile_display_name() {
        let user = user(
            json!({"first_name": "Ada", "last_name": "Lovelace"}),
            Some("ada@example.com"),
        );
        let profile = derive_profile(&user);
        assert_eq!(derive_display_name(&user, &profile), "Ada Lovelace");

        let user = self::user(json!({"lastName": "Lovelace"}), None);
        let profile = derive_profile(&user);
        assert_eq!(derive_display_name(&user, &profile), "Lovelace");
    }

    #[test]
    fn test_first_name_priority() {
        let user = user(
            json!({"firstName": "camel", "first_name": "snake", "fullName": "Full Name"}),
            None,
        );
        assert_eq!(derive_profile(&user).first_name, "snake");

        let user = self::user(json!({"firstName": "camel", "fullName": "Full Name"}), None);
        assert_eq!(derive_profile(&user).first_name, "camel");

        let user = self::user(json!({"fullName": "Full Name"}), None);
        assert_eq!(derive_profile(&user).first_name, "Full Name");
    }

    #[test]
    fn test_last_name_from_full_name() {
        let user = user(json!({"full_name": "Ada King Lovelace"}), None);
        let profile = derive_profile(&user);
        assert_eq!(profile.last_name, "King Lovelace");
        // full_name is not a first-name source
        assert_eq!(profile.first_name, "");

        let user = self::user(json!({"full_name": "Ada"}), None);
        assert_eq!(derive_profile(&user).last_name, "");

        let user = self::user(json!({"full_name": "Ada Lovelace", "lastName": "King"}), None);
        assert_eq!(derive_profile(&user).last_name, "King");
    }

    #[test]
    fn test_student_id_priority_and_numbers() {
        let user = user(json!({"student_id": "24-0002", "studentId": "24-0001"}), None);
        assert_eq!(derive_profile(&user).student_id, "24-0001");

        let user = self::user(json!({"student_id": 240002}), None);
        assert_eq!(derive_profile(&user).student_id, "240002");
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let user = user(
            json!({"first_name": "Ada", "last_name": "Lovelace", "student_id": "24-0001"}),
            Some("ada@example.com"),
        );
        let first = derive_profile(&user);
        let second = derive_profile(&user);
        assert_eq!(first, second);
        assert_eq!(
            derive_display_name(&user, &first),
            derive_display_name(&user, &second)
        );
    }
}
