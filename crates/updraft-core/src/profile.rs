//! Contributor profile decoding.
//!
//! Profiles arrive as hex-encoded UTF-8 JSON (optionally `0x`-prefixed).
//! Only `name` and `team` matter for display; other fields are ignored.

use crate::change::Contributor;
use crate::error::ErrorCode;
use serde::Deserialize;

/// Display-relevant profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
}

impl Profile {
    /// First non-empty of `name`, then `team`.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        [self.name.as_deref(), self.team.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
    }
}

/// Failure to decode a profile blob.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("profile is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("profile bytes are not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("profile is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProfileError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::ProfileDecodeFailed
    }
}

/// Turns a raw profile blob into a [`Profile`].
pub trait ProfileDecoder {
    /// Decode one blob.
    ///
    /// # Errors
    ///
    /// Returns a [`ProfileError`] when the blob cannot be decoded.
    fn decode(&self, blob: &str) -> Result<Profile, ProfileError>;
}

/// Hex → UTF-8 → JSON decoder used by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct HexJsonProfileDecoder;

impl ProfileDecoder for HexJsonProfileDecoder {
    fn decode(&self, blob: &str) -> Result<Profile, ProfileError> {
        let trimmed = blob.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let bytes = hex::decode(digits)?;
        let text = String::from_utf8(bytes)?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl<F> ProfileDecoder for F
where
    F: Fn(&str) -> Result<Profile, ProfileError>,
{
    fn decode(&self, blob: &str) -> Result<Profile, ProfileError> {
        self(blob)
    }
}

/// Resolve the display name for a contributor entering a feed sample.
///
/// An already-set non-empty name is kept. Otherwise the profile's `name`
/// or `team` is used, falling back to the address when there is no
/// profile, the profile names nobody, or it fails to decode.
pub fn resolve_name<D: ProfileDecoder + ?Sized>(decoder: &D, contributor: &Contributor) -> String {
    if let Some(name) = contributor.name.as_deref().filter(|n| !n.is_empty()) {
        return name.to_string();
    }
    let Some(blob) = contributor.profile.as_deref() else {
        return contributor.id.clone();
    };
    match decoder.decode(blob) {
        Ok(profile) => profile
            .display_name()
            .map_or_else(|| contributor.id.clone(), str::to_string),
        Err(e) => {
            tracing::warn!(
                contributor = %contributor.id,
                code = %e.code(),
                "profile decode failed, using address: {e}"
            );
            contributor.id.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(json: &str) -> String {
        hex::encode(json.as_bytes())
    }

    fn with_profile(id: &str, profile: &str) -> Contributor {
        Contributor::new(id).with_profile(profile)
    }

    #[test]
    fn decodes_name() {
        let profile = HexJsonProfileDecoder
            .decode(&blob(r#"{"name":"Alice","image":"x"}"#))
            .expect("decode");
        assert_eq!(profile.display_name(), Some("Alice"));
    }

    #[test]
    fn accepts_0x_prefix() {
        let hex = format!("0x{}", blob(r#"{"team":"Acme"}"#));
        let profile = HexJsonProfileDecoder.decode(&hex).expect("decode");
        assert_eq!(profile.display_name(), Some("Acme"));
    }

    #[test]
    fn name_then_team_then_address() {
        let d = HexJsonProfileDecoder;
        let both = with_profile("0xA", &blob(r#"{"name":"Alice","team":"Acme"}"#));
        assert_eq!(resolve_name(&d, &both), "Alice");

        let empty_name = with_profile("0xA", &blob(r#"{"name":"","team":"Acme"}"#));
        assert_eq!(resolve_name(&d, &empty_name), "Acme");

        let neither = with_profile("0xA", &blob("{}"));
        assert_eq!(resolve_name(&d, &neither), "0xA");
    }

    #[test]
    fn decode_failures_fall_back_to_address() {
        let d = HexJsonProfileDecoder;
        assert_eq!(resolve_name(&d, &with_profile("0xA", "zz-not-hex")), "0xA");
        assert_eq!(resolve_name(&d, &with_profile("0xB", &blob("not json"))), "0xB");
        assert_eq!(resolve_name(&d, &with_profile("0xC", "ff")), "0xC");
    }

    #[test]
    fn error_variants_are_distinguished() {
        let d = HexJsonProfileDecoder;
        assert!(matches!(d.decode("xyz"), Err(ProfileError::Hex(_))));
        assert!(matches!(d.decode("ff"), Err(ProfileError::Utf8(_))));
        assert!(matches!(d.decode(&blob("[")), Err(ProfileError::Json(_))));
    }

    #[test]
    fn no_profile_uses_address() {
        assert_eq!(
            resolve_name(&HexJsonProfileDecoder, &Contributor::new("0xA")),
            "0xA"
        );
    }

    #[test]
    fn preset_name_is_kept() {
        let mut c = with_profile("0xA", &blob(r#"{"name":"Alice"}"#));
        c.name = Some("Preset".into());
        assert_eq!(resolve_name(&HexJsonProfileDecoder, &c), "Preset");
    }

    #[test]
    fn closures_are_decoders() {
        let decoder = |_: &str| -> Result<Profile, ProfileError> {
            Ok(Profile {
                name: Some("Fixed".into()),
                team: None,
            })
        };
        assert_eq!(resolve_name(&decoder, &with_profile("0xA", "00")), "Fixed");
    }
}
