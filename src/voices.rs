//! Voice catalog and narration request parameters.
//!
//! The catalog maps stable voice identifiers to human-readable names. It
//! can be loaded from a JSON file for custom deployments, with a built-in
//! set of neural voices as the default.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::NarrateError;

/// Lower bound for the speaking-rate offset, in percent.
pub const MIN_RATE_OFFSET: i32 = -50;

/// Upper bound for the speaking-rate offset, in percent.
pub const MAX_RATE_OFFSET: i32 = 100;

/// One selectable narration voice.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Voice {
    /// Stable identifier passed to the narration backend.
    pub id: String,
    /// Short display name.
    pub name: String,
    /// One-line description (accent, register).
    pub description: String,
}

/// The set of voices available to a narration backend.
pub struct VoiceCatalog {
    voices: Vec<Voice>,
}

impl VoiceCatalog {
    /// Load a catalog from a JSON array of voice entries.
    pub fn load(path: &Path) -> Result<Self, NarrateError> {
        let file = File::open(path)?;
        let voices: Vec<Voice> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| NarrateError::Catalog(format!("failed to parse {}: {e}", path.display())))?;
        if voices.is_empty() {
            return Err(NarrateError::Catalog(format!(
                "{} contains no voices",
                path.display()
            )));
        }
        log::info!("loaded {} voices from {}", voices.len(), path.display());
        Ok(Self { voices })
    }

    /// The built-in voice set.
    pub fn builtin() -> Self {
        let voice = |id: &str, name: &str, description: &str| Voice {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
        };
        Self {
            voices: vec![
                voice("en-US-AriaNeural", "Aria", "US English, conversational"),
                voice("en-US-JennyNeural", "Jenny", "US English, warm"),
                voice("en-US-GuyNeural", "Guy", "US English, male"),
                voice("en-GB-SoniaNeural", "Sonia", "British English"),
                voice("en-AU-NatashaNeural", "Natasha", "Australian English"),
                voice("en-CA-ClaraNeural", "Clara", "Canadian English"),
            ],
        }
    }

    pub fn get(&self, id: &str) -> Result<&Voice, NarrateError> {
        self.voices
            .iter()
            .find(|v| v.id == id)
            .ok_or_else(|| NarrateError::VoiceNotFound(id.to_string()))
    }

    pub fn list(&self) -> &[Voice] {
        &self.voices
    }

    /// The first catalog entry, used when no voice is requested.
    pub fn default_voice(&self) -> &Voice {
        &self.voices[0]
    }
}

impl Default for VoiceCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Parameters for one synthesis call.
///
/// Built through [`NarrationRequestBuilder`], which validates the text
/// and rate bounds before a request ever reaches a backend:
///
/// ```
/// use narrate_rs::voices::NarrationRequestBuilder;
///
/// let request = NarrationRequestBuilder::default()
///     .text("Hello there.")
///     .rate_offset_percent(10)
///     .build()
///     .unwrap();
/// assert_eq!(request.voice_id, "en-US-AriaNeural");
/// ```
#[derive(Debug, Clone, derive_builder::Builder)]
#[builder(build_fn(validate = "Self::validate", error = "NarrateError"), setter(into))]
pub struct NarrationRequest {
    /// Plain text to narrate. Must be non-empty after trimming.
    pub text: String,
    /// Voice identifier from the catalog.
    #[builder(default = "\"en-US-AriaNeural\".to_string()")]
    pub voice_id: String,
    /// Speaking-rate offset in percent, within
    /// [`MIN_RATE_OFFSET`]..=[`MAX_RATE_OFFSET`].
    #[builder(default)]
    pub rate_offset_percent: i32,
    /// Pitch offset in Hz.
    #[builder(default)]
    pub pitch_offset_hz: i32,
}

impl From<derive_builder::UninitializedFieldError> for NarrateError {
    fn from(err: derive_builder::UninitializedFieldError) -> Self {
        NarrateError::MissingField(err.field_name().to_string())
    }
}

impl NarrationRequestBuilder {
    fn validate(&self) -> Result<(), NarrateError> {
        if let Some(text) = &self.text {
            if text.trim().is_empty() {
                return Err(NarrateError::EmptyText);
            }
        }
        if let Some(rate) = self.rate_offset_percent {
            if !(MIN_RATE_OFFSET..=MAX_RATE_OFFSET).contains(&rate) {
                return Err(NarrateError::RateOutOfRange(rate));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_has_a_default_voice() {
        let catalog = VoiceCatalog::builtin();
        assert_eq!(catalog.default_voice().id, "en-US-AriaNeural");
        assert_eq!(catalog.list().len(), 6);
    }

    #[test]
    fn unknown_voice_id_is_an_error() {
        let catalog = VoiceCatalog::builtin();
        let err = catalog.get("xx-XX-Nobody").unwrap_err();
        assert!(matches!(err, NarrateError::VoiceNotFound(id) if id == "xx-XX-Nobody"));
    }

    #[test]
    fn catalog_loads_from_json() {
        let path = std::env::temp_dir().join("narrate_voices_test.json");
        std::fs::write(
            &path,
            r#"[{"id": "en-US-TestNeural", "name": "Test", "description": "fixture"}]"#,
        )
        .unwrap();
        let catalog = VoiceCatalog::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(catalog.default_voice().name, "Test");
    }

    #[test]
    fn request_defaults_are_sane() {
        let request = NarrationRequestBuilder::default()
            .text("Hello.")
            .build()
            .unwrap();
        assert_eq!(request.voice_id, "en-US-AriaNeural");
        assert_eq!(request.rate_offset_percent, 0);
        assert_eq!(request.pitch_offset_hz, 0);
    }

    #[test]
    fn empty_text_is_rejected_before_synthesis() {
        let err = NarrationRequestBuilder::default()
            .text("   ")
            .build()
            .unwrap_err();
        assert!(matches!(err, NarrateError::EmptyText));
    }

    #[test]
    fn rate_outside_bounds_is_rejected() {
        let err = NarrationRequestBuilder::default()
            .text("Hello.")
            .rate_offset_percent(150)
            .build()
            .unwrap_err();
        assert!(matches!(err, NarrateError::RateOutOfRange(150)));
    }
}
