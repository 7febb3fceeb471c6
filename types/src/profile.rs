use std::collections::BTreeMap;

use serde_json::Value;

use crate::value::{first_list, first_text};

/// Wire keys folded into the named fields below. Everything else lands in `extra`.
const KNOWN_FIELDS: &[&str] = &[
    "name",
    "gender",
    "age_group",
    "age_range",
    "skin_tone",
    "undertone",
    "palettes",
    "best_palettes",
    "palette",
    "vibes",
    "style_vibes",
    "vibe",
];

/// What the agent (or the portrait analysis) knows about the user.
///
/// Every field is optional; a profile received from the wire is treated as a
/// patch and merged with [`UserProfile::merge`].
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "Value")]
pub struct UserProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skin_tone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub undertone: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub palettes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vibes: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl From<Value> for UserProfile {
    fn from(value: Value) -> Self {
        let Value::Object(object) = value else {
            return Self::default();
        };
        let extra = object
            .iter()
            .filter(|(key, value)| !KNOWN_FIELDS.contains(&key.as_str()) && !value.is_null())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Self {
            name: first_text(&object, &["name"]),
            gender: first_text(&object, &["gender"]),
            age_group: first_text(&object, &["age_group", "age_range"]),
            skin_tone: first_text(&object, &["skin_tone"]),
            undertone: first_text(&object, &["undertone"]),
            palettes: first_list(&object, &["palettes", "best_palettes", "palette"]),
            vibes: first_list(&object, &["vibes", "style_vibes", "vibe"]),
            extra,
        }
    }
}

impl UserProfile {
    /// Decodes a profile response that may be wrapped in a `data` or `profile` envelope.
    pub fn from_response(value: Value) -> Self {
        match value {
            Value::Object(mut object) => {
                for envelope in ["data", "profile"] {
                    if matches!(object.get(envelope), Some(Value::Object(_))) {
                        if let Some(inner) = object.remove(envelope) {
                            return Self::from(inner);
                        }
                    }
                }
                Self::from(Value::Object(object))
            }
            other => Self::from(other),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies `patch` on top of `self`. A field is only overwritten when the
    /// patch carries a value for it; nothing known is ever cleared.
    pub fn merge(&mut self, patch: &UserProfile) {
        fn keep_or_replace(slot: &mut Option<String>, incoming: &Option<String>) {
            if incoming.is_some() {
                slot.clone_from(incoming);
            }
        }

        keep_or_replace(&mut self.name, &patch.name);
        keep_or_replace(&mut self.gender, &patch.gender);
        keep_or_replace(&mut self.age_group, &patch.age_group);
        keep_or_replace(&mut self.skin_tone, &patch.skin_tone);
        keep_or_replace(&mut self.undertone, &patch.undertone);
        if !patch.palettes.is_empty() {
            self.palettes.clone_from(&patch.palettes);
        }
        if !patch.vibes.is_empty() {
            self.vibes.clone_from(&patch.vibes);
        }
        for (key, value) in &patch.extra {
            if !value.is_null() {
                self.extra.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Body of `POST /profile/update`. Unset fields are left alone by the service.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProfileUpdate {
    #[serde(rename = "userId")]
    user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    age_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    skin_tone: Option<String>,
}

impl ProfileUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_id(mut self, user_id: &str) -> Self {
        self.user_id = user_id.to_string();
        self
    }

    /// Blank values are skipped; the service would store them verbatim.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = filled(name);
        self
    }

    pub fn with_gender(mut self, gender: &str) -> Self {
        self.gender = filled(gender);
        self
    }

    pub fn with_age_group(mut self, age_group: &str) -> Self {
        self.age_group = filled(age_group);
        self
    }

    pub fn with_skin_tone(mut self, skin_tone: &str) -> Self {
        self.skin_tone = filled(skin_tone);
        self
    }

    /// True when no profile field is set.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.gender.is_none()
            && self.age_group.is_none()
            && self.skin_tone.is_none()
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

fn filled(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn update_body_carries_only_set_fields() {
        let update = ProfileUpdate::new()
            .with_user_id("u1")
            .with_age_group("25-34")
            .with_skin_tone(" wheatish ")
            .with_name("  ");

        assert!(!update.is_empty());
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"userId": "u1", "age_group": "25-34", "skin_tone": "wheatish"})
        );
        assert!(ProfileUpdate::new().with_user_id("u1").with_name("").is_empty());
    }

    #[test]
    fn merge_never_drops_known_fields() {
        let mut profile = UserProfile::from(json!({"gender": "women"}));
        profile.merge(&UserProfile::from(json!({"name": "Ava"})));

        assert_eq!(profile.gender.as_deref(), Some("women"));
        assert_eq!(profile.name.as_deref(), Some("Ava"));
        assert_eq!(
            serde_json::to_value(&profile).unwrap(),
            json!({"gender": "women", "name": "Ava"})
        );
    }

    #[test]
    fn merge_ignores_nulls_and_blank_values() {
        let mut profile = UserProfile::from(json!({"name": "Ava", "skin_tone": "wheatish"}));
        profile.merge(&UserProfile::from(json!({"name": null, "skin_tone": "", "gender": "women"})));

        assert_eq!(profile.name.as_deref(), Some("Ava"));
        assert_eq!(profile.skin_tone.as_deref(), Some("wheatish"));
        assert_eq!(profile.gender.as_deref(), Some("women"));
    }

    #[test]
    fn portrait_analysis_aliases_are_normalized() {
        let profile = UserProfile::from_response(json!({
            "data": {
                "gender": "men",
                "age_range": "25-34",
                "best_palettes": ["earth tones", "jewel tones"],
                "style_vibes": "minimal",
                "fit_notes": ["slim through the shoulder"]
            },
            "response_id": "resp_1"
        }));

        assert_eq!(profile.age_group.as_deref(), Some("25-34"));
        assert_eq!(profile.palettes, vec!["earth tones", "jewel tones"]);
        assert_eq!(profile.vibes, vec!["minimal"]);
        assert!(profile.extra.contains_key("fit_notes"));
        assert!(!profile.extra.contains_key("response_id"));
    }

    #[test]
    fn update_omits_unset_fields() {
        let update = ProfileUpdate::new().with_user_id("u1").with_gender("women");
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"userId": "u1", "gender": "women"})
        );
    }

    #[test]
    fn unwrapped_profile_response_is_read_directly() {
        let profile = UserProfile::from_response(json!({"name": "Ava"}));
        assert_eq!(profile.name.as_deref(), Some("Ava"));
    }
}
