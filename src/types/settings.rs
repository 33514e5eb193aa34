use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A sharing-policy field at the project or file tier.
///
/// `Inherit` means "not configured here, ask the next broader tier".
/// `Set` pins the field at this tier, including `Set(None)` for fields
/// whose value is itself optional ("explicitly no cap" is distinct from
/// "not configured").
///
/// In JSON a missing field is `Inherit`; any present value, `null`
/// included, is `Set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inheritable<T> {
    Inherit,
    Set(T),
}

impl<T> Inheritable<T> {
    #[must_use]
    pub fn is_inherit(&self) -> bool {
        matches!(self, Inheritable::Inherit)
    }
}

impl<T> Default for Inheritable<T> {
    fn default() -> Self {
        Inheritable::Inherit
    }
}

impl<T: Serialize> Serialize for Inheritable<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Inheritable::Set(value) => value.serialize(serializer),
            Inheritable::Inherit => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Inheritable<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Inheritable::Set)
    }
}

/// Which settings table row an override set is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsScope {
    Project,
    File,
}

impl SettingsScope {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SettingsScope::Project => "project",
            SettingsScope::File => "file",
        }
    }
}

/// Per-project or per-file sharing overrides. Every field is independently
/// optional; unset fields fall through to the next broader tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareOverrides {
    #[serde(default, skip_serializing_if = "Inheritable::is_inherit")]
    pub enabled: Inheritable<bool>,
    #[serde(default, skip_serializing_if = "Inheritable::is_inherit")]
    pub password_required: Inheritable<bool>,
    /// Days until new uploads expire. `Set(None)` means links never expire.
    #[serde(default, skip_serializing_if = "Inheritable::is_inherit")]
    pub expiry_days: Inheritable<Option<u32>>,
    /// `Set(None)` means downloads are uncapped.
    #[serde(default, skip_serializing_if = "Inheritable::is_inherit")]
    pub download_limit_per_ip: Inheritable<Option<u32>>,
    #[serde(default, skip_serializing_if = "Inheritable::is_inherit")]
    pub download_limit_window_minutes: Inheritable<u32>,
}

/// The fully-resolved sharing policy: the global tier as stored, and the
/// effective policy for one file after applying the inheritance chain.
/// Every field is concrete; this is the resolution floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharePolicy {
    pub enabled: bool,
    pub password_required: bool,
    pub expiry_days: Option<u32>,
    pub download_limit_per_ip: Option<u32>,
    pub download_limit_window_minutes: u32,
}

impl Default for SharePolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            password_required: false,
            expiry_days: None,
            download_limit_per_ip: None,
            download_limit_window_minutes: 60,
        }
    }
}

impl SharePolicy {
    /// Resolves the effective policy for one file. Each field is evaluated
    /// independently: file tier first, then project, with the global value
    /// as the floor. Resolution always terminates here.
    #[must_use]
    pub fn resolve(
        &self,
        project: Option<&ShareOverrides>,
        file: Option<&ShareOverrides>,
    ) -> SharePolicy {
        let unset = ShareOverrides::default();
        let file = file.unwrap_or(&unset);
        let project = project.unwrap_or(&unset);

        SharePolicy {
            enabled: pick(self.enabled, [&file.enabled, &project.enabled]),
            password_required: pick(
                self.password_required,
                [&file.password_required, &project.password_required],
            ),
            expiry_days: pick(self.expiry_days, [&file.expiry_days, &project.expiry_days]),
            download_limit_per_ip: pick(
                self.download_limit_per_ip,
                [&file.download_limit_per_ip, &project.download_limit_per_ip],
            ),
            download_limit_window_minutes: pick(
                self.download_limit_window_minutes,
                [
                    &file.download_limit_window_minutes,
                    &project.download_limit_window_minutes,
                ],
            ),
        }
    }
}

/// Narrowest tier first; the first explicitly set value wins.
fn pick<T: Copy>(floor: T, tiers: [&Inheritable<T>; 2]) -> T {
    for tier in tiers {
        if let Inheritable::Set(value) = tier {
            return *value;
        }
    }
    floor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_all_inherit_yields_global() {
        let global = SharePolicy::default();
        let effective = global.resolve(None, None);
        assert_eq!(effective, global);
    }

    #[test]
    fn test_resolve_project_override_applies() {
        let global = SharePolicy::default();
        let project = ShareOverrides {
            password_required: Inheritable::Set(true),
            ..ShareOverrides::default()
        };

        let effective = global.resolve(Some(&project), Some(&ShareOverrides::default()));

        assert!(effective.enabled);
        assert!(effective.password_required);
        assert_eq!(effective.expiry_days, None);
        assert_eq!(effective.download_limit_per_ip, None);
    }

    #[test]
    fn test_resolve_file_tier_beats_project_tier() {
        let global = SharePolicy::default();
        let project = ShareOverrides {
            enabled: Inheritable::Set(false),
            download_limit_per_ip: Inheritable::Set(Some(3)),
            ..ShareOverrides::default()
        };
        let file = ShareOverrides {
            enabled: Inheritable::Set(true),
            ..ShareOverrides::default()
        };

        let effective = global.resolve(Some(&project), Some(&file));

        // enabled comes from the file tier, the limit from the project tier
        assert!(effective.enabled);
        assert_eq!(effective.download_limit_per_ip, Some(3));
    }

    #[test]
    fn test_resolve_fields_are_independent() {
        let global = SharePolicy {
            expiry_days: Some(30),
            ..SharePolicy::default()
        };
        let file = ShareOverrides {
            password_required: Inheritable::Set(true),
            ..ShareOverrides::default()
        };

        let effective = global.resolve(None, Some(&file));

        // expiry_days inherited from global while password_required is
        // overridden at the file tier
        assert_eq!(effective.expiry_days, Some(30));
        assert!(effective.password_required);
    }

    #[test]
    fn test_resolve_set_none_is_not_inherit() {
        let global = SharePolicy {
            download_limit_per_ip: Some(10),
            ..SharePolicy::default()
        };
        let file = ShareOverrides {
            download_limit_per_ip: Inheritable::Set(None),
            ..ShareOverrides::default()
        };

        let effective = global.resolve(None, Some(&file));

        // explicitly uncapped at the file tier, despite the global cap
        assert_eq!(effective.download_limit_per_ip, None);
    }

    #[test]
    fn test_overrides_json_missing_field_is_inherit() {
        let overrides: ShareOverrides = serde_json::from_str("{}").unwrap();
        assert_eq!(overrides, ShareOverrides::default());
    }

    #[test]
    fn test_overrides_json_null_is_set_none() {
        let overrides: ShareOverrides =
            serde_json::from_str(r#"{"expiry_days": null}"#).unwrap();
        assert_eq!(overrides.expiry_days, Inheritable::Set(None));
        assert!(overrides.download_limit_per_ip.is_inherit());
    }

    #[test]
    fn test_overrides_json_round_trip() {
        let overrides = ShareOverrides {
            enabled: Inheritable::Set(false),
            expiry_days: Inheritable::Set(Some(7)),
            download_limit_per_ip: Inheritable::Set(None),
            ..ShareOverrides::default()
        };

        let json = serde_json::to_string(&overrides).unwrap();
        let parsed: ShareOverrides = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, overrides);
        // inherited fields must not appear in the stored document
        assert!(!json.contains("password_required"));
        assert!(!json.contains("window_minutes"));
    }
}
