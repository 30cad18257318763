//! The static model table and magic/product-ID lookups.

use serde::Serialize;

use crate::features::Features;
use crate::os::OsVersion;

/// One calculator hardware/firmware identity.
///
/// Models are ordered by `order`, which ranks the line from the TI-82 up.
/// Instances live in the static [`MODELS`] table and are shared by
/// reference; they are never constructed elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Model {
    /// Display name, e.g. `TI-84+CE`.
    pub name: &'static str,
    /// Capability flags.
    pub features: Features,
    /// 8-character file magic written into var headers.
    pub magic: &'static str,
    /// Product ID byte; `0x00` means no product constraint.
    pub product_id: u8,
    /// UI language code.
    pub lang: &'static str,
    /// Ranking order within the model line.
    pub order: u16,
}

impl Model {
    /// Resolve a version label to an [`OsVersion`] on this model's rank.
    ///
    /// `"latest"` (or an unparsable label) maps to the newest OS for the
    /// rank; `"major.minor"` labels map to that specific version.
    #[must_use]
    pub fn os(&self, version: &str) -> OsVersion {
        if version == "latest" {
            return OsVersion::latest(self.order);
        }

        let mut parts = version.splitn(2, '.');
        let major = parts.next().and_then(|p| p.parse().ok());
        let minor = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);

        match major {
            Some(major) => OsVersion::new(self.order, major, minor),
            None => OsVersion::latest(self.order),
        }
    }

    /// Whether this model has a flash chip.
    #[must_use]
    pub fn has_flash(&self) -> bool {
        self.features.has_flash()
    }
}

impl PartialOrd for Model {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Model {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.order.cmp(&other.order)
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

const FLAGS_82: Features = Features::DEFAULT;
const FLAGS_83: Features = FLAGS_82.with(Features::COMPLEX);
const FLAGS_82A: Features = FLAGS_83.with(Features::FLASH);
const FLAGS_83P: Features = FLAGS_82A.with(Features::APPS);
const FLAGS_84P: Features = FLAGS_83P.with(Features::CLOCK);
const FLAGS_84PCSE: Features = FLAGS_84P.with(Features::COLOR);
const FLAGS_84PCE: Features = FLAGS_84PCSE.with(Features::EZ80);
const FLAGS_83PCE: Features = FLAGS_84PCE.with(Features::EXACT_MATH);
const FLAGS_83PCEEP: Features = FLAGS_83PCE.with(Features::PYTHON);
const FLAGS_84PCEPY: Features = FLAGS_84PCE.with(Features::PYTHON);
const FLAGS_82AEP: Features = FLAGS_83PCEEP.without(Features::APPS);

const fn model(
    name: &'static str,
    features: Features,
    magic: &'static str,
    product_id: u8,
    lang: &'static str,
    order: u16,
) -> Model {
    Model {
        name,
        features,
        magic,
        product_id,
        lang,
        order,
    }
}

/// Every known model, in ranking order.
pub static MODELS: &[Model] = &[
    model("TI-82", FLAGS_82, "**TI82**", 0x00, "en", 0),
    model("TI-83", FLAGS_83, "**TI83**", 0x00, "en", 1),
    model("TI-82ST", FLAGS_83, "**TI83**", 0x00, "en", 2),
    model("TI-82ST.fr", FLAGS_83, "**TI83**", 0x00, "fr", 3),
    model("TI-76.fr", FLAGS_83, "**TI83**", 0x00, "fr", 4),
    model("TI-83+", FLAGS_83P, "**TI83F*", 0x04, "en", 5),
    model("TI-83+SE", FLAGS_83P, "**TI83F*", 0x04, "en", 6),
    model("TI-83+.fr", FLAGS_83P, "**TI83F*", 0x04, "fr", 7),
    model("TI-82+", FLAGS_83P, "**TI83F*", 0x04, "fr", 8),
    model("TI-84+", FLAGS_84P, "**TI83F*", 0x0A, "en", 9),
    model("TI-84+SE", FLAGS_84P, "**TI83F*", 0x0A, "en", 10),
    model("TI-83+.fr:USB", FLAGS_84P, "**TI83F*", 0x0A, "fr", 11),
    model("TI-84P.fr", FLAGS_84P, "**TI83F*", 0x0A, "fr", 12),
    model("TI-84+PSE", FLAGS_84P, "**TI83F*", 0x0A, "en", 13),
    model("TI-82A", FLAGS_82A, "**TI83F*", 0x0B, "fr", 14),
    model("TI-84+T", FLAGS_84P, "**TI83F*", 0x1B, "en", 15),
    model("TI-84+CSE", FLAGS_84PCSE, "**TI83F*", 0x0F, "en", 16),
    model("TI-84+CE", FLAGS_84PCE, "**TI83F*", 0x13, "en", 17),
    model("TI-84+CET", FLAGS_84PCE, "**TI83F*", 0x13, "en", 18),
    model("TI-83PCE", FLAGS_83PCE, "**TI83F*", 0x13, "fr", 19),
    model("TI-83PCEEP", FLAGS_83PCEEP, "**TI83F*", 0x13, "fr", 20),
    model("TI-84+CEPY", FLAGS_84PCEPY, "**TI83F*", 0x13, "en", 21),
    model("TI-84+CETPE", FLAGS_84PCEPY, "**TI83F*", 0x13, "en", 22),
    model("TI-82AEP", FLAGS_82AEP, "**TI83F*", 0x00, "fr", 23),
];

/// Look a model up by display name.
pub fn by_name(name: &str) -> Option<&'static Model> {
    MODELS.iter().find(|m| m.name == name)
}

/// Models whose file magic equals `magic`.
pub fn lookup_magic(magic: &str) -> Vec<&'static Model> {
    MODELS.iter().filter(|m| m.magic == magic).collect()
}

/// Models that can load a file with the given magic.
///
/// The support set is every model ranked at or above the lowest-ranked
/// model sharing the magic. Empty if the magic is unknown.
pub fn supports_magic(magic: &str) -> Vec<&'static Model> {
    let Some(lowest) = lookup_magic(magic).into_iter().map(|m| m.order).min() else {
        return Vec::new();
    };

    MODELS.iter().filter(|m| m.order >= lowest).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_magic() {
        assert_eq!(lookup_magic("**TI82**").len(), 1);
        assert_eq!(lookup_magic("**TI83**").len(), 4);
        assert!(lookup_magic("********").is_empty());
    }

    #[test]
    fn support_set_extends_upward() {
        // Everything from the TI-83 up can load a TI-83 var.
        let supports = supports_magic("**TI83**");
        assert_eq!(supports.len(), MODELS.len() - 1);
        assert!(supports.iter().all(|m| m.name != "TI-82"));

        // The TI-82 magic is supported by the whole line.
        assert_eq!(supports_magic("**TI82**").len(), MODELS.len());
    }

    #[test]
    fn os_labels() {
        let ce = MODELS.iter().find(|m| m.name == "TI-84+CE").unwrap();
        assert!(ce.os("5.3") < ce.os("latest"));
        assert!(OsVersion::INITIAL < ce.os("5.3"));
        assert_eq!(ce.os("bogus"), ce.os("latest"));
    }

    #[test]
    fn model_ordering_follows_rank() {
        let ti82 = &MODELS[0];
        let ce = MODELS.iter().find(|m| m.name == "TI-84+CE").unwrap();
        assert!(ti82 < ce);
    }
}
