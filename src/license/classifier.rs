/// Keywords identifying copyleft license families, upper-cased for matching.
const COPYLEFT_KEYWORDS: &[&str] = &[
    "GPL",
    "GNU GENERAL PUBLIC LICENSE",
    "LGPL",
    "GNU LESSER GENERAL PUBLIC LICENSE",
    "AGPL",
    "GNU AFFERO GENERAL PUBLIC LICENSE",
    "MPL",
    "MOZILLA PUBLIC LICENSE",
    "CC-BY-SA",
    "CREATIVE COMMONS ATTRIBUTION-SHAREALIKE",
    "EPL",
    "ECLIPSE PUBLIC LICENSE",
    "OFL",
    "OPEN FONT LICENSE",
    "CPL",
    "COMMON PUBLIC LICENSE",
    "OSL",
    "OPEN SOFTWARE LICENSE",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseClass {
    Copyleft,
    Other,
}

/// Classify a free-text license string.
///
/// Case-insensitive substring match against the copyleft keyword set.
/// Anything that matches nothing, including the `"Unknown"` sentinel and
/// the empty string, is [`LicenseClass::Other`].
pub fn classify(license: &str) -> LicenseClass {
    let upper = license.to_uppercase();
    if COPYLEFT_KEYWORDS.iter().any(|kw| upper.contains(kw)) {
        LicenseClass::Copyleft
    } else {
        LicenseClass::Other
    }
}
