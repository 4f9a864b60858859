use serde::{Deserialize, Serialize};

pub const DEFAULT_CODE: &str = "+39";

/// One entry of `phone-codes.json`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct PhoneCode {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub iso2: String,
}

impl PhoneCode {
    /// Option label, e.g. `+39 (IT)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.code, self.iso2.to_uppercase())
    }
}

/// Sort by country name ignoring case, then move Italy to the front.
/// Entries without a code or ISO code are dropped.
pub fn sort_codes(mut codes: Vec<PhoneCode>) -> Vec<PhoneCode> {
    codes.retain(|c| !c.code.is_empty() && !c.iso2.is_empty());
    codes.sort_by_cached_key(|c| c.name.to_lowercase());
    if let Some(idx) = codes.iter().position(|c| c.iso2.eq_ignore_ascii_case("IT")) {
        let italy = codes.remove(idx);
        codes.insert(0, italy);
    }
    codes
}

/// The submitted phone: code and number joined by a space, blanks skipped.
pub fn compose_phone(code: &str, number: &str) -> String {
    [code.trim(), number.trim()]
        .iter()
        .filter(|s| !s.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(" ")
}
