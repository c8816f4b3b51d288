use std::collections::HashMap;

/// Canonical address -> localized address, for one target language.
pub type AddressLookup = HashMap<String, String>;

/// What the reconciler needs from a content entity to localize links pointing at it.
pub trait Localizable {
    fn canonical_address(&self) -> Option<&str>;

    /// Localized address for `language`, if the entity has one.
    fn localized_address(&self, language: &str) -> Option<String>;
}

pub fn build_address_lookup<'a, T, I>(items: I, language: &str) -> AddressLookup
where
    T: Localizable + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut lookup = AddressLookup::new();
    for item in items {
        let Some(canonical) = item.canonical_address().filter(|c| !c.is_empty()) else {
            continue;
        };
        let localized = item
            .localized_address(language)
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| canonical.to_string());
        lookup.insert(canonical.to_string(), localized);
    }
    lookup
}
