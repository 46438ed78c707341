use std::collections::BTreeMap;

/// Labels and annotations share this shape.
pub type Map = BTreeMap<String, String>;

/// Returns true if every entry of `desired` appears in `live` with the same
/// value.
///
/// Entries present only in `live` are not considered. An empty `desired`
/// map is contained in anything, including a missing map.
pub fn contains_all(live: Option<&Map>, desired: &Map) -> bool {
    for (k, v) in desired.iter() {
        if live.and_then(|live| live.get(k)) != Some(v) {
            return false;
        }
    }

    true
}

/// Returns a copy of `map` with `key` set to `value`.
pub fn with_entry(map: &Map, key: &str, value: impl ToString) -> Map {
    let mut map = map.clone();
    map.insert(key.to_string(), value.to_string());
    map
}
