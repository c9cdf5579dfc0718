use std::collections::HashSet;

/// an id derived from `base`, suffixed with `-2`, `-3`... until it is not taken.
pub fn unique_id(base: &str, taken: &HashSet<String>) -> String {
    let base = match base.trim() {
        "" => "gtfs",
        trimmed => trimmed,
    };
    if !taken.contains(base) {
        return base.to_string();
    }
    (2..)
        .map(|suffix| format!("{base}-{suffix}"))
        .find(|id| !taken.contains(id))
        .unwrap_or_else(|| format!("{base}-{}", uuid::Uuid::new_v4()))
}
