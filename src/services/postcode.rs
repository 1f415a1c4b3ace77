/// Postcode service-area groups. All bookings on one date must resolve to the
/// same group so the crew works a single area per day.
///
/// A postcode matches a group when its first four characters equal one of the
/// group's prefixes, or when its first three characters equal the shared RH6
/// prefix (which belongs to every group's patch and resolves to the first).
const GROUPS: &[(&str, &[&str])] = &[
    ("Crawley", &["RH10", "RH11"]),
    ("Horsham", &["RH12", "RH13"]),
];

const SHARED_PREFIX: &str = "RH6";

pub fn resolve_group(postcode: &str) -> Option<&'static str> {
    let normalized = postcode.trim().to_uppercase();
    let long_prefix: String = normalized.chars().take(4).collect();
    let short_prefix: String = normalized.chars().take(3).collect();

    GROUPS
        .iter()
        .find(|(_, prefixes)| {
            prefixes.contains(&long_prefix.as_str()) || short_prefix == SHARED_PREFIX
        })
        .map(|(name, _)| *name)
}
