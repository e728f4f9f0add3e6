/// Vendor prefixes, armature markers and separators stripped from bone names.
/// Order matters: at each position the alternatives are tried left to right.
const RIG_TOKENS: [&str; 6] = ["mixamo", "mixamorig", "armature", "_", ":", "."];

/// Canonical form of a bone name used for fuzzy comparison.
///
/// Strips every occurrence of the rig tokens (case-insensitive) in a single
/// left-to-right pass and lower-cases the rest. Total and side-effect free;
/// distinct raw names may collapse to the same canonical string.
pub fn normalize(name: &str) -> String {
    let lower = name.to_lowercase();
    let mut out = String::with_capacity(lower.len());
    let mut rest = lower.as_str();

    'scan: while let Some(ch) = rest.chars().next() {
        for token in RIG_TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                rest = tail;
                continue 'scan;
            }
        }
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_strips_vendor_prefix_and_separators() {
        assert_eq!(normalize("mixamorig:Hips"), "righips");
        assert_eq!(normalize("mixamorig:LeftForeArm"), "rigleftforearm");
        assert_eq!(normalize("Armature_Spine.001"), "spine001");
        assert_eq!(normalize("Hips"), "hips");
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(normalize("Hips"), normalize("hips"));
        assert_eq!(normalize("MIXAMO:HEAD"), normalize("mixamo:head"));
    }

    #[test]
    fn test_empty_and_token_only_names() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("_:."), "");
        assert_eq!(normalize("Armature"), "");
    }

    #[test]
    fn test_deterministic_on_random_names() {
        let alphabet: Vec<char> = "abcXYZ_:.mixamorigArmature".chars().collect();
        let mut rng = rand::rng();

        for _ in 0..200 {
            let len = rng.random_range(0..24);
            let name: String = (0..len)
                .map(|_| alphabet[rng.random_range(0..alphabet.len())])
                .collect();

            let canonical = normalize(&name);
            assert_eq!(canonical, normalize(&name));
            assert_eq!(canonical, normalize(&name.to_uppercase()));
            assert!(!canonical.contains(['_', ':', '.']), "{:?} -> {:?}", name, canonical);
        }
    }
}
