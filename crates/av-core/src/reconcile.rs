//! Part id reconciliation
//!
//! Maps loosely spelled ids (e.g. from an inference service) onto canonical
//! part names. Matching policy, in order:
//! 1. normalize both sides (lowercase, keep only alphanumerics)
//! 2. exact match of the normalized forms
//! 3. containment in either direction; the longest canonical id wins, ties
//!    go to the earlier canonical id
//!
//! Ids that normalize to an empty string never match.

/// Lowercase and strip whitespace, punctuation and separators
pub fn normalize_part_id(id: &str) -> String {
    id.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Find the canonical id matching `proposed`
pub fn reconcile_id<'a, S: AsRef<str>>(proposed: &str, canonical: &'a [S]) -> Option<&'a str> {
    let needle = normalize_part_id(proposed);
    if needle.is_empty() {
        return None;
    }

    let normalized: Vec<(&'a str, String)> = canonical
        .iter()
        .map(|c| (c.as_ref(), normalize_part_id(c.as_ref())))
        .filter(|(_, n)| !n.is_empty())
        .collect();

    if let Some((id, _)) = normalized.iter().find(|(_, n)| *n == needle) {
        return Some(*id);
    }

    let mut best: Option<(&'a str, usize)> = None;
    for (id, n) in &normalized {
        if (n.contains(&needle) || needle.contains(n.as_str()))
            && best.is_none_or(|(_, len)| n.len() > len)
        {
            best = Some((*id, n.len()));
        }
    }
    best.map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: &[&str] = &["Connecting Rod", "Connecting Rod Cap", "Piston", "Piston Pin", "NUT"];

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_part_id("  Connecting-Rod_Cap! "), "connectingrodcap");
        assert_eq!(normalize_part_id("--"), "");
    }

    #[test]
    fn test_exact_match_wins_over_containment() {
        assert_eq!(reconcile_id("connecting_rod", CANONICAL), Some("Connecting Rod"));
        assert_eq!(reconcile_id("PISTON", CANONICAL), Some("Piston"));
    }

    #[test]
    fn test_containment_prefers_longest() {
        assert_eq!(reconcile_id("rod cap", CANONICAL), Some("Connecting Rod Cap"));
        assert_eq!(reconcile_id("upper piston pin assembly", CANONICAL), Some("Piston Pin"));
    }

    #[test]
    fn test_no_match() {
        assert_eq!(reconcile_id("propeller", CANONICAL), None);
        assert_eq!(reconcile_id("", CANONICAL), None);
        assert_eq!(reconcile_id("???", CANONICAL), None);
    }

    #[test]
    fn test_owned_canonical_ids() {
        let owned = vec!["BASE".to_string(), "ROD".to_string()];
        assert_eq!(reconcile_id("base_plate", &owned), Some("BASE"));
    }
}
