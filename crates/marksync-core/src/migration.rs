//! Legacy bookmark id migration
//!
//! Older releases stored composite ids of the form
//! `<entityId>_<hash>_<index>`. These are rewritten to the bare entity id.
//! Ids whose entity component is `unknown`, or that have fewer than three
//! parts, are left untouched.

use std::borrow::Cow;

/// Composite ids are always longer than this
const LEGACY_MIN_LEN: usize = 20;

/// Entity component written when the entity could not be resolved
const UNKNOWN_ENTITY: &str = "unknown";

/// Migrate a single id to its canonical form
pub fn migrate_id(id: &str) -> Cow<'_, str> {
    if !id.contains('_') || id.chars().count() <= LEGACY_MIN_LEN {
        return Cow::Borrowed(id);
    }

    let parts: Vec<&str> = id.split('_').collect();
    if parts.len() >= 3 && parts[0] != UNKNOWN_ENTITY {
        Cow::Owned(parts[0].to_string())
    } else {
        Cow::Borrowed(id)
    }
}

/// Migrate a batch of ids, preserving order and duplicates
pub fn migrate(ids: &[String]) -> Vec<String> {
    ids.iter().map(|id| migrate_id(id).into_owned()).collect()
}

/// Check whether any id in the batch would be rewritten
pub fn needs_migration(ids: &[String]) -> bool {
    ids.iter().any(|id| matches!(migrate_id(id), Cow::Owned(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_composite_id_is_reduced_to_entity() {
        assert_eq!(migrate_id("place42_9f8e7d6c5b4a_0"), "place42");
    }

    #[test]
    fn test_short_ids_are_untouched() {
        // 20 characters exactly is not long enough
        assert_eq!(migrate_id("abc_defghijklmnop_12"), "abc_defghijklmnop_12");
        assert_eq!(migrate_id("a_b_c"), "a_b_c");
    }

    #[test]
    fn test_unknown_sentinel_is_preserved() {
        let id = "unknown_abcdef0123456789_3";
        assert_eq!(migrate_id(id), id);
    }

    #[test]
    fn test_two_part_ids_are_preserved() {
        let id = "entity_abcdef0123456789abcdef";
        assert_eq!(migrate_id(id), id);
    }

    #[test]
    fn test_ids_without_underscore_are_preserved() {
        let id = "abcdefghijklmnopqrstuvwxyz";
        assert_eq!(migrate_id(id), id);
    }

    #[test]
    fn test_order_and_duplicates_kept() {
        let input = strings(&[
            "b_0123456789abcdef_0",
            "zzzzzzzz_0123456789abcdef_1",
            "zzzzzzzz_0123456789abcdef_2",
            "a",
        ]);
        assert_eq!(
            migrate(&input),
            strings(&["b_0123456789abcdef_0", "zzzzzzzz", "zzzzzzzz", "a"])
        );
    }

    #[test]
    fn test_mixed_batch() {
        let input = strings(&[
            "unknown_abc123_0",
            "org_42_xyz_1_0000000000",
            "canonicalId",
        ]);
        assert_eq!(
            migrate(&input),
            strings(&["unknown_abc123_0", "org", "canonicalId"])
        );
    }

    #[test]
    fn test_short_composite_ids_are_left_alone() {
        // "org_42_xyz_1" has 12 characters, below the length threshold
        let input = strings(&["unknown_abc123_0", "org_42_xyz_1", "canonicalId"]);
        assert_eq!(migrate(&input), input);
        assert!(!needs_migration(&input));
    }

    #[test]
    fn test_migration_is_idempotent() {
        let input = strings(&[
            "unknown_abc123_0",
            "unknown_0123456789abcdef_7",
            "venue77_0123456789abcdef_4",
            "short_id",
            "entity_abcdef0123456789abcdef",
            "canonicalId",
            "",
        ]);
        let once = migrate(&input);
        let twice = migrate(&once);
        assert_eq!(once, twice);
        assert!(!needs_migration(&once));
    }

    #[test]
    fn test_needs_migration() {
        assert!(!needs_migration(&strings(&["a", "b"])));
        assert!(needs_migration(&strings(&["a", "venue77_0123456789abcdef_4"])));
    }
}
