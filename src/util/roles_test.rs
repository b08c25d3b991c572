use super::*;

fn roles(list: &[&str]) -> Vec<String> {
    list.iter().map(|r| (*r).to_owned()).collect()
}

// =============================================================
// Section membership
// =============================================================

#[test]
fn admin_group_contains_both_admin_spellings() {
    assert!(Section::Admin.contains_role("admin"));
    assert!(Section::Admin.contains_role("administrator"));
    assert!(!Section::Admin.contains_role("client"));
}

#[test]
fn membership_ignores_case_and_whitespace() {
    assert!(Section::Client.contains_role("  Customer "));
    assert_eq!(Section::of_role("ADMIN"), Some(Section::Admin));
}

#[test]
fn unknown_roles_belong_to_no_section() {
    assert_eq!(Section::of_role("captain"), None);
    assert_eq!(Section::of_role(""), None);
}

#[test]
fn every_vocabulary_role_maps_to_exactly_one_section() {
    for role in ADMIN_ROLES {
        assert_eq!(Section::of_role(role), Some(Section::Admin));
    }
    for role in CLIENT_ROLES {
        assert_eq!(Section::of_role(role), Some(Section::Client));
    }
}

// =============================================================
// Group equivalence and allow-lists
// =============================================================

#[test]
fn roles_equivalent_uses_group_semantics() {
    assert!(roles_equivalent("admin", "administrator"));
    assert!(roles_equivalent("user", "customer"));
    assert!(!roles_equivalent("admin", "client"));
    assert!(roles_equivalent("captain", "Captain"));
    assert!(!roles_equivalent("", ""));
}

#[test]
fn empty_allow_list_falls_back_to_section_group() {
    assert!(has_required_role("customer", &[], Section::Client));
    assert!(!has_required_role("customer", &[], Section::Admin));
}

#[test]
fn allow_list_matches_through_groups() {
    let allowed = roles(&["admin"]);
    assert!(has_required_role("administrator", &allowed, Section::Admin));
    assert!(!has_required_role("client", &allowed, Section::Admin));
}

#[test]
fn role_admits_requires_matching_section_even_with_allow_list() {
    let allowed = roles(&["client", "admin"]);
    assert!(role_admits("client", &allowed, Section::Client));
    assert!(!role_admits("client", &allowed, Section::Admin));
}

#[test]
fn section_denies_other_group_exhaustively() {
    for role in CLIENT_ROLES {
        assert!(!role_admits(role, &[], Section::Admin), "{role} admitted to admin");
    }
    for role in ADMIN_ROLES {
        assert!(!role_admits(role, &[], Section::Client), "{role} admitted to client");
    }
}

#[test]
fn section_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&Section::Admin).unwrap(), "\"admin\"");
    assert_eq!(Section::Client.to_string(), "client");
}
