use findpass::constraint::{kind_at, Rendering, CATALOG};
use findpass::{
    Constraint, ConstraintId, ConstraintKind, ConstraintSet, ConstraintValue, FindpassError, ToolFlags,
};

#[test]
fn test_catalog_layout() {
    assert_eq!(CATALOG.len(), 19);
    assert_eq!(kind_at(1), ConstraintKind::Separator);
    assert_eq!(kind_at(CATALOG.len()), ConstraintKind::Terminator);

    for id in ConstraintId::ALL {
        let kind = id.kind();
        assert_ne!(kind, ConstraintKind::Separator, "{id:?}");
        assert_eq!(kind_at(id.index()), kind);
    }

    assert!(ConstraintId::ShowHidden.template().is_hidden_toggle());
    assert!(ConstraintId::IncludeOtherFilesystems.template().is_mount_exclusion());
    assert_eq!(ConstraintId::SizeAtLeast.template().unit, Some("kilobytes"));
    assert_eq!(ConstraintId::ModifiedLessThan.label(), "Date modified less than");
}

#[test]
fn test_new_rejects_mismatched_value() {
    let err = Constraint::new(ConstraintId::SizeAtLeast, Some(ConstraintValue::Text("big".into())))
        .unwrap_err();
    assert!(matches!(err, FindpassError::InvalidConstraintValue { constraint: "Size at least", .. }));

    assert!(Constraint::new(ConstraintId::FileIsEmpty, Some(ConstraintValue::Count(1))).is_err());
    assert!(Constraint::new(ConstraintId::FileIsEmpty, None).is_ok());
    assert!(Constraint::new(ConstraintId::ModifiedMoreThan, Some(ConstraintValue::Days(3))).is_ok());
}

#[test]
fn test_parse_reads_leading_integer() {
    let c = Constraint::parse(ConstraintId::SizeAtMost, "  42kb");
    assert_eq!(c.value(), Some(&ConstraintValue::Count(42)));

    let c = Constraint::parse(ConstraintId::ModifiedLessThan, "-5");
    assert_eq!(c.value(), Some(&ConstraintValue::Days(0)));

    let c = Constraint::parse(ConstraintId::SizeAtMost, "lots");
    assert_eq!(c.value(), Some(&ConstraintValue::Count(0)));

    let c = Constraint::parse(ConstraintId::OwnedByGroup, "staff");
    assert_eq!(c.text(), Some("staff"));
}

#[test]
fn test_render_fragments() {
    let flags = ToolFlags::CASE_SENSITIVE;

    assert_eq!(
        Constraint::parse(ConstraintId::SizeAtMost, "2").render(&flags),
        Rendering::Fragment("\\( -size 2048c -o -size -2048c \\)".into())
    );
    assert_eq!(
        Constraint::parse(ConstraintId::ModifiedLessThan, "7").render(&flags),
        Rendering::Fragment("-mtime -7".into())
    );
    assert_eq!(
        Constraint::flag(ConstraintId::OwnerUnrecognized).render(&flags),
        Rendering::Fragment("\\( -nouser -o -nogroup \\)".into())
    );
    assert_eq!(
        Constraint::parse(ConstraintId::OwnedByUser, "o'brien").render(&flags),
        Rendering::Fragment("-user 'o'\\''brien'".into())
    );
    assert_eq!(Constraint::parse(ConstraintId::OwnedByUser, "").render(&flags), Rendering::Skip);
    assert_eq!(Constraint::flag(ConstraintId::ShowHidden).render(&flags), Rendering::ShowHidden);
    assert_eq!(
        Constraint::flag(ConstraintId::IncludeOtherFilesystems).render(&flags),
        Rendering::IncludeOtherFilesystems
    );
}

#[test]
fn test_render_uses_case_insensitive_variants() {
    let flags = ToolFlags { find_iname: true, grep_ignore_case: true, locate_ignore_case: false };

    assert_eq!(
        Constraint::parse(ConstraintId::NameExcludes, "tmp").render(&flags),
        Rendering::Fragment("'!' -iname '*tmp*'".into())
    );
    assert_eq!(
        Constraint::parse(ConstraintId::ContainsText, "todo").render(&flags),
        Rendering::Fragment("'!' -type p -exec grep -i -c 'todo' {} \\;".into())
    );
}

#[test]
fn test_huge_size_saturates() {
    let c = Constraint::new(ConstraintId::SizeAtLeast, Some(ConstraintValue::Count(u64::MAX))).unwrap();
    let Rendering::Fragment(fragment) = c.render(&ToolFlags::CASE_SENSITIVE) else {
        panic!("expected a fragment");
    };
    assert!(fragment.contains(&u64::MAX.to_string()));
}

// ---------------------------------------------------------------------------
// ConstraintSet
// ---------------------------------------------------------------------------

#[test]
fn test_set_keeps_one_entry_per_template() {
    let mut set = ConstraintSet::new();
    set.add(Constraint::parse(ConstraintId::ContainsText, "a"));
    set.add(Constraint::parse(ConstraintId::SizeAtLeast, "1"));
    set.add(Constraint::parse(ConstraintId::ContainsText, "b"));

    assert_eq!(set.len(), 2);
    let first = set.iter().next().unwrap();
    assert_eq!(first.id(), ConstraintId::ContainsText);
    assert_eq!(first.text(), Some("b"));
}

#[test]
fn test_next_available_and_remove() {
    let mut set: ConstraintSet = [Constraint::parse(ConstraintId::ContainsText, "x")].into_iter().collect();
    assert_eq!(set.next_available(), Some(ConstraintId::ModifiedLessThan));
    assert!(set.is_selected(ConstraintId::ContainsText));

    assert!(set.remove(ConstraintId::ContainsText).is_some());
    assert!(set.remove(ConstraintId::ContainsText).is_none());
    assert!(set.is_empty());
    assert_eq!(set.next_available(), Some(ConstraintId::ContainsText));

    for id in ConstraintId::ALL {
        set.add(Constraint::parse(id, "1"));
    }
    assert_eq!(set.next_available(), None);
}

#[test]
fn test_blank_text_does_not_count_as_constraint() {
    let set: ConstraintSet = [Constraint::parse(ConstraintId::NameExcludes, "  ")].into_iter().collect();
    assert!(!set.is_empty());
    assert!(!set.has_additional_constraints());
}
