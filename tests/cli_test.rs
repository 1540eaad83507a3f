use clap::Parser;

use findpass::cli::{clone_args, describe, CliArgs};
use findpass::{ConstraintId, ConstraintValue, SortKey};

fn parse(args: &[&str]) -> CliArgs {
    CliArgs::try_parse_from(std::iter::once("findpass").chain(args.iter().copied())).unwrap()
}

#[test]
fn test_options_map_to_constraints_in_order() {
    let args = parse(&["--named=report", "--path=/srv", "--hidden", "--sizemore=12", "--contains=total"]);
    let request = args.to_request();

    assert_eq!(request.name_pattern, "report");
    assert_eq!(request.root_folder, "/srv/");

    let ids: Vec<ConstraintId> = request.constraints.iter().map(|c| c.id()).collect();
    assert_eq!(ids, vec![ConstraintId::ContainsText, ConstraintId::SizeAtLeast, ConstraintId::ShowHidden]);
}

#[test]
fn test_numbers_read_leading_digits() {
    let request = parse(&["--path=/srv", "--mtimeless=7days", "--sizeless=abc"]).to_request();
    let values: Vec<_> = request.constraints.iter().map(|c| c.value().cloned()).collect();

    assert_eq!(values, vec![Some(ConstraintValue::Days(7)), Some(ConstraintValue::Count(0))]);
}

#[test]
fn test_clone_args_round_trip() {
    let args = parse(&["--named=my report", "--path=/srv/share", "--user=ann", "--nouser", "--follow"]);
    let request = args.to_request();

    let plain = clone_args(&request, false);
    assert_eq!(
        plain,
        vec!["--named=my report", "--path=/srv/share", "--user=ann", "--nouser", "--follow"]
    );

    let escaped = clone_args(&request, true);
    assert_eq!(escaped[0], "--named='my report'");

    let again = parse(&plain.iter().map(String::as_str).collect::<Vec<_>>()).to_request();
    assert_eq!(again, request);
}

#[test]
fn test_clone_args_skip_collapsed_constraints() {
    let request = findpass::search()
        .named("x")
        .root("/srv")
        .flag(ConstraintId::FileIsEmpty)
        .constraints_visible(false)
        .build();

    assert_eq!(clone_args(&request, false), vec!["--named=x", "--path=/srv"]);
}

#[test]
fn test_describe_matches_saved_search_title() {
    let request = parse(&["--named=*.txt", "--path=/", "--mtimemore=30", "--empty", "--allmounts"]).to_request();

    assert_eq!(
        describe(&request),
        "Search for Files (named=*.txt&path=/&mtimemore=30&empty&allmounts)"
    );
}

#[test]
fn test_sort_key() {
    assert_eq!(parse(&["--sortby=size"]).sort_key(), Some(SortKey::Size));
    assert_eq!(parse(&["--sortby=bogus"]).sort_key(), Some(SortKey::Name));
    assert_eq!(parse(&[]).sort_key(), None);
}

#[test]
fn test_start_and_config_flags() {
    let args = parse(&["--start", "--config", "/etc/findpass.toml", "--descending"]);
    assert!(args.start);
    assert!(args.descending);
    assert_eq!(args.config.as_deref(), Some(std::path::Path::new("/etc/findpass.toml")));
}
