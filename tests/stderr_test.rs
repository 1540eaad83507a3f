use findpass::stderr::{classify, ErrorStreamAggregator, StderrLine, MAX_ERROR_LINES, TRUNCATION_MARKER};
use findpass::ErrorReportKind;

#[test]
fn test_tool_noise_is_never_surfaced() {
    for line in [
        "find: '/root': Permission denied\n",
        "grep: /srv/dir: Is a directory\n",
        "find: '/proc/1/fd/5': No such file or directory\n",
        "find:\n",
    ] {
        assert_eq!(classify(line), StderrLine::ToolNoise, "{line:?}");
    }

    let mut agg = ErrorStreamAggregator::new();
    agg.push("find: '/root': Permission denied\n");
    assert!(agg.is_empty());
    assert!(agg.finish(false).is_none());
}

#[test]
fn test_other_find_messages_are_errors() {
    assert_eq!(classify("find: invalid argument `-foo' to `-size'\n"), StderrLine::Error);
    assert_eq!(classify("locate: warning: database is more than 8 days old\n"), StderrLine::Error);
}

#[test]
fn test_report_keeps_lines_in_order() {
    let mut agg = ErrorStreamAggregator::new();
    agg.push("first problem\n");
    agg.push("grep: noise\n");
    agg.push("second problem\n");

    let report = agg.finish(false).unwrap();
    assert_eq!(report.kind, ErrorReportKind::Plain);
    assert_eq!(report.details, "first problem\nsecond problem");
    assert!(!report.truncated);
}

#[test]
fn test_report_is_capped_with_marker() {
    let mut agg = ErrorStreamAggregator::new();
    for i in 0..MAX_ERROR_LINES + 5 {
        agg.push(&format!("problem {i}\n"));
    }

    let report = agg.finish(false).unwrap();
    assert!(report.truncated);
    assert!(report.details.ends_with(TRUNCATION_MARKER));
    assert!(report.details.contains("problem 19"));
    assert!(!report.details.contains("problem 20"));
    assert_eq!(report.details.lines().filter(|l| l.starts_with("problem")).count(), MAX_ERROR_LINES);
}

#[test]
fn test_exactly_max_lines_is_not_truncated() {
    let mut agg = ErrorStreamAggregator::new();
    for i in 0..MAX_ERROR_LINES {
        agg.push(&format!("problem {i}\n"));
    }
    assert!(!agg.finish(false).unwrap().truncated);
}

#[test]
fn test_quick_mode_errors_offer_disabling_quick_search() {
    let mut agg = ErrorStreamAggregator::new();
    agg.push("locate: can not open database\n");

    let report = agg.finish(true).unwrap();
    assert_eq!(report.kind, ErrorReportKind::OfferDisableQuickSearch);
    assert!(report.headline().contains("disable the quick search"));
}
