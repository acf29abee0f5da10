mod common;

use codegate::coverage::MetricKind;
use codegate::detect::Format;
use codegate::error::CodegateError;
use codegate::ingest::ingest;
use codegate::limits::{check_limits, CoverageLimit};
use codegate::location::LocationMatcher;
use common::{fixture, write_file};

fn line_counts(coverages: &codegate::coverages::Coverages, group: &str) -> (u64, u64) {
    let c = coverages.group(group, MetricKind::Line).unwrap();
    (c.covered(), c.total())
}

#[test]
fn ingest_jacoco_xml_fixture() {
    let (coverages, format) = ingest(&fixture("sample_jacoco.xml"), None).unwrap();
    assert_eq!(format, Format::JacocoXml);

    let global = coverages.global(MetricKind::Line).unwrap();
    assert_eq!((global.covered(), global.total()), (7, 12));
    assert_eq!(line_counts(&coverages, "com.example"), (7, 8));
    assert_eq!(line_counts(&coverages, "com.example.util"), (0, 4));

    let inner = coverages
        .unit("com.example", "Foo$Inner", MetricKind::Line)
        .unwrap();
    assert_eq!(inner.covered(), 2);
}

#[test]
fn ingest_jacoco_csv_fixture() {
    let (coverages, format) = ingest(&fixture("sample_jacoco.csv"), None).unwrap();
    assert_eq!(format, Format::JacocoCsv);
    assert_eq!(coverages.len(), 15);

    let global = coverages.global(MetricKind::Line).unwrap();
    assert_eq!((global.covered(), global.total()), (7, 12));
    let branch = coverages.global(MetricKind::Branch).unwrap();
    assert_eq!((branch.covered(), branch.total()), (3, 6));
}

#[test]
fn limits_against_ingested_report() {
    let (coverages, _) = ingest(&fixture("sample_jacoco.xml"), None).unwrap();

    let limits = [
        CoverageLimit::global(MetricKind::Line, 50.0),
        CoverageLimit::groups(LocationMatcher::parse("*.util").unwrap(), MetricKind::Line, 25.0),
    ];
    let violations = check_limits(&coverages, &limits);

    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].coverage.group(), "com.example.util");
}

#[test]
fn default_package_gets_its_own_group_rollup() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_file(
        &dir,
        "jacoco.csv",
        "GROUP,PACKAGE,CLASS,LINE_MISSED,LINE_COVERED\n\
         app,,Main,10,0\n\
         app,com.a,Foo,0,90\n",
    );
    let xml = write_file(
        &dir,
        "jacoco.xml",
        r#"<?xml version="1.0"?>
<report name="app">
  <package name="">
    <class name="Main"><counter type="LINE" missed="10" covered="0"/></class>
  </package>
  <package name="com/a">
    <class name="com/a/Foo"><counter type="LINE" missed="0" covered="90"/></class>
  </package>
</report>"#,
    );

    for path in [csv, xml] {
        let (coverages, _) = ingest(&path, None).unwrap();

        let globals: Vec<_> = coverages.query().filter(|c| c.is_global()).collect();
        assert_eq!(globals.len(), 1, "{}", path.display());
        assert_eq!((globals[0].covered(), globals[0].total()), (90, 100));
        assert_eq!(line_counts(&coverages, ""), (0, 10));
        assert!(coverages.group("", MetricKind::Line).unwrap().is_group_rollup());

        assert!(check_limits(&coverages, &[CoverageLimit::global(MetricKind::Line, 50.0)]).is_empty());
        let any_group = CoverageLimit::groups(LocationMatcher::parse("*").unwrap(), MetricKind::Line, 50.0);
        let violations = check_limits(&coverages, &[any_group]);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].coverage.group(), "");
        assert!(violations[0].coverage.is_group_rollup());
    }
}

#[test]
fn format_override_beats_detection() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        &dir,
        "coverage.txt",
        "PACKAGE,CLASS,LINE_MISSED,LINE_COVERED\np,A,1,1\n",
    );

    assert!(matches!(ingest(&path, None), Err(CodegateError::UnknownFormat)));
    let (coverages, format) = ingest(&path, Some("csv")).unwrap();
    assert_eq!(format, Format::JacocoCsv);
    assert_eq!(coverages.len(), 1);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ingest(&dir.path().join("nope.xml"), None).unwrap_err();
    assert!(matches!(err, CodegateError::Io(_)));
}
