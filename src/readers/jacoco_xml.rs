/// Reader for JaCoCo XML reports.
///
/// Structure:
///   <report name="...">
///     <package name="com/example">
///       <class name="com/example/Foo" sourcefilename="Foo.java">
///         <method name="doStuff" desc="()V" line="10">
///           <counter type="LINE" missed="0" covered="3"/>
///         </method>
///         <counter type="INSTRUCTION" missed="2" covered="10"/>
///         <counter type="LINE" missed="1" covered="5"/>
///       </class>
///       <sourcefile name="Foo.java">...</sourcefile>
///       <counter .../>
///     </package>
///   </report>
///
/// Only the `<counter>` elements directly inside `<class>` are read. Method,
/// source file, package and report counters are totals JaCoCo already
/// derived from the class counters, and the lattice derives those itself.
///
/// Group is the package with `/` replaced by `.`; unit is the class name
/// without its package.
use std::path::Path;

use quick_xml::events::Event;

use super::{get_attr, CoverageReader, Format};
use crate::coverage::{Coverage, MetricKind};
use crate::error::{CodegateError, Result};

pub struct JacocoXmlReader;

impl CoverageReader for JacocoXmlReader {
    fn format(&self) -> Format {
        Format::JacocoXml
    }

    fn can_read(&self, _path: &Path, content: &[u8]) -> bool {
        let head = super::sniff_head(content);
        super::looks_like_xml(&head)
            && head.contains("<report")
            && (head.contains("jacoco") || head.contains("JACOCO") || head.contains("<package"))
    }

    fn read(&self, input: &[u8]) -> Result<Vec<Coverage>> {
        parse(input)
    }
}

/// Parse JaCoCo XML into per-class coverage records.
pub fn parse(input: &[u8]) -> Result<Vec<Coverage>> {
    let mut xml = super::xml_reader(input);
    let mut buf = Vec::new();
    let mut records = Vec::new();

    let mut current_package: Option<String> = None;
    let mut current_class: Option<String> = None;
    let mut in_method = false;

    loop {
        let event = xml.read_event_into(&mut buf);
        let is_start_event = matches!(&event, Ok(Event::Start(_)));
        match event {
            Err(e) => return Err(super::xml_err(e, &xml)),
            Ok(Event::Eof) => break,
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"package" if is_start_event => {
                    current_package = get_attr(e, b"name").map(|p| p.replace('/', "."));
                }
                b"class" if is_start_event => {
                    current_class = get_attr(e, b"name");
                }
                b"method" if is_start_event => {
                    in_method = true;
                }
                b"counter" if !in_method => {
                    if let Some(class) = &current_class {
                        let group = current_package.as_deref().unwrap_or("");
                        if let Some(record) = class_counter(e, group, class)? {
                            records.push(record);
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"package" => current_package = None,
                b"class" => current_class = None,
                b"method" => in_method = false,
                _ => {}
            },
            _ => {}
        }
        buf.clear();
    }

    Ok(records)
}

fn class_counter(
    e: &quick_xml::events::BytesStart<'_>,
    group: &str,
    class: &str,
) -> Result<Option<Coverage>> {
    let kind = match get_attr(e, b"type").and_then(|t| t.parse::<MetricKind>().ok()) {
        Some(kind) => kind,
        // Counter types we do not track.
        None => return Ok(None),
    };
    let count = |attr: &[u8], label: &str| -> Result<u64> {
        get_attr(e, attr)
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| {
                CodegateError::Parse(format!("{class}: {kind} counter without valid '{label}'"))
            })
    };
    let missed = count(b"missed", "missed")?;
    let covered = count(b"covered", "covered")?;
    let unit = class.rsplit('/').next().unwrap_or(class);
    Coverage::from_counters(group, unit, kind, missed, covered).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_jacoco() {
        let input = include_bytes!("../../tests/fixtures/sample_jacoco.xml");
        let records = parse(input).unwrap();

        let lines: Vec<&Coverage> = records
            .iter()
            .filter(|c| c.kind() == MetricKind::Line)
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].group(), "com.example");
        assert_eq!(lines[0].unit(), "Foo");
        assert_eq!((lines[0].covered(), lines[0].total()), (5, 6));
        assert_eq!(lines[1].unit(), "Foo$Inner");
        assert_eq!(lines[2].group(), "com.example.util");
        assert_eq!(lines[2].unit(), "Bar");
        assert_eq!((lines[2].covered(), lines[2].total()), (0, 4));

        // Method counters are not class counters.
        let foo_methods = records
            .iter()
            .find(|c| c.unit() == "Foo" && c.kind() == MetricKind::Method)
            .unwrap();
        assert_eq!((foo_methods.covered(), foo_methods.total()), (2, 3));
    }

    #[test]
    fn test_parse_jacoco_empty() {
        let input = br#"<?xml version="1.0"?><report name="empty"></report>"#;
        assert!(parse(input).unwrap().is_empty());
    }

    #[test]
    fn test_parse_jacoco_malformed() {
        let input = br#"<report name="x"><package name="a"><class name="a/B"></package></report>"#;
        let err = parse(input).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("position"), "Error should contain position info: {msg}");
    }

    #[test]
    fn test_parse_jacoco_bad_counter() {
        let input = br#"<report><package name="a"><class name="a/B"><counter type="LINE" missed="x" covered="1"/></class></package></report>"#;
        assert!(matches!(parse(input), Err(CodegateError::Parse(_))));
    }

    #[test]
    fn test_can_read_jacoco() {
        let reader = JacocoXmlReader;

        let content = br#"<?xml version="1.0" encoding="UTF-8"?><!DOCTYPE report PUBLIC "-//JACOCO//DTD Report 1.1//EN" "report.dtd"><report name="test">"#;
        assert!(reader.can_read(Path::new("jacoco.xml"), content));

        let content = br#"<?xml version="1.0"?><report name="test"><package name="com/example">"#;
        assert!(reader.can_read(Path::new("report.xml"), content));

        let content = br#"<?xml version="1.0"?><coverage version="1.0">"#;
        assert!(!reader.can_read(Path::new("coverage.xml"), content));
    }
}
