pub mod jacoco_csv;
pub mod jacoco_xml;

use std::io::BufRead;
use std::path::Path;

use quick_xml::events::BytesStart;
use quick_xml::Reader;

use crate::coverage::Coverage;
use crate::error::{CodegateError, Result};

pub use crate::detect::{detect_format, Format};

/// Every instrumentation report reader implements this trait.
pub trait CoverageReader {
    fn format(&self) -> Format;

    /// Whether this reader recognises the file, from its path and the
    /// first few KB of content.
    fn can_read(&self, path: &Path, content: &[u8]) -> bool;

    /// One record per unit and metric kind.
    fn read(&self, input: &[u8]) -> Result<Vec<Coverage>>;
}

pub fn reader_for(format: Format) -> &'static dyn CoverageReader {
    match format {
        Format::JacocoXml => &jacoco_xml::JacocoXmlReader,
        Format::JacocoCsv => &jacoco_csv::JacocoCsvReader,
    }
}

/// Decode the first 4 KB for sniffing.
pub(crate) fn sniff_head(content: &[u8]) -> std::borrow::Cow<'_, str> {
    let head_len = content.len().min(4096);
    String::from_utf8_lossy(&content[..head_len])
}

pub(crate) fn looks_like_xml(head: &str) -> bool {
    head.contains("<?xml") || head.trim_start().starts_with('<')
}

pub(crate) fn xml_reader<R: BufRead>(reader: R) -> Reader<R> {
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);
    xml
}

pub(crate) fn xml_err<R>(source: quick_xml::Error, xml: &Reader<R>) -> CodegateError {
    CodegateError::Xml {
        source,
        position: xml.buffer_position(),
    }
}

pub(crate) fn get_attr(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.into_owned())
}
