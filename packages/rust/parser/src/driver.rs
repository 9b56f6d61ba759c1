//! Parse driver: feeds quick-xml tokenizer events into the tag mapper.
//!
//! One parse is one synchronous pass over the input. The driver lowercases
//! tag and attribute names (the vendor schema is case-insensitive), trims
//! text, and surfaces tokenizer errors as [`CatfeedError::MalformedInput`]
//! with the byte position. No partial result ever escapes a failed parse.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, info};

use catfeed_shared::{Catalog, CatfeedError, Result};

use crate::mapper::{handle_close_tag, handle_open_tag, handle_text};
use crate::state::ParserState;

/// Parse a vendor catalog XML file into the two keyed collections.
///
/// Fails with [`CatfeedError::FileNotFound`] before the tokenizer is
/// built if the path does not exist, and with
/// [`CatfeedError::MalformedInput`] on any syntax error.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Catalog> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(CatfeedError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    info!(path = %path.display(), "parsing catalog file");

    let file = File::open(path).map_err(|e| CatfeedError::io(path, e))?;
    let reader = Reader::from_reader(BufReader::new(file));
    let catalog = run(reader)?;

    info!(
        groups = catalog.article_groups.len(),
        articles = catalog.articles.len(),
        "parse complete"
    );

    Ok(catalog)
}

/// Parse catalog XML from an in-memory string. Same machine as
/// [`parse_file`]; used by tests and callers that already hold the bytes.
pub fn parse_str(content: &str) -> Result<Catalog> {
    run(Reader::from_reader(content.as_bytes()))
}

/// Drive the tokenizer to end-of-input, dispatching events into the
/// mapper handlers.
fn run<R: BufRead>(mut reader: Reader<R>) -> Result<Catalog> {
    reader.config_mut().trim_text(true);
    // The tokenizer's own end-name check is byte-exact; close tags are
    // matched below against the path stack on lowercased names instead,
    // so <Name></NAME> pairs up.
    reader.config_mut().check_end_names = false;

    let mut state = ParserState::new();
    let mut buf = Vec::with_capacity(8 * 1024);

    loop {
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(e) => {
                return Err(CatfeedError::malformed(
                    reader.buffer_position(),
                    e.to_string(),
                ));
            }
        };

        match event {
            Event::Start(ref e) => {
                let name = tag_name(e.name().as_ref());
                let attributes = collect_attributes(e, reader.buffer_position())?;
                debug!(tag = %name, path = %state.current_path(), "open");
                handle_open_tag(&mut state, &name, &attributes);
            }
            Event::Empty(ref e) => {
                // Self-closing tag: an open immediately followed by a close.
                let name = tag_name(e.name().as_ref());
                let attributes = collect_attributes(e, reader.buffer_position())?;
                handle_open_tag(&mut state, &name, &attributes);
                handle_close_tag(&mut state, &name);
            }
            Event::End(ref e) => {
                let name = tag_name(e.name().as_ref());
                match state.unclosed_tag() {
                    Some(open) if open == name => {}
                    Some(open) => {
                        return Err(CatfeedError::malformed(
                            reader.buffer_position(),
                            format!("mismatched close tag </{name}>, <{open}> is open"),
                        ));
                    }
                    None => {
                        return Err(CatfeedError::malformed(
                            reader.buffer_position(),
                            format!("close tag </{name}> without a matching open tag"),
                        ));
                    }
                }
                debug!(tag = %name, "close");
                handle_close_tag(&mut state, &name);
            }
            Event::Text(ref e) => {
                let text = e.unescape().map_err(|err| {
                    CatfeedError::malformed(reader.buffer_position(), err.to_string())
                })?;
                handle_text(&mut state, &text);
            }
            Event::CData(ref e) => {
                handle_text(&mut state, &String::from_utf8_lossy(e));
            }
            Event::Eof => {
                // quick-xml does not flag a truncated document on its own.
                if let Some(tag) = state.unclosed_tag() {
                    return Err(CatfeedError::malformed(
                        reader.buffer_position(),
                        format!("unexpected end of input, <{tag}> still open"),
                    ));
                }
                return Ok(state.into_catalog());
            }
            _ => {}
        }

        buf.clear();
    }
}

/// Lowercase a raw tag name (vendor tags are treated case-insensitively).
fn tag_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

/// Collect a tag's attributes into a map with lowercased keys and
/// unescaped values.
fn collect_attributes(e: &BytesStart<'_>, position: u64) -> Result<HashMap<String, String>> {
    let mut attributes = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| CatfeedError::malformed(position, err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase();
        let value = attr
            .unescape_value()
            .map_err(|err| CatfeedError::malformed(position, err.to_string()))?
            .into_owned();
        attributes.insert(key, value);
    }
    Ok(attributes)
}
