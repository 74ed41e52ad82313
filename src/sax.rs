//! Parse-event delivery
//!
//! [`EventReader`] drives quick-xml over a buffered source and turns its
//! events into `start_element` / `characters` / `end_element` callbacks on a
//! [`ContentHandler`]. Well-formedness problems the tokenizer does not catch
//! on its own (no root, content after the root, unclosed elements at end of
//! input) are reported here as [`Error::InvalidXml`].
//!
//! A handler may end the parse early by returning [`Control::Stop`].

use crate::error::{Error, Result};
use crate::limits::Limits;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::BufRead;

/// Raw attributes of a start tag: qualified name and unescaped value, in
/// document order
pub type Attributes = Vec<(String, String)>;

/// What the event loop should do after a callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Keep delivering events
    Continue,
    /// Stop the parse; not an error
    Stop,
}

/// Receiver of parse events
pub trait ContentHandler {
    /// A start tag (or the opening half of an empty-element tag)
    fn start_element(&mut self, name: &str, attributes: Attributes) -> Result<Control>;

    /// Character data inside the root element
    fn characters(&mut self, text: &str) -> Result<Control>;

    /// An end tag (or the closing half of an empty-element tag)
    fn end_element(&mut self, name: &str) -> Result<Control>;
}

/// Outcome of one [`EventReader::step`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// An event was delivered (or skipped); more may follow
    Continue,
    /// The handler asked to stop
    Stopped,
    /// End of input reached after a complete document
    Finished,
}

enum RawEvent {
    Start(String, Attributes),
    Empty(String, Attributes),
    End(String),
    Text(String),
    Eof,
    Skip,
}

/// Pull-driven event source feeding a [`ContentHandler`]
pub struct EventReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    limits: Limits,
    depth: usize,
    seen_root: bool,
    done: bool,
}

impl<R: BufRead> EventReader<R> {
    /// Create an event reader over a buffered source
    pub fn new(source: R, limits: Limits) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.trim_text(false);
        reader.check_end_names(true);
        reader.expand_empty_elements(false);
        Self {
            reader,
            buf: Vec::new(),
            limits,
            depth: 0,
            seen_root: false,
            done: false,
        }
    }

    /// Bytes consumed from the source so far
    pub fn position(&self) -> usize {
        self.reader.buffer_position()
    }

    /// Whether the end of the document has been reached
    pub fn is_finished(&self) -> bool {
        self.done
    }

    /// Read one event from the source and deliver it to `handler`
    pub fn step<H: ContentHandler>(&mut self, handler: &mut H) -> Result<Step> {
        if self.done {
            return Ok(Step::Finished);
        }
        let raw = self.next_raw()?;
        self.limits.check_document_size(self.position())?;

        let control = match raw {
            RawEvent::Start(name, attributes) => self.open(handler, &name, attributes)?,
            RawEvent::Empty(name, attributes) => match self.open(handler, &name, attributes)? {
                Control::Stop => Control::Stop,
                Control::Continue => self.close(handler, &name)?,
            },
            RawEvent::End(name) => self.close(handler, &name)?,
            RawEvent::Text(text) => {
                if self.depth == 0 {
                    if !text.trim().is_empty() {
                        return Err(Error::InvalidXml(format!(
                            "text outside the document element at byte {}",
                            self.position()
                        )));
                    }
                    Control::Continue
                } else {
                    handler.characters(&text)?
                }
            }
            RawEvent::Eof => {
                if self.depth > 0 {
                    return Err(Error::InvalidXml(format!(
                        "unexpected end of input: {} element(s) left open",
                        self.depth
                    )));
                }
                if !self.seen_root {
                    return Err(Error::InvalidXml("no element found".to_string()));
                }
                self.done = true;
                return Ok(Step::Finished);
            }
            RawEvent::Skip => Control::Continue,
        };

        Ok(match control {
            Control::Continue => Step::Continue,
            Control::Stop => Step::Stopped,
        })
    }

    /// Deliver events until the document ends or the handler stops
    pub fn run<H: ContentHandler>(&mut self, handler: &mut H) -> Result<Step> {
        loop {
            match self.step(handler)? {
                Step::Continue => continue,
                outcome => return Ok(outcome),
            }
        }
    }

    fn open<H: ContentHandler>(
        &mut self,
        handler: &mut H,
        name: &str,
        attributes: Attributes,
    ) -> Result<Control> {
        if self.depth == 0 && self.seen_root {
            return Err(Error::InvalidXml(format!(
                "junk after document element: <{}>",
                name
            )));
        }
        self.limits.check_attributes(attributes.len())?;
        self.depth += 1;
        self.limits.check_depth(self.depth)?;
        handler.start_element(name, attributes)
    }

    fn close<H: ContentHandler>(&mut self, handler: &mut H, name: &str) -> Result<Control> {
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.seen_root = true;
        }
        handler.end_element(name)
    }

    fn next_raw(&mut self) -> Result<RawEvent> {
        let raw = {
            let event = self.reader.read_event_into(&mut self.buf)?;
            let decoder = self.reader.decoder();
            match event {
                Event::Start(ref e) => {
                    let (name, attributes) = start_parts(&self.reader, e)?;
                    RawEvent::Start(name, attributes)
                }
                Event::Empty(ref e) => {
                    let (name, attributes) = start_parts(&self.reader, e)?;
                    RawEvent::Empty(name, attributes)
                }
                Event::End(ref e) => RawEvent::End(decoder.decode(e.name().as_ref())?.into_owned()),
                Event::Text(ref e) => RawEvent::Text(e.unescape()?.into_owned()),
                Event::CData(e) => {
                    let bytes = e.into_inner();
                    RawEvent::Text(decoder.decode(&bytes)?.into_owned())
                }
                Event::Eof => RawEvent::Eof,
                // Declarations, comments, processing instructions, doctypes
                _ => RawEvent::Skip,
            }
        };
        self.buf.clear();
        Ok(raw)
    }
}

fn start_parts<R>(reader: &Reader<R>, start: &BytesStart<'_>) -> Result<(String, Attributes)> {
    let decoder = reader.decoder();
    let name = decoder.decode(start.name().as_ref())?.into_owned();
    let mut attributes = Attributes::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = decoder.decode(attr.key.as_ref())?.into_owned();
        let value = attr.unescape_value()?.into_owned();
        attributes.push((key, value));
    }
    Ok((name, attributes))
}

/// Run a whole parse over `source`, delivering every event to `handler`.
///
/// Returns `true` when the handler stopped the parse early.
pub fn parse<R: BufRead, H: ContentHandler>(source: R, handler: &mut H, limits: &Limits) -> Result<bool> {
    let mut events = EventReader::new(source, limits.clone());
    Ok(events.run(handler)? == Step::Stopped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        stop_on_start: bool,
    }

    impl ContentHandler for Recorder {
        fn start_element(&mut self, name: &str, attributes: Attributes) -> Result<Control> {
            let attrs: Vec<String> = attributes.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            self.events.push(format!("start {} [{}]", name, attrs.join(",")));
            Ok(if self.stop_on_start { Control::Stop } else { Control::Continue })
        }

        fn characters(&mut self, text: &str) -> Result<Control> {
            self.events.push(format!("text {:?}", text));
            Ok(Control::Continue)
        }

        fn end_element(&mut self, name: &str) -> Result<Control> {
            self.events.push(format!("end {}", name));
            Ok(Control::Continue)
        }
    }

    fn record(xml: &str) -> Result<Vec<String>> {
        let mut recorder = Recorder::default();
        parse(xml.as_bytes(), &mut recorder, &Limits::default())?;
        Ok(recorder.events)
    }

    #[test]
    fn test_event_sequence() {
        let events = record(r#"<?xml version="1.0"?><a x="1 &amp; 2"><b/>t<![CDATA[<c>]]></a>"#).unwrap();
        assert_eq!(
            events,
            vec![
                "start a [x=1 & 2]",
                "start b []",
                "end b",
                "text \"t\"",
                "text \"<c>\"",
                "end a",
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let events = record("<!-- lead --><a><!-- inner -->x</a>\n").unwrap();
        assert_eq!(events, vec!["start a []", "text \"x\"", "end a"]);
    }

    #[test]
    fn test_malformed_input() {
        for xml in [
            "",
            "<a>",
            "<a></b>",
            "<a/><b/>",
            "text<a/>",
            "<a x='1' x='2'/>",
            "<a>&unknown;</a>",
        ] {
            assert!(
                matches!(record(xml), Err(Error::InvalidXml(_))),
                "expected InvalidXml for {:?}",
                xml
            );
        }
    }

    #[test]
    fn test_stop_signal() {
        let mut recorder = Recorder {
            stop_on_start: true,
            ..Default::default()
        };
        // the unclosed tail would be an error if the parse continued
        let stopped = parse("<root a='1'><child>".as_bytes(), &mut recorder, &Limits::default()).unwrap();
        assert!(stopped);
        assert_eq!(recorder.events, vec!["start root [a=1]"]);
    }

    #[test]
    fn test_depth_limit() {
        let limits = Limits {
            max_depth: 2,
            ..Limits::default()
        };
        let mut recorder = Recorder::default();
        let result = parse("<a><b><c/></b></a>".as_bytes(), &mut recorder, &limits);
        assert!(matches!(result, Err(Error::LimitExceeded(_))));
    }
}
