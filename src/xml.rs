// Response parsing: turns the XML body of a v2 query into a `QueryResult`.
//
// The document looks roughly like this:
//
//   <queryresult success="true" error="false" numpods="2">
//     <pod title="Input">
//       <subpod title="">
//         <plaintext>2 + 2</plaintext>
//         <img src="https://..." alt="2 + 2"/>
//       </subpod>
//     </pod>
//     ...
//   </queryresult>
//
// or, on failure:
//
//   <queryresult success="false" error="true">
//     <error><code>1</code><msg>Invalid appid</msg></error>
//   </queryresult>
//
// The walk is a single pass over quick-xml events with an explicit element
// stack; nothing else in the document is kept.

use crate::error::QueryError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Parsed query response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    /// True only when the root's `success` attribute is exactly `"true"`.
    pub success: bool,
    pub error: Option<ApiError>,
    /// Pods in document order.
    pub pods: Vec<Pod>,
}

/// The `<error>` block of a failed query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiError {
    pub code: String,
    pub msg: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pod {
    pub title: String,
    pub subpods: Vec<Subpod>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subpod {
    /// `None` when the attribute is missing or empty.
    pub title: Option<String>,
    /// Flattened `<plaintext>` content: its text plus any inline child
    /// markup written back out as text. HTML entities are left in place.
    pub plaintext: String,
    pub images: Vec<Image>,
}

/// An `<img>` reference from a subpod.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Image {
    pub src: String,
}

/// Parse a raw response body.
pub fn parse_query_result(xml: &str) -> Result<QueryResult, QueryError> {
    let mut reader = Reader::from_str(xml);
    let mut walker = Walker::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                walker.open(&e, false)?;
                walker.stack.push(local_name(&e));
            }
            Event::Empty(e) => {
                // Inline empty tags are written out whole, so there is no end to wait for.
                if !walker.open(&e, true)? {
                    walker.stack.push(local_name(&e));
                    walker.close();
                }
            }
            Event::End(_) => walker.close(),
            Event::Text(t) => {
                let text = t.unescape()?;
                walker.text(&text);
            }
            Event::CData(t) => {
                let text = String::from_utf8_lossy(&t).into_owned();
                walker.text(&text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !walker.saw_root {
        return Err(QueryError::EmptyDocument);
    }
    if let Some(open) = walker.stack.last() {
        return Err(QueryError::Truncated {
            element: open.clone(),
        });
    }
    walker.result.error = walker.error;
    Ok(walker.result)
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn attr(e: &BytesStart<'_>, name: &str) -> Result<Option<String>, QueryError> {
    for a in e.attributes() {
        let a = a?;
        if a.key.local_name().as_ref() == name.as_bytes() {
            return Ok(Some(a.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Text being collected for an element, and the stack depth it lives at.
#[derive(Debug)]
struct Capture<T> {
    depth: usize,
    target: T,
    text: String,
}

#[derive(Debug, Clone, Copy)]
enum ErrorField {
    Code,
    Msg,
}

#[derive(Debug, Default)]
struct Walker {
    result: QueryResult,
    saw_root: bool,
    stack: Vec<String>,
    pod: Option<(usize, Pod)>,
    subpod: Option<(usize, Subpod)>,
    /// Whether the open subpod already had its first `<plaintext>`.
    subpod_has_plaintext: bool,
    plaintext: Option<Capture<()>>,
    error: Option<ApiError>,
    error_depth: Option<usize>,
    error_field: Option<Capture<ErrorField>>,
}

impl Walker {
    /// Called for every start (or empty) tag, before it is pushed. Returns
    /// true when the tag was copied into `<plaintext>` as inline markup.
    fn open(&mut self, e: &BytesStart<'_>, empty: bool) -> Result<bool, QueryError> {
        let depth = self.stack.len() + 1;
        let name = local_name(e);

        if let Some(capture) = self.plaintext.as_mut() {
            capture.text.push('<');
            capture.text.push_str(&String::from_utf8_lossy(e));
            capture.text.push_str(if empty { "/>" } else { ">" });
            return Ok(true);
        }

        if !self.saw_root {
            self.saw_root = true;
            self.result.success = attr(e, "success")?.as_deref() == Some("true");
            return Ok(false);
        }

        let parent = self.stack.last().map(String::as_str);
        match name.as_str() {
            "error" if depth == 2 && self.error.is_none() => {
                self.error = Some(ApiError::default());
                self.error_depth = Some(depth);
            }
            "code" | "msg" if self.error_depth == Some(depth - 1) => {
                let target = if name == "code" {
                    ErrorField::Code
                } else {
                    ErrorField::Msg
                };
                self.error_field = Some(Capture {
                    depth,
                    target,
                    text: String::new(),
                });
            }
            "pod" if self.pod.is_none() => {
                let title = attr(e, "title")?.unwrap_or_default();
                self.pod = Some((
                    depth,
                    Pod {
                        title,
                        subpods: Vec::new(),
                    },
                ));
            }
            "subpod" if self.pod.is_some() && self.subpod.is_none() => {
                let title = attr(e, "title")?.filter(|t| !t.is_empty());
                self.subpod = Some((
                    depth,
                    Subpod {
                        title,
                        ..Subpod::default()
                    },
                ));
                self.subpod_has_plaintext = false;
            }
            "plaintext" if parent == Some("subpod") && self.is_subpod_child(depth) => {
                if !self.subpod_has_plaintext {
                    self.subpod_has_plaintext = true;
                    self.plaintext = Some(Capture {
                        depth,
                        target: (),
                        text: String::new(),
                    });
                }
            }
            "img" if parent == Some("subpod") && self.is_subpod_child(depth) => {
                let image = Image {
                    src: attr(e, "src")?.unwrap_or_default(),
                };
                if let Some((_, subpod)) = self.subpod.as_mut() {
                    subpod.images.push(image);
                }
            }
            _ => {}
        }
        Ok(false)
    }

    fn is_subpod_child(&self, depth: usize) -> bool {
        matches!(self.subpod, Some((d, _)) if d + 1 == depth)
    }

    /// Called for every end tag (and right after an empty tag).
    fn close(&mut self) {
        let depth = self.stack.len();
        let name = self.stack.pop().unwrap_or_default();

        if let Some(capture) = self.plaintext.take() {
            if capture.depth == depth {
                if let Some((_, subpod)) = self.subpod.as_mut() {
                    subpod.plaintext = capture.text;
                }
            } else {
                let mut capture = capture;
                capture.text.push_str("</");
                capture.text.push_str(&name);
                capture.text.push('>');
                self.plaintext = Some(capture);
            }
            return;
        }

        if let Some(capture) = self.error_field.take() {
            if capture.depth == depth {
                if let Some(error) = self.error.as_mut() {
                    match capture.target {
                        ErrorField::Code => error.code = capture.text,
                        ErrorField::Msg => error.msg = capture.text,
                    }
                }
            } else {
                self.error_field = Some(capture);
            }
        }

        if self.error_depth == Some(depth) {
            self.error_depth = None;
        }
        if matches!(self.subpod, Some((d, _)) if d == depth) {
            if let (Some((_, subpod)), Some((_, pod))) = (self.subpod.take(), self.pod.as_mut()) {
                pod.subpods.push(subpod);
            }
        }
        if matches!(self.pod, Some((d, _)) if d == depth) {
            if let Some((_, pod)) = self.pod.take() {
                self.result.pods.push(pod);
            }
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(capture) = self.plaintext.as_mut() {
            capture.text.push_str(text);
        } else if let Some(capture) = self.error_field.as_mut() {
            capture.text.push_str(text);
        }
    }
}
