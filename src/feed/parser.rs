use super::{FeedEntry, ParsedFeed, Person};
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Parses an RSS 0.9x/2.0, RDF or Atom document
///
/// Never fails: problems are recorded in [`ParsedFeed::bozo`] and the
/// entries completed before the problem are returned.
pub fn parse_feed(xml: &str) -> ParsedFeed {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut state = State::default();
    let mut bozo = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = local_name(&e);
                state.open(&name, &e);
                state.stack.push(Frame {
                    name,
                    text: String::new(),
                });
            }
            Ok(Event::Empty(e)) => {
                let name = local_name(&e);
                state.open(&name, &e);
                state.close(Frame {
                    name,
                    text: String::new(),
                });
            }
            Ok(Event::Text(t)) => {
                let text = match t.unescape() {
                    Ok(text) => text.into_owned(),
                    Err(_) => String::from_utf8_lossy(&t).into_owned(),
                };
                state.append(&text);
            }
            Ok(Event::CData(c)) => state.append(&String::from_utf8_lossy(&c)),
            Ok(Event::End(_)) => {
                if let Some(frame) = state.stack.pop() {
                    state.close(frame);
                }
            }
            Ok(Event::Eof) => {
                if !state.stack.is_empty() {
                    bozo = Some(format!("unexpected end of document inside <{}>", state.stack_top()));
                }
                break;
            }
            Ok(_) => {}
            Err(e) => {
                bozo = Some(format!("XML error at byte {}: {}", reader.buffer_position(), e));
                break;
            }
        }
    }

    if bozo.is_none() {
        bozo = match state.root.as_deref() {
            None => Some("document has no root element".to_string()),
            Some("rss" | "feed" | "rdf") => None,
            Some(other) => Some(format!("<{other}> is not an RSS or Atom root element")),
        };
    }

    ParsedFeed {
        title: state.title,
        entries: state.entries,
        bozo,
    }
}

/// Parses a feed timestamp: RFC 2822 first, then RFC 3339
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

struct Frame {
    name: String,
    text: String,
}

#[derive(Default)]
struct State {
    stack: Vec<Frame>,
    root: Option<String>,
    title: Option<String>,
    entries: Vec<FeedEntry>,
    current: Option<FeedEntry>,
    person: Option<Person>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Parent {
    Channel,
    Entry,
    Author,
    Other,
}

impl State {
    fn stack_top(&self) -> &str {
        self.stack.last().map(|f| f.name.as_str()).unwrap_or("")
    }

    fn parent(&self) -> Parent {
        match self.stack_top() {
            "channel" | "feed" => Parent::Channel,
            "item" | "entry" if self.current.is_some() => Parent::Entry,
            "author" if self.person.is_some() => Parent::Author,
            _ => Parent::Other,
        }
    }

    fn append(&mut self, text: &str) {
        if let Some(frame) = self.stack.last_mut() {
            frame.text.push_str(text);
        }
    }

    fn open(&mut self, name: &str, e: &BytesStart<'_>) {
        if self.stack.is_empty() && self.root.is_none() {
            self.root = Some(name.to_string());
        }

        let parent = self.parent();
        match name {
            "item" | "entry" => self.current = Some(FeedEntry::default()),
            "author" if parent == Parent::Entry => self.person = Some(Person::default()),
            "link" if parent == Parent::Entry => {
                let rel = attribute(e, "rel");
                if matches!(rel.as_deref(), None | Some("alternate")) {
                    if let (Some(href), Some(entry)) = (attribute(e, "href"), self.current.as_mut()) {
                        entry.link.get_or_insert(href);
                    }
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, frame: Frame) {
        let parent = self.parent();
        let text = frame.text.trim();

        match (frame.name.as_str(), parent) {
            ("item" | "entry", _) => {
                if let Some(entry) = self.current.take() {
                    self.entries.push(entry);
                }
            }
            ("title", Parent::Channel) => {
                if self.current.is_none() && !text.is_empty() {
                    self.title = Some(text.to_string());
                }
            }
            ("name", Parent::Author) => {
                if let Some(person) = self.person.as_mut() {
                    person.name = Some(text.to_string()).filter(|s| !s.is_empty());
                }
            }
            ("email", Parent::Author) => {
                if let Some(person) = self.person.as_mut() {
                    person.email = Some(text.to_string()).filter(|s| !s.is_empty());
                }
            }
            ("author", Parent::Entry) => {
                let person = self.person.take().unwrap_or_default();
                if let Some(entry) = self.current.as_mut() {
                    if !person.is_empty() {
                        if entry.author.is_none() {
                            entry.author = person.name.clone();
                        }
                        entry.author_detail.get_or_insert_with(|| person.clone());
                        entry.authors.push(person);
                    } else if !text.is_empty() {
                        entry.author = Some(text.to_string());
                    }
                }
            }
            (name, Parent::Entry) if !text.is_empty() => {
                if let Some(entry) = self.current.as_mut() {
                    apply_entry_field(entry, name, text);
                }
            }
            _ => {}
        }
    }
}

fn apply_entry_field(entry: &mut FeedEntry, name: &str, text: &str) {
    let text = text.to_string();
    match name {
        "title" => entry.title = Some(text),
        "link" => {
            entry.link.get_or_insert(text);
        }
        "guid" | "id" => entry.id = Some(text),
        "description" => {
            entry.summary.get_or_insert_with(|| text.clone());
            entry.description = Some(text);
        }
        "summary" => entry.summary = Some(text),
        "content" | "encoded" => entry.content = Some(text),
        "pubdate" | "published" | "issued" | "date" => {
            entry.published_parsed = parse_date(&text);
            entry.published = Some(text);
        }
        "updated" | "modified" => {
            entry.updated_parsed = parse_date(&text);
            entry.updated = Some(text);
        }
        "creator" => {
            entry.authors.push(Person {
                name: Some(text.clone()),
                email: None,
            });
            entry.author.get_or_insert(text);
        }
        _ => {}
    }
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).to_ascii_lowercase()
}

fn attribute(e: &BytesStart<'_>, key: &str) -> Option<String> {
    e.try_get_attribute(key)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}
