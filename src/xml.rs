//! Reading and writing configuration documents.
//!
//! The document layout is fixed:
//!
//! ```text
//! configuration
//! ├── channels
//! │   └── channel[@number]  { display, label, probe, scale, unit }
//! ├── display_label
//! ├── time_scale
//! ├── trigger               { mode, source, level, slope }
//! └── trigger_command
//! ```
//!
//! Reading is permissive: every missing element takes its default and unknown elements are
//! ignored. Only a foreign root element or an unusable channel number is an error.

use std::io::Write;

use quick_xml::errors::IllFormedError;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::{Channel, Configuration, Error, Result, SchemaError};
use crate::{Slope, Trigger, TriggerMode, TriggerSource, Unit, DEFAULT_TRIGGER_COMMAND};

pub const ROOT_TAG: &str = "configuration";

#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn from_start(start: &BytesStart) -> Result<Element> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute.unescape_value()?.into_owned();
            attributes.push((key, value));
        }
        Ok(Element { name, attributes, ..Default::default() })
    }

    fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Trimmed text of the first child called `name`, or `default` if there is no such child.
    /// A child that exists but is empty yields an empty string, not `default`.
    fn child_text(&self, name: &str, default: &str) -> String {
        match self.child(name) {
            Some(child) => child.text.trim().to_owned(),
            None => default.to_owned(),
        }
    }
}

fn read_tree(document: &str) -> Result<Element> {
    let mut reader = Reader::from_str(document);
    let mut stack: Vec<Element> = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(start) =>
                stack.push(Element::from_start(&start)?),
            Event::Empty(start) => {
                let element = Element::from_start(&start)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => return Ok(element),
                }
            }
            Event::End(_) => {
                // end tag names are checked by the reader
                if let Some(element) = stack.pop() {
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => return Ok(element),
                    }
                }
            }
            Event::Text(text) => {
                if let Some(element) = stack.last_mut() {
                    element.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(element) = stack.last_mut() {
                    element.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => {
                // the reader does not report elements left open at the end of input
                let open = stack.last().map_or(ROOT_TAG, |element| element.name.as_str());
                return Err(quick_xml::Error::IllFormed(
                    IllFormedError::MissingEndTag(open.to_owned())).into())
            }
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) | Event::Comment(_) => (),
        }
    }
}

fn parse_switch(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case("ON")
}

fn parse_channel_number(text: &str) -> Result<u32> {
    match text.trim().parse::<u32>() {
        Ok(number) if number > 0 => Ok(number),
        _ => Err(SchemaError::ChannelNumber { text: text.to_owned() }.into()),
    }
}

fn parse_channel(element: &Element, number: u32) -> Channel {
    Channel {
        number,
        display: parse_switch(&element.child_text("display", "OFF")),
        label: element.child_text("label", ""),
        probe: element.child_text("probe", ""),
        scale: element.child_text("scale", ""),
        unit: Unit::from_text(&element.child_text("unit", "")),
    }
}

fn parse_trigger(element: Option<&Element>) -> Trigger {
    let text = |name: &str, default: &str| match element {
        Some(element) => element.child_text(name, default),
        None => default.to_owned(),
    };
    Trigger {
        mode: TriggerMode::from_text(&text("mode", TriggerMode::default().as_str())),
        source: TriggerSource::from_text(&text("source", TriggerSource::default().as_str())),
        level: text("level", ""),
        slope: Slope::from_text(&text("slope", Slope::default().as_str())),
    }
}

/// Read a configuration document.
///
/// Channels are returned in document order and identified by their `number` attribute; a
/// channel without one takes its 1-based position among the channel elements. Two channels
/// resolving to the same number are rejected.
pub fn parse(document: &str) -> Result<Configuration> {
    let root = read_tree(document)?;
    if root.name != ROOT_TAG {
        return Err(SchemaError::RootTag { found: root.name }.into())
    }

    let mut channels: Vec<Channel> = Vec::new();
    if let Some(channels_element) = root.child("channels") {
        for (index, element) in channels_element.children_named("channel").enumerate() {
            let number = match element.attribute("number") {
                Some(text) => parse_channel_number(text)?,
                None => index as u32 + 1,
            };
            if channels.iter().any(|channel| channel.number == number) {
                return Err(SchemaError::DuplicateChannel { number }.into())
            }
            channels.push(parse_channel(element, number));
        }
    }

    let config = Configuration {
        display_label: parse_switch(&root.child_text("display_label", "OFF")),
        time_scale: root.child_text("time_scale", ""),
        channels,
        trigger: parse_trigger(root.child("trigger")),
        trigger_command: root.child_text("trigger_command", DEFAULT_TRIGGER_COMMAND).to_uppercase(),
    };
    log::debug!("parsed configuration with {} channel(s)", config.channels.len());
    Ok(config)
}

fn switch_text(value: bool) -> &'static str {
    if value { "ON" } else { "OFF" }
}

fn write_text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    if text.is_empty() {
        writer.write_event(Event::Empty(BytesStart::new(name)))?;
    } else {
        writer.write_event(Event::Start(BytesStart::new(name)))?;
        writer.write_event(Event::Text(BytesText::new(text)))?;
        writer.write_event(Event::End(BytesEnd::new(name)))?;
    }
    Ok(())
}

fn write_channel<W: Write>(writer: &mut Writer<W>, channel: &Channel) -> Result<()> {
    let number = channel.number.to_string();
    let mut start = BytesStart::new("channel");
    start.push_attribute(("number", number.as_str()));
    writer.write_event(Event::Start(start))?;
    write_text_element(writer, "display", switch_text(channel.display))?;
    // settings of a hidden channel have no effect, so only the element shells are kept
    let shown = |text: &str| if channel.display { text.trim().to_owned() } else { String::new() };
    write_text_element(writer, "label", &shown(&channel.label))?;
    write_text_element(writer, "probe", &shown(&channel.probe))?;
    write_text_element(writer, "scale", &shown(&channel.scale))?;
    write_text_element(writer, "unit", &shown(channel.unit.as_str()))?;
    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    Ok(())
}

/// Write a configuration document as indented UTF-8 text.
///
/// Channels are written in `number` order.
pub fn serialize(config: &Configuration) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new(ROOT_TAG)))?;

    writer.write_event(Event::Start(BytesStart::new("channels")))?;
    let mut channels = config.channels.iter().collect::<Vec<_>>();
    channels.sort_by_key(|channel| channel.number);
    for channel in channels {
        write_channel(&mut writer, channel)?;
    }
    writer.write_event(Event::End(BytesEnd::new("channels")))?;

    write_text_element(&mut writer, "display_label", switch_text(config.display_label))?;
    write_text_element(&mut writer, "time_scale", config.time_scale.trim())?;

    writer.write_event(Event::Start(BytesStart::new("trigger")))?;
    write_text_element(&mut writer, "mode", config.trigger.mode.as_str())?;
    write_text_element(&mut writer, "source", config.trigger.source.as_str())?;
    write_text_element(&mut writer, "level", config.trigger.level.trim())?;
    write_text_element(&mut writer, "slope", config.trigger.slope.as_str())?;
    writer.write_event(Event::End(BytesEnd::new("trigger")))?;

    write_text_element(&mut writer, "trigger_command", config.trigger_command.trim())?;
    writer.write_event(Event::End(BytesEnd::new(ROOT_TAG)))?;

    let mut document = String::from_utf8(writer.into_inner())
        .map_err(|error| Error::Other(error.into()))?;
    document.push('\n');
    log::debug!("serialized configuration ({} bytes)", document.len());
    Ok(document)
}
