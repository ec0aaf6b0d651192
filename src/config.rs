//! Declarative configuration of the instrument in terms of its SCPI settings.
//!
//! Keyword fields are closed sets with an escape hatch: text that is not one of the known
//! keywords is kept (upper-cased) in an `Other` variant instead of being rejected, so that
//! documents written for a newer dialect still load. Whether such text is acceptable is decided
//! by the editing layer (see [`crate::Issue`]), never by the codec or the compiler.

use std::fmt;

macro_rules! keyword_enum {
    {
        $( #[$attr:meta] )*
        pub enum $name:ident {
            #[default]
            $default:ident => $default_text:literal,
            $( $variant:ident => $text:literal, )*
        }
    } => {
        $( #[$attr] )*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
        pub enum $name {
            #[default]
            $default,
            $( $variant, )*
            /// Text outside of the known keyword set, upper-cased.
            Other(String),
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$name::$default, $( $name::$variant, )*];

            /// Interpret document or form text. Never fails; unknown text becomes `Other`.
            pub fn from_text(text: &str) -> $name {
                match text.trim().to_uppercase().as_str() {
                    $default_text => $name::$default,
                    $( $text => $name::$variant, )*
                    other => $name::Other(other.to_owned()),
                }
            }

            pub fn as_str(&self) -> &str {
                match self {
                    $name::$default => $default_text,
                    $( $name::$variant => $text, )*
                    $name::Other(text) => text.as_str(),
                }
            }

            pub fn is_known(&self) -> bool {
                !matches!(self, $name::Other(_))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

keyword_enum! {
    /// Vertical unit of a channel. Stored and persisted, but not compiled into commands.
    pub enum Unit {
        #[default]
        Unspecified => "",
        Amp => "AMP",
        Volt => "VOLT",
    }
}

keyword_enum! {
    pub enum TriggerMode {
        #[default]
        Edge => "EDGE",
        Runt => "RUNT",
        Bus => "BUS",
        Glitch => "GLITCH",
        Pulse => "PULSE",
        Video => "VIDEO",
        Pattern => "PATTERN",
    }
}

keyword_enum! {
    pub enum TriggerSource {
        #[default]
        Chan1 => "CHAN1",
        Chan2 => "CHAN2",
        Chan3 => "CHAN3",
        Chan4 => "CHAN4",
        Ext => "EXT",
        Line => "LINE",
    }
}

keyword_enum! {
    pub enum Slope {
        #[default]
        Pos => "POS",
        Neg => "NEG",
    }
}

/// Number of input channels on the supported instruments.
pub const CHANNEL_COUNT: u32 = 4;

pub const DEFAULT_TRIGGER_COMMAND: &str = "SINGLE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    /// Channel identity, `1` for `CHAN1`. Unrelated to the position in `Configuration::channels`.
    pub number: u32,
    pub display: bool,
    pub label: String,
    /// Probe attenuation ratio, e.g. `10` for a 10X probe. Passed through as text.
    pub probe: String,
    /// Vertical scale per division. Passed through as text.
    pub scale: String,
    pub unit: Unit,
}

impl Channel {
    pub fn new(number: u32) -> Channel {
        Channel {
            number,
            display: false,
            label: String::new(),
            probe: String::new(),
            scale: String::new(),
            unit: Unit::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Trigger {
    pub mode: TriggerMode,
    pub source: TriggerSource,
    /// Trigger level; empty leaves the instrument setting alone.
    pub level: String,
    pub slope: Slope,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub display_label: bool,
    /// Horizontal scale per division; empty (or blank) leaves the instrument setting alone.
    pub time_scale: String,
    pub channels: Vec<Channel>,
    pub trigger: Trigger,
    /// Issued verbatim after everything else, e.g. `SINGLE` to arm one acquisition. Documents
    /// are upper-cased when read; empty means no command is issued.
    pub trigger_command: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            display_label: false,
            time_scale: String::new(),
            channels: (1..=CHANNEL_COUNT).map(Channel::new).collect(),
            trigger: Trigger::default(),
            trigger_command: DEFAULT_TRIGGER_COMMAND.to_owned(),
        }
    }
}

impl Configuration {
    pub fn channel(&self, number: u32) -> Option<&Channel> {
        self.channels.iter().find(|channel| channel.number == number)
    }

    pub fn channel_mut(&mut self, number: u32) -> Option<&mut Channel> {
        self.channels.iter_mut().find(|channel| channel.number == number)
    }
}
