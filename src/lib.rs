mod config;
mod xml;
mod compile;
mod validate;
mod library;
mod transport;

use std::fmt;
use std::path::PathBuf;

/// A well-formed XML document that is not a configuration document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    RootTag { found: String },
    ChannelNumber { text: String },
    DuplicateChannel { number: u32 },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::RootTag { found } =>
                write!(f, "not a configuration document (root element is <{}>)", found),
            Self::ChannelNumber { text } =>
                write!(f, "channel number {:?} is not a positive integer", text),
            Self::DuplicateChannel { number } =>
                write!(f, "channel {} is defined more than once", number),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryError {
    NotFound { path: PathBuf },
    AlreadyExists { path: PathBuf },
    InvalidTestId { id: String },
}

impl fmt::Display for LibraryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NotFound { path } =>
                write!(f, "file not found: {}", path.display()),
            Self::AlreadyExists { path } =>
                write!(f, "{} already exists", path.display()),
            Self::InvalidTestId { id } =>
                write!(f, "invalid test number {:?} (use letters, digits and underscores)", id),
        }
    }
}

#[derive(Debug)]
pub enum Error {
    Schema(SchemaError),
    Xml(quick_xml::Error),
    Io(std::io::Error),
    Resource { resource: String, reason: &'static str },
    Library(LibraryError),
    Other(Box<dyn std::error::Error + Sync + Send + 'static>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Schema(schema_error) =>
                write!(f, "{}", schema_error),
            Self::Xml(xml_error) =>
                write!(f, "malformed XML: {}", xml_error),
            Self::Io(io_error) =>
                write!(f, "I/O error: {}", io_error),
            Self::Resource { resource, reason } =>
                write!(f, "cannot use resource {:?}: {}", resource, reason),
            Self::Library(library_error) =>
                write!(f, "{}", library_error),
            Self::Other(error) =>
                write!(f, "{}", error),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Xml(xml_error) => Some(xml_error),
            Self::Io(io_error) => Some(io_error),
            _ => None
        }
    }
}

impl From<SchemaError> for Error {
    fn from(error: SchemaError) -> Self {
        Error::Schema(error)
    }
}

impl From<LibraryError> for Error {
    fn from(error: LibraryError) -> Self {
        Error::Library(error)
    }
}

impl From<quick_xml::Error> for Error {
    fn from(error: quick_xml::Error) -> Self {
        match error {
            quick_xml::Error::Io(io_error) =>
                match std::sync::Arc::try_unwrap(io_error) {
                    Ok(io_error) => Error::Io(io_error),
                    Err(io_error) => Error::Xml(quick_xml::Error::Io(io_error)),
                },
            error => Error::Xml(error),
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(error: quick_xml::events::attributes::AttrError) -> Self {
        Error::Xml(error.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::Io(error)
    }
}

pub type Result<T> =
    core::result::Result<T, Error>;

pub use config::{
    Unit,
    TriggerMode,
    TriggerSource,
    Slope,
    Channel,
    Trigger,
    Configuration,
    CHANNEL_COUNT,
    DEFAULT_TRIGGER_COMMAND,
};

pub use xml::{
    parse,
    serialize,
    ROOT_TAG,
};

pub use compile::compile;

pub use validate::{
    Issue,
    IssueKind,
};

pub use library::{
    load_file,
    save_file,
    Library,
    DEFAULT_LIBRARY_ROOT,
};

pub use transport::{
    apply,
    with_session,
    Transport,
    Resource,
    ResourceKind,
    SocketTransport,
    RecordingTransport,
    DEFAULT_TIMEOUT,
};
