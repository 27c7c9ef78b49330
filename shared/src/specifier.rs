use std::{fmt, str::FromStr};

use thiserror::Error;

/// Errors that can occur while parsing a specifier name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecifierError {
    /// Name is not one of the protocol's state compartments
    #[error("Unknown specifier '{name}'. Specifiers are fixed at session start")]
    Unknown { name: String },
}

// Specifier
/// Named compartment of the shared state a message belongs to.
///
/// The set is closed and known at session start. `Document` is a singleton
/// compartment, every other specifier holds delegates keyed by object index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Specifier {
    Document,
    Tables,
    Entities,
    Plots,
    Signals,
    Methods,
    Materials,
    Lights,
    Geometries,
    Images,
    Samplers,
    Buffers,
    BufferViews,
    Textures,
}

impl Specifier {
    pub const ALL: [Specifier; 14] = [
        Specifier::Document,
        Specifier::Tables,
        Specifier::Entities,
        Specifier::Plots,
        Specifier::Signals,
        Specifier::Methods,
        Specifier::Materials,
        Specifier::Lights,
        Specifier::Geometries,
        Specifier::Images,
        Specifier::Samplers,
        Specifier::Buffers,
        Specifier::BufferViews,
        Specifier::Textures,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Specifier::Document => "document",
            Specifier::Tables => "tables",
            Specifier::Entities => "entities",
            Specifier::Plots => "plots",
            Specifier::Signals => "signals",
            Specifier::Methods => "methods",
            Specifier::Materials => "materials",
            Specifier::Lights => "lights",
            Specifier::Geometries => "geometries",
            Specifier::Images => "images",
            Specifier::Samplers => "samplers",
            Specifier::Buffers => "buffers",
            Specifier::BufferViews => "bufferviews",
            Specifier::Textures => "textures",
        }
    }

    pub fn is_document(&self) -> bool {
        *self == Specifier::Document
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Specifier {
    type Err = SpecifierError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Specifier::ALL
            .iter()
            .find(|specifier| specifier.as_str() == name)
            .copied()
            .ok_or_else(|| SpecifierError::Unknown {
                name: name.to_string(),
            })
    }
}
