use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use snafu::prelude::*;

/// The evaluation strategy of a registered dependency.
///
/// A [`Kind`] decides how often a dependency's definition runs and whether
/// its result is kept by the container:
///
/// - [`Kind::Value`] stores an already computed object and hands it out as-is.
/// - [`Kind::Factory`] runs the definition on every request.
/// - [`Kind::Singleton`] runs the definition on the first successful request
///   and caches the result for the lifetime of the owning container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Value,
    Factory,
    Singleton,
}

impl Kind {
    /// Returns the kind an extension of a `self` dependency takes.
    ///
    /// Extending a value promotes it to a singleton, so the extension runs
    /// once and the original value can still be handed to it. Factories and
    /// singletons keep their kind.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use blister::kind::Kind;
    /// assert_eq!(Kind::Value.extended(), Kind::Singleton);
    /// assert_eq!(Kind::Factory.extended(), Kind::Factory);
    /// assert_eq!(Kind::Singleton.extended(), Kind::Singleton);
    /// ```
    pub fn extended(self) -> Self {
        match self {
            Self::Value => Self::Singleton,
            other => other,
        }
    }

    /// Returns the name of the kind in a string literal.
    pub fn to_str(self) -> &'static str {
        match self {
            Self::Value => "Value",
            Self::Factory => "Factory",
            Self::Singleton => "Singleton",
        }
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for Kind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "value" => Ok(Self::Value),
            "factory" => Ok(Self::Factory),
            "singleton" | "service" => Ok(Self::Singleton),
            _ => Err(ParseKindError { name: s.to_owned() }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(display("{name} is not a dependency kind"))]
pub struct ParseKindError {
    name: String,
}
