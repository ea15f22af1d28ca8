//! Vertex attribute semantics (`POSITION`, `TEXCOORD_0`, ...).

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Attribute semantic of a primitive. Numbered sets may go beyond `_1`;
/// names outside the standard set are kept verbatim.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Semantic {
    Positions,
    Normals,
    Tangents,
    TexCoords(u32),
    Colors(u32),
    Joints(u32),
    Weights(u32),
    Custom(String),
}

impl Semantic {
    fn numbered(name: &str) -> Option<Self> {
        let (prefix, set) = name.rsplit_once('_')?;
        // Signs and leading zeros would not survive Display.
        if set.is_empty() || !set.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if set.len() > 1 && set.starts_with('0') {
            return None;
        }
        let set: u32 = set.parse().ok()?;
        match prefix {
            "TEXCOORD" => Some(Self::TexCoords(set)),
            "COLOR" => Some(Self::Colors(set)),
            "JOINTS" => Some(Self::Joints(set)),
            "WEIGHTS" => Some(Self::Weights(set)),
            _ => None,
        }
    }
}

impl FromStr for Semantic {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "POSITION" => Self::Positions,
            "NORMAL" => Self::Normals,
            "TANGENT" => Self::Tangents,
            _ => Self::numbered(s).unwrap_or_else(|| Self::Custom(s.to_owned())),
        })
    }
}

impl From<&str> for Semantic {
    fn from(name: &str) -> Self {
        match name.parse() {
            Ok(semantic) => semantic,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for Semantic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positions => f.write_str("POSITION"),
            Self::Normals => f.write_str("NORMAL"),
            Self::Tangents => f.write_str("TANGENT"),
            Self::TexCoords(n) => write!(f, "TEXCOORD_{n}"),
            Self::Colors(n) => write!(f, "COLOR_{n}"),
            Self::Joints(n) => write!(f, "JOINTS_{n}"),
            Self::Weights(n) => write!(f, "WEIGHTS_{n}"),
            Self::Custom(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_names() {
        assert_eq!(Semantic::from("POSITION"), Semantic::Positions);
        assert_eq!(Semantic::from("TEXCOORD_1"), Semantic::TexCoords(1));
        assert_eq!(Semantic::from("COLOR_0"), Semantic::Colors(0));
        assert_eq!(Semantic::from("JOINTS_0"), Semantic::Joints(0));
        assert_eq!(Semantic::from("WEIGHTS_0"), Semantic::Weights(0));
    }

    #[test]
    fn higher_sets_and_custom_names() {
        assert_eq!(Semantic::from("TEXCOORD_12"), Semantic::TexCoords(12));
        assert_eq!(Semantic::from("_TEMPERATURE"), Semantic::Custom("_TEMPERATURE".into()));
        assert_eq!(Semantic::from("TEXCOORD_"), Semantic::Custom("TEXCOORD_".into()));
        assert_eq!(Semantic::from("COLOR_01"), Semantic::Custom("COLOR_01".into()));
    }

    #[test]
    fn display_gives_back_the_name() {
        for name in ["POSITION", "NORMAL", "TANGENT", "TEXCOORD_3", "WEIGHTS_0", "_ID"] {
            assert_eq!(Semantic::from(name).to_string(), name);
        }
    }
}
