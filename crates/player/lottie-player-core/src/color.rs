//! Background colour values.

use serde::{Deserialize, Serialize};

use crate::error::PlayerError;

/// 8-bit RGB triple as produced by the colour picker's channel sliders.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Lowercase `#rrggbb`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Background of the rendering container.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Background {
    #[default]
    Transparent,
    /// Normalised `#rrggbb` or `#rrggbbaa`
    Hex(String),
}

impl Background {
    /// Accepts `transparent`, `#rgb`, `#rrggbb`, `#rrggbbaa` and `rgb(r, g, b)`.
    pub fn parse(input: &str) -> crate::Result<Self> {
        let trimmed = input.trim();
        let invalid = || PlayerError::InvalidColor {
            value: input.to_string(),
        };

        if trimmed.eq_ignore_ascii_case("transparent") {
            return Ok(Self::Transparent);
        }
        if let Some(hex) = trimmed.strip_prefix('#') {
            if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            let hex = hex.to_ascii_lowercase();
            return match hex.len() {
                3 => {
                    let expanded: String = hex.chars().flat_map(|c| [c, c]).collect();
                    Ok(Self::Hex(format!("#{expanded}")))
                }
                6 | 8 => Ok(Self::Hex(format!("#{hex}"))),
                _ => Err(invalid()),
            };
        }
        if let Some(body) = trimmed
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let parts: Vec<u8> = body
                .split(',')
                .map(|p| p.trim().parse::<u8>())
                .collect::<Result<_, _>>()
                .map_err(|_| invalid())?;
            if let [r, g, b] = parts[..] {
                return Ok(Self::Hex(Rgb::new(r, g, b).to_hex()));
            }
        }
        Err(invalid())
    }

    #[inline]
    pub fn as_css(&self) -> &str {
        match self {
            Self::Transparent => "transparent",
            Self::Hex(hex) => hex,
        }
    }

    /// Opaque channels, when this is a colour.
    pub fn rgb(&self) -> Option<Rgb> {
        let Self::Hex(hex) = self else {
            return None;
        };
        let channel = |i: usize| u8::from_str_radix(hex.get(1 + 2 * i..3 + 2 * i)?, 16).ok();
        Some(Rgb::new(channel(0)?, channel(1)?, channel(2)?))
    }
}

impl From<Rgb> for Background {
    fn from(rgb: Rgb) -> Self {
        Self::Hex(rgb.to_hex())
    }
}

impl TryFrom<String> for Background {
    type Error = PlayerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Background> for String {
    fn from(background: Background) -> Self {
        background.as_css().to_string()
    }
}
