use serde::Deserialize;

/// Parses `123`, `0x7B` or `0X7b`.
pub fn parse_u64_literal(text: &str) -> Option<u64> {
    let text = text.trim();
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberRepr {
    Int(u64),
    Text(String),
}

impl NumberRepr {
    fn into_u64(self) -> Result<u64, String> {
        match self {
            Self::Int(v) => Ok(v),
            Self::Text(text) => {
                parse_u64_literal(&text).ok_or_else(|| format!("invalid number {text:?}"))
            }
        }
    }
}

/// A `u32` written either as a JSON number or as a decimal/`0x` hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "NumberRepr")]
pub struct LiteralU32(pub u32);

impl TryFrom<NumberRepr> for LiteralU32 {
    type Error = String;

    fn try_from(value: NumberRepr) -> Result<Self, Self::Error> {
        let v = value.into_u64()?;
        u32::try_from(v)
            .map(LiteralU32)
            .map_err(|_| format!("{v} does not fit in u32"))
    }
}

/// A `u64` written either as a JSON number or as a decimal/`0x` hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "NumberRepr")]
pub struct LiteralU64(pub u64);

impl TryFrom<NumberRepr> for LiteralU64 {
    type Error = String;

    fn try_from(value: NumberRepr) -> Result<Self, Self::Error> {
        value.into_u64().map(LiteralU64)
    }
}
