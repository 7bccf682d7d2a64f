use std::fs;
use std::path::Path;

use crate::error::{Chip8Error, Result};
use crate::{FONTSET, FONTSET_SIZE};

/// The sixteen hexadecimal digit sprites, five bytes each.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Font {
    glyphs: [u8; FONTSET_SIZE],
}

impl Default for Font {
    fn default() -> Self {
        Font { glyphs: FONTSET }
    }
}

impl Font {
    /// Parse a font source: one byte per line, written as `0xF0`, `0b11110000`,
    /// `0o360` or plain decimal. Blank lines and `#` comments are skipped.
    pub fn parse(source: &str) -> Result<Self> {
        let mut glyphs = [0u8; FONTSET_SIZE];
        let mut count = 0;
        for (lineno, line) in source.lines().enumerate() {
            let token = line.split('#').next().unwrap_or_default().trim();
            if token.is_empty() {
                continue;
            }
            let byte = parse_byte(token).ok_or_else(|| {
                Chip8Error::Init(format!("line {}: invalid byte {:?}", lineno + 1, token))
            })?;
            if count == FONTSET_SIZE {
                return Err(Chip8Error::Init(format!(
                    "more than {} bytes of sprite data",
                    FONTSET_SIZE
                )));
            }
            glyphs[count] = byte;
            count += 1;
        }
        if count != FONTSET_SIZE {
            return Err(Chip8Error::Init(format!(
                "expected {} bytes of sprite data, found {}",
                FONTSET_SIZE, count
            )));
        }
        Ok(Font { glyphs })
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let source = fs::read_to_string(path)?;
        Self::parse(&source)
    }

    pub fn as_bytes(&self) -> &[u8; FONTSET_SIZE] {
        &self.glyphs
    }
}

fn parse_byte(token: &str) -> Option<u8> {
    let lower = token.to_ascii_lowercase();
    let (digits, radix) = if let Some(hex) = lower.strip_prefix("0x") {
        (hex, 16)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        (bin, 2)
    } else if let Some(oct) = lower.strip_prefix("0o") {
        (oct, 8)
    } else {
        (lower.as_str(), 10)
    };
    u8::from_str_radix(digits, radix).ok()
}
