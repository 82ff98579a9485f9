//! Font width tables and text decoding for the content interpreter.
//!
//! Only the metrics that geometry extraction needs are loaded: glyph
//! advance widths, vertical extents, and a code-to-unicode mapping. Simple
//! fonts read `FirstChar`/`Widths` with `MissingWidth` as fallback; Type0
//! (CID) fonts read the descendant's `W`/`DW`. Text decodes through the
//! font's `ToUnicode` CMap when present, byte-as-Latin-1 otherwise.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object};

use crate::page::{number, resolve_ref};

/// Glyph-space values are expressed in thousandths of text space.
const GLYPH_UNITS: f64 = 1000.0;

/// Advance width assumed when a font provides no usable width for a code.
const FALLBACK_WIDTH: f64 = 500.0;

/// Vertical extents assumed when the font descriptor carries none.
const FALLBACK_ASCENT: f64 = 800.0;
const FALLBACK_DESCENT: f64 = -200.0;

/// The subset of font information the interpreter consumes.
#[derive(Debug, Clone)]
pub struct FontMetrics {
    /// Two-byte codes (Type0/CID); single-byte otherwise.
    two_byte: bool,
    first_char: u32,
    widths: Vec<f64>,
    missing_width: f64,
    /// Per-CID widths from the descendant font's `W` array.
    cid_widths: HashMap<u32, f64>,
    /// `DW` default for CID codes absent from `W`.
    default_width: f64,
    to_unicode: Option<HashMap<u32, String>>,
    /// Ascent/descent in text-space fractions of the font size.
    pub ascent: f64,
    pub descent: f64,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            two_byte: false,
            first_char: 0,
            widths: Vec::new(),
            missing_width: FALLBACK_WIDTH,
            cid_widths: HashMap::new(),
            default_width: GLYPH_UNITS,
            to_unicode: None,
            ascent: FALLBACK_ASCENT / GLYPH_UNITS,
            descent: FALLBACK_DESCENT / GLYPH_UNITS,
        }
    }
}

impl FontMetrics {
    /// Loads metrics from a font dictionary.
    pub fn from_dict(doc: &Document, font: &Dictionary) -> Self {
        let mut metrics = Self::default();

        let subtype = font
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok())
            .unwrap_or(b"");

        if subtype == b"Type0" {
            metrics.two_byte = true;
            if let Some(descendant) = descendant_font(doc, font) {
                metrics.default_width = descendant
                    .get(b"DW")
                    .ok()
                    .map(|o| resolve_ref(doc, o))
                    .and_then(number)
                    .unwrap_or(GLYPH_UNITS);
                if let Ok(w) = descendant.get(b"W") {
                    if let Object::Array(items) = resolve_ref(doc, w) {
                        metrics.cid_widths = parse_cid_widths(doc, items);
                    }
                }
                load_descriptor(doc, &descendant, &mut metrics);
            }
        } else {
            metrics.first_char = font
                .get(b"FirstChar")
                .ok()
                .and_then(number)
                .unwrap_or(0.0) as u32;
            if let Ok(w) = font.get(b"Widths") {
                if let Object::Array(items) = resolve_ref(doc, w) {
                    metrics.widths = items
                        .iter()
                        .map(|o| number(resolve_ref(doc, o)).unwrap_or(0.0))
                        .collect();
                }
            }
            load_descriptor(doc, font, &mut metrics);
        }

        if let Ok(obj) = font.get(b"ToUnicode") {
            if let Object::Stream(stream) = resolve_ref(doc, obj) {
                if let Ok(data) = stream.decompressed_content() {
                    let map = parse_to_unicode(&data);
                    if !map.is_empty() {
                        metrics.to_unicode = Some(map);
                    }
                }
            }
        }

        metrics
    }

    /// Advance width for a code, in glyph-space units (1/1000 text space).
    pub fn width(&self, code: u32) -> f64 {
        if self.two_byte {
            return *self.cid_widths.get(&code).unwrap_or(&self.default_width);
        }
        let index = code.wrapping_sub(self.first_char) as usize;
        match self.widths.get(index) {
            Some(w) if *w > 0.0 => *w,
            _ => self.missing_width,
        }
    }

    /// Advance width as a fraction of the font size.
    pub fn width_fraction(&self, code: u32) -> f64 {
        self.width(code) / GLYPH_UNITS
    }

    /// True for Type0 fonts, whose string operands hold two-byte codes.
    /// Word spacing only ever applies to single-byte code 32.
    pub fn is_two_byte(&self) -> bool {
        self.two_byte
    }

    /// Splits a string operand into character codes.
    pub fn codes(&self, bytes: &[u8]) -> Vec<u32> {
        if self.two_byte {
            bytes
                .chunks(2)
                .map(|c| {
                    if c.len() == 2 {
                        (u32::from(c[0]) << 8) | u32::from(c[1])
                    } else {
                        u32::from(c[0])
                    }
                })
                .collect()
        } else {
            bytes.iter().map(|b| u32::from(*b)).collect()
        }
    }

    /// Decodes one code to text. Codes without a `ToUnicode` entry fall
    /// back to Latin-1 for single-byte fonts and are dropped for CID
    /// fonts, where the code carries no portable meaning.
    pub fn decode(&self, code: u32) -> Option<String> {
        if let Some(map) = &self.to_unicode {
            if let Some(text) = map.get(&code) {
                return Some(text.clone());
            }
        }
        if !self.two_byte && code <= 0xFF {
            // Latin-1 coincides with the first Unicode block, close enough
            // for the standard single-byte encodings.
            return char::from_u32(code).map(String::from);
        }
        None
    }
}

fn descendant_font(doc: &Document, font: &Dictionary) -> Option<Dictionary> {
    let obj = font.get(b"DescendantFonts").ok()?;
    if let Object::Array(items) = resolve_ref(doc, obj) {
        let first = items.first()?;
        if let Object::Dictionary(dict) = resolve_ref(doc, first) {
            return Some(dict.clone());
        }
    }
    None
}

fn load_descriptor(doc: &Document, font: &Dictionary, metrics: &mut FontMetrics) {
    let Ok(obj) = font.get(b"FontDescriptor") else {
        return;
    };
    let Object::Dictionary(descriptor) = resolve_ref(doc, obj) else {
        return;
    };
    if let Some(w) = descriptor.get(b"MissingWidth").ok().and_then(number) {
        if w > 0.0 {
            metrics.missing_width = w;
        }
    }
    if let Some(a) = descriptor.get(b"Ascent").ok().and_then(number) {
        if a > 0.0 {
            metrics.ascent = a / GLYPH_UNITS;
        }
    }
    if let Some(d) = descriptor.get(b"Descent").ok().and_then(number) {
        if d < 0.0 {
            metrics.descent = d / GLYPH_UNITS;
        }
    }
}

/// Parses the CID `W` array: `c [w1 w2 ...]` runs and `cfirst clast w`
/// ranges, freely mixed.
fn parse_cid_widths(doc: &Document, items: &[Object]) -> HashMap<u32, f64> {
    let mut widths = HashMap::new();
    let mut i = 0;
    while i < items.len() {
        let Some(first) = number(resolve_ref(doc, &items[i])) else {
            break;
        };
        match items.get(i + 1).map(|o| resolve_ref(doc, o)) {
            Some(Object::Array(run)) => {
                for (offset, w) in run.iter().enumerate() {
                    if let Some(w) = number(resolve_ref(doc, w)) {
                        widths.insert(first as u32 + offset as u32, w);
                    }
                }
                i += 2;
            }
            Some(obj) => {
                let Some(last) = number(obj) else { break };
                let Some(w) = items.get(i + 2).and_then(|o| number(resolve_ref(doc, o))) else {
                    break;
                };
                let (lo, hi) = (first as u32, last as u32);
                if hi >= lo && hi - lo <= u16::MAX as u32 {
                    for code in lo..=hi {
                        widths.insert(code, w);
                    }
                }
                i += 3;
            }
            None => break,
        }
    }
    widths
}

/// Minimal ToUnicode CMap reader: bfchar and bfrange sections only, which
/// is what real-world generators emit.
fn parse_to_unicode(data: &[u8]) -> HashMap<u32, String> {
    let mut map = HashMap::new();
    let text = String::from_utf8_lossy(data);
    let mut rest = text.as_ref();

    while let Some(start) = rest.find("beginbfchar") {
        let body = &rest[start + "beginbfchar".len()..];
        let end = body.find("endbfchar").unwrap_or(body.len());
        let mut tokens = hex_tokens(&body[..end]).into_iter();
        while let (Some(src), Some(dst)) = (tokens.next(), tokens.next()) {
            if let (Some(code), Some(text)) = (hex_code(&src), hex_utf16(&dst)) {
                map.insert(code, text);
            }
        }
        rest = &body[end..];
    }

    let mut rest = text.as_ref();
    while let Some(start) = rest.find("beginbfrange") {
        let body = &rest[start + "beginbfrange".len()..];
        let end = body.find("endbfrange").unwrap_or(body.len());
        parse_bfrange(&body[..end], &mut map);
        rest = &body[end..];
    }

    map
}

fn parse_bfrange(body: &str, map: &mut HashMap<u32, String>) {
    let mut tokens: Vec<RangeToken> = Vec::new();
    let mut rest = body;

    loop {
        let hex_at = rest.find('<');
        let array_at = rest.find('[');
        match (hex_at, array_at) {
            (Some(h), a) if a.map_or(true, |a| h < a) => {
                let after = &rest[h + 1..];
                let Some(end) = after.find('>') else { break };
                tokens.push(RangeToken::Hex(after[..end].to_string()));
                rest = &after[end + 1..];
            }
            (_, Some(a)) => {
                let after = &rest[a + 1..];
                let Some(end) = after.find(']') else { break };
                tokens.push(RangeToken::Array(hex_tokens(&after[..end])));
                rest = &after[end + 1..];
            }
            (None, None) => break,
            (Some(_), None) => unreachable!(),
        }
    }

    let mut i = 0;
    while i + 2 < tokens.len() {
        let (Some(RangeToken::Hex(lo)), Some(RangeToken::Hex(hi))) =
            (tokens.get(i), tokens.get(i + 1))
        else {
            break;
        };
        let (Some(lo), Some(hi)) = (hex_code(lo), hex_code(hi)) else {
            break;
        };
        match tokens.get(i + 2) {
            Some(RangeToken::Hex(dst)) => {
                if let Some(base) = hex_code(dst) {
                    if hi >= lo && hi - lo <= u16::MAX as u32 {
                        for (offset, code) in (lo..=hi).enumerate() {
                            if let Some(c) = char::from_u32(base + offset as u32) {
                                map.insert(code, c.to_string());
                            }
                        }
                    }
                }
                i += 3;
            }
            Some(RangeToken::Array(dsts)) => {
                for (offset, dst) in dsts.iter().enumerate() {
                    if let Some(text) = hex_utf16(dst) {
                        map.insert(lo + offset as u32, text);
                    }
                }
                i += 3;
            }
            None => break,
        }
    }
}

enum RangeToken {
    Hex(String),
    Array(Vec<String>),
}

/// Collects the contents of `<...>` groups in order.
fn hex_tokens(body: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut rest = body;
    while let Some(start) = rest.find('<') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('>') else { break };
        tokens.push(after[..end].to_string());
        rest = &after[end + 1..];
    }
    tokens
}

fn hex_code(token: &str) -> Option<u32> {
    u32::from_str_radix(token.trim(), 16).ok()
}

/// Decodes a hex token as UTF-16BE text.
fn hex_utf16(token: &str) -> Option<String> {
    let digits: String = token.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.len() % 4 != 0 || digits.is_empty() {
        // A bare 2-digit destination is a single byte code point.
        if digits.len() == 2 {
            let code = u32::from_str_radix(&digits, 16).ok()?;
            return char::from_u32(code).map(String::from);
        }
        return None;
    }
    let units: Option<Vec<u16>> = digits
        .as_bytes()
        .chunks(4)
        .map(|c| {
            let s = std::str::from_utf8(c).ok()?;
            u16::from_str_radix(s, 16).ok()
        })
        .collect();
    String::from_utf16(&units?).ok()
}

/// Builds the name-to-metrics map for a resource dictionary's `Font`
/// entry.
pub fn font_map_from_resources(doc: &Document, resources: &Dictionary) -> HashMap<String, FontMetrics> {
    let mut fonts = HashMap::new();
    let Ok(obj) = resources.get(b"Font") else {
        return fonts;
    };
    if let Object::Dictionary(font_dict) = resolve_ref(doc, obj) {
        for (name, entry) in font_dict.iter() {
            if let Object::Dictionary(font) = resolve_ref(doc, entry) {
                fonts.insert(
                    String::from_utf8_lossy(name).into_owned(),
                    FontMetrics::from_dict(doc, font),
                );
            }
        }
    }
    fonts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_font_width_lookup() {
        let metrics = FontMetrics {
            first_char: 65,
            widths: vec![600.0, 650.0],
            missing_width: 500.0,
            ..Default::default()
        };
        assert_eq!(metrics.width(65), 600.0);
        assert_eq!(metrics.width(66), 650.0);
        assert_eq!(metrics.width(90), 500.0);
        assert_eq!(metrics.width(10), 500.0);
    }

    #[test]
    fn test_latin1_fallback_decoding() {
        let metrics = FontMetrics::default();
        assert_eq!(metrics.decode(b'S' as u32).as_deref(), Some("S"));
        assert_eq!(metrics.decode(0xE9).as_deref(), Some("é"));
    }

    #[test]
    fn test_bfchar_parsing() {
        let cmap = b"begincmap\n2 beginbfchar\n<0041> <0053>\n<0042> <0065>\nendbfchar\nendcmap";
        let map = parse_to_unicode(cmap);
        assert_eq!(map.get(&0x41).map(String::as_str), Some("S"));
        assert_eq!(map.get(&0x42).map(String::as_str), Some("e"));
    }

    #[test]
    fn test_bfrange_parsing() {
        let cmap = b"1 beginbfrange\n<0010> <0012> <0061>\nendbfrange";
        let map = parse_to_unicode(cmap);
        assert_eq!(map.get(&0x10).map(String::as_str), Some("a"));
        assert_eq!(map.get(&0x11).map(String::as_str), Some("b"));
        assert_eq!(map.get(&0x12).map(String::as_str), Some("c"));
    }

    #[test]
    fn test_bfrange_array_destinations() {
        let cmap = b"1 beginbfrange\n<0001> <0002> [<0058> <0059>]\nendbfrange";
        let map = parse_to_unicode(cmap);
        assert_eq!(map.get(&1).map(String::as_str), Some("X"));
        assert_eq!(map.get(&2).map(String::as_str), Some("Y"));
    }

    #[test]
    fn test_two_byte_codes() {
        let metrics = FontMetrics {
            two_byte: true,
            ..Default::default()
        };
        assert_eq!(metrics.codes(&[0x00, 0x41, 0x01, 0x02]), vec![0x41, 0x0102]);
    }
}
