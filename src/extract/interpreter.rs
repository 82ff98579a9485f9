//! Content-stream text interpreter.
//!
//! Walks a page's decoded operations tracking the graphics and text state
//! the way a viewer would: `cm` concatenates onto the CTM, `BT`/`Tm`/`Td`/
//! `TD`/`T*` drive the text and line matrices, and the show operators
//! (`Tj`, `TJ`, `'`, `"`) emit glyphs whose device-space rectangles are
//! grouped into words. Form XObjects are recursed with their own matrix
//! and resources.
//!
//! All geometry leaves this module in text-extraction space (top-left
//! origin, Y down), flipped against the page height.

use std::collections::HashMap;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};

use super::fonts::{font_map_from_resources, FontMetrics};
use super::Word;
use crate::geometry::TextSpaceBox;
use crate::page::{number, resolve_ref};

/// Nested form XObjects deeper than this are ignored.
const MAX_FORM_DEPTH: usize = 8;

/// Horizontal gap, as a fraction of glyph height, that splits two glyphs
/// into separate words.
const WORD_GAP_FACTOR: f64 = 0.25;

#[derive(Debug, Clone, Copy)]
struct Matrix {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Matrix {
    fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    fn translate(tx: f64, ty: f64) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::identity()
        }
    }

    /// Row-vector composition: apply `self`, then `m`.
    fn then(self, m: Matrix) -> Matrix {
        Matrix {
            a: self.a * m.a + self.b * m.c,
            b: self.a * m.b + self.b * m.d,
            c: self.c * m.a + self.d * m.c,
            d: self.c * m.b + self.d * m.d,
            e: self.e * m.a + self.f * m.c + m.e,
            f: self.e * m.b + self.f * m.d + m.f,
        }
    }

    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }
}

#[derive(Debug, Clone)]
struct TextState {
    font: Option<String>,
    size: f64,
    char_spacing: f64,
    word_spacing: f64,
    horiz_scaling: f64,
    leading: f64,
    rise: f64,
    text_matrix: Matrix,
    line_matrix: Matrix,
}

impl TextState {
    fn new() -> Self {
        Self {
            font: None,
            size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horiz_scaling: 100.0,
            leading: 0.0,
            rise: 0.0,
            text_matrix: Matrix::identity(),
            line_matrix: Matrix::identity(),
        }
    }

    fn next_line(&mut self) {
        self.line_matrix = Matrix::translate(0.0, -self.leading).then(self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    /// Advances the text matrix along the baseline by `distance` text
    /// space units.
    fn advance(&mut self, distance: f64) {
        self.text_matrix = Matrix::translate(distance, 0.0).then(self.text_matrix);
    }
}

/// Device-space extent of one or more glyphs (Y up).
#[derive(Debug, Clone, Copy)]
struct DeviceRect {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl DeviceRect {
    fn union(self, other: DeviceRect) -> DeviceRect {
        DeviceRect {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

struct PendingWord {
    text: String,
    rect: DeviceRect,
    baseline: f64,
}

/// Groups emitted glyphs into words and flips finished words into
/// text-extraction space.
struct WordAccumulator {
    page_height: f64,
    words: Vec<Word>,
    current: Option<PendingWord>,
}

impl WordAccumulator {
    fn new(page_height: f64) -> Self {
        Self {
            page_height,
            words: Vec::new(),
            current: None,
        }
    }

    fn push_glyph(&mut self, text: Option<&str>, rect: DeviceRect, baseline: f64) {
        let is_whitespace = text.map_or(false, |t| t.trim().is_empty());
        if is_whitespace {
            self.flush();
            return;
        }

        if let Some(current) = &self.current {
            let gap = rect.min_x - current.rect.max_x;
            let gap_limit = WORD_GAP_FACTOR * rect.height().max(current.rect.height());
            let line_break = (baseline - current.baseline).abs() > 0.5 * rect.height().max(1e-6);
            // Small negative gaps are kerning; a large jump backwards is a
            // new column or line.
            if line_break || gap > gap_limit || gap < -4.0 * gap_limit {
                self.flush();
            }
        }

        if let Some(current) = &mut self.current {
            current.rect = current.rect.union(rect);
            if let Some(t) = text {
                current.text.push_str(t);
            }
        } else if let Some(t) = text {
            self.current = Some(PendingWord {
                text: t.to_string(),
                rect,
                baseline,
            });
        }
        // An unmappable glyph cannot start a word on its own.
    }

    fn flush(&mut self) {
        if let Some(pending) = self.current.take() {
            if pending.text.is_empty() {
                return;
            }
            self.words.push(Word {
                text: pending.text,
                bbox: TextSpaceBox {
                    x: pending.rect.min_x,
                    y: self.page_height - pending.rect.max_y,
                    width: pending.rect.max_x - pending.rect.min_x,
                    height: pending.rect.height(),
                },
            });
        }
    }

    fn finish(mut self) -> Vec<Word> {
        self.flush();
        self.words
    }
}

/// Extracts the words of one page, in content-stream order, with boxes in
/// text-extraction space. Returns a reason string on decode failure; the
/// caller attaches the page number.
pub(crate) fn collect_page_words(
    doc: &Document,
    page_id: ObjectId,
    page_height: f64,
) -> Result<Vec<Word>, String> {
    let content_data = doc
        .get_page_content(page_id)
        .map_err(|e| format!("unreadable content stream: {e}"))?;
    let content =
        Content::decode(&content_data).map_err(|e| format!("undecodable content stream: {e}"))?;

    let resources = page_resources(doc, page_id);
    let fonts = font_map_from_resources(doc, &resources);

    let mut accumulator = WordAccumulator::new(page_height);
    run_operations(
        doc,
        &content,
        &resources,
        &fonts,
        Matrix::identity(),
        &mut accumulator,
        0,
    );
    Ok(accumulator.finish())
}

/// Merges inherited and direct resource dictionaries for a page.
fn page_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    let mut merged = Dictionary::new();
    let (direct, inherited_ids) = doc.get_page_resources(page_id);
    for id in inherited_ids {
        if let Ok(dict) = doc.get_dictionary(id) {
            for (key, value) in dict.iter() {
                merged.set(key.clone(), value.clone());
            }
        }
    }
    if let Some(dict) = direct {
        for (key, value) in dict.iter() {
            merged.set(key.clone(), value.clone());
        }
    }
    merged
}

#[allow(clippy::too_many_arguments)]
fn run_operations(
    doc: &Document,
    content: &Content,
    resources: &Dictionary,
    fonts: &HashMap<String, FontMetrics>,
    base_ctm: Matrix,
    accumulator: &mut WordAccumulator,
    depth: usize,
) {
    let mut ctm = base_ctm;
    let mut ctm_stack: Vec<Matrix> = Vec::new();
    let mut state = TextState::new();
    let mut state_stack: Vec<TextState> = Vec::new();

    for op in &content.operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "q" => {
                ctm_stack.push(ctm);
                state_stack.push(state.clone());
            }
            "Q" => {
                if let Some(previous) = ctm_stack.pop() {
                    ctm = previous;
                }
                if let Some(previous) = state_stack.pop() {
                    state = previous;
                }
            }
            "cm" => {
                if let Some(m) = matrix_operands(operands) {
                    ctm = m.then(ctm);
                }
            }
            "BT" => {
                state.text_matrix = Matrix::identity();
                state.line_matrix = Matrix::identity();
            }
            "ET" => {}
            "Tf" => {
                if operands.len() >= 2 {
                    if let Ok(name) = operands[0].as_name() {
                        state.font = Some(String::from_utf8_lossy(name).into_owned());
                    }
                    state.size = number(&operands[1]).unwrap_or(0.0);
                }
            }
            "Tm" => {
                if let Some(m) = matrix_operands(operands) {
                    state.text_matrix = m;
                    state.line_matrix = m;
                }
            }
            "Td" => {
                if operands.len() == 2 {
                    let tx = number(&operands[0]).unwrap_or(0.0);
                    let ty = number(&operands[1]).unwrap_or(0.0);
                    state.line_matrix = Matrix::translate(tx, ty).then(state.line_matrix);
                    state.text_matrix = state.line_matrix;
                }
            }
            "TD" => {
                if operands.len() == 2 {
                    let tx = number(&operands[0]).unwrap_or(0.0);
                    let ty = number(&operands[1]).unwrap_or(0.0);
                    state.leading = -ty;
                    state.line_matrix = Matrix::translate(tx, ty).then(state.line_matrix);
                    state.text_matrix = state.line_matrix;
                }
            }
            "T*" => state.next_line(),
            "TL" => {
                if let Some(v) = operands.first().and_then(number) {
                    state.leading = v;
                }
            }
            "Tc" => {
                if let Some(v) = operands.first().and_then(number) {
                    state.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = operands.first().and_then(number) {
                    state.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = operands.first().and_then(number) {
                    state.horiz_scaling = v;
                }
            }
            "Ts" => {
                if let Some(v) = operands.first().and_then(number) {
                    state.rise = v;
                }
            }
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    show_text(fonts, &mut state, &ctm, bytes, accumulator);
                }
            }
            "'" => {
                state.next_line();
                if let Some(Object::String(bytes, _)) = operands.first() {
                    show_text(fonts, &mut state, &ctm, bytes, accumulator);
                }
            }
            "\"" => {
                if operands.len() >= 3 {
                    state.word_spacing = number(&operands[0]).unwrap_or(0.0);
                    state.char_spacing = number(&operands[1]).unwrap_or(0.0);
                    state.next_line();
                    if let Object::String(bytes, _) = &operands[2] {
                        show_text(fonts, &mut state, &ctm, bytes, accumulator);
                    }
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    for item in items {
                        match item {
                            Object::String(bytes, _) => {
                                show_text(fonts, &mut state, &ctm, bytes, accumulator);
                            }
                            other => {
                                if let Some(kern) = number(other) {
                                    let adjust = (-kern / 1000.0)
                                        * state.size
                                        * (state.horiz_scaling / 100.0);
                                    state.advance(adjust);
                                }
                            }
                        }
                    }
                }
            }
            "Do" => {
                if depth < MAX_FORM_DEPTH {
                    if let Some(Object::Name(name)) = operands.first() {
                        run_form_xobject(doc, resources, name, ctm, accumulator, depth);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Recurses into a Form XObject with its own matrix, resources, and fonts.
fn run_form_xobject(
    doc: &Document,
    resources: &Dictionary,
    name: &[u8],
    ctm: Matrix,
    accumulator: &mut WordAccumulator,
    depth: usize,
) {
    let Some(Object::Dictionary(xobjects)) = resources
        .get(b"XObject")
        .ok()
        .map(|o| resolve_ref(doc, o))
    else {
        return;
    };
    let Ok(entry) = xobjects.get(name) else {
        return;
    };
    let Object::Stream(stream) = resolve_ref(doc, entry) else {
        return;
    };

    let is_form = stream
        .dict
        .get(b"Subtype")
        .ok()
        .and_then(|o| o.as_name().ok())
        .map_or(false, |s| s == b"Form");
    if !is_form {
        return;
    }

    let form_matrix = stream
        .dict
        .get(b"Matrix")
        .ok()
        .map(|o| resolve_ref(doc, o))
        .and_then(|o| match o {
            Object::Array(items) => matrix_operands(items),
            _ => None,
        })
        .unwrap_or_else(Matrix::identity);

    let form_resources = match stream.dict.get(b"Resources").ok().map(|o| resolve_ref(doc, o)) {
        Some(Object::Dictionary(dict)) => dict.clone(),
        _ => resources.clone(),
    };
    let form_fonts = font_map_from_resources(doc, &form_resources);

    let Ok(bytes) = stream.decompressed_content() else {
        return;
    };
    let Ok(content) = Content::decode(&bytes) else {
        return;
    };

    run_operations(
        doc,
        &content,
        &form_resources,
        &form_fonts,
        form_matrix.then(ctm),
        accumulator,
        depth + 1,
    );
}

fn matrix_operands(operands: &[Object]) -> Option<Matrix> {
    if operands.len() != 6 {
        return None;
    }
    Some(Matrix {
        a: number(&operands[0])?,
        b: number(&operands[1])?,
        c: number(&operands[2])?,
        d: number(&operands[3])?,
        e: number(&operands[4])?,
        f: number(&operands[5])?,
    })
}

/// Shows one string operand: emits a glyph rectangle per code and advances
/// the text matrix by the glyph's scaled width plus spacing.
fn show_text(
    fonts: &HashMap<String, FontMetrics>,
    state: &mut TextState,
    ctm: &Matrix,
    bytes: &[u8],
    accumulator: &mut WordAccumulator,
) {
    let Some(font_name) = &state.font else {
        return;
    };
    let Some(font) = fonts.get(font_name) else {
        return;
    };

    for code in font.codes(bytes) {
        let width = font.width_fraction(code);
        let decoded = font.decode(code);

        // Text rendering matrix: font parameters, then the text matrix,
        // then the CTM.
        let scale = Matrix {
            a: state.size * (state.horiz_scaling / 100.0),
            b: 0.0,
            c: 0.0,
            d: state.size,
            e: 0.0,
            f: state.rise,
        };
        let trm = scale.then(state.text_matrix).then(*ctm);

        let corners = [
            trm.apply(0.0, font.descent),
            trm.apply(width, font.descent),
            trm.apply(width, font.ascent),
            trm.apply(0.0, font.ascent),
        ];
        let rect = DeviceRect {
            min_x: corners.iter().map(|c| c.0).fold(f64::INFINITY, f64::min),
            max_x: corners.iter().map(|c| c.0).fold(f64::NEG_INFINITY, f64::max),
            min_y: corners.iter().map(|c| c.1).fold(f64::INFINITY, f64::min),
            max_y: corners.iter().map(|c| c.1).fold(f64::NEG_INFINITY, f64::max),
        };
        let (_, baseline) = trm.apply(0.0, 0.0);

        accumulator.push_glyph(decoded.as_deref(), rect, baseline);

        let apply_word_spacing = !font.is_two_byte() && code == 0x20;
        let mut advance = width * state.size + state.char_spacing;
        if apply_word_spacing {
            advance += state.word_spacing;
        }
        state.advance(advance * (state.horiz_scaling / 100.0));
    }
}
