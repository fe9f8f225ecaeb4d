
use std::ops::Range;

/// Paired byte spans of one annotated segment: where its bytes sit in
/// the markup source, and where its contribution sits in the plain text
/// handed to the checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanPair {
    pub source: Range<usize>,
    pub plain: Range<usize>,
}

impl SpanPair {
    pub fn new(source: Range<usize>, plain: Range<usize>) -> Self {
        SpanPair { source, plain }
    }

    /// Extend both spans by a continuation merged into this segment.
    fn grow(&mut self, source_len: usize, plain_len: usize) {
        self.source.end += source_len;
        self.plain.end += plain_len;
    }

    /// Source offset for a plain-text offset inside this segment.
    /// Verbatim segments translate byte-for-byte; replaced segments
    /// clamp to their source start.
    fn source_offset(&self, plain_offset: usize, verbatim: bool) -> usize {
        if verbatim {
            self.source.start + (plain_offset - self.plain.start)
        } else {
            self.source.start
        }
    }

    /// Plain-text offset for a source offset inside this segment, with
    /// the same clamping rule as `source_offset`.
    fn plain_offset(&self, source_offset: usize, verbatim: bool) -> usize {
        if verbatim {
            self.plain.start + (source_offset - self.source.start)
        } else {
            self.plain.start
        }
    }
}

/// How one segment of the source contributes to the plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Source bytes that appear verbatim in the plain text.
    Text,
    /// Source bytes that contribute nothing, or a short synthetic
    /// replacement, to the plain text.
    Markup { interpret_as: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedSegment {
    pub kind: SegmentKind,
    pub span: SpanPair,
}

impl AnnotatedSegment {
    fn is_verbatim(&self) -> bool {
        self.kind == SegmentKind::Text
    }
}

/// Accumulator the markup builders write into.
///
/// Segments are appended in strictly increasing source order; the plain
/// text is the concatenation of the text segments and the `interpret_as`
/// replacements of the markup segments. Adjacent text segments and
/// adjacent replacement-free markup segments are merged.
#[derive(Debug, Default)]
pub struct AnnotatedTextBuilder {
    segments: Vec<AnnotatedSegment>,
    plain_text: String,
    source_pos: usize,
}

impl AnnotatedTextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append plain text originating from the next `text.len()` source bytes.
    pub fn add_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }

        if let Some(last) = self.segments.last_mut() {
            if last.kind == SegmentKind::Text {
                last.span.grow(text.len(), text.len());
                self.plain_text.push_str(text);
                self.source_pos += text.len();
                return;
            }
        }

        let span = SpanPair::new(
            self.source_pos..self.source_pos + text.len(),
            self.plain_text.len()..self.plain_text.len() + text.len(),
        );
        self.plain_text.push_str(text);
        self.source_pos += text.len();
        self.segments.push(AnnotatedSegment {
            kind: SegmentKind::Text,
            span,
        });
    }

    /// Attribute the next `markup.len()` source bytes to no plain text.
    pub fn add_markup(&mut self, markup: &str) {
        if markup.is_empty() {
            return;
        }

        if let Some(last) = self.segments.last_mut() {
            if matches!(&last.kind, SegmentKind::Markup { interpret_as } if interpret_as.is_empty())
            {
                last.span.grow(markup.len(), 0);
                self.source_pos += markup.len();
                return;
            }
        }

        let span = SpanPair::new(
            self.source_pos..self.source_pos + markup.len(),
            self.plain_text.len()..self.plain_text.len(),
        );
        self.source_pos += markup.len();
        self.segments.push(AnnotatedSegment {
            kind: SegmentKind::Markup {
                interpret_as: String::new(),
            },
            span,
        });
    }

    /// Attribute the next `markup.len()` source bytes to the replacement
    /// text `interpret_as`. The markup may be empty for purely synthetic
    /// insertions.
    pub fn add_markup_as(&mut self, markup: &str, interpret_as: &str) {
        if interpret_as.is_empty() {
            self.add_markup(markup);
            return;
        }

        let span = SpanPair::new(
            self.source_pos..self.source_pos + markup.len(),
            self.plain_text.len()..self.plain_text.len() + interpret_as.len(),
        );
        self.plain_text.push_str(interpret_as);
        self.source_pos += markup.len();
        self.segments.push(AnnotatedSegment {
            kind: SegmentKind::Markup {
                interpret_as: interpret_as.to_string(),
            },
            span,
        });
    }

    pub fn build(self) -> AnnotatedText {
        AnnotatedText {
            segments: self.segments,
            plain_text: self.plain_text,
        }
    }
}

/// The finished annotated text: the plain-text projection handed to the
/// checker plus the segment list mapping it back to the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedText {
    segments: Vec<AnnotatedSegment>,
    plain_text: String,
}

impl AnnotatedText {
    pub fn plain_text(&self) -> &str {
        &self.plain_text
    }

    pub fn segments(&self) -> &[AnnotatedSegment] {
        &self.segments
    }

    /// Map an offset in the plain text back to a source offset.
    ///
    /// Offsets inside a markup replacement clamp to the start of the
    /// markup's source span; offsets past the end clamp to the end of
    /// the last segment.
    pub fn source_offset_for_plain(&self, plain_offset: usize) -> usize {
        let idx = self
            .segments
            .partition_point(|segment| segment.span.plain.end <= plain_offset);

        match self.segments.get(idx) {
            Some(segment) => segment.span.source_offset(plain_offset, segment.is_verbatim()),
            None => self
                .segments
                .last()
                .map(|segment| segment.span.source.end)
                .unwrap_or(0),
        }
    }

    /// Map a source offset to an offset in the plain text.
    ///
    /// Offsets inside a markup segment clamp to the plain-text position
    /// of its replacement; offsets past the end clamp to the plain-text
    /// length.
    pub fn plain_offset_for_source(&self, source_offset: usize) -> usize {
        let idx = self
            .segments
            .partition_point(|segment| segment.span.source.end <= source_offset);

        match self.segments.get(idx) {
            Some(segment) => segment.span.plain_offset(source_offset, segment.is_verbatim()),
            None => self.plain_text.len(),
        }
    }
}
