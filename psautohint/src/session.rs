//! Per-font hinting session.

use bez_types::{Fixed, Point};

use crate::{
    arena::DEFAULT_ARENA_CAPACITY,
    builder::{PathBuilder, Transform},
    classify::{self, Axis},
    edit,
    error::HintError,
    font::FontContext,
    path::{ElementKind, Hint, Path},
    report::{ReportSink, Reporter},
    synth,
};

/// Phase of glyph processing.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum GlyphState {
    /// Waiting for the next glyph.
    #[default]
    Idle,
    Parsing,
    Building,
    Editing,
    Classifying,
    Synthesising,
    Reporting,
}

/// A command of a hinted outline, in absolute coordinates.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OutlineCommand {
    MoveTo(Point<Fixed>),
    LineTo(Point<Fixed>),
    CurveTo {
        c1: Point<Fixed>,
        c2: Point<Fixed>,
        end: Point<Fixed>,
        /// Set on the second curve of a flex pair.
        flex: bool,
    },
    Close,
}

impl OutlineCommand {
    /// End point, or `None` for [`OutlineCommand::Close`].
    pub fn end(&self) -> Option<Point<Fixed>> {
        match self {
            Self::MoveTo(p) | Self::LineTo(p) => Some(*p),
            Self::CurveTo { end, .. } => Some(*end),
            Self::Close => None,
        }
    }
}

/// Hints that replace the active set starting at an outline command.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocalHints {
    /// Index into [`HintedGlyph::outline`].
    pub ordinal: usize,
    pub hints: Vec<Hint>,
}

/// Result of hinting one glyph.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HintedGlyph {
    pub name: Option<String>,
    /// The edited outline.
    pub outline: Vec<OutlineCommand>,
    pub main_hints: Vec<Hint>,
    pub local_hints: Vec<LocalHints>,
    /// Number of warnings raised while processing the glyph.
    pub warnings: usize,
}

/// Hints glyphs of one font.
///
/// The session owns every piece of per-glyph state, so separate sessions
/// may run on separate threads. Glyphs are processed one at a time; all
/// storage used for a glyph is released when it completes, whether or not
/// it succeeded.
///
/// A fatal error leaves the session poisoned: further glyphs fail with
/// [`HintError::SessionPoisoned`] until [`HintSession::reset`] is called.
#[derive(Clone, Debug)]
pub struct HintSession {
    font: FontContext,
    transform: Transform,
    path: Path,
    state: GlyphState,
    poisoned: bool,
}

impl HintSession {
    /// Creates a session for the given font.
    pub fn new(font: FontContext) -> Self {
        Self::with_arena_capacity(font, DEFAULT_ARENA_CAPACITY)
    }

    /// Creates a session whose per-glyph storage is limited to `capacity`
    /// bytes.
    pub fn with_arena_capacity(font: FontContext, capacity: usize) -> Self {
        Self {
            font,
            transform: Transform::IDENTITY,
            path: Path::new(capacity),
            state: GlyphState::Idle,
            poisoned: false,
        }
    }

    /// Sets the scaling from design space applied to incoming glyphs.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn font(&self) -> &FontContext {
        &self.font
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn state(&self) -> GlyphState {
        self.state
    }

    /// Bytes of per-glyph storage currently in use.
    pub fn arena_used(&self) -> usize {
        self.path.arena_used()
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Clears a fatal error so the session can be reused.
    pub fn reset(&mut self) {
        self.path.reset();
        self.state = GlyphState::Idle;
        self.poisoned = false;
    }

    /// Hints a glyph given as a plain or encrypted bez program.
    ///
    /// Stems and extremes are delivered to `sink` as they are found and the
    /// hinted glyph is returned. On error the glyph is abandoned; the error
    /// has already been passed to the sink, which chose its severity.
    pub fn hint_glyph(
        &mut self,
        data: &[u8],
        sink: &mut dyn ReportSink,
    ) -> Result<HintedGlyph, HintError> {
        let mut reporter = Reporter::new(sink);
        if self.poisoned {
            return Err(reporter.fail(HintError::SessionPoisoned));
        }
        let result = self.process(data, &mut reporter);
        reporter.finish();
        if reporter.is_fatal() {
            log::error!("fatal error; session must be reset");
            self.poisoned = true;
        }
        self.path.reset();
        self.state = GlyphState::Idle;
        result
    }

    /// Locates the inflection of a curve along `axis`.
    ///
    /// Used to keep the split points of compatible master designs in step.
    pub fn inflection_point(
        &self,
        p0: Point<Fixed>,
        c1: Point<Fixed>,
        c2: Point<Fixed>,
        p3: Point<Fixed>,
        axis: Axis,
    ) -> Result<Fixed, HintError> {
        classify::inflection_point(p0, c1, c2, p3, axis)
    }

    fn process(
        &mut self,
        data: &[u8],
        reporter: &mut Reporter,
    ) -> Result<HintedGlyph, HintError> {
        self.state = GlyphState::Parsing;
        let data = read_bez::decrypt::decode(data);
        self.path.reset();
        self.state = GlyphState::Building;
        let mut builder = PathBuilder::new(&mut self.path, self.transform, self.font.round_to_int)
            .map_err(|e| reporter.fail(e))?;
        let evaluated = read_bez::evaluate(&data, &mut builder);
        let name = builder.finish();
        evaluated.map_err(|e| reporter.fail(e.into()))?;
        let name = name.map_err(|e| reporter.fail(e))?;
        log::debug!(
            "{}: built {} elements",
            name.as_deref().unwrap_or("<unnamed>"),
            self.path.len()
        );
        edit::edit_path(&mut self.path, &self.font, reporter, &mut self.state)
            .map_err(|e| report_pass_error(reporter, e))?;
        self.path.validate().map_err(|e| reporter.fail(e))?;
        self.state = GlyphState::Synthesising;
        synth::synthesize(&mut self.path, &self.font, &self.transform, reporter)
            .map_err(|e| report_pass_error(reporter, e))?;
        self.state = GlyphState::Reporting;
        synth::report_hints(&self.path, &self.transform, reporter);
        Ok(self.capture(name, reporter.warnings()))
    }

    fn capture(&self, name: Option<String>, warnings: usize) -> HintedGlyph {
        let mut glyph = HintedGlyph {
            name,
            main_hints: self.path.main_hints(),
            warnings,
            ..Default::default()
        };
        for (ordinal, (ix, element)) in self.path.iter().enumerate() {
            glyph.outline.push(match element.kind {
                ElementKind::MoveTo => OutlineCommand::MoveTo(element.end),
                ElementKind::LineTo => OutlineCommand::LineTo(element.end),
                ElementKind::CurveTo => OutlineCommand::CurveTo {
                    c1: element.c1,
                    c2: element.c2,
                    end: element.end,
                    flex: element.is_flex,
                },
                ElementKind::ClosePath => OutlineCommand::Close,
            });
            if element.hints.is_some() {
                glyph.local_hints.push(LocalHints {
                    ordinal,
                    hints: self.path.local_hints(ix),
                });
            }
        }
        glyph
    }
}

/// Reports errors from the editing and synthesis passes that were not
/// already handed to the sink. Diagnostics are reported where they occur.
fn report_pass_error(reporter: &mut Reporter, error: HintError) -> HintError {
    if error.is_diagnostic() {
        error
    } else {
        reporter.fail(error)
    }
}
