//! Delivery of hinting results and diagnostics.

use bez_types::Fixed;

use crate::error::{HintError, Level, Severity};

/// Trait for receiving the results of hinting a glyph.
///
/// Every method has a default that ignores its input so implementors only
/// provide the callbacks they care about. Callbacks are invoked
/// synchronously while the glyph is processed.
#[allow(unused_variables)]
pub trait ReportSink {
    /// Horizontal stem at `location` with the given `width`.
    ///
    /// Ghost stems have a width of -20 (top edge) or -21 (bottom edge).
    fn hstem(&mut self, location: Fixed, width: Fixed) {}
    /// Vertical stem at `location` with the given `width`.
    fn vstem(&mut self, location: Fixed, width: Fixed) {}
    /// Vertical extent of the outline.
    fn glyph_extremes(&mut self, top: Fixed, bottom: Fixed) {}
    /// Vertical extent of the emitted horizontal stems.
    fn stem_extremes(&mut self, low: Fixed, high: Fixed) {}
    /// Stem pairing is being retried with a wider limit.
    fn retry(&mut self) {}
    /// A formatted message.
    fn log(&mut self, level: Level, message: &str) {}
    /// Chooses how to proceed after `error`.
    fn error(&mut self, error: &HintError) -> Severity {
        error.default_severity()
    }
}

/// Discards everything.
impl ReportSink for () {}

impl<T: ReportSink + ?Sized> ReportSink for &mut T {
    fn hstem(&mut self, location: Fixed, width: Fixed) {
        (**self).hstem(location, width)
    }

    fn vstem(&mut self, location: Fixed, width: Fixed) {
        (**self).vstem(location, width)
    }

    fn glyph_extremes(&mut self, top: Fixed, bottom: Fixed) {
        (**self).glyph_extremes(top, bottom)
    }

    fn stem_extremes(&mut self, low: Fixed, high: Fixed) {
        (**self).stem_extremes(low, high)
    }

    fn retry(&mut self) {
        (**self).retry()
    }

    fn log(&mut self, level: Level, message: &str) {
        (**self).log(level, message)
    }

    fn error(&mut self, error: &HintError) -> Severity {
        (**self).error(error)
    }
}

/// Prefix attached to every message logged at [`Level::Error`].
pub const ERROR_PREFIX: &str = "LOGERROR: ";

/// Wraps a sink with message collapsing and error bookkeeping.
pub(crate) struct Reporter<'a> {
    sink: &'a mut dyn ReportSink,
    last: Option<(Level, String)>,
    repeats: usize,
    warnings: usize,
    fatal: bool,
}

impl<'a> Reporter<'a> {
    pub fn new(sink: &'a mut dyn ReportSink) -> Self {
        Self {
            sink,
            last: None,
            repeats: 0,
            warnings: 0,
            fatal: false,
        }
    }

    pub fn sink(&mut self) -> &mut dyn ReportSink {
        &mut *self.sink
    }

    pub fn warnings(&self) -> usize {
        self.warnings
    }

    /// True once any reported error was given fatal severity.
    pub fn is_fatal(&self) -> bool {
        self.fatal
    }

    pub fn info(&mut self, message: String) {
        self.message(Level::Info, message);
    }

    pub fn warning(&mut self, message: String) {
        self.warnings += 1;
        self.message(Level::Warning, message);
    }

    /// Reports `error` and returns the severity chosen by the sink.
    pub fn report(&mut self, error: &HintError) -> Severity {
        let severity = self.sink.error(error);
        if severity == Severity::Fatal {
            self.fatal = true;
        }
        match error.level() {
            Level::Warning => self.warning(error.to_string()),
            level => self.message(level, error.to_string()),
        }
        severity
    }

    /// Reports `error`, failing unless the sink lets processing continue.
    pub fn check(&mut self, error: HintError) -> Result<(), HintError> {
        match self.report(&error) {
            Severity::Ok => Ok(()),
            _ => Err(error),
        }
    }

    /// Reports an error that ends processing of the glyph.
    pub fn fail(&mut self, error: HintError) -> HintError {
        self.report(&error);
        error
    }

    /// Flushes any pending repeat summary.
    pub fn finish(&mut self) {
        self.flush_repeats();
        self.last = None;
    }

    fn message(&mut self, level: Level, message: String) {
        if let Some((last_level, last_message)) = &self.last {
            if *last_level == level && *last_message == message {
                self.repeats += 1;
                return;
            }
        }
        self.flush_repeats();
        self.emit(level, &message);
        self.last = Some((level, message));
    }

    fn flush_repeats(&mut self) {
        if self.repeats == 0 {
            return;
        }
        if let Some((level, message)) = self.last.take() {
            let summary = format!("{message} (repeated {} more times)", self.repeats);
            self.emit(level, &summary);
            self.last = Some((level, message));
        }
        self.repeats = 0;
    }

    fn emit(&mut self, level: Level, message: &str) {
        match level {
            Level::Info => {
                log::info!("{message}");
                self.sink.log(level, message);
            }
            Level::Warning => {
                log::warn!("{message}");
                self.sink.log(level, message);
            }
            Level::Error => {
                log::error!("{message}");
                self.sink.log(level, &format!("{ERROR_PREFIX}{message}"));
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Sink that records every callback.
    #[derive(Default, Debug)]
    pub struct RecordingSink {
        pub hstems: Vec<(Fixed, Fixed)>,
        pub vstems: Vec<(Fixed, Fixed)>,
        pub glyph_extremes: Option<(Fixed, Fixed)>,
        pub stem_extremes: Option<(Fixed, Fixed)>,
        pub retries: usize,
        pub messages: Vec<(Level, String)>,
        pub errors: Vec<HintError>,
        pub escalate: Option<Severity>,
    }

    impl ReportSink for RecordingSink {
        fn hstem(&mut self, location: Fixed, width: Fixed) {
            self.hstems.push((location, width));
        }

        fn vstem(&mut self, location: Fixed, width: Fixed) {
            self.vstems.push((location, width));
        }

        fn glyph_extremes(&mut self, top: Fixed, bottom: Fixed) {
            self.glyph_extremes = Some((top, bottom));
        }

        fn stem_extremes(&mut self, low: Fixed, high: Fixed) {
            self.stem_extremes = Some((low, high));
        }

        fn retry(&mut self) {
            self.retries += 1;
        }

        fn log(&mut self, level: Level, message: &str) {
            self.messages.push((level, message.into()));
        }

        fn error(&mut self, error: &HintError) -> Severity {
            self.errors.push(error.clone());
            self.escalate.unwrap_or(error.default_severity())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{testing::RecordingSink, *};
    use bez_types::Point;
    use pretty_assertions::assert_eq;

    #[test]
    fn collapses_repeated_messages() {
        let mut sink = RecordingSink::default();
        let mut reporter = Reporter::new(&mut sink);
        for _ in 0..3 {
            reporter.warning("same".into());
        }
        reporter.warning("different".into());
        reporter.warning("different".into());
        reporter.finish();
        assert_eq!(reporter.warnings(), 5);
        assert_eq!(
            sink.messages,
            [
                (Level::Warning, "same".to_string()),
                (Level::Warning, "same (repeated 2 more times)".to_string()),
                (Level::Warning, "different".to_string()),
                (Level::Warning, "different (repeated 1 more times)".to_string()),
            ]
        );
    }

    #[test]
    fn errors_are_prefixed() {
        let mut sink = RecordingSink::default();
        let mut reporter = Reporter::new(&mut sink);
        let err = reporter.fail(HintError::MalformedName);
        assert_eq!(err, HintError::MalformedName);
        assert!(!reporter.is_fatal());
        assert_eq!(sink.messages.len(), 1);
        assert!(sink.messages[0].1.starts_with(ERROR_PREFIX));
    }

    #[test]
    fn sink_chooses_severity() {
        let mut sink = RecordingSink {
            escalate: Some(Severity::Fatal),
            ..Default::default()
        };
        let mut reporter = Reporter::new(&mut sink);
        let diagnostic = HintError::SharpAngle(Point::ZERO);
        assert_eq!(reporter.check(diagnostic.clone()), Err(diagnostic));
        assert!(reporter.is_fatal());

        let mut quiet = ();
        let mut reporter = Reporter::new(&mut quiet);
        assert_eq!(reporter.check(HintError::SharpAngle(Point::ZERO)), Ok(()));
        assert_eq!(reporter.warnings(), 1);
    }
}
