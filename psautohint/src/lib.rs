//! Stem hint generation for PostScript Type 1 glyph outlines.
//!
//! Glyphs arrive as bez programs, the textual charstring form read by
//! [`read-bez`](read_bez). A [`HintSession`] builds the outline, cleans it
//! up (removing degenerate segments, splitting S-curves, aligning nearly
//! smooth joins), finds stems from straight edges, curve extremes, flex
//! pairs and alignment zones, and delivers the resulting hints to a
//! [`ReportSink`].
//!
//! ```
//! use psautohint::{FontContext, FontInfoMap, HintSession};
//!
//! let info = FontInfoMap::parse("BlueValues [-12 0 700 712]\nDominantV [80]\n");
//! let font = FontContext::from_font_info(&info).unwrap();
//! let mut session = HintSession::new(font);
//! let glyph = session
//!     .hint_glyph(b"% I sc 0 0 mt 80 0 rdt 0 700 rdt -80 0 rdt cp ed", &mut ())
//!     .unwrap();
//! assert_eq!(glyph.name.as_deref(), Some("I"));
//! let text = psautohint::write_bez(&glyph);
//! assert!(text.contains(" rm\n"));
//! ```

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Public re-export of the bez reader.
pub extern crate read_bez as raw;

mod arena;
mod builder;
mod classify;
mod edit;
mod error;
mod flatten;
mod font;
mod fontinfo;
mod path;
mod report;
mod segments;
mod session;
mod synth;
mod write;

pub use arena::DEFAULT_ARENA_CAPACITY;
pub use builder::Transform;
pub use classify::Axis;
pub use error::{HintError, Level, ReadError, Severity};
pub use font::{AlignmentZone, FontContext, MAX_STEM_SNAP};
pub use fontinfo::{FontInfo, FontInfoMap};
pub use path::Hint;
pub use report::{ReportSink, ERROR_PREFIX};
pub use session::{GlyphState, HintSession, HintedGlyph, LocalHints, OutlineCommand};
pub use synth::MAX_HINT_OPERANDS;
pub use write::write_bez;

/// Type for 24.8 fixed point values.
pub type Fixed = bez_types::Fixed;

/// Type for a point in the hinting coordinate system.
pub type Point = bez_types::Point<Fixed>;

#[doc(inline)]
pub use read_bez::HintKind;
