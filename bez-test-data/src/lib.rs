//! test data shared between the bez hinting crates.

/// Glyph programs in bez form.
pub mod bez {
    /// A 500 x 700 rectangle.
    pub static SQUARE: &str = include_str!("../test_data/bez/square.bez");

    /// A 100 x 100 square.
    pub static SMALL_SQUARE: &str = include_str!("../test_data/bez/small_square.bez");

    /// An "O" made of two four-curve ellipses with 100 unit stems.
    pub static O: &str = include_str!("../test_data/bez/o.bez");

    /// An "H" with 80 unit stems and a crossbar.
    pub static H: &str = include_str!("../test_data/bez/h.bez");

    /// An outline whose first line has zero length.
    pub static ZERO_LENGTH: &str = include_str!("../test_data/bez/zero_length.bez");

    /// A single symmetric S-curve given in absolute coordinates.
    pub static S_CURVE: &str = include_str!("../test_data/bez/s_curve.bez");

    /// The same control offsets given to `rct`.
    pub static S_CURVE_RELATIVE: &str = include_str!("../test_data/bez/s_curve_relative.bez");

    /// A bar whose top is drawn as a marked flex pair.
    pub static FLEX: &str = include_str!("../test_data/bez/flex.bez");

    /// Repeated movetos and an empty subpath.
    pub static DUP_MOVES: &str = include_str!("../test_data/bez/dup_moves.bez");

    /// A counter drawn before the contour enclosing it.
    pub static COUNTER_FIRST: &str = include_str!("../test_data/bez/counter_first.bez");

    /// A glyph whose name exceeds the 63 byte limit.
    pub static LONG_NAME: &str = include_str!("../test_data/bez/long_name.bez");

    /// All well formed glyphs, for benchmarks and bulk tests.
    pub static ALL: &[&str] = &[
        SQUARE,
        SMALL_SQUARE,
        O,
        H,
        ZERO_LENGTH,
        S_CURVE,
        S_CURVE_RELATIVE,
        FLEX,
        DUP_MOVES,
        COUNTER_FIRST,
    ];
}

/// Font-level key/value data.
pub mod fontinfo {
    /// A font info file with zones, stems and flex enabled.
    pub static TEST_SANS: &str = include_str!("../test_data/fontinfo.txt");
}
