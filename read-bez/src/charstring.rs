//! Evaluation of bez glyph programs.

use types::Fixed;

use super::{Error, Stack, Token, Tokenizer};

/// Type of a stem hint operator.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HintKind {
    /// Horizontal stem (`rb`).
    Bottom,
    /// Horizontal stem touching a top zone (`ry`).
    Top,
    /// Vertical stem (`rm`).
    Left,
    /// Vertical stem right of the glyph centre (`rv`).
    Right,
}

impl HintKind {
    /// Returns true for hints that constrain y coordinates.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Bottom | Self::Top)
    }

    /// Returns the bez operator for this hint.
    pub fn operator(self) -> Operator {
        match self {
            Self::Bottom => Operator::Rb,
            Self::Top => Operator::Ry,
            Self::Left => Operator::Rm,
            Self::Right => Operator::Rv,
        }
    }
}

/// Trait for processing commands resulting from bez evaluation.
///
/// The relative and axis-aligned path operators are resolved into
/// absolute move, line, curve and close commands.
#[allow(unused_variables)]
pub trait CommandSink {
    // Path construction operators.
    fn move_to(&mut self, x: Fixed, y: Fixed);
    fn line_to(&mut self, x: Fixed, y: Fixed);
    fn curve_to(&mut self, cx0: Fixed, cy0: Fixed, cx1: Fixed, cy1: Fixed, x: Fixed, y: Fixed);
    fn close(&mut self);
    /// The second curve of a flex pair.
    fn flex_curve_to(
        &mut self,
        cx0: Fixed,
        cy0: Fixed,
        cx1: Fixed,
        cy1: Fixed,
        x: Fixed,
        y: Fixed,
    ) {
        self.curve_to(cx0, cy0, cx1, cy1, x, y)
    }
    /// Name taken from the leading comment.
    fn glyph_name(&mut self, name: &str) {}
    // Hint operators.
    /// Stem hint spanning `lo` to `hi`.
    fn hint(&mut self, kind: HintKind, lo: Fixed, hi: Fixed) {}
    /// Start of a new group of hints.
    fn hint_group(&mut self) {}
}

/// Evaluates the given bez program and emits the resulting commands to the
/// specified sink.
///
/// Evaluation stops at the first `ed` operator or at the end of the data.
pub fn evaluate(data: &[u8], sink: &mut impl CommandSink) -> Result<(), Error> {
    Evaluator::new(sink).evaluate(data)
}

/// Transient state for evaluating a bez program.
struct Evaluator<'a, S> {
    sink: &'a mut S,
    stack: Stack,
    x: Fixed,
    y: Fixed,
    have_name: bool,
    in_flex: bool,
    flex_curves: u32,
}

impl<'a, S> Evaluator<'a, S>
where
    S: CommandSink,
{
    fn new(sink: &'a mut S) -> Self {
        Self {
            sink,
            stack: Stack::new(),
            x: Fixed::ZERO,
            y: Fixed::ZERO,
            have_name: false,
            in_flex: false,
            flex_curves: 0,
        }
    }

    fn evaluate(&mut self, data: &[u8]) -> Result<(), Error> {
        for token in Tokenizer::new(data) {
            let token = token?;
            match token {
                Token::Number(value) => self.stack.push(value)?,
                Token::Comment(_) => {
                    if !self.have_name {
                        if let Some(name) = token.glyph_name()? {
                            self.have_name = true;
                            self.sink.glyph_name(name);
                        }
                    }
                }
                Token::Operator(name) => {
                    let operator = Operator::from_name(name).ok_or_else(|| {
                        Error::UnknownOperator(String::from_utf8_lossy(name).into())
                    })?;
                    if !self.evaluate_operator(operator)? {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    /// Evaluates a single operator.
    ///
    /// Returns `Ok(false)` when evaluation should stop.
    fn evaluate_operator(&mut self, operator: Operator) -> Result<bool, Error> {
        use Operator::*;
        match operator {
            RMoveTo => {
                let [dx, dy] = self.stack.args()?;
                self.move_to(self.x + dx, self.y + dy);
            }
            HMoveTo => {
                let [dx] = self.stack.args()?;
                self.move_to(self.x + dx, self.y);
            }
            VMoveTo => {
                let [dy] = self.stack.args()?;
                self.move_to(self.x, self.y + dy);
            }
            RLineTo => {
                let [dx, dy] = self.stack.args()?;
                self.line_to(self.x + dx, self.y + dy);
            }
            HLineTo => {
                let [dx] = self.stack.args()?;
                self.line_to(self.x + dx, self.y);
            }
            VLineTo => {
                let [dy] = self.stack.args()?;
                self.line_to(self.x, self.y + dy);
            }
            RCurveTo => {
                let [dx1, dy1, dx2, dy2, dx3, dy3] = self.stack.args()?;
                let (x1, y1) = (self.x + dx1, self.y + dy1);
                let (x2, y2) = (x1 + dx2, y1 + dy2);
                self.curve_to(x1, y1, x2, y2, x2 + dx3, y2 + dy3);
            }
            VhCurveTo => {
                let [dy1, dx2, dy2, dx3] = self.stack.args()?;
                let (x1, y1) = (self.x, self.y + dy1);
                let (x2, y2) = (x1 + dx2, y1 + dy2);
                self.curve_to(x1, y1, x2, y2, x2 + dx3, y2);
            }
            HvCurveTo => {
                let [dx1, dx2, dy2, dy3] = self.stack.args()?;
                let (x1, y1) = (self.x + dx1, self.y);
                let (x2, y2) = (x1 + dx2, y1 + dy2);
                self.curve_to(x1, y1, x2, y2, x2, y2 + dy3);
            }
            MoveTo => {
                let [x, y] = self.stack.args()?;
                self.move_to(x, y);
            }
            LineTo => {
                let [x, y] = self.stack.args()?;
                self.line_to(x, y);
            }
            CurveTo => {
                let [x1, y1, x2, y2, x3, y3] = self.stack.args()?;
                self.curve_to(x1, y1, x2, y2, x3, y3);
            }
            ClosePath => self.sink.close(),
            StartChar => {
                self.x = Fixed::ZERO;
                self.y = Fixed::ZERO;
            }
            EndChar => {
                self.stack.clear();
                return Ok(false);
            }
            Id => {
                self.stack.args::<1>()?;
            }
            Rb | Ry | Rm | Rv => {
                let [lo, hi] = self.stack.args()?;
                let kind = match operator {
                    Rb => HintKind::Bottom,
                    Ry => HintKind::Top,
                    Rm => HintKind::Left,
                    _ => HintKind::Right,
                };
                self.sink.hint(kind, lo, hi);
            }
            PreFlex1 => {
                self.in_flex = true;
                self.flex_curves = 0;
            }
            PreFlex2 => self.in_flex = false,
            Flex => {
                // Six relative coordinates followed by the flex depth and the
                // final point, which are implied by the curve itself.
                let [dx1, dy1, dx2, dy2, dx3, dy3, _, _, _, _, _] = self.stack.args()?;
                let (x1, y1) = (self.x + dx1, self.y + dy1);
                let (x2, y2) = (x1 + dx2, y1 + dy2);
                let (x3, y3) = (x2 + dx3, y2 + dy3);
                self.sink.flex_curve_to(x1, y1, x2, y2, x3, y3);
                self.x = x3;
                self.y = y3;
            }
            Div => {
                let divisor = self.stack.pop()?;
                let dividend = self.stack.pop()?;
                self.stack.push(dividend / divisor)?;
                // Quotient stays on the stack for the next operator
                return Ok(true);
            }
            NewColors => self.sink.hint_group(),
            BeginSubr | EndSubr | StartOfLine | StartNewColors | EndOfLine
            | EndNewColors => {}
        }
        self.stack.clear();
        Ok(true)
    }

    fn move_to(&mut self, x: Fixed, y: Fixed) {
        // Moves between the flex markers only position the control points
        if self.in_flex {
            return;
        }
        self.x = x;
        self.y = y;
        self.sink.move_to(x, y);
    }

    fn line_to(&mut self, x: Fixed, y: Fixed) {
        self.x = x;
        self.y = y;
        self.sink.line_to(x, y);
    }

    fn curve_to(&mut self, x1: Fixed, y1: Fixed, x2: Fixed, y2: Fixed, x3: Fixed, y3: Fixed) {
        if self.in_flex {
            self.flex_curves += 1;
            if self.flex_curves % 2 == 0 {
                self.sink.flex_curve_to(x1, y1, x2, y2, x3, y3);
            } else {
                self.sink.curve_to(x1, y1, x2, y2, x3, y3);
            }
        } else {
            self.sink.curve_to(x1, y1, x2, y2, x3, y3);
        }
        self.x = x3;
        self.y = y3;
    }
}

/// Operators of the bez language.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Operator {
    RMoveTo,
    HMoveTo,
    VMoveTo,
    RLineTo,
    HLineTo,
    VLineTo,
    RCurveTo,
    VhCurveTo,
    HvCurveTo,
    MoveTo,
    LineTo,
    CurveTo,
    ClosePath,
    StartChar,
    EndChar,
    Id,
    Rb,
    Ry,
    Rm,
    Rv,
    PreFlex1,
    PreFlex2,
    Flex,
    BeginSubr,
    EndSubr,
    NewColors,
    StartOfLine,
    StartNewColors,
    EndOfLine,
    EndNewColors,
    Div,
}

impl Operator {
    const ALL: [Self; 31] = [
        Self::RMoveTo,
        Self::HMoveTo,
        Self::VMoveTo,
        Self::RLineTo,
        Self::HLineTo,
        Self::VLineTo,
        Self::RCurveTo,
        Self::VhCurveTo,
        Self::HvCurveTo,
        Self::MoveTo,
        Self::LineTo,
        Self::CurveTo,
        Self::ClosePath,
        Self::StartChar,
        Self::EndChar,
        Self::Id,
        Self::Rb,
        Self::Ry,
        Self::Rm,
        Self::Rv,
        Self::PreFlex1,
        Self::PreFlex2,
        Self::Flex,
        Self::BeginSubr,
        Self::EndSubr,
        Self::NewColors,
        Self::StartOfLine,
        Self::StartNewColors,
        Self::EndOfLine,
        Self::EndNewColors,
        Self::Div,
    ];

    /// Creates an operator from its name in the program text.
    pub fn from_name(name: &[u8]) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.name().as_bytes() == name)
    }

    /// Returns the name of the operator in the program text.
    pub fn name(self) -> &'static str {
        use Operator::*;
        match self {
            RMoveTo => "rmt",
            HMoveTo => "hmt",
            VMoveTo => "vmt",
            RLineTo => "rdt",
            HLineTo => "hdt",
            VLineTo => "vdt",
            RCurveTo => "rct",
            VhCurveTo => "vhct",
            HvCurveTo => "hvct",
            MoveTo => "mt",
            LineTo => "dt",
            CurveTo => "ct",
            ClosePath => "cp",
            StartChar => "sc",
            EndChar => "ed",
            Id => "id",
            Rb => "rb",
            Ry => "ry",
            Rm => "rm",
            Rv => "rv",
            PreFlex1 => "preflx1",
            PreFlex2 => "preflx2",
            Flex => "flx",
            BeginSubr => "beginsubr",
            EndSubr => "endsubr",
            NewColors => "newcolors",
            StartOfLine => "sol",
            StartNewColors => "snc",
            EndOfLine => "eol",
            EndNewColors => "enc",
            Div => "div",
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
