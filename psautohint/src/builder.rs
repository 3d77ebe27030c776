//! Construction of a path from evaluated bez commands.

use bez_types::{Fixed, Point};
use read_bez::CommandSink;

use crate::{
    error::HintError,
    path::{ElementIx, ElementKind, Path, PathElement},
};

/// Scaling from design space to the internal coordinate system.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transform {
    pub tfmx: Fixed,
    pub tfmy: Fixed,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        tfmx: Fixed::ONE,
        tfmy: Fixed::ONE,
    };

    /// True if internal y increases with design y.
    pub fn y_goes_up(&self) -> bool {
        self.tfmy > Fixed::ZERO
    }

    /// True if internal x increases with design x.
    pub fn x_goes_right(&self) -> bool {
        self.tfmx > Fixed::ZERO
    }

    pub(crate) fn validate(&self) -> Result<(), HintError> {
        if self.tfmx == Fixed::ZERO || self.tfmy == Fixed::ZERO {
            Err(HintError::ScalingMissing)
        } else {
            Ok(())
        }
    }

    pub(crate) fn apply(&self, point: Point<Fixed>) -> Point<Fixed> {
        Point::new(point.x * self.tfmx, point.y * self.tfmy)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Command sink that appends absolute path elements to a [`Path`].
///
/// Errors are latched: after the first failure every later command is
/// ignored and the error is returned from [`PathBuilder::finish`].
pub(crate) struct PathBuilder<'a> {
    path: &'a mut Path,
    transform: Transform,
    round_to_int: bool,
    name: Option<String>,
    current_move: Option<ElementIx>,
    is_open: bool,
    error: Option<HintError>,
}

impl<'a> PathBuilder<'a> {
    pub fn new(
        path: &'a mut Path,
        transform: Transform,
        round_to_int: bool,
    ) -> Result<Self, HintError> {
        transform.validate()?;
        Ok(Self {
            path,
            transform,
            round_to_int,
            name: None,
            current_move: None,
            is_open: false,
            error: None,
        })
    }

    /// Closes any open subpath and returns the glyph name.
    pub fn finish(mut self) -> Result<Option<String>, HintError> {
        if self.error.is_none() && self.is_open {
            log::debug!("closing open subpath at end of glyph");
            self.push_close();
        }
        match self.error {
            Some(error) => Err(error),
            None => {
                self.path.link_close_partners();
                Ok(self.name)
            }
        }
    }

    fn map(&mut self, x: Fixed, y: Fixed) -> Option<Point<Fixed>> {
        let mut point = self.transform.apply(Point::new(x, y));
        if self.round_to_int {
            point = point.map(Fixed::round);
        }
        if point.x.is_saturated() || point.y.is_saturated() {
            self.error = Some(HintError::MalformedPath(format!(
                "coordinate ({x}, {y}) is out of range"
            )));
            return None;
        }
        Some(point)
    }

    fn append(&mut self, element: PathElement) {
        if let Err(e) = self.path.push(element) {
            self.error = Some(e);
        }
    }

    fn push_drawing(&mut self, element: PathElement) {
        if self.current_move.is_none() {
            self.error = Some(HintError::MalformedPath(
                "drawing operator before the first moveto".into(),
            ));
            return;
        }
        self.is_open = true;
        self.append(element);
    }

    fn push_close(&mut self) {
        let Some(mv) = self.current_move.take() else {
            log::debug!("ignoring closepath without a subpath");
            return;
        };
        let mut element = PathElement::new(ElementKind::ClosePath, self.path.get(mv).end);
        element.close_partner = Some(mv);
        self.is_open = false;
        self.append(element);
    }

    #[allow(clippy::too_many_arguments)]
    fn push_curve(
        &mut self,
        cx0: Fixed,
        cy0: Fixed,
        cx1: Fixed,
        cy1: Fixed,
        x: Fixed,
        y: Fixed,
        is_flex: bool,
    ) {
        if self.error.is_some() {
            return;
        }
        let (Some(c1), Some(c2), Some(end)) =
            (self.map(cx0, cy0), self.map(cx1, cy1), self.map(x, y))
        else {
            return;
        };
        let mut element = PathElement::curve(c1, c2, end);
        element.is_flex = is_flex;
        self.push_drawing(element);
    }
}

impl CommandSink for PathBuilder<'_> {
    fn move_to(&mut self, x: Fixed, y: Fixed) {
        if self.error.is_some() {
            return;
        }
        let Some(point) = self.map(x, y) else {
            return;
        };
        if self.is_open {
            log::debug!("closing open subpath before moveto");
            self.push_close();
        }
        match self.path.push(PathElement::new(ElementKind::MoveTo, point)) {
            Ok(ix) => self.current_move = Some(ix),
            Err(e) => self.error = Some(e),
        }
    }

    fn line_to(&mut self, x: Fixed, y: Fixed) {
        if self.error.is_some() {
            return;
        }
        if let Some(point) = self.map(x, y) {
            self.push_drawing(PathElement::new(ElementKind::LineTo, point));
        }
    }

    fn curve_to(&mut self, cx0: Fixed, cy0: Fixed, cx1: Fixed, cy1: Fixed, x: Fixed, y: Fixed) {
        self.push_curve(cx0, cy0, cx1, cy1, x, y, false);
    }

    fn flex_curve_to(
        &mut self,
        cx0: Fixed,
        cy0: Fixed,
        cx1: Fixed,
        cy1: Fixed,
        x: Fixed,
        y: Fixed,
    ) {
        self.push_curve(cx0, cy0, cx1, cy1, x, y, true);
    }

    fn close(&mut self) {
        if self.error.is_none() {
            self.push_close();
        }
    }

    fn glyph_name(&mut self, name: &str) {
        self.name = Some(name.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        arena::DEFAULT_ARENA_CAPACITY,
        path::testing::kinds_and_ends,
    };
    use pretty_assertions::assert_eq;
    use ElementKind::*;

    fn build(source: &str, transform: Transform) -> Result<(Path, Option<String>), HintError> {
        let mut path = Path::new(DEFAULT_ARENA_CAPACITY);
        let mut builder = PathBuilder::new(&mut path, transform, true)?;
        read_bez::evaluate(source.as_bytes(), &mut builder)?;
        let name = builder.finish()?;
        Ok((path, name))
    }

    #[test]
    fn square_outline() {
        let (path, name) = build(bez_test_data::bez::SQUARE, Transform::IDENTITY).unwrap();
        assert_eq!(name.as_deref(), Some("A"));
        assert_eq!(
            kinds_and_ends(&path),
            [
                (MoveTo, Point::from_i32(0, 0)),
                (LineTo, Point::from_i32(500, 0)),
                (LineTo, Point::from_i32(500, 700)),
                (LineTo, Point::from_i32(0, 700)),
                (ClosePath, Point::from_i32(0, 0)),
            ]
        );
        path.validate().unwrap();
    }

    #[test]
    fn open_subpaths_are_closed() {
        let (path, _) = build("0 0 mt 10 0 dt 0 10 mt 10 10 dt ed", Transform::IDENTITY).unwrap();
        let kinds = path.iter().map(|(_, e)| e.kind).collect::<Vec<_>>();
        assert_eq!(kinds, [MoveTo, LineTo, ClosePath, MoveTo, LineTo, ClosePath]);
        path.validate().unwrap();
    }

    #[test]
    fn flex_pair_marks_second_curve() {
        let (path, _) = build(bez_test_data::bez::FLEX, Transform::IDENTITY).unwrap();
        let flags = path
            .iter()
            .filter(|(_, e)| e.is_curve())
            .map(|(_, e)| e.is_flex)
            .collect::<Vec<_>>();
        assert_eq!(flags, [false, true]);
    }

    #[test]
    fn transform_and_rounding() {
        let transform = Transform {
            tfmx: Fixed::from_f64(0.5),
            tfmy: -Fixed::ONE,
        };
        assert!(!transform.y_goes_up());
        let (path, _) = build("0 0 mt 11 10 dt cp ed", transform).unwrap();
        let line = path.indices()[1];
        // 5.5 rounds up
        assert_eq!(path.get(line).end, Point::from_i32(6, -10));
    }

    #[test]
    fn errors() {
        let zero = Transform {
            tfmx: Fixed::ZERO,
            tfmy: Fixed::ONE,
        };
        assert_eq!(build("ed", zero).err(), Some(HintError::ScalingMissing));
        assert!(matches!(
            build("10 10 dt ed", Transform::IDENTITY),
            Err(HintError::MalformedPath(_))
        ));
        let huge = Transform {
            tfmx: Fixed::from_i32(1000),
            tfmy: Fixed::ONE,
        };
        assert!(matches!(
            build("10000 0 mt ed", huge),
            Err(HintError::MalformedPath(_))
        ));
        assert_eq!(
            build("10 mt", Transform::IDENTITY).err(),
            Some(HintError::StackUnderflow)
        );
    }
}
