//! Per-font hinting context.

use bez_types::Fixed;

use crate::{
    error::HintError,
    fontinfo::{parse_bool, parse_list, parse_number, FontInfo},
};

/// Maximum number of stem snap values kept per direction.
pub const MAX_STEM_SNAP: usize = 12;

/// A horizontal band to which glyph features align.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlignmentZone {
    pub bottom: Fixed,
    pub top: Fixed,
}

impl AlignmentZone {
    /// Creates a zone from two edges in either order.
    pub fn new(a: Fixed, b: Fixed) -> Self {
        Self {
            bottom: a.min(b),
            top: a.max(b),
        }
    }

    /// Returns true if `y` lies in the zone widened by `fuzz`.
    pub fn contains(&self, y: Fixed, fuzz: Fixed) -> bool {
        y >= self.bottom - fuzz && y <= self.top + fuzz
    }
}

/// Font-wide data that drives hinting.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FontContext {
    pub top_zones: Vec<AlignmentZone>,
    pub bottom_zones: Vec<AlignmentZone>,
    /// Heights of serif features.
    pub serif_y: Vec<Fixed>,
    pub dominant_h: Vec<Fixed>,
    pub dominant_v: Vec<Fixed>,
    pub stem_snap_h: Vec<Fixed>,
    pub stem_snap_v: Vec<Fixed>,
    pub blue_fuzz: Fixed,
    pub em_square: Fixed,
    /// Detect flex on unmarked curve pairs.
    pub flex_ok: bool,
    /// Require flex chords to be exactly axis aligned.
    pub flex_strict: bool,
    /// Allow the editor to split, smooth and reorder the outline.
    pub edit_char: bool,
    pub round_to_int: bool,
    /// Keep stems whose edges both come from curves.
    pub report_curve_stems: bool,
}

impl Default for FontContext {
    fn default() -> Self {
        Self {
            top_zones: Vec::new(),
            bottom_zones: Vec::new(),
            serif_y: Vec::new(),
            dominant_h: Vec::new(),
            dominant_v: Vec::new(),
            stem_snap_h: Vec::new(),
            stem_snap_v: Vec::new(),
            blue_fuzz: Fixed::ONE,
            em_square: Fixed::from_i32(1000),
            flex_ok: false,
            flex_strict: false,
            edit_char: true,
            round_to_int: true,
            report_curve_stems: true,
        }
    }
}

const TOP_ZONE_KEYS: &[(&str, &str)] = &[
    ("CapHeight", "CapOvershoot"),
    ("LcHeight", "LcOvershoot"),
    ("AscenderHeight", "AscenderOvershoot"),
    ("FigHeight", "FigOvershoot"),
];

const BOTTOM_ZONE_KEYS: &[(&str, &str)] = &[
    ("BaselineYCoord", "BaselineOvershoot"),
    ("DescenderHeight", "DescenderOvershoot"),
];

impl FontContext {
    /// Lifts a design space distance to the em square in use.
    pub fn ps_dist(&self, n: i32) -> Fixed {
        Fixed::from_i32(n).mul_div(self.em_square, Fixed::from_i32(1000))
    }

    /// Builds a context from font info values.
    ///
    /// Missing keys keep their defaults. A missing `OrigEmSqUnits` means an
    /// em of 1000; a present but unusable one is an error.
    pub fn from_font_info(info: &impl FontInfo) -> Result<Self, HintError> {
        let mut font = Self::default();
        if let Some(value) = info.get("OrigEmSqUnits") {
            let em = parse_number(value)
                .filter(|em| *em > 0.0)
                .ok_or(HintError::ScalingMissing)?;
            font.em_square = Fixed::from_f64(em);
        }
        if let Some(fuzz) = info.get("BlueFuzz").and_then(parse_number) {
            font.blue_fuzz = Fixed::from_f64(fuzz);
        }
        if let Some(flex_ok) = info.get("FlexOK").and_then(parse_bool) {
            font.flex_ok = flex_ok;
        }
        if let Some(flex_strict) = info.get("FlexStrict").and_then(parse_bool) {
            font.flex_strict = flex_strict;
        }
        font.dominant_h = fixed_list(info, "DominantH");
        font.dominant_v = fixed_list(info, "DominantV");
        font.stem_snap_h = merge_stems(fixed_list(info, "StemSnapH"), fixed_list(info, "AuxHStems"));
        font.stem_snap_v = merge_stems(fixed_list(info, "StemSnapV"), fixed_list(info, "AuxVStems"));
        let blues = fixed_list(info, "BlueValues");
        for (i, pair) in blues.chunks_exact(2).enumerate() {
            let zone = AlignmentZone::new(pair[0], pair[1]);
            if i == 0 {
                font.bottom_zones.push(zone);
            } else {
                font.top_zones.push(zone);
            }
        }
        for pair in fixed_list(info, "OtherBlues").chunks_exact(2) {
            font.bottom_zones.push(AlignmentZone::new(pair[0], pair[1]));
        }
        for (zones, keys) in [
            (&mut font.top_zones, TOP_ZONE_KEYS),
            (&mut font.bottom_zones, BOTTOM_ZONE_KEYS),
        ] {
            for (height_key, overshoot_key) in keys {
                let Some(height) = info.get(height_key).and_then(parse_number) else {
                    continue;
                };
                let overshoot = info
                    .get(overshoot_key)
                    .and_then(parse_number)
                    .unwrap_or_default();
                let height = Fixed::from_f64(height);
                zones.push(AlignmentZone::new(height, height + Fixed::from_f64(overshoot)));
            }
        }
        font.top_zones.sort_by_key(|zone| zone.bottom);
        font.top_zones.dedup();
        font.bottom_zones.sort_by_key(|zone| zone.bottom);
        font.bottom_zones.dedup();
        log::debug!(
            "font context: em {}, {} top zones, {} bottom zones",
            font.em_square,
            font.top_zones.len(),
            font.bottom_zones.len()
        );
        Ok(font)
    }

    /// Returns true if `y` lies in any zone widened by the blue fuzz.
    pub fn in_zone(&self, y: Fixed) -> bool {
        self.top_zones
            .iter()
            .chain(&self.bottom_zones)
            .any(|zone| zone.contains(y, self.blue_fuzz))
    }

    /// Preferred widths, dominant first, for horizontal or vertical stems.
    pub(crate) fn preferred_widths(&self, horizontal: bool) -> impl Iterator<Item = Fixed> + '_ {
        let (dominant, snap) = if horizontal {
            (&self.dominant_h, &self.stem_snap_h)
        } else {
            (&self.dominant_v, &self.stem_snap_v)
        };
        dominant.iter().chain(snap).copied()
    }
}

fn fixed_list(info: &impl FontInfo, key: &str) -> Vec<Fixed> {
    let Some(value) = info.get(key) else {
        return Vec::new();
    };
    match parse_list(value) {
        Some(values) => values.into_iter().map(Fixed::from_f64).collect(),
        None => {
            log::warn!("ignoring malformed font info list {key}: {value}");
            Vec::new()
        }
    }
}

fn merge_stems(mut stems: Vec<Fixed>, aux: Vec<Fixed>) -> Vec<Fixed> {
    stems.extend(aux);
    stems.sort();
    stems.dedup();
    if stems.len() > MAX_STEM_SNAP {
        log::warn!(
            "keeping the first {MAX_STEM_SNAP} of {} stem snap values",
            stems.len()
        );
        stems.truncate(MAX_STEM_SNAP);
    }
    stems
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fontinfo::FontInfoMap;
    use pretty_assertions::assert_eq;

    fn ints(values: &[i32]) -> Vec<Fixed> {
        values.iter().copied().map(Fixed::from_i32).collect()
    }

    #[test]
    fn from_test_font() {
        let info = FontInfoMap::parse(bez_test_data::fontinfo::TEST_SANS);
        let font = FontContext::from_font_info(&info).unwrap();
        assert!(font.flex_ok);
        assert!(!font.flex_strict);
        assert_eq!(font.blue_fuzz, Fixed::ONE);
        assert_eq!(font.dominant_v, ints(&[100]));
        assert_eq!(font.stem_snap_v, ints(&[80, 90, 100, 120]));
        assert_eq!(font.stem_snap_h, ints(&[70, 100]));
        assert_eq!(
            font.bottom_zones,
            [
                AlignmentZone::new(Fixed::from_i32(-212), Fixed::from_i32(-200)),
                AlignmentZone::new(Fixed::from_i32(-12), Fixed::ZERO),
            ]
        );
        assert_eq!(
            font.top_zones,
            [
                AlignmentZone::new(Fixed::from_i32(500), Fixed::from_i32(510)),
                AlignmentZone::new(Fixed::from_i32(700), Fixed::from_i32(712)),
            ]
        );
        assert!(font.in_zone(Fixed::from_i32(713)));
        assert!(!font.in_zone(Fixed::from_i32(714)));
    }

    #[test]
    fn blue_values_and_other_blues() {
        let mut info = FontInfoMap::new();
        info.insert("BlueValues", "[-15 0 480 495 700 715]");
        info.insert("OtherBlues", "[-250 -240]");
        let font = FontContext::from_font_info(&info).unwrap();
        assert_eq!(font.bottom_zones.len(), 2);
        assert_eq!(font.top_zones.len(), 2);
        assert_eq!(font.bottom_zones[0].bottom, Fixed::from_i32(-250));
    }

    #[test]
    fn em_square_scaling() {
        let mut info = FontInfoMap::new();
        info.insert("OrigEmSqUnits", "2048");
        let font = FontContext::from_font_info(&info).unwrap();
        assert_eq!(font.ps_dist(150), Fixed::from_f64(307.2));
        assert_eq!(FontContext::default().ps_dist(4), Fixed::from_i32(4));
        info.insert("OrigEmSqUnits", "0");
        assert_eq!(
            FontContext::from_font_info(&info),
            Err(HintError::ScalingMissing)
        );
        info.insert("OrigEmSqUnits", "big");
        assert_eq!(
            FontContext::from_font_info(&info),
            Err(HintError::ScalingMissing)
        );
    }

    #[test]
    fn stem_snap_is_capped() {
        let mut info = FontInfoMap::new();
        info.insert("StemSnapH", "[10 20 30 40 50 60 70]");
        info.insert("AuxHStems", "[70 80 90 100 110 120 130 140]");
        let font = FontContext::from_font_info(&info).unwrap();
        assert_eq!(font.stem_snap_h.len(), MAX_STEM_SNAP);
        assert_eq!(font.stem_snap_h.last(), Some(&Fixed::from_i32(120)));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_round_trip() {
        let font = FontContext {
            top_zones: vec![AlignmentZone::new(Fixed::from_i32(700), Fixed::from_i32(712))],
            serif_y: ints(&[20]),
            ..Default::default()
        };
        let json = serde_json::to_string(&font).unwrap();
        let back: FontContext = serde_json::from_str(&json).unwrap();
        assert_eq!(back, font);
    }
}
