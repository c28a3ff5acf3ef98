//! The color palettes of the dashboard.
//!
//! All the palettes hold between 1 and 12 colors. The monochrome palettes are
//! derived from a single 12-color ramp: smaller palettes are obtained by
//! removing colors in a fixed order, so that a palette of `k` colors is always
//! contained in the palette of `k + 1` colors.

use log::debug;

use crate::config::MapErrors;

/// The maximum number of colors in a palette.
pub const MAX_COLORS: usize = 12;

/// The order in which colors are removed from a monochrome ramp.
/// Position 1 is never removed: it is the single color of a 1-color palette.
const DELETION_ORDER: [usize; MAX_COLORS - 1] = [5, 6, 3, 8, 0, 11, 2, 9, 4, 7, 10];

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Palette {
    Categorical,
    Ordered,
    Blue,
    Red,
    Yellow,
    Green,
    Orange,
    Purple,
}

impl Palette {
    pub const ALL: [Palette; 8] = [
        Palette::Categorical,
        Palette::Ordered,
        Palette::Blue,
        Palette::Red,
        Palette::Yellow,
        Palette::Green,
        Palette::Orange,
        Palette::Purple,
    ];

    pub fn from_name(name: &str) -> Result<Palette, MapErrors> {
        match name {
            "categorical" => Ok(Palette::Categorical),
            "ordered" | "blue-yellow" => Ok(Palette::Ordered),
            "blue" => Ok(Palette::Blue),
            "red" => Ok(Palette::Red),
            "yellow" => Ok(Palette::Yellow),
            "green" => Ok(Palette::Green),
            "orange" => Ok(Palette::Orange),
            "purple" => Ok(Palette::Purple),
            x => Err(MapErrors::UnknownPalette(x.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Palette::Categorical => "categorical",
            Palette::Ordered => "ordered",
            Palette::Blue => "blue",
            Palette::Red => "red",
            Palette::Yellow => "yellow",
            Palette::Green => "green",
            Palette::Orange => "orange",
            Palette::Purple => "purple",
        }
    }

    pub fn is_monochrome(&self) -> bool {
        self.ramp().is_some()
    }

    fn ramp(&self) -> Option<&'static [&'static str; MAX_COLORS]> {
        match self {
            Palette::Categorical | Palette::Ordered => None,
            Palette::Blue => Some(&BLUE),
            Palette::Red => Some(&RED),
            Palette::Yellow => Some(&YELLOW),
            Palette::Green => Some(&GREEN),
            Palette::Orange => Some(&ORANGE),
            Palette::Purple => Some(&PURPLE),
        }
    }
}

/// Returns the hex codes of a palette with the given number of colors.
///
/// ```
/// use survey_maps::palette::{get_colors, Palette};
///
/// let colors = get_colors(Palette::Categorical, 2)?;
/// assert_eq!(colors, vec!["#547482", "#C87259"]);
/// # Ok::<(), survey_maps::MapErrors>(())
/// ```
pub fn get_colors(palette: Palette, number: usize) -> Result<Vec<&'static str>, MapErrors> {
    if number == 0 || number > MAX_COLORS {
        return Err(MapErrors::PaletteSize {
            palette: palette.name().to_string(),
            requested: number,
        });
    }
    let res = match palette {
        Palette::Categorical => CATEGORICAL[..number].to_vec(),
        Palette::Ordered => ORDERED[number - 1].to_vec(),
        _ => match palette.ramp() {
            Some(ramp) => mono_subset(ramp, number),
            None => return Err(MapErrors::UnknownPalette(palette.name().to_string())),
        },
    };
    debug!("get_colors: palette: {:?} number: {} -> {:?}", palette, number, res);
    Ok(res)
}

/// Same as [`get_colors`], with the palette given by name.
pub fn get_colors_by_name(name: &str, number: usize) -> Result<Vec<&'static str>, MapErrors> {
    get_colors(Palette::from_name(name)?, number)
}

fn mono_subset(ramp: &[&'static str; MAX_COLORS], number: usize) -> Vec<&'static str> {
    let deleted = &DELETION_ORDER[..MAX_COLORS - number];
    ramp.iter()
        .enumerate()
        .filter(|(idx, _)| !deleted.contains(idx))
        .map(|(_, hex)| *hex)
        .collect()
}

/// A continuous color map, interpolating linearly between the colors of a
/// monochrome palette.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ColorMap {
    palette: Palette,
    // Invariant: never empty.
    stops: Vec<[u8; 3]>,
}

impl ColorMap {
    pub fn new(palette: Palette, number: usize) -> Result<ColorMap, MapErrors> {
        if !palette.is_monochrome() {
            return Err(MapErrors::ColormapNotMonochrome(palette.name().to_string()));
        }
        let mut stops: Vec<[u8; 3]> = Vec::new();
        for hex in get_colors(palette, number)? {
            stops.push(parse_hex(hex).ok_or_else(|| MapErrors::InvalidColor(hex.to_string()))?);
        }
        Ok(ColorMap { palette, stops })
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    /// The color at position `t`. Positions outside `[0, 1]` are clamped.
    pub fn at(&self, t: f64) -> String {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        if self.stops.len() == 1 {
            return to_hex(self.stops[0]);
        }
        let pos = t * (self.stops.len() - 1) as f64;
        let idx = (pos.floor() as usize).min(self.stops.len() - 2);
        let frac = pos - idx as f64;
        let (a, b) = (self.stops[idx], self.stops[idx + 1]);
        let mut rgb = [0u8; 3];
        for c in 0..3 {
            let v = a[c] as f64 + (b[c] as f64 - a[c] as f64) * frac;
            rgb[c] = v.round().clamp(0.0, 255.0) as u8;
        }
        to_hex(rgb)
    }
}

fn parse_hex(hex: &str) -> Option<[u8; 3]> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let mut rgb = [0u8; 3];
    for (c, channel) in rgb.iter_mut().enumerate() {
        *channel = u8::from_str_radix(digits.get(2 * c..2 * c + 2)?, 16).ok()?;
    }
    Some(rgb)
}

fn to_hex(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}

// =====================================================================================
// Hex codes for the basic color palettes
// =====================================================================================

const CATEGORICAL: [&str; MAX_COLORS] = [
    "#547482", "#C87259", "#C2D8C2", "#F1B05D", "#818662", "#6C4A4D", "#7A8C87", "#EE8445",
    "#C8B05C", "#3C2030", "#C89D64", "#2A3B49",
];

// Indexed by number of colors - 1.
const ORDERED: [&[&str]; MAX_COLORS] = [
    &["#547482"],
    &["#547482", "#c87259"],
    &["#547482", "#F1B05D", "#c87259"],
    &["#547482", "#7A8C87", "#F1B05D", "#c87259"],
    &["#547482", "#7A8C87", "#C2D8C2", "#F1B05D", "#c87259"],
    &["#547482", "#7A8C87", "#C2D8C2", "#F1B05D", "#EE8445", "#c87259"],
    &[
        "#547482", "#7A8C87", "#C2D8C2", "#C8B05C", "#F1B05D", "#EE8445", "#c87259",
    ],
    &[
        "#547482", "#7A8C87", "#C2D8C2", "#C8B05C", "#C89D64", "#F1B05D", "#EE8445", "#c87259",
    ],
    &[
        "#547482", "#7A8C87", "#C2D8C2", "#818662", "#C8B05C", "#C89D64", "#F1B05D", "#EE8445",
        "#c87259",
    ],
    &[
        "#547482", "#7A8C87", "#C2D8C2", "#818662", "#C8B05C", "#C89D64", "#F1B05D", "#EE8445",
        "#c87259", "#6c4a4d",
    ],
    &[
        "#2A3B49", "#547482", "#7A8C87", "#C2D8C2", "#818662", "#C8B05C", "#C89D64", "#F1B05D",
        "#EE8445", "#c87259", "#6c4a4d",
    ],
    &[
        "#2A3B49", "#547482", "#7A8C87", "#C2D8C2", "#818662", "#C8B05C", "#C89D64", "#F1B05D",
        "#EE8445", "#c87259", "#6c4a4d", "#3C2030",
    ],
];

const BLUE: [&str; MAX_COLORS] = [
    "#547482", "#5c7f8e", "#63899a", "#6f92a2", "#7b9baa", "#87a4b1", "#93adb9", "#9fb6c1",
    "#abbfc8", "#b6c8d0", "#c2d1d8", "#cedae0",
];

const RED: [&str; MAX_COLORS] = [
    "#a04d35", "#b3563b", "#c26246", "#c87259", "#ce826c", "#d5937f", "#dba392", "#e0b1a3",
    "#e5bdb1", "#eacac0", "#efd6cf", "#f4e3de",
];

const YELLOW: [&str; MAX_COLORS] = [
    "#d98213", "#eb8d15", "#ec9627", "#efa74b", "#f1b05d", "#f3b96f", "#f4c281", "#f6ca93",
    "#f7d3a5", "#f9dcb7", "#fae5c9", "#fceedb",
];

const GREEN: [&str; MAX_COLORS] = [
    "#606449", "#6b6f51", "#767b5a", "#818662", "#8c916a", "#959a75", "#9ea280", "#a6ab8c",
    "#afb397", "#b8bba2", "#c1c4ae", "#c9ccb9",
];

const ORANGE: [&str; MAX_COLORS] = [
    "#d35b13", "#ea6516", "#ec752e", "#ee8445", "#f0935c", "#f2a374", "#f4b28b", "#f6bf9f",
    "#f8cbb1", "#f9d7c3", "#fbe3d5", "#fdefe7",
];

const PURPLE: [&str; MAX_COLORS] = [
    "#4e3537", "#5d4042", "#6c4a4d", "#7b5458", "#8a5f63", "#996a6e", "#a2777a", "#a98286",
    "#b18e91", "#b9999c", "#c1a5a8", "#c9b1b3",
];

#[cfg(test)]
mod tests {
    use super::*;

    fn mono_palettes() -> Vec<Palette> {
        Palette::ALL
            .iter()
            .cloned()
            .filter(|p| p.is_monochrome())
            .collect()
    }

    #[test]
    fn sizes_are_exact() {
        for palette in Palette::ALL {
            for k in 1..=MAX_COLORS {
                assert_eq!(get_colors(palette, k).unwrap().len(), k, "{:?}", palette);
            }
        }
    }

    #[test]
    fn mono_palettes_are_nested() {
        for palette in mono_palettes() {
            for k in 1..MAX_COLORS {
                let small = get_colors(palette, k).unwrap();
                let large = get_colors(palette, k + 1).unwrap();
                assert!(small.iter().all(|c| large.contains(c)), "{:?} {}", palette, k);
            }
        }
    }

    #[test]
    fn mono_anchor_color() {
        assert_eq!(get_colors(Palette::Blue, 1).unwrap(), vec!["#5c7f8e"]);
        assert_eq!(get_colors(Palette::Red, 1).unwrap(), vec!["#b3563b"]);
        assert_eq!(get_colors(Palette::Blue, 12).unwrap(), BLUE.to_vec());
        // The first deleted position is 5.
        let eleven = get_colors(Palette::Green, 11).unwrap();
        assert!(!eleven.contains(&GREEN[5]));
    }

    #[test]
    fn out_of_range_size() {
        assert_eq!(
            get_colors(Palette::Blue, 0),
            Err(MapErrors::PaletteSize {
                palette: "blue".to_string(),
                requested: 0
            })
        );
        assert!(get_colors(Palette::Categorical, 13).is_err());
    }

    #[test]
    fn palette_names() {
        for palette in Palette::ALL {
            assert_eq!(Palette::from_name(palette.name()), Ok(palette));
        }
        assert_eq!(Palette::from_name("blue-yellow"), Ok(Palette::Ordered));
        assert_eq!(
            get_colors_by_name("pink", 3),
            Err(MapErrors::UnknownPalette("pink".to_string()))
        );
    }

    #[test]
    fn color_map_endpoints() {
        let cmap = ColorMap::new(Palette::Blue, 12).unwrap();
        assert_eq!(cmap.at(0.0), "#547482");
        assert_eq!(cmap.at(1.0), "#cedae0");
        assert_eq!(cmap.at(-3.0), "#547482");
        assert_eq!(cmap.at(7.0), "#cedae0");
    }

    #[test]
    fn color_map_interpolates() {
        let cmap = ColorMap::new(Palette::Blue, 2).unwrap();
        // Blue with 2 colors keeps the positions 1 and 10.
        assert_eq!(get_colors(Palette::Blue, 2).unwrap(), vec!["#5c7f8e", "#c2d1d8"]);
        assert_eq!(cmap.at(0.5), "#8fa8b3");
    }

    #[test]
    fn color_map_requires_monochrome() {
        assert_eq!(
            ColorMap::new(Palette::Categorical, 3),
            Err(MapErrors::ColormapNotMonochrome("categorical".to_string()))
        );
        assert!(ColorMap::new(Palette::Ordered, 3).is_err());
    }
}
