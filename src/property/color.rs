//! Colors are stored either as `#RRGGBB` or, when alpha is supported, as
//! `rgba(r,g,b,a)`. Input may be hex (with or without `#`, 3 or 6 digits),
//! `rgb()`, `rgba()`, a CSS/SVG color name, or an `{r, g, b, a}` /
//! `[r, g, b, a]` record.

use super::json_bool;
use crate::{
    errors::{PropertyError, Result},
    models::Value,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as Json;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorConfig {
    support_alpha: bool,
}

impl ColorConfig {
    pub fn support_alpha(&self) -> bool {
        self.support_alpha
    }

    pub fn set_support_alpha(&mut self, support_alpha: bool) -> &mut Self {
        self.support_alpha = support_alpha;
        self
    }

    /// Normalize one color. Null and empty strings pass through.
    pub fn color_val(&self, val: Value) -> Result<Value> {
        if val.is_null_or_empty() {
            return Ok(val);
        }
        let rgba = parse_color(&val)?;
        Ok(Value::Str(if self.support_alpha {
            rgba.to_rgba_string()
        } else {
            rgba.to_hex()
        }))
    }

    pub(super) fn set_field(&mut self, key: &str, val: &Json) -> Result<bool> {
        match key {
            "support_alpha" => {
                self.set_support_alpha(json_bool(val)?);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub(super) fn field(&self, name: &str) -> Option<Json> {
        match name {
            "support_alpha" => Some(Json::from(self.support_alpha)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    pub fn to_rgba_string(&self) -> String {
        format!("rgba({},{},{},{})", self.r, self.g, self.b, self.a)
    }
}

pub fn parse_color(val: &Value) -> Result<Rgba> {
    match val {
        Value::Str(s) => parse_color_str(s),
        Value::List(items) => from_components(
            items.first(),
            items.get(1),
            items.get(2),
            items.get(3),
        ),
        Value::Map(m) if m.contains_key("r") => {
            from_components(m.get("r"), m.get("g"), m.get("b"), m.get("a"))
        }
        Value::Map(m) => {
            let items: Vec<&Value> = m.values().collect();
            from_components(
                items.first().copied(),
                items.get(1).copied(),
                items.get(2).copied(),
                items.get(3).copied(),
            )
        }
        other => {
            Err(PropertyError::invalid(format!("{other} is not a valid color")))
        }
    }
}

fn from_components(
    r: Option<&Value>,
    g: Option<&Value>,
    b: Option<&Value>,
    a: Option<&Value>,
) -> Result<Rgba> {
    let (Some(r), Some(g), Some(b)) = (r, g, b) else {
        return Err(PropertyError::invalid(
            "a color record needs at least r, g and b",
        ));
    };
    Ok(Rgba {
        r: component(r)?,
        g: component(g)?,
        b: component(b)?,
        a: a.map(alpha).transpose()?.unwrap_or(0.0),
    })
}

fn component(val: &Value) -> Result<u8> {
    let n = match val {
        Value::Int(i) => *i,
        Value::Float(f) => *f as i64,
        Value::Str(s) => s.trim().parse().map_err(|_| {
            PropertyError::invalid(format!("{s} is not a color component"))
        })?,
        other => {
            return Err(PropertyError::invalid(format!(
                "{other} is not a color component"
            )))
        }
    };
    u8::try_from(n).map_err(|_| {
        PropertyError::invalid(format!("color component {n} is out of range"))
    })
}

fn alpha(val: &Value) -> Result<f64> {
    match val {
        Value::Int(i) => Ok(*i as f64),
        Value::Float(f) => Ok(*f),
        Value::Str(s) => s.trim().parse().map_err(|_| {
            PropertyError::invalid(format!("{s} is not an alpha value"))
        }),
        Value::Null => Ok(0.0),
        other => {
            Err(PropertyError::invalid(format!("{other} is not an alpha value")))
        }
    }
}

static RGB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"rgb\s*\(\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*\)")
        .expect("valid regex")
});

static RGBA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"rgba\s*\(\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d*\.?\d+)\s*\)",
    )
    .expect("valid regex")
});

fn parse_color_str(raw: &str) -> Result<Rgba> {
    let s = raw.trim().to_lowercase().replace('#', "");
    if (s.len() == 3 || s.len() == 6) && s.chars().all(|c| c.is_ascii_hexdigit())
    {
        return parse_hex(&s);
    }
    if s.contains("rgb(") {
        return parse_functional(&RGB, &s);
    }
    if s.contains("rgba(") {
        return parse_functional(&RGBA, &s);
    }
    if s.contains("hsl(") || s.contains("hsla(") {
        return Err(PropertyError::NotImplemented(format!(
            "hsl colors are not supported: {raw}"
        )));
    }
    match NAMED_COLORS.iter().find(|(name, _)| *name == s) {
        Some((_, hex)) => parse_color_str(hex),
        None => Err(PropertyError::invalid(format!(
            "Color \"{raw}\" is not a valid SVG (or CSS) color name"
        ))),
    }
}

fn parse_hex(hex: &str) -> Result<Rgba> {
    let hex = if hex.len() == 3 {
        hex.chars().flat_map(|c| [c, c]).collect()
    } else {
        hex.to_string()
    };
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| {
            PropertyError::invalid(format!("#{hex} is not a valid hex color"))
        })
    };
    Ok(Rgba {
        r: channel(0)?,
        g: channel(2)?,
        b: channel(4)?,
        a: 0.0,
    })
}

fn parse_functional(re: &Regex, s: &str) -> Result<Rgba> {
    let caps = re.captures(s).ok_or_else(|| {
        PropertyError::invalid(format!("{s} is not a valid color"))
    })?;
    let component = |i: usize| -> Result<u8> {
        let raw = caps.get(i).map_or("", |m| m.as_str());
        raw.parse::<u16>()
            .ok()
            .and_then(|n| u8::try_from(n).ok())
            .ok_or_else(|| {
                PropertyError::invalid(format!(
                    "color component {raw} is out of range"
                ))
            })
    };
    let a = match caps.get(4) {
        Some(m) => m.as_str().parse().map_err(|_| {
            PropertyError::invalid(format!("{} is not an alpha value", m.as_str()))
        })?,
        None => 0.0,
    };
    Ok(Rgba {
        r: component(1)?,
        g: component(2)?,
        b: component(3)?,
        a,
    })
}

/// CSS Color Module Level 4 named colors.
static NAMED_COLORS: &[(&str, &str)] = &[
    ("aliceblue", "f0f8ff"),
    ("antiquewhite", "faebd7"),
    ("aqua", "00ffff"),
    ("aquamarine", "7fffd4"),
    ("azure", "f0ffff"),
    ("beige", "f5f5dc"),
    ("bisque", "ffe4c4"),
    ("black", "000000"),
    ("blanchedalmond", "ffebcd"),
    ("blue", "0000ff"),
    ("blueviolet", "8a2be2"),
    ("brown", "a52a2a"),
    ("burlywood", "deb887"),
    ("cadetblue", "5f9ea0"),
    ("chartreuse", "7fff00"),
    ("chocolate", "d2691e"),
    ("coral", "ff7f50"),
    ("cornflowerblue", "6495ed"),
    ("cornsilk", "fff8dc"),
    ("crimson", "dc143c"),
    ("cyan", "00ffff"),
    ("darkblue", "00008b"),
    ("darkcyan", "008b8b"),
    ("darkgoldenrod", "b8860b"),
    ("darkgray", "a9a9a9"),
    ("darkgreen", "006400"),
    ("darkgrey", "a9a9a9"),
    ("darkkhaki", "bdb76b"),
    ("darkmagenta", "8b008b"),
    ("darkolivegreen", "556b2f"),
    ("darkorange", "ff8c00"),
    ("darkorchid", "9932cc"),
    ("darkred", "8b0000"),
    ("darksalmon", "e9967a"),
    ("darkseagreen", "8fbc8f"),
    ("darkslateblue", "483d8b"),
    ("darkslategray", "2f4f4f"),
    ("darkslategrey", "2f4f4f"),
    ("darkturquoise", "00ced1"),
    ("darkviolet", "9400d3"),
    ("deeppink", "ff1493"),
    ("deepskyblue", "00bfff"),
    ("dimgray", "696969"),
    ("dimgrey", "696969"),
    ("dodgerblue", "1e90ff"),
    ("firebrick", "b22222"),
    ("floralwhite", "fffaf0"),
    ("forestgreen", "228b22"),
    ("fuchsia", "ff00ff"),
    ("gainsboro", "dcdcdc"),
    ("ghostwhite", "f8f8ff"),
    ("gold", "ffd700"),
    ("goldenrod", "daa520"),
    ("gray", "808080"),
    ("green", "008000"),
    ("greenyellow", "adff2f"),
    ("grey", "808080"),
    ("honeydew", "f0fff0"),
    ("hotpink", "ff69b4"),
    ("indianred", "cd5c5c"),
    ("indigo", "4b0082"),
    ("ivory", "fffff0"),
    ("khaki", "f0e68c"),
    ("lavender", "e6e6fa"),
    ("lavenderblush", "fff0f5"),
    ("lawngreen", "7cfc00"),
    ("lemonchiffon", "fffacd"),
    ("lightblue", "add8e6"),
    ("lightcoral", "f08080"),
    ("lightcyan", "e0ffff"),
    ("lightgoldenrodyellow", "fafad2"),
    ("lightgray", "d3d3d3"),
    ("lightgreen", "90ee90"),
    ("lightgrey", "d3d3d3"),
    ("lightpink", "ffb6c1"),
    ("lightsalmon", "ffa07a"),
    ("lightseagreen", "20b2aa"),
    ("lightskyblue", "87cefa"),
    ("lightslategray", "778899"),
    ("lightslategrey", "778899"),
    ("lightsteelblue", "b0c4de"),
    ("lightyellow", "ffffe0"),
    ("lime", "00ff00"),
    ("limegreen", "32cd32"),
    ("linen", "faf0e6"),
    ("magenta", "ff00ff"),
    ("maroon", "800000"),
    ("mediumaquamarine", "66cdaa"),
    ("mediumblue", "0000cd"),
    ("mediumorchid", "ba55d3"),
    ("mediumpurple", "9370db"),
    ("mediumseagreen", "3cb371"),
    ("mediumslateblue", "7b68ee"),
    ("mediumspringgreen", "00fa9a"),
    ("mediumturquoise", "48d1cc"),
    ("mediumvioletred", "c71585"),
    ("midnightblue", "191970"),
    ("mintcream", "f5fffa"),
    ("mistyrose", "ffe4e1"),
    ("moccasin", "ffe4b5"),
    ("navajowhite", "ffdead"),
    ("navy", "000080"),
    ("oldlace", "fdf5e6"),
    ("olive", "808000"),
    ("olivedrab", "6b8e23"),
    ("orange", "ffa500"),
    ("orangered", "ff4500"),
    ("orchid", "da70d6"),
    ("palegoldenrod", "eee8aa"),
    ("palegreen", "98fb98"),
    ("paleturquoise", "afeeee"),
    ("palevioletred", "db7093"),
    ("papayawhip", "ffefd5"),
    ("peachpuff", "ffdab9"),
    ("peru", "cd853f"),
    ("pink", "ffc0cb"),
    ("plum", "dda0dd"),
    ("powderblue", "b0e0e6"),
    ("purple", "800080"),
    ("rebeccapurple", "663399"),
    ("red", "ff0000"),
    ("rosybrown", "bc8f8f"),
    ("royalblue", "4169e1"),
    ("saddlebrown", "8b4513"),
    ("salmon", "fa8072"),
    ("sandybrown", "f4a460"),
    ("seagreen", "2e8b57"),
    ("seashell", "fff5ee"),
    ("sienna", "a0522d"),
    ("silver", "c0c0c0"),
    ("skyblue", "87ceeb"),
    ("slateblue", "6a5acd"),
    ("slategray", "708090"),
    ("slategrey", "708090"),
    ("snow", "fffafa"),
    ("springgreen", "00ff7f"),
    ("steelblue", "4682b4"),
    ("tan", "d2b48c"),
    ("teal", "008080"),
    ("thistle", "d8bfd8"),
    ("tomato", "ff6347"),
    ("turquoise", "40e0d0"),
    ("violet", "ee82ee"),
    ("wheat", "f5deb3"),
    ("white", "ffffff"),
    ("whitesmoke", "f5f5f5"),
    ("yellow", "ffff00"),
    ("yellowgreen", "9acd32"),
];
