use serde::Deserialize;

/// Straight-alpha color with normalized `0..=1` channels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl StyleColor {
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Multiply alpha by an opacity factor in `0..=1`.
    pub fn with_opacity(self, opacity: f64) -> Self {
        Self {
            a: self.a * opacity.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Convert to straight-alpha RGBA8.
    pub fn to_rgba8(self) -> [u8; 4] {
        fn to_u8(x: f64) -> u8 {
            (x.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        [to_u8(self.r), to_u8(self.g), to_u8(self.b), to_u8(self.a)]
    }

    /// Parse a CSS color string as found in style documents.
    ///
    /// Accepted: `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb()`, `rgba()`, `hsl()`, `hsla()` and a
    /// handful of named colors.
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }
        let lower = s.to_ascii_lowercase();
        if let Some((name, args)) = split_function(&lower) {
            return parse_function(name, args);
        }
        named(&lower).ok_or_else(|| format!("unsupported color \"{s}\""))
    }
}

impl<'de> Deserialize<'de> for StyleColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

fn parse_hex(s: &str) -> Result<StyleColor, String> {
    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }
    fn hex_nibble(c: &str) -> Result<u8, String> {
        let v = u8::from_str_radix(c, 16).map_err(|_| format!("invalid hex digit \"{c}\""))?;
        Ok(v * 17)
    }

    if !s.is_ascii() {
        return Err("hex color must be ASCII".to_owned());
    }

    let (r, g, b, a) = match s.len() {
        3 | 4 => {
            let r = hex_nibble(&s[0..1])?;
            let g = hex_nibble(&s[1..2])?;
            let b = hex_nibble(&s[2..3])?;
            let a = if s.len() == 4 {
                hex_nibble(&s[3..4])?
            } else {
                255
            };
            (r, g, b, a)
        }
        6 | 8 => {
            let r = hex_byte(&s[0..2])?;
            let g = hex_byte(&s[2..4])?;
            let b = hex_byte(&s[4..6])?;
            let a = if s.len() == 8 {
                hex_byte(&s[6..8])?
            } else {
                255
            };
            (r, g, b, a)
        }
        _ => {
            return Err("hex color must be #RGB, #RGBA, #RRGGBB or #RRGGBBAA".to_owned());
        }
    };

    Ok(StyleColor::rgba(
        (r as f64) / 255.0,
        (g as f64) / 255.0,
        (b as f64) / 255.0,
        (a as f64) / 255.0,
    ))
}

fn split_function(s: &str) -> Option<(&str, Vec<&str>)> {
    let open = s.find('(')?;
    let inner = s[open + 1..].strip_suffix(')')?;
    let args = inner.split(',').map(str::trim).collect();
    Some((s[..open].trim(), args))
}

fn parse_function(name: &str, args: Vec<&str>) -> Result<StyleColor, String> {
    fn number(arg: &str) -> Result<f64, String> {
        arg.trim_end_matches('%')
            .parse::<f64>()
            .map_err(|_| format!("invalid color component \"{arg}\""))
    }
    fn alpha(args: &[&str], idx: usize) -> Result<f64, String> {
        match args.get(idx) {
            Some(a) => number(a),
            None => Ok(1.0),
        }
    }

    let expected = match name {
        "rgb" | "hsl" => 3,
        "rgba" | "hsla" => 4,
        _ => return Err(format!("unsupported color function \"{name}\"")),
    };
    if args.len() != expected {
        return Err(format!(
            "{name}() expects {expected} components, got {}",
            args.len()
        ));
    }

    match name {
        "rgb" | "rgba" => Ok(StyleColor::rgba(
            number(args[0])? / 255.0,
            number(args[1])? / 255.0,
            number(args[2])? / 255.0,
            alpha(&args, 3)?,
        )),
        _ => Ok(hsla_to_rgba(
            number(args[0])?,
            number(args[1])? / 100.0,
            number(args[2])? / 100.0,
            alpha(&args, 3)?,
        )),
    }
}

fn named(s: &str) -> Option<StyleColor> {
    let c = match s {
        "transparent" => StyleColor::TRANSPARENT,
        "black" => StyleColor::rgba(0.0, 0.0, 0.0, 1.0),
        "white" => StyleColor::rgba(1.0, 1.0, 1.0, 1.0),
        "red" => StyleColor::rgba(1.0, 0.0, 0.0, 1.0),
        "green" => StyleColor::rgba(0.0, 128.0 / 255.0, 0.0, 1.0),
        "blue" => StyleColor::rgba(0.0, 0.0, 1.0, 1.0),
        "yellow" => StyleColor::rgba(1.0, 1.0, 0.0, 1.0),
        "gray" | "grey" => StyleColor::rgba(128.0 / 255.0, 128.0 / 255.0, 128.0 / 255.0, 1.0),
        _ => return None,
    };
    Some(c)
}

fn hsla_to_rgba(h: f64, s: f64, l: f64, a: f64) -> StyleColor {
    let h = (h % 360.0 + 360.0) % 360.0 / 360.0;
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    if s == 0.0 {
        return StyleColor::rgba(l, l, l, a);
    }

    fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 1.0 / 2.0 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;

    StyleColor::rgba(
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
        a,
    )
}
