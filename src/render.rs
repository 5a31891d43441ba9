// Output formatting: decorates pod/subpod titles, unescapes HTML entities
// and lays the sections of a result out as plain lines of text.

use crate::api::web_url;
use crate::config::Colors;
use crate::pictures::PictureIndex;
use crate::xml::QueryResult;
use crossterm::style::{style, Color, Stylize};
use std::str::FromStr;

/// Printed when a query produced nothing to show.
pub const NO_RESULT: &str = "No result.";

/// Terminal colors by their colorama-style names (`GREEN`, `LIGHTBLUE_EX`...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    LightBlack,
    LightRed,
    LightGreen,
    LightYellow,
    LightBlue,
    LightMagenta,
    LightCyan,
    LightWhite,
}

impl FromStr for TermColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let color = match s.trim().to_ascii_uppercase().as_str() {
            "BLACK" => TermColor::Black,
            "RED" => TermColor::Red,
            "GREEN" => TermColor::Green,
            "YELLOW" => TermColor::Yellow,
            "BLUE" => TermColor::Blue,
            "MAGENTA" => TermColor::Magenta,
            "CYAN" => TermColor::Cyan,
            "WHITE" => TermColor::White,
            "LIGHTBLACK_EX" => TermColor::LightBlack,
            "LIGHTRED_EX" => TermColor::LightRed,
            "LIGHTGREEN_EX" => TermColor::LightGreen,
            "LIGHTYELLOW_EX" => TermColor::LightYellow,
            "LIGHTBLUE_EX" => TermColor::LightBlue,
            "LIGHTMAGENTA_EX" => TermColor::LightMagenta,
            "LIGHTCYAN_EX" => TermColor::LightCyan,
            "LIGHTWHITE_EX" => TermColor::LightWhite,
            other => return Err(format!("unknown color '{other}'")),
        };
        Ok(color)
    }
}

impl From<TermColor> for Color {
    fn from(c: TermColor) -> Self {
        match c {
            TermColor::Black => Color::Black,
            TermColor::Red => Color::DarkRed,
            TermColor::Green => Color::DarkGreen,
            TermColor::Yellow => Color::DarkYellow,
            TermColor::Blue => Color::DarkBlue,
            TermColor::Magenta => Color::DarkMagenta,
            TermColor::Cyan => Color::DarkCyan,
            TermColor::White => Color::Grey,
            TermColor::LightBlack => Color::DarkGrey,
            TermColor::LightRed => Color::Red,
            TermColor::LightGreen => Color::Green,
            TermColor::LightYellow => Color::Yellow,
            TermColor::LightBlue => Color::Blue,
            TermColor::LightMagenta => Color::Magenta,
            TermColor::LightCyan => Color::Cyan,
            TermColor::LightWhite => Color::White,
        }
    }
}

/// Title decoration. When either configured color name is unknown both
/// titles fall back to `** pod **` and `(subpod)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    Colored { pod: TermColor, subpod: TermColor },
    Plain,
}

impl Palette {
    pub fn new(colors: &Colors) -> Self {
        match (colors.pod.parse(), colors.subpod.parse()) {
            (Ok(pod), Ok(subpod)) => Palette::Colored { pod, subpod },
            (pod, subpod) => {
                for err in [pod.err(), subpod.err()].into_iter().flatten() {
                    tracing::warn!("{err}, falling back to plain titles");
                }
                Palette::Plain
            }
        }
    }

    pub fn pod(&self, title: &str) -> String {
        match self {
            Palette::Colored { pod, .. } => style(title).with(Color::from(*pod)).to_string(),
            Palette::Plain => format!("** {title} **"),
        }
    }

    pub fn subpod(&self, title: &str) -> String {
        match self {
            Palette::Colored { subpod, .. } => style(title).with(Color::from(*subpod)).to_string(),
            Palette::Plain => format!("({title})"),
        }
    }
}

/// Placeholder shown instead of an image-only subpod.
pub fn picture_placeholder(number: usize) -> String {
    format!("(Type :p {number} to see picture)")
}

/// Render a parsed result. The picture index is rebuilt from scratch when
/// `fetch_pics` is on, and left empty otherwise.
pub fn format_result(
    result: &QueryResult,
    palette: &Palette,
    fetch_pics: bool,
    pictures: &mut PictureIndex,
) -> String {
    pictures.clear();

    if !result.success {
        return match &result.error {
            Some(error) => unescape(&format!("Error #{}: {}", error.code.trim(), error.msg.trim())),
            None => NO_RESULT.to_string(),
        };
    }

    let mut sections = Vec::new();
    for pod in &result.pods {
        let mut lines = Vec::new();
        for subpod in &pod.subpods {
            let heading = subpod
                .title
                .as_deref()
                .map(|t| format!("{}\n", palette.subpod(t)))
                .unwrap_or_default();

            if !subpod.plaintext.trim().is_empty() {
                lines.push(unescape(format!("{heading}{}", subpod.plaintext).trim()));
            } else if fetch_pics && !subpod.images.is_empty() {
                let placeholders: Vec<String> = subpod
                    .images
                    .iter()
                    .map(|image| picture_placeholder(pictures.push(image.clone())))
                    .collect();
                lines.push(format!("{heading}{}", placeholders.join("\n")));
            }
        }

        if !lines.is_empty() {
            let mut section = vec![palette.pod(&unescape(&pod.title))];
            section.extend(lines);
            sections.push(section.join("\n"));
        }
    }

    if sections.is_empty() {
        return NO_RESULT.to_string();
    }
    sections.join("\n\n")
}

/// Append the wolframalpha.com link for `query` on its own line.
pub fn with_web_url(body: &str, query: &str) -> String {
    format!("{body}\n({})", web_url(query))
}

fn unescape(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::{ApiError, Image, Pod, Subpod};
    use pretty_assertions::assert_eq;

    fn subpod(title: Option<&str>, plaintext: &str) -> Subpod {
        Subpod {
            title: title.map(str::to_string),
            plaintext: plaintext.to_string(),
            images: Vec::new(),
        }
    }

    fn success(pods: Vec<Pod>) -> QueryResult {
        QueryResult {
            success: true,
            error: None,
            pods,
        }
    }

    #[test]
    fn color_names_parse_case_insensitively() {
        assert_eq!("green".parse::<TermColor>(), Ok(TermColor::Green));
        assert_eq!("LIGHTBLUE_EX".parse::<TermColor>(), Ok(TermColor::LightBlue));
        assert!("PUCE".parse::<TermColor>().is_err());
    }

    #[test]
    fn unknown_color_falls_back_to_plain() {
        let palette = Palette::new(&Colors {
            pod: "GREEN".into(),
            subpod: "PUCE".into(),
        });
        assert_eq!(palette, Palette::Plain);
        assert_eq!(palette.pod("Result"), "** Result **");
        assert_eq!(palette.subpod("Exact"), "(Exact)");
    }

    #[test]
    fn colored_titles_keep_their_text() {
        let palette = Palette::new(&Colors::default());
        assert_eq!(
            palette,
            Palette::Colored {
                pod: TermColor::Green,
                subpod: TermColor::Blue,
            }
        );
        assert_eq!(palette.pod("Result"), "\u{1b}[38;5;2mResult\u{1b}[39m");
        assert_eq!(palette.subpod("Exact"), "\u{1b}[38;5;4mExact\u{1b}[39m");
        assert_eq!(
            palette.pod("Result"),
            style("Result").with(Color::DarkGreen).to_string()
        );
    }

    #[test]
    fn colored_palette_decorates_every_title() {
        let palette = Palette::Colored {
            pod: TermColor::LightCyan,
            subpod: TermColor::Magenta,
        };
        let result = success(vec![
            Pod {
                title: "Input".into(),
                subpods: vec![subpod(None, "2 + 2")],
            },
            Pod {
                title: "Result".into(),
                subpods: vec![subpod(Some("Exact"), "4")],
            },
        ]);
        let out = format_result(&result, &palette, false, &mut PictureIndex::default());
        assert_eq!(
            out,
            format!(
                "{}\n2 + 2\n\n{}\n{}\n4",
                style("Input").with(Color::Cyan),
                style("Result").with(Color::Cyan),
                style("Exact").with(Color::DarkMagenta),
            )
        );
        assert!(!out.contains("**"));
    }

    #[test]
    fn formats_pods_with_titles_and_unescaped_text() {
        let result = success(vec![
            Pod {
                title: "Input".into(),
                subpods: vec![subpod(None, "2 + 2")],
            },
            Pod {
                title: "Result".into(),
                subpods: vec![subpod(Some("Exact"), "4 &amp; &lt;5&gt;\n")],
            },
        ]);
        let mut pictures = PictureIndex::default();
        let out = format_result(&result, &Palette::Plain, false, &mut pictures);
        assert_eq!(
            out,
            "** Input **\n2 + 2\n\n** Result **\n(Exact)\n4 & <5>"
        );
        assert!(pictures.is_empty());
    }

    #[test]
    fn error_block_is_one_line() {
        let result = QueryResult {
            success: false,
            error: Some(ApiError {
                code: "1".into(),
                msg: "Invalid appid".into(),
            }),
            pods: Vec::new(),
        };
        let out = format_result(&result, &Palette::Plain, false, &mut PictureIndex::default());
        assert_eq!(out, "Error #1: Invalid appid");
    }

    #[test]
    fn failure_without_error_is_no_result() {
        let out = format_result(
            &QueryResult::default(),
            &Palette::Plain,
            false,
            &mut PictureIndex::default(),
        );
        assert_eq!(out, NO_RESULT);
    }

    #[test]
    fn pod_without_plaintext_is_omitted() {
        let mut image_only = subpod(Some("Plot"), "");
        image_only.images.push(Image {
            src: "https://example.com/plot.gif".into(),
        });
        let result = success(vec![
            Pod {
                title: "Plot".into(),
                subpods: vec![image_only, subpod(None, "   ")],
            },
            Pod {
                title: "Result".into(),
                subpods: vec![subpod(None, "4")],
            },
        ]);
        let mut pictures = PictureIndex::default();
        let out = format_result(&result, &Palette::Plain, false, &mut pictures);
        assert_eq!(out, "** Result **\n4");
        assert!(pictures.is_empty());
    }

    #[test]
    fn image_only_subpods_get_numbered_placeholders() {
        let mut plot = subpod(Some("Plot"), "");
        plot.images.push(Image {
            src: "https://example.com/plot.gif".into(),
        });
        let mut other = subpod(None, "");
        other.images.push(Image {
            src: "https://example.com/other.gif".into(),
        });
        let result = success(vec![Pod {
            title: "Plots".into(),
            subpods: vec![plot, subpod(None, "text"), other],
        }]);

        let mut pictures = PictureIndex::default();
        pictures.push(Image::default());
        let out = format_result(&result, &Palette::Plain, true, &mut pictures);
        assert_eq!(
            out,
            "** Plots **\n(Plot)\n(Type :p 1 to see picture)\ntext\n(Type :p 2 to see picture)"
        );
        assert_eq!(pictures.len(), 2);
        assert_eq!(pictures.get(1).unwrap().src, "https://example.com/plot.gif");
        assert_eq!(pictures.get(2).unwrap().src, "https://example.com/other.gif");
    }

    #[test]
    fn success_with_nothing_to_show_is_no_result() {
        let result = success(vec![Pod {
            title: "Empty".into(),
            subpods: vec![subpod(None, "")],
        }]);
        let out = format_result(&result, &Palette::Plain, false, &mut PictureIndex::default());
        assert_eq!(out, NO_RESULT);
    }

    #[test]
    fn web_url_goes_on_its_own_line() {
        let out = with_web_url("** Result **\n4", "2+2");
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("** Result **"));
        assert_eq!(lines.next(), Some("4"));
        let last = lines.next().unwrap();
        assert!(last.starts_with("(https://www.wolframalpha.com/input/?i="));
        assert!(last.ends_with(')'));
    }
}
