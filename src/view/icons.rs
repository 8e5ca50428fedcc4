//! Icon placeholder resolution

const PLACEHOLDER_START: &str = "<i data-feather=\"";
const PLACEHOLDER_END: &str = "</i>";

/// Replaces `<i data-feather="name">` placeholders with rendered icons.
pub trait IconResolver: Send + Sync {
    fn resolve(&self, html: &str) -> String;
}

/// Renders known icons as text glyphs; unknown names stay as placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlyphIcons;

impl GlyphIcons {
    pub fn glyph(name: &str) -> Option<&'static str> {
        match name {
            "sun" => Some("\u{2600}"),
            "moon" => Some("\u{263E}"),
            "chevron-down" => Some("\u{25BE}"),
            "minus-circle" => Some("\u{2296}"),
            _ => None,
        }
    }
}

impl IconResolver for GlyphIcons {
    fn resolve(&self, html: &str) -> String {
        let mut out = String::with_capacity(html.len());
        let mut rest = html;

        while let Some(start) = rest.find(PLACEHOLDER_START) {
            let after_start = &rest[start + PLACEHOLDER_START.len()..];
            let Some(name_end) = after_start.find('"') else {
                break;
            };
            let Some(close) = after_start.find(PLACEHOLDER_END) else {
                break;
            };
            let name = &after_start[..name_end];
            let placeholder_len = PLACEHOLDER_START.len() + close + PLACEHOLDER_END.len();

            out.push_str(&rest[..start]);
            match Self::glyph(name) {
                Some(glyph) => {
                    out.push_str(&format!(
                        "<span class=\"icon icon-{name}\" aria-hidden=\"true\">{glyph}</span>"
                    ));
                }
                None => out.push_str(&rest[start..start + placeholder_len]),
            }
            rest = &rest[start + placeholder_len..];
        }

        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_icons_are_replaced() {
        let html = "<button><i data-feather=\"moon\"></i></button><i data-feather=\"chevron-down\" class=\"cat-chevron\"></i>";
        let resolved = GlyphIcons.resolve(html);

        assert_eq!(
            resolved,
            "<button><span class=\"icon icon-moon\" aria-hidden=\"true\">\u{263E}</span></button><span class=\"icon icon-chevron-down\" aria-hidden=\"true\">\u{25BE}</span>"
        );
    }

    #[test]
    fn test_unknown_icons_are_kept() {
        let html = "a<i data-feather=\"rocket\"></i>b";
        assert_eq!(GlyphIcons.resolve(html), html);
    }

    #[test]
    fn test_text_without_placeholders_is_untouched() {
        assert_eq!(GlyphIcons.resolve("<p>plain</p>"), "<p>plain</p>");
    }
}
