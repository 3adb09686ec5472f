use std::sync::LazyLock;

use regex::Regex;

static IMAGE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[image:\s*([^\]]+)\]").expect("valid image marker regex"));

static MARKDOWN_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[(.*?)\]\((.*?)\)").expect("valid markdown image regex"));

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Image(&'a str),
}

/// Split question text on `[image: file]` markers.
pub fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut last = 0;
    for caps in IMAGE_MARKER.captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            out.push(Segment::Text(&text[last..whole.start()]));
        }
        out.push(Segment::Image(name.as_str().trim()));
        last = whole.end();
    }
    if last < text.len() {
        out.push(Segment::Text(&text[last..]));
    }
    out
}

/// Option text with markdown images replaced by a terminal placeholder.
pub fn option_text(text: &str) -> String {
    MARKDOWN_IMAGE
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let alt = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let src = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            if alt.is_empty() {
                format!("[img {src}]")
            } else {
                format!("[img {alt}: {src}]")
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_image_markers() {
        let segs = segments("Which antenna? [image: MC1-0007.webp] Pick one.");
        assert_eq!(
            segs,
            vec![
                Segment::Text("Which antenna? "),
                Segment::Image("MC1-0007.webp"),
                Segment::Text(" Pick one."),
            ]
        );
    }

    #[test]
    fn plain_text_is_single_segment() {
        assert_eq!(segments("no images"), vec![Segment::Text("no images")]);
        assert!(segments("").is_empty());
    }

    #[test]
    fn markdown_images_become_placeholders() {
        assert_eq!(option_text("see ![dipole](d.png)"), "see [img dipole: d.png]");
        assert_eq!(option_text("![](x.webp)"), "[img x.webp]");
    }
}
