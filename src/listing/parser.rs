// src/listing/parser.rs
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::ListingDetail;

const NO_TITLE: &str = "No title";
const NO_DESCRIPTION: &str = "No description";

// Selectors are compile-time constants; a parse failure is a programming error.
static TITLE: Lazy<Selector> = Lazy::new(|| sel("span#titletextonly"));
static PRICE: Lazy<Selector> = Lazy::new(|| sel("span.price"));
static BODY: Lazy<Selector> = Lazy::new(|| sel("section#postingbody"));
static VALUE: Lazy<Selector> = Lazy::new(|| sel("span.valu"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

fn sel(s: &str) -> Selector {
    Selector::parse(s).unwrap_or_else(|e| panic!("invalid selector {s}: {e:?}"))
}

/// Collapse whitespace runs and trim.
pub fn collapse_ws(s: &str) -> String {
    RE_WS.replace_all(s, " ").trim().to_string()
}

fn text_of(el: ElementRef<'_>) -> String {
    collapse_ws(&el.text().collect::<Vec<_>>().join(" "))
}

fn first_text(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector)
        .next()
        .map(text_of)
        .filter(|t| !t.is_empty())
}

/// Value of `<div class="attr {class}"><span class="valu">…</span></div>`.
fn attr_value(doc: &Html, class: &str) -> Option<String> {
    let div = Selector::parse(&format!("div.attr.{class}")).ok()?;
    doc.select(&div)
        .next()
        .and_then(|d| d.select(&VALUE).next())
        .map(text_of)
        .filter(|t| !t.is_empty())
}

/// Posting body without the print-only QR code block.
fn body_text(doc: &Html) -> Option<String> {
    let section = doc.select(&BODY).next()?;
    let mut parts = Vec::new();
    for node in section.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let in_qr = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| e.classes().any(|c| c == "print-qrcode-container"))
        });
        if !in_qr {
            parts.push((**text).to_owned());
        }
    }
    Some(collapse_ws(&parts.join(" "))).filter(|t| !t.is_empty())
}

/// Extract the structured record from a listing page.
///
/// Missing optional attributes stay `None`; a missing title or body falls
/// back to a placeholder so the record is always complete.
pub fn parse_listing_html(html: &str, url: &str) -> ListingDetail {
    let doc = Html::parse_document(html);

    ListingDetail {
        title: first_text(&doc, &TITLE).unwrap_or_else(|| NO_TITLE.to_string()),
        price: first_text(&doc, &PRICE),
        bicycle_type: attr_value(&doc, "bicycle_type"),
        wheel_size: attr_value(&doc, "bicycle_wheel_size"),
        frame_size: attr_value(&doc, "bicycle_frame_size_freeform"),
        frame_material: attr_value(&doc, "bicycle_frame_material"),
        manufacturer: attr_value(&doc, "sale_manufacturer"),
        model: attr_value(&doc, "sale_model"),
        condition: attr_value(&doc, "condition"),
        body: body_text(&doc).unwrap_or_else(|| NO_DESCRIPTION.to_string()),
        url: url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_page_uses_placeholders() {
        let d = parse_listing_html("<html><body></body></html>", "https://x/1.html");
        assert_eq!(d.title, "No title");
        assert_eq!(d.body, "No description");
        assert!(d.price.is_none());
        assert!(d.manufacturer.is_none());
        assert_eq!(d.url, "https://x/1.html");
    }

    #[test]
    fn qr_block_is_dropped_and_whitespace_collapsed() {
        let html = r#"<section id="postingbody">
            <div class="print-qrcode-container"><p>QR Code Link to This Post</p></div>
            Shimano 105<br>   11 speed
        </section>"#;
        let d = parse_listing_html(html, "u");
        assert_eq!(d.body, "Shimano 105 11 speed");
    }

    #[test]
    fn attribute_link_text_is_kept() {
        let html = r#"<div class="attr sale_manufacturer"><span class="labl">make:</span>
            <span class="valu"><a href="/s?x">Trek</a></span></div>"#;
        let d = parse_listing_html(html, "u");
        assert_eq!(d.manufacturer.as_deref(), Some("Trek"));
    }
}
