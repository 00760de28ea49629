//! Text exports of a document's extracted page text.

use serde::Serialize;

/// Text extracted from one page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageText(pub String);

impl PageText {
    /// Join extracted text items with single spaces.
    pub fn from_items<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut text = String::new();
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                text.push(' ');
            }
            text.push_str(item.as_ref());
        }
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PageText {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonExport<'a> {
    filename: String,
    num_pages: usize,
    pages: Vec<JsonPage<'a>>,
}

#[derive(Serialize)]
struct JsonPage<'a> {
    page: usize,
    content: &'a str,
}

/// Plain text, one `--- PAGE i ---` block per page.
pub fn to_plain_text(pages: &[PageText]) -> String {
    let mut out = String::new();
    for (i, page) in pages.iter().enumerate() {
        out.push_str(&format!("--- PAGE {} ---\n\n{}\n\n", i + 1, page.as_str()));
    }
    out
}

/// Pretty-printed JSON with the source file name and per-page content.
pub fn to_json(base_name: &str, pages: &[PageText]) -> Result<String, serde_json::Error> {
    let export = JsonExport {
        filename: format!("{base_name}.pdf"),
        num_pages: pages.len(),
        pages: pages
            .iter()
            .enumerate()
            .map(|(i, p)| JsonPage {
                page: i + 1,
                content: p.as_str(),
            })
            .collect(),
    };
    serde_json::to_string_pretty(&export)
}

fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

const HTML_STYLE: &str = "body{font-family:sans-serif;padding:2em;}\
.page{border:1px solid #ccc;padding:1.5em;margin-bottom:2em;}\
h2{border-bottom:2px solid #eee;padding-bottom:.5em;}\
p{white-space:pre-wrap;}";

/// Standalone HTML page with one `div.page` per page.
pub fn to_html(title: &str, pages: &[PageText]) -> String {
    let mut out = format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"UTF-8\"><title>{}</title><style>{HTML_STYLE}</style></head><body>",
        escape_markup(title)
    );
    for (i, page) in pages.iter().enumerate() {
        out.push_str(&format!(
            "<div class=\"page\"><h2>Page {}</h2><p>{}</p></div>",
            i + 1,
            escape_markup(page.as_str())
        ));
    }
    out.push_str("</body></html>");
    out
}

/// Minimal WordprocessingML document body.
///
/// Each page becomes a heading paragraph followed by a text paragraph.
pub fn to_wordml(pages: &[PageText]) -> String {
    let mut out = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>",
    );
    for (i, page) in pages.iter().enumerate() {
        out.push_str(&format!("<w:p><w:r><w:t>PAGE {}</w:t></w:r></w:p>", i + 1));
        out.push_str(&format!(
            "<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>",
            escape_markup(page.as_str())
        ));
    }
    out.push_str("</w:body></w:document>");
    out
}
