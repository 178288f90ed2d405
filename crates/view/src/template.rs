//! Structural template seam.

use waitboard_roster::EntryRecord;

/// Produces the structural content of an entry fragment.
///
/// `is_rendered` is true when the fragment already exists, in which case the
/// result replaces only the inner container.
pub trait Template {
    fn render(&self, record: &EntryRecord, is_rendered: bool) -> String;
}

impl<F> Template for F
where
    F: Fn(&EntryRecord, bool) -> String,
{
    fn render(&self, record: &EntryRecord, is_rendered: bool) -> String {
        self(record, is_rendered)
    }
}

/// Escapes text for use inside markup content or a quoted attribute.
pub fn escape_markup(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Minimal markup for headless use. Guest text is escaped.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainTemplate;

impl Template for PlainTemplate {
    fn render(&self, record: &EntryRecord, is_rendered: bool) -> String {
        let inner = format!(
            "<span class=\"entry-name\">{}</span><span class=\"party-size\">{}</span>\
             <span class=\"response\">{}</span>",
            escape_markup(&record.name),
            record.party_size,
            escape_markup(&record.response)
        );
        if is_rendered {
            inner
        } else {
            format!("<div class=\"waitlist_container\">{}</div>", inner)
        }
    }
}
