//! Parser for the review's summary checklist.
//!
//! The service returns the checklist as one markdown-ish string:
//!
//! ```text
//! # Key Terms - **Payment** - Net 30 days. - **Termination** - 90 days notice.
//! This checklist covers the main obligations.
//! ```
//!
//! which we split into a heading, `(title, description)` items and a footer.

use once_cell::sync::Lazy;
use regex::Regex;

static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^(.*?) - \*\*").expect("static regex"));
static FOOTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)This checklist covers.*$").expect("static regex"));
// Items split on every " - **Title** - ", including one inside a
// description, the same way the web client reads the checklist.
static ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)- \*\*(.*?)\*\* - ").expect("static regex"));

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecklistItem {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checklist {
    pub heading: String,
    pub items: Vec<ChecklistItem>,
    pub footer: String,
}

impl Checklist {
    pub fn is_empty(&self) -> bool {
        self.heading.is_empty() && self.items.is_empty() && self.footer.is_empty()
    }
}

/// Split a checklist string into its parts.  Unrecognised input yields an
/// empty checklist rather than an error.
pub fn parse_checklist(text: &str) -> Checklist {
    let mut body = text;

    let heading = match HEADING_RE.captures(text).and_then(|c| c.get(1)) {
        Some(m) => {
            // Keep the " - **" that opened the first item.
            body = &text[m.end()..];
            m.as_str().trim().trim_start_matches('#').trim().to_string()
        }
        None => String::new(),
    };

    let footer = match FOOTER_RE.find(body) {
        Some(m) => {
            let footer = m.as_str().trim().to_string();
            body = &body[..m.start()];
            footer
        }
        None => String::new(),
    };

    let markers: Vec<_> = ITEM_RE.captures_iter(body).collect();
    let mut items = Vec::with_capacity(markers.len());
    for (i, caps) in markers.iter().enumerate() {
        let (Some(whole), Some(title)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let end = markers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(body.len(), |next| next.start());
        items.push(ChecklistItem {
            title: title.as_str().trim().to_string(),
            description: body[whole.end()..end].trim().to_string(),
        });
    }

    Checklist {
        heading,
        items,
        footer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(title: &str, description: &str) -> ChecklistItem {
        ChecklistItem {
            title: title.into(),
            description: description.into(),
        }
    }

    #[test]
    fn parses_heading_items_and_footer() {
        let text = "# Contract Review Checklist - **Payment Terms** - Net 30, late fees apply. \
                    - **Termination** - Either party with 90 days notice. \
                    This checklist covers the key obligations.";
        let checklist = parse_checklist(text);

        assert_eq!(checklist.heading, "Contract Review Checklist");
        assert_eq!(
            checklist.items,
            vec![
                item("Payment Terms", "Net 30, late fees apply."),
                item("Termination", "Either party with 90 days notice."),
            ]
        );
        assert_eq!(checklist.footer, "This checklist covers the key obligations.");
    }

    #[test]
    fn descriptions_may_span_lines() {
        let text = "Checklist - **Liability** - Capped at fees paid.\nExcludes gross negligence.";
        let checklist = parse_checklist(text);
        assert_eq!(
            checklist.items,
            vec![item("Liability", "Capped at fees paid.\nExcludes gross negligence.")]
        );
        assert_eq!(checklist.footer, "");
    }

    #[test]
    fn bold_marker_inside_description_starts_a_new_item() {
        let checklist = parse_checklist("Terms - **Fees** - See - **Schedule B** - for rates.");
        assert_eq!(
            checklist.items,
            vec![item("Fees", "See"), item("Schedule B", "for rates.")]
        );
    }

    #[test]
    fn items_without_heading() {
        let checklist = parse_checklist("- **Scope** - Services listed in Schedule 1.");
        assert_eq!(checklist.heading, "");
        assert_eq!(checklist.items, vec![item("Scope", "Services listed in Schedule 1.")]);
    }

    #[test]
    fn plain_text_yields_empty_checklist() {
        assert!(parse_checklist("").is_empty());
        let checklist = parse_checklist("no structure here");
        assert!(checklist.items.is_empty());
        assert_eq!(checklist.heading, "");
    }
}
