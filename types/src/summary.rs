use crate::payload::AgentPayload;

pub const MAX_TOP_PIECES: usize = 8;
pub const MAX_COLORS: usize = 10;
pub const MAX_OCCASIONS: usize = 6;
pub const MAX_KEYWORDS: usize = 10;

/// Compact digest of a result payload, kept next to the assistant message.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TurnSummary {
    /// Product titles
    top_pieces: Vec<String>,
    /// Colours pooled across every product
    colors: Vec<String>,
    /// Outfit labels
    occasions: Vec<String>,
    /// Product tags
    keywords: Vec<String>,
}

impl TurnSummary {
    pub fn from_payload(payload: &AgentPayload) -> Self {
        let products = payload.products();
        Self {
            top_pieces: unique(products.iter().filter_map(|p| p.title()), MAX_TOP_PIECES),
            colors: unique(
                products.iter().flat_map(|p| p.colors().iter().map(String::as_str)),
                MAX_COLORS,
            ),
            occasions: unique(payload.outfits().iter().filter_map(|o| o.label()), MAX_OCCASIONS),
            keywords: unique(
                products.iter().flat_map(|p| p.tags().iter().map(String::as_str)),
                MAX_KEYWORDS,
            ),
        }
    }

    pub fn top_pieces(&self) -> &[String] {
        &self.top_pieces
    }

    pub fn colors(&self) -> &[String] {
        &self.colors
    }

    pub fn occasions(&self) -> &[String] {
        &self.occasions
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn is_empty(&self) -> bool {
        self.top_pieces.is_empty()
            && self.colors.is_empty()
            && self.occasions.is_empty()
            && self.keywords.is_empty()
    }
}

/// First-seen order, blanks skipped, at most `limit` entries.
fn unique<'a>(items: impl IntoIterator<Item = &'a str>, limit: usize) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for item in items {
        if seen.len() >= limit {
            break;
        }
        let item = item.trim();
        if item.is_empty() || seen.iter().any(|s| s == item) {
            continue;
        }
        seen.push(item.to_string());
    }
    seen
}
