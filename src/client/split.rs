/// Phrases that open the second beat of a two-part bot reply.
#[derive(Debug, Clone, Default)]
pub struct AnchorTable {
    anchors: Vec<String>,
}

impl AnchorTable {
    pub fn new(anchors: Vec<String>) -> Self {
        Self {
            anchors: anchors.into_iter().filter(|a| !a.is_empty()).collect(),
        }
    }

    pub fn anchors(&self) -> &[String] {
        &self.anchors
    }

    /// Splits `text` in front of the first anchor (table order) that has
    /// something before it. Yields one or two trimmed parts, in source order.
    pub fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        for anchor in &self.anchors {
            if let Some(pos) = text.find(anchor.as_str()) {
                let head = text[..pos].trim();
                if !head.is_empty() {
                    return vec![head, text[pos..].trim()];
                }
            }
        }
        vec![text.trim()]
    }
}
