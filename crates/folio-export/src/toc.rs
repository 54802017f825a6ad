//! Table of contents for the ebook converter.

use serde::{Deserialize, Serialize};

use crate::document::{DocumentId, DocumentNode, page_file_name};

/// Navigation entry pointing at a staged document page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    pub id: DocumentId,
    /// Staged page file name (`<id>.html`).
    pub link: String,
    #[serde(rename = "pid")]
    pub parent_id: DocumentId,
    pub title: String,
}

impl From<&DocumentNode> for TocEntry {
    fn from(doc: &DocumentNode) -> Self {
        Self {
            id: doc.id,
            link: page_file_name(doc.id),
            parent_id: doc.parent_id,
            title: doc.title.clone(),
        }
    }
}

/// Build the TOC from a flat document list.
///
/// Entries come out stratified: every top-level document first, then every
/// nested one, each group keeping its input order. Converters rebuild the
/// hierarchy from `parent_id`, so this is not a depth-first order.
pub fn build_toc(documents: &[DocumentNode]) -> Vec<TocEntry> {
    let (roots, nested): (Vec<&DocumentNode>, Vec<&DocumentNode>) =
        documents.iter().partition(|doc| doc.is_root());

    roots.into_iter().chain(nested).map(TocEntry::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(toc: &[TocEntry]) -> Vec<DocumentId> {
        toc.iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_roots_come_before_nested_entries() {
        let docs = vec![
            DocumentNode::new(1, 0, "A"),
            DocumentNode::new(2, 1, "B"),
            DocumentNode::new(3, 0, "C"),
            DocumentNode::new(4, 1, "D"),
        ];

        assert_eq!(ids(&build_toc(&docs)), vec![1, 3, 2, 4]);
    }

    #[test]
    fn test_relative_order_kept_within_strata() {
        let docs = vec![
            DocumentNode::new(9, 5, "deep"),
            DocumentNode::new(5, 0, "root b"),
            DocumentNode::new(7, 9, "deeper"),
            DocumentNode::new(2, 0, "root a"),
            DocumentNode::new(3, 5, "child"),
        ];

        assert_eq!(ids(&build_toc(&docs)), vec![5, 2, 9, 7, 3]);
    }

    #[test]
    fn test_entry_fields() {
        let toc = build_toc(&[DocumentNode::new(12, 4, "Install")]);

        assert_eq!(
            toc,
            vec![TocEntry {
                id: 12,
                link: "12.html".to_owned(),
                parent_id: 4,
                title: "Install".to_owned(),
            }]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(build_toc(&[]).is_empty());
    }

    #[test]
    fn test_serializes_parent_as_pid() {
        let toc = build_toc(&[DocumentNode::new(2, 1, "B")]);
        let json = serde_json::to_string(&toc[0]).unwrap();

        assert_eq!(json, r#"{"id":2,"link":"2.html","pid":1,"title":"B"}"#);
    }
}
