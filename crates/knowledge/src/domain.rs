//! Knowledge domain partitions.
//!
//! Each business module owns one knowledge partition. The domain selector
//! is a closed enumeration: table names and document-type allow-lists are
//! resolved through lookups on the enum, never interpolated from caller
//! input.

use serde::{Deserialize, Serialize};

/// The knowledge partitions known to the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnowledgeDomain {
    /// Ghost-writing: style references, transcripts, drafts
    Ghost,
    /// Legal compliance: laws, contracts, precedents
    Legal,
    /// Natural-language-to-SQL: schema notes, query examples
    Query,
    /// Insurance analytics: policies, claims reports, regulatory norms
    Insurance,
}

impl KnowledgeDomain {
    /// All known domains.
    pub const ALL: [KnowledgeDomain; 4] = [
        KnowledgeDomain::Ghost,
        KnowledgeDomain::Legal,
        KnowledgeDomain::Query,
        KnowledgeDomain::Insurance,
    ];

    /// Parse a domain selector.
    ///
    /// Returns `None` for anything outside the allow-list; callers treat
    /// that as "retrieve nothing", not as an error.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ghost" => Some(Self::Ghost),
            "legal" => Some(Self::Legal),
            "query" => Some(Self::Query),
            "insurance" => Some(Self::Insurance),
            _ => None,
        }
    }

    /// Get the canonical domain name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ghost => "ghost",
            Self::Legal => "legal",
            Self::Query => "query",
            Self::Insurance => "insurance",
        }
    }

    /// Table prefix for the storage backend.
    pub fn table_prefix(&self) -> &'static str {
        self.as_str()
    }

    /// Document types accepted by this domain.
    pub fn doc_types(&self) -> &'static [&'static str] {
        match self {
            Self::Ghost => &["style_reference", "transcript", "draft", "article"],
            Self::Legal => &[
                "law",
                "regulation",
                "contract",
                "policy",
                "precedent",
                "petition",
                "opinion",
                "gold_piece",
            ],
            Self::Query => &["schema_note", "query_example", "glossary"],
            Self::Insurance => &[
                "policy",
                "report",
                "regulation",
                "ans_norm",
                "coverage_table",
            ],
        }
    }

    /// Check a document type against this domain's allow-list.
    pub fn is_valid_doc_type(&self, doc_type: &str) -> bool {
        self.doc_types().contains(&doc_type)
    }
}

impl std::fmt::Display for KnowledgeDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
