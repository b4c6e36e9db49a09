//! Detected-label state and the static topic-code → category table.

use std::fmt;
use std::str::FromStr;

use crate::error::CaseError;

/// Topic code an external labeler assigns to "application declined" messages.
pub const DECLINED_CODE: u32 = 2;

/// Topic code forced onto messages exchanged inside one mail domain.
pub const INTERNAL_CODE: u32 = 3;

/// Marker written for codes that have no category.
pub const UNMAPPED_MARKER: &str = "?";

/// Label state of a record as set by the external topic labeler.
///
/// `Unset` is distinct from every code, so "not labeled yet" can never be
/// mistaken for topic 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DetectedLabel {
    #[default]
    Unset,
    Code(u32),
}

impl DetectedLabel {
    /// The topic code, if one has been assigned.
    pub fn code(self) -> Option<u32> {
        match self {
            Self::Unset => None,
            Self::Code(c) => Some(c),
        }
    }

    pub fn is_set(self) -> bool {
        matches!(self, Self::Code(_))
    }

    /// Human-readable category for this label.
    pub fn category(self) -> Category {
        self.code().map_or(Category::Unmapped, Category::from_code)
    }
}

impl fmt::Display for DetectedLabel {
    /// Codes render as their number, `Unset` as an empty cell.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => Ok(()),
            Self::Code(c) => write!(f, "{c}"),
        }
    }
}

impl FromStr for DetectedLabel {
    type Err = CaseError;

    /// Parse a cell from a label file. Empty cells are `Unset`.
    ///
    /// Float-formatted integers (`"3.0"`) are accepted since spreadsheet
    /// tools commonly write codes that way.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::Unset);
        }
        let digits = s.strip_suffix(".0").unwrap_or(s);
        digits
            .parse::<u32>()
            .map(Self::Code)
            .map_err(|_| CaseError::InvalidLabel(s.to_string()))
    }
}

/// Interaction category of a recruiting message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    InitialApplication,
    AutomaticReply,
    InternalCommunication,
    CandidateCommunication,
    JobOffer,
    ApplicationDeclined,
    Unmapped,
}

impl Category {
    /// Map a detected topic code to its category.
    ///
    /// Code 8 and anything above 9 have no category.
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => Self::InitialApplication,
            2 => Self::ApplicationDeclined,
            6 | 9 => Self::JobOffer,
            0 | 4 | 7 => Self::CandidateCommunication,
            3 => Self::InternalCommunication,
            5 => Self::AutomaticReply,
            _ => Self::Unmapped,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::InitialApplication => "Initial Application by Candidate",
            Self::AutomaticReply => "Automatic Reply",
            Self::InternalCommunication => "Internal Communication / Clarification of Requirements",
            Self::CandidateCommunication => {
                "Organizational Communication with Candidate for Clarification of Skills or Interview Invitation"
            }
            Self::JobOffer => "Job Offer / Contract Negotiation",
            Self::ApplicationDeclined => "Application Declined",
            Self::Unmapped => UNMAPPED_MARKER,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Mail domain of an address (`hr@acme.com` → `acme.com`), lowercased.
pub fn mail_domain(address: &str) -> Option<String> {
    let (_, domain) = address.trim().rsplit_once('@')?;
    let domain = domain.trim_end_matches('>').trim();
    if domain.is_empty() {
        None
    } else {
        Some(domain.to_lowercase())
    }
}

/// Whether sender and recipient belong to the same mail domain.
pub fn is_internal(sender: &str, recipient: &str) -> bool {
    match (mail_domain(sender), mail_domain(recipient)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_table() {
        assert_eq!(Category::from_code(1), Category::InitialApplication);
        assert_eq!(Category::from_code(2), Category::ApplicationDeclined);
        assert_eq!(Category::from_code(3), Category::InternalCommunication);
        assert_eq!(Category::from_code(5), Category::AutomaticReply);
        for code in [6, 9] {
            assert_eq!(Category::from_code(code), Category::JobOffer);
        }
        for code in [0, 4, 7] {
            assert_eq!(Category::from_code(code), Category::CandidateCommunication);
        }
    }

    #[test]
    fn test_unmapped_codes() {
        assert_eq!(Category::from_code(8), Category::Unmapped);
        assert_eq!(Category::from_code(42), Category::Unmapped);
        assert_eq!(DetectedLabel::Unset.category(), Category::Unmapped);
        assert_eq!(Category::Unmapped.name(), "?");
    }

    #[test]
    fn test_parse_detected_label() {
        assert_eq!("3".parse::<DetectedLabel>().unwrap(), DetectedLabel::Code(3));
        assert_eq!("7.0".parse::<DetectedLabel>().unwrap(), DetectedLabel::Code(7));
        assert_eq!(" ".parse::<DetectedLabel>().unwrap(), DetectedLabel::Unset);
        assert!("abc".parse::<DetectedLabel>().is_err());
        assert!("-1".parse::<DetectedLabel>().is_err());
    }

    #[test]
    fn test_display_detected_label() {
        assert_eq!(DetectedLabel::Code(4).to_string(), "4");
        assert_eq!(DetectedLabel::Unset.to_string(), "");
    }

    #[test]
    fn test_internal_domains() {
        assert!(is_internal("anna@acme.com", "Bob@ACME.com"));
        assert!(!is_internal("anna@acme.com", "cand@mail.org"));
        assert!(!is_internal("no-address", "bob@acme.com"));
        assert_eq!(mail_domain("x@Sub.Example.org"), Some("sub.example.org".into()));
    }
}
