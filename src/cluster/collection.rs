//! The ordered list of cases built by the engine.
//!
//! Cases are scanned linearly; lookups are O(cases × records).

use crate::error::{CaseError, Result};
use crate::model::case::Case;
use crate::model::label::{DetectedLabel, DECLINED_CODE};
use crate::model::record::Record;

/// Cases in creation order. Cases are appended, never removed.
#[derive(Debug, Clone)]
pub struct CaseCollection {
    cases: Vec<Case>,
    declined: DetectedLabel,
}

impl Default for CaseCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl CaseCollection {
    pub fn new() -> Self {
        Self::with_declined(DetectedLabel::Code(DECLINED_CODE))
    }

    /// Collection whose cases count as failed when any record carries `declined`.
    pub fn with_declined(declined: DetectedLabel) -> Self {
        Self {
            cases: Vec::new(),
            declined,
        }
    }

    /// The reserved label marking a declined case.
    pub fn declined(&self) -> DetectedLabel {
        self.declined
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Case> {
        self.cases.iter()
    }

    pub fn as_slice(&self) -> &[Case] {
        &self.cases
    }

    /// Total number of records across all cases.
    pub fn record_count(&self) -> usize {
        self.cases.iter().map(Case::message_count).sum()
    }

    /// All records, case by case, in insertion order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.cases.iter().flat_map(|c| c.records().iter())
    }

    pub fn push(&mut self, case: Case) {
        self.cases.push(case);
    }

    /// Position of the case containing the record with `record_id`.
    pub fn position_of_record(&self, record_id: &str) -> Option<usize> {
        self.cases.iter().position(|c| c.contains(record_id))
    }

    /// The case containing the record with `record_id`.
    pub fn find_by_record_id(&self, record_id: &str) -> Option<&Case> {
        self.position_of_record(record_id).map(|i| &self.cases[i])
    }

    pub fn get(&self, case_id: &str) -> Option<&Case> {
        self.cases.iter().find(|c| c.id() == case_id)
    }

    /// Case at a position obtained from [`Self::position_of_record`] or a scan.
    pub(crate) fn case_mut(&mut self, index: usize) -> &mut Case {
        &mut self.cases[index]
    }

    /// Look up a record anywhere in the collection.
    pub fn record(&self, record_id: &str) -> Option<&Record> {
        self.records().find(|r| r.id() == record_id)
    }

    /// Set the detected label of the record with `record_id`.
    pub fn set_detected_label(&mut self, record_id: &str, label: DetectedLabel) -> Result<()> {
        self.cases
            .iter_mut()
            .find_map(|c| c.record_mut(record_id))
            .map(|r| r.set_detected_label(label))
            .ok_or_else(|| CaseError::UnknownRecord(record_id.to_string()))
    }

    /// Force `label` onto every record whose sender and recipient share a
    /// mail domain. Returns the number of records changed.
    pub fn label_internal_communication(&mut self, label: DetectedLabel) -> usize {
        let mut changed = 0;
        for record in self.cases.iter_mut().flat_map(|c| c.records_mut()) {
            if crate::model::label::is_internal(record.sender(), record.recipient()) {
                record.set_detected_label(label);
                changed += 1;
            }
        }
        changed
    }

    /// Distinct train labels in order of first appearance. Records without
    /// one are skipped.
    pub fn train_labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for label in self.records().filter_map(Record::train_label) {
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
        labels
    }

    /// Records whose train label equals `label`.
    pub fn records_by_train_label<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a Record> + 'a {
        self.records().filter(move |r| r.train_label() == Some(label))
    }

    /// One `"<subject> <body>"` document per record, for the topic model.
    pub fn corpus(&self) -> Vec<String> {
        self.records().map(Record::document).collect()
    }

    /// A new collection holding clones of the successful cases only.
    pub fn successful(&self) -> CaseCollection {
        Self {
            cases: self
                .cases
                .iter()
                .filter(|c| c.is_successful(self.declined))
                .cloned()
                .collect(),
            declined: self.declined,
        }
    }
}

impl<'a> IntoIterator for &'a CaseCollection {
    type Item = &'a Case;
    type IntoIter = std::slice::Iter<'a, Case>;

    fn into_iter(self) -> Self::IntoIter {
        self.cases.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::record::{InputRow, DEFAULT_DATE_FORMAT};

    fn rec(id: &str, from: &str, to: &str, label: Option<&str>) -> Record {
        Record::from_row(
            InputRow {
                from: from.into(),
                to: to.into(),
                subject: format!("Subject {id}"),
                content: format!("Body {id}"),
                datetime: Some("2021-06-01 08:00:00".into()),
                message_id: id.into(),
                in_reply_to: None,
                label: label.map(String::from),
            },
            DEFAULT_DATE_FORMAT,
        )
        .unwrap()
    }

    fn sample() -> CaseCollection {
        let mut cases = CaseCollection::new();
        let mut first = Case::new(rec("a", "cand@mail.org", "hr@acme.com", Some("1")));
        first.add(rec("b", "hr@acme.com", "boss@acme.com", Some("3")));
        cases.push(first);
        cases.push(Case::new(rec("c", "other@mail.org", "hr@acme.com", Some("1"))));
        cases
    }

    #[test]
    fn test_lookups() {
        let cases = sample();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases.record_count(), 3);
        assert_eq!(cases.find_by_record_id("b").map(Case::id), Some("a"));
        assert_eq!(cases.get("c").map(Case::message_count), Some(1));
        assert!(cases.get("b").is_none());
        assert!(cases.find_by_record_id("zzz").is_none());
    }

    #[test]
    fn test_set_detected_label() {
        let mut cases = sample();
        cases.set_detected_label("c", DetectedLabel::Code(5)).unwrap();
        assert_eq!(cases.record("c").unwrap().detected_label(), DetectedLabel::Code(5));

        let err = cases.set_detected_label("zzz", DetectedLabel::Code(5)).unwrap_err();
        assert!(matches!(err, CaseError::UnknownRecord(ref id) if id == "zzz"));
    }

    #[test]
    fn test_train_labels_in_first_appearance_order() {
        let cases = sample();
        assert_eq!(cases.train_labels(), vec!["1", "3"]);
        assert_eq!(cases.records_by_train_label("1").count(), 2);
    }

    #[test]
    fn test_corpus() {
        let cases = sample();
        assert_eq!(
            cases.corpus(),
            vec!["Subject a Body a", "Subject b Body b", "Subject c Body c"]
        );
    }

    #[test]
    fn test_internal_labeling() {
        let mut cases = sample();
        assert_eq!(cases.label_internal_communication(DetectedLabel::Code(3)), 1);
        assert_eq!(cases.record("b").unwrap().detected_label(), DetectedLabel::Code(3));
        assert_eq!(cases.record("a").unwrap().detected_label(), DetectedLabel::Unset);
    }

    #[test]
    fn test_successful_subset() {
        let mut cases = sample();
        cases.set_detected_label("c", DetectedLabel::Code(DECLINED_CODE)).unwrap();
        let ok = cases.successful();
        assert_eq!(ok.len(), 1);
        assert_eq!(ok.as_slice()[0].id(), "a");
        // Source collection is left untouched
        assert_eq!(cases.len(), 2);
    }
}
