use serde::{Deserialize, Serialize};

/// A tracker issue as handed to the merge engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Issue key, e.g. `CRM-12`
    pub key: String,
    pub title: String,
    /// Raw multi-line acceptance criteria text
    #[serde(alias = "acceptanceCriteria", default)]
    pub acceptance_criteria: String,
}

impl Issue {
    pub fn new(key: &str, title: &str, acceptance_criteria: &str) -> Self {
        Issue {
            key: key.to_string(),
            title: title.to_string(),
            acceptance_criteria: acceptance_criteria.to_string(),
        }
    }

    /// Numeric suffix of the key (`CRM-12` → 12).
    pub fn number(&self) -> Option<u64> {
        let (_, suffix) = self.key.rsplit_once('-')?;
        suffix.parse().ok()
    }

    /// Project prefix of the key (`CRM-12` → `CRM`).
    pub fn prefix(&self) -> &str {
        self.key
            .rsplit_once('-')
            .map(|(prefix, _)| prefix)
            .unwrap_or(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_and_prefix() {
        let issue = Issue::new("CRM-12", "t", "");
        assert_eq!(issue.number(), Some(12));
        assert_eq!(issue.prefix(), "CRM");

        let multi = Issue::new("MY-APP-7", "t", "");
        assert_eq!(multi.number(), Some(7));
        assert_eq!(multi.prefix(), "MY-APP");
    }

    #[test]
    fn test_number_missing() {
        assert_eq!(Issue::new("CRM", "t", "").number(), None);
        assert_eq!(Issue::new("CRM-x", "t", "").number(), None);
    }

    #[test]
    fn test_deserialize_camel_case_alias() {
        let json = r#"{"key":"CRM-1","title":"Login","acceptanceCriteria":"a\nb"}"#;
        let issue: Issue = serde_json::from_str(json).unwrap();
        assert_eq!(issue.acceptance_criteria, "a\nb");
    }
}
