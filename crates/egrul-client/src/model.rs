//! Response bodies of the register search

use serde::Deserialize;

/// Body of the search form submission
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchToken {
    /// Token addressing the result page
    #[serde(default)]
    pub t: Option<String>,
}

impl SearchToken {
    /// The token, if the register issued a non-empty one
    pub fn token(&self) -> Option<&str> {
        self.t.as_deref().filter(|t| !t.is_empty())
    }
}

/// Body of the result page
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub rows: Vec<SearchRow>,
}

/// One register entry; the register keys its fields with single letters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRow {
    /// Head of the organisation, e.g. `"ГЕНЕРАЛЬНЫЙ ДИРЕКТОР: Иванов Иван Иванович"`
    #[serde(default)]
    pub g: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_ignores_empty() {
        let body: SearchToken = serde_json::from_str(r#"{"t":""}"#).unwrap();
        assert_eq!(body.token(), None);

        let body: SearchToken = serde_json::from_str(r#"{"t":"abc"}"#).unwrap();
        assert_eq!(body.token(), Some("abc"));

        let body: SearchToken = serde_json::from_str("{}").unwrap();
        assert_eq!(body.token(), None);
    }

    #[test]
    fn test_result_defaults() {
        let body: SearchResult = serde_json::from_str(r#"{"rows":[{"n":"ООО","i":"7707083893"}]}"#).unwrap();
        assert_eq!(body.rows.len(), 1);
        assert!(body.rows[0].g.is_none());

        let body: SearchResult = serde_json::from_str(r#"{"status":"wait"}"#).unwrap();
        assert!(body.rows.is_empty());
    }
}
