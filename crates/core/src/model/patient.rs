use serde::{Deserialize, Serialize};

/// Patient reference data used for autocomplete. Owned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub name: String,
    pub mrn: String,
    #[serde(default)]
    pub ward: String,
    #[serde(default)]
    pub bed: String,
}

impl Patient {
    /// Case-insensitive partial match on name or MRN.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return false;
        }
        self.name.to_lowercase().contains(&query) || self.mrn.to_lowercase().contains(&query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_name_and_mrn() {
        let p = Patient {
            name: "Emma Thompson".into(),
            mrn: "MRN-34567890".into(),
            ward: "emergency".into(),
            bed: "E-4".into(),
        };

        assert!(p.matches("emma"));
        assert!(p.matches("THOMP"));
        assert!(p.matches("3456"));
        assert!(!p.matches("johnson"));
        assert!(!p.matches("   "));
    }
}
