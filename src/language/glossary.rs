/// Company terms that must survive translation and answer generation verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glossary {
    terms: Vec<String>,
}

const DEFAULT_TERMS: [&str; 6] = [
    "reclaim",
    "reclaiming",
    "reclameren",
    "budget",
    "mediator",
    "DJ",
];

impl Glossary {
    /// Build a glossary from arbitrary terms, trimming and dropping blanks and duplicates.
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut collected: Vec<String> = Vec::new();
        for term in terms {
            let trimmed = term.as_ref().trim();
            if trimmed.is_empty() || collected.iter().any(|known| known == trimmed) {
                continue;
            }
            collected.push(trimmed.to_string());
        }
        Self { terms: collected }
    }

    /// Terms in insertion order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Whether no terms are configured.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Render the terms as a quoted, comma separated list for prompts.
    pub fn quoted(&self) -> String {
        self.terms
            .iter()
            .map(|term| format!("\"{term}\""))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for Glossary {
    fn default() -> Self {
        Self::new(DEFAULT_TERMS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trims_and_dedupes() {
        let glossary = Glossary::new([" reclaim ", "", "reclaim", "DJ"]);
        assert_eq!(glossary.terms(), ["reclaim".to_string(), "DJ".to_string()]);
        assert_eq!(glossary.quoted(), "\"reclaim\", \"DJ\"");
    }

    #[test]
    fn default_keeps_reclaim_terms() {
        let glossary = Glossary::default();
        assert!(glossary.terms().iter().any(|term| term == "reclameren"));
        assert!(!glossary.is_empty());
    }
}
