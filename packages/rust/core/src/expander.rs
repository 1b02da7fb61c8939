//! Topic → search-term expansion.
//!
//! A curated table maps broad topics to narrower search terms. Topics not in
//! the table are searched as given.

use std::collections::BTreeMap;

use scholardigest_shared::{Result, ScholarDigestError};

/// Built-in expansions, keyed by lowercase topic.
const CURATED: &[(&str, &[&str])] = &[
    (
        "neuroscience",
        &[
            "neurobiology",
            "cognitive neuroscience",
            "computational neuroscience",
            "neuroimaging",
            "neurogenetics",
        ],
    ),
    (
        "machine learning",
        &[
            "deep learning",
            "reinforcement learning",
            "natural language processing",
            "computer vision",
            "machine learning algorithms",
        ],
    ),
    (
        "data science",
        &[
            "data analysis",
            "data mining",
            "big data",
            "data visualization",
            "predictive modeling",
        ],
    ),
    (
        "artificial intelligence",
        &[
            "machine learning",
            "deep learning",
            "natural language processing",
            "computer vision",
            "robotics",
        ],
    ),
    (
        "quantum computing",
        &[
            "quantum algorithms",
            "quantum information theory",
            "quantum cryptography",
            "quantum simulation",
        ],
    ),
    (
        "biotechnology",
        &[
            "genetic engineering",
            "biopharmaceuticals",
            "bioinformatics",
            "synthetic biology",
            "biomaterials",
        ],
    ),
    (
        "climate change",
        &[
            "global warming",
            "climate modeling",
            "renewable energy",
            "carbon capture",
            "climate policy",
        ],
    ),
    (
        "cybersecurity",
        &[
            "network security",
            "cryptography",
            "information security",
            "cybercrime",
            "data privacy",
        ],
    ),
    (
        "economics",
        &[
            "macroeconomics",
            "microeconomics",
            "behavioral economics",
            "econometrics",
            "development economics",
        ],
    ),
    (
        "psychology",
        &[
            "cognitive psychology",
            "social psychology",
            "developmental psychology",
            "clinical psychology",
            "neuroscience",
        ],
    ),
    (
        "sociology",
        &[
            "social inequality",
            "social networks",
            "culture",
            "gender studies",
            "race and ethnicity",
        ],
    ),
    (
        "history",
        &[
            "ancient history",
            "medieval history",
            "modern history",
            "world history",
            "military history",
        ],
    ),
    (
        "literature",
        &["poetry", "fiction", "drama", "nonfiction", "literary theory"],
    ),
    (
        "philosophy",
        &[
            "ethics",
            "metaphysics",
            "epistemology",
            "logic",
            "political philosophy",
        ],
    ),
    (
        "physics",
        &[
            "particle physics",
            "condensed matter physics",
            "astrophysics",
            "quantum mechanics",
            "general relativity",
        ],
    ),
    (
        "chemistry",
        &[
            "organic chemistry",
            "inorganic chemistry",
            "analytical chemistry",
            "physical chemistry",
            "biochemistry",
        ],
    ),
    (
        "biology",
        &[
            "cell biology",
            "molecular biology",
            "genetics",
            "ecology",
            "evolutionary biology",
        ],
    ),
];

/// Validated topic → terms table.
#[derive(Debug, Clone)]
pub struct TermExpander {
    table: BTreeMap<String, Vec<String>>,
}

impl TermExpander {
    /// The built-in table only.
    pub fn curated() -> Self {
        let table = CURATED
            .iter()
            .map(|(topic, terms)| {
                (
                    (*topic).to_string(),
                    terms.iter().map(|t| (*t).to_string()).collect(),
                )
            })
            .collect();
        Self { table }
    }

    /// The built-in table with `extra` entries merged over it.
    ///
    /// Keys must be lowercase with no surrounding whitespace, and every entry
    /// needs at least one non-blank term.
    pub fn new(extra: &BTreeMap<String, Vec<String>>) -> Result<Self> {
        let mut expander = Self::curated();

        for (topic, terms) in extra {
            validate_entry(topic, terms)?;
            expander.table.insert(topic.clone(), terms.clone());
        }

        Ok(expander)
    }

    /// Related search terms for `topic`, or `[topic]` when it is not in the
    /// table. Matching is case-insensitive.
    pub fn expand(&self, topic: &str) -> Vec<String> {
        match self.table.get(&topic.to_lowercase()) {
            Some(terms) => terms.clone(),
            None => vec![topic.to_string()],
        }
    }

    /// Known topic keys in sorted order.
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }
}

impl Default for TermExpander {
    fn default() -> Self {
        Self::curated()
    }
}

fn validate_entry(topic: &str, terms: &[String]) -> Result<()> {
    if topic.trim().is_empty() {
        return Err(ScholarDigestError::validation("expansion topic must not be empty"));
    }
    if topic != topic.trim() || topic != topic.to_lowercase() {
        return Err(ScholarDigestError::validation(format!(
            "expansion topic '{topic}' must be lowercase without surrounding whitespace"
        )));
    }
    if terms.is_empty() {
        return Err(ScholarDigestError::validation(format!(
            "expansion topic '{topic}' has no terms"
        )));
    }
    if terms.iter().any(|t| t.trim().is_empty()) {
        return Err(ScholarDigestError::validation(format!(
            "expansion topic '{topic}' contains a blank term"
        )));
    }
    Ok(())
}
