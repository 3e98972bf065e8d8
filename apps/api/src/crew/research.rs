//! Structured output of the research task: the job posting, itemized.

use serde::{Deserialize, Serialize};

use crate::crew::pipeline::TaskError;
use crate::llm_client::parse_json;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Requirements {
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub qualifications: Vec<String>,
    #[serde(default)]
    pub experience: Vec<String>,
}

impl Requirements {
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty() && self.qualifications.is_empty() && self.experience.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResearch {
    pub job_title: String,
    pub company: String,
    pub requirements: Requirements,
    #[serde(default)]
    pub summary: Option<String>,
}

impl JobResearch {
    /// Display title, e.g. "Senior Backend Engineer at Acme".
    pub fn title(&self) -> String {
        format!("{} at {}", self.job_title.trim(), self.company.trim())
    }
}

/// Parses and validates the researcher's final answer.
///
/// Never falls back to an empty structure: output that does not match the
/// schema, or that lacks a title or company, fails the task.
pub fn parse_research(raw: &str) -> Result<JobResearch, TaskError> {
    let research: JobResearch = parse_json(raw)
        .map_err(|e| TaskError::InvalidOutput(format!("research output is not valid JSON: {e}")))?;

    if research.job_title.trim().is_empty() {
        return Err(TaskError::InvalidOutput(
            "research output has an empty job_title".to_string(),
        ));
    }
    if research.company.trim().is_empty() {
        return Err(TaskError::InvalidOutput(
            "research output has an empty company".to_string(),
        ));
    }

    if research.requirements.is_empty() {
        return Err(TaskError::InvalidOutput(
            "research output lists no skills, qualifications or experience".to_string(),
        ));
    }

    Ok(research)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "job_title": "Senior Backend Engineer",
        "company": "Acme",
        "requirements": {
            "skills": ["Rust", "PostgreSQL"],
            "qualifications": ["BSc Computer Science"],
            "experience": ["5+ years backend"]
        }
    }"#;

    #[test]
    fn test_valid_research_parses() {
        let research = parse_research(VALID).unwrap();
        assert_eq!(research.title(), "Senior Backend Engineer at Acme");
        assert_eq!(research.requirements.skills, vec!["Rust", "PostgreSQL"]);
        assert!(research.summary.is_none());
    }

    #[test]
    fn test_fenced_research_parses() {
        let fenced = format!("```json\n{VALID}\n```");
        assert!(parse_research(&fenced).is_ok());
    }

    #[test]
    fn test_missing_requirement_lists_default_to_empty() {
        let raw = r#"{"job_title": "SRE", "company": "Globex", "requirements": {"skills": ["Go"]}}"#;
        let research = parse_research(raw).unwrap();
        assert!(research.requirements.experience.is_empty());
    }

    #[test]
    fn test_free_text_is_rejected() {
        let err = parse_research("The role is a backend position at Acme.").unwrap_err();
        assert!(matches!(err, TaskError::InvalidOutput(_)));
    }

    #[test]
    fn test_missing_requirements_object_is_rejected() {
        let raw = r#"{"job_title": "SRE", "company": "Globex"}"#;
        assert!(matches!(
            parse_research(raw),
            Err(TaskError::InvalidOutput(_))
        ));
    }

    #[test]
    fn test_empty_title_is_rejected() {
        let raw = r#"{"job_title": " ", "company": "Globex", "requirements": {"skills": ["Go"]}}"#;
        let err = parse_research(raw).unwrap_err();
        assert!(err.to_string().contains("job_title"));
    }

    #[test]
    fn test_empty_company_is_rejected() {
        let raw = r#"{"job_title": "SRE", "company": "", "requirements": {"skills": ["Go"]}}"#;
        let err = parse_research(raw).unwrap_err();
        assert!(err.to_string().contains("company"));
    }

    #[test]
    fn test_empty_requirements_are_rejected() {
        for raw in [
            r#"{"job_title": "SRE", "company": "Globex", "requirements": {}}"#,
            r#"{"job_title": "SRE", "company": "Globex", "requirements": {"unrelated": 1}}"#,
            r#"{"job_title": "SRE", "company": "Globex",
                "requirements": {"skills": [], "qualifications": [], "experience": []}}"#,
        ] {
            let err = parse_research(raw).unwrap_err();
            assert!(matches!(err, TaskError::InvalidOutput(_)), "{raw}");
            assert!(err.to_string().contains("no skills"), "{raw}");
        }
    }
}
