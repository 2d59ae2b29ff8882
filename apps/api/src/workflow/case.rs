//! Case: the immutable input bundle a conversation evaluates.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

/// The six screening questions, keyed by the form field that answers them.
pub const CANDIDATE_QUESTIONS: [(&str, &str); 6] = [
    ("name", "What is your full name?"),
    ("experience", "How many years of experience do you have?"),
    ("skills", "What are your key technical skills?"),
    ("roles", "What roles are you interested in?"),
    ("availability", "What is your availability for interview?"),
    ("email", "What is your email address?"),
];

pub const DEFAULT_JOB_DESCRIPTION: &str = "\
We are looking for a skilled **Python Developer** to join our data engineering team. \
The ideal candidate will have experience in building scalable data pipelines and migrating \
ETL workflows. You will work closely with cross-functional teams to design, develop, and \
maintain data processing systems using modern frameworks.

**Key Responsibilities:**
- Develop and maintain ETL pipelines using PySpark.
- Migrate existing workflows from Talend to PySpark.
- Collaborate with data analysts, engineers, and stakeholders to understand requirements.
- Optimize data processing for performance and scalability.
- Ensure data quality and consistency.

**Required Skills:**
- 2+ years of experience with Python.
- Strong understanding of PySpark and distributed data processing.
- Experience with ETL tools like Talend.
- Familiarity with data warehousing concepts.
- Experience working with cloud platforms such as AWS or Azure is a plus.
- Excellent problem-solving and communication skills.

**Preferred Qualifications:**
- Bachelor's degree in Computer Science, Engineering, or related field.
- Familiarity with CI/CD pipelines and version control tools like Git.

**Location:** Remote
**Job Type:** Full-time
**Salary:** Competitive, based on experience
";

/// Reads the job description from `path`, or falls back to the built-in one.
pub fn load_job_description(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read job description from {}", path.display())),
        None => Ok(DEFAULT_JOB_DESCRIPTION.to_string()),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Case {
    pub job_description: String,
    pub resume_text: String,
    /// question id → answer, for the ids in `CANDIDATE_QUESTIONS`
    pub answers: BTreeMap<String, String>,
}

impl Case {
    /// Builds a case from the submitted form fields. Returns the ids of every
    /// question left missing or blank.
    pub fn from_answers(
        job_description: String,
        resume_text: String,
        fields: &BTreeMap<String, String>,
    ) -> Result<Self, Vec<String>> {
        let mut answers = BTreeMap::new();
        let mut missing = Vec::new();

        for (id, _) in CANDIDATE_QUESTIONS {
            match fields.get(id).map(|v| v.trim()).filter(|v| !v.is_empty()) {
                Some(answer) => {
                    answers.insert(id.to_string(), answer.to_string());
                }
                None => missing.push(id.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(missing);
        }

        Ok(Self {
            job_description,
            resume_text,
            answers,
        })
    }

    pub fn with_resume_text(mut self, resume_text: String) -> Self {
        self.resume_text = resume_text;
        self
    }

    pub fn answer(&self, id: &str) -> &str {
        self.answers.get(id).map(String::as_str).unwrap_or_default()
    }
}
