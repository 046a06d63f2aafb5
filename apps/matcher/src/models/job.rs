use serde::{Deserialize, Serialize};

/// One row of the job corpus. Column names follow the CSV header.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobPosting {
    #[serde(rename = "Job Id")]
    pub job_id: String,
    #[serde(rename = "Job Description", default)]
    pub description: Option<String>,
    #[serde(rename = "Qualifications", default)]
    pub qualifications: Option<String>,
    #[serde(rename = "Responsibilities", default)]
    pub responsibilities: Option<String>,
    #[serde(rename = "Experience", default)]
    pub experience: Option<String>,
    #[serde(rename = "Salary Range", default)]
    pub salary_range: Option<String>,
    #[serde(rename = "Work Type", default)]
    pub work_type: Option<String>,
    #[serde(rename = "Company Size", default)]
    pub company_size: Option<String>,
    #[serde(rename = "Country", default)]
    pub country: Option<String>,
}

/// Columns every corpus must carry.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "Job Id",
    "Job Description",
    "Qualifications",
    "Responsibilities",
    "Experience",
    "Salary Range",
    "Work Type",
    "Company Size",
    "Country",
];
