use std::fmt;

use serde_derive::{Deserialize, Serialize};

/// Column names in storage and display order
pub const FIELDS: [&str; 10] = [
    "CompanyName",
    "PostingAge",
    "JobId",
    "Country",
    "Location",
    "PublicationDate",
    "SalaryMax",
    "SalaryMin",
    "SalaryType",
    "JobTitle",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
/// A single job posting
/// JobId is the business key, every other field is free text
/// Missing values are empty strings, never absent
pub struct Record {
    pub company_name: String,
    pub posting_age: String,
    pub job_id: String,
    pub country: String,
    pub location: String,
    pub publication_date: String,
    pub salary_max: String,
    pub salary_min: String,
    pub salary_type: String,
    pub job_title: String,
}

impl Record {
    /// Builds a record from a row of cells laid out like [`FIELDS`].
    /// Short rows are padded with empty strings, extra cells are ignored.
    pub fn from_cells<S: AsRef<str>>(cells: &[S]) -> Self {
        let cell = |i: usize| {
            cells
                .get(i)
                .map(|c| c.as_ref().to_string())
                .unwrap_or_default()
        };

        Self {
            company_name: cell(0),
            posting_age: cell(1),
            job_id: cell(2),
            country: cell(3),
            location: cell(4),
            publication_date: cell(5),
            salary_max: cell(6),
            salary_min: cell(7),
            salary_type: cell(8),
            job_title: cell(9),
        }
    }

    pub fn cells(&self) -> [&str; 10] {
        [
            &self.company_name,
            &self.posting_age,
            &self.job_id,
            &self.country,
            &self.location,
            &self.publication_date,
            &self.salary_max,
            &self.salary_min,
            &self.salary_type,
            &self.job_title,
        ]
    }

    /// Mutable access to a field by its column name
    pub fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        let field = match name {
            "CompanyName" => &mut self.company_name,
            "PostingAge" => &mut self.posting_age,
            "JobId" => &mut self.job_id,
            "Country" => &mut self.country,
            "Location" => &mut self.location,
            "PublicationDate" => &mut self.publication_date,
            "SalaryMax" => &mut self.salary_max,
            "SalaryMin" => &mut self.salary_min,
            "SalaryType" => &mut self.salary_type,
            "JobTitle" => &mut self.job_title,
            _ => return None,
        };
        Some(field)
    }

    /// One line label, as shown in the record list
    pub fn summary(&self) -> String {
        format!("{} - {}", self.company_name, self.job_title)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Selected Record:")?;
        writeln!(f)?;
        for (name, value) in FIELDS.iter().zip(self.cells()) {
            writeln!(f, "{}: {}", name, value)?;
        }
        Ok(())
    }
}
