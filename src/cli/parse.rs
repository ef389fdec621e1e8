use clap::Args;

use crate::models::Record;

/// Record fields accepted on the command line, JobId excluded.
/// Fields left unset keep their current value.
#[derive(Args, Debug, Default, Clone)]
pub struct RecordArgs {
    #[arg(long)]
    pub company_name: Option<String>,
    #[arg(long)]
    pub posting_age: Option<String>,
    #[arg(long)]
    pub country: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub publication_date: Option<String>,
    #[arg(long)]
    pub salary_max: Option<String>,
    #[arg(long)]
    pub salary_min: Option<String>,
    #[arg(long)]
    pub salary_type: Option<String>,
    #[arg(long)]
    pub job_title: Option<String>,
}

impl RecordArgs {
    fn fields(self) -> [(&'static str, Option<String>); 9] {
        [
            ("CompanyName", self.company_name),
            ("PostingAge", self.posting_age),
            ("Country", self.country),
            ("Location", self.location),
            ("PublicationDate", self.publication_date),
            ("SalaryMax", self.salary_max),
            ("SalaryMin", self.salary_min),
            ("SalaryType", self.salary_type),
            ("JobTitle", self.job_title),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.clone().fields().iter().all(|(_, v)| v.is_none())
    }

    /// Overwrites the fields that were given, leaves the rest alone
    pub fn apply(self, record: &mut Record) {
        for (name, value) in self.fields() {
            if let (Some(value), Some(field)) = (value, record.field_mut(name)) {
                *field = value;
            }
        }
    }

    pub fn into_record(self, job_id: String) -> Record {
        let mut record = Record {
            job_id,
            ..Default::default()
        };
        self.apply(&mut record);
        record
    }
}
