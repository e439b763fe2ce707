use anyhow::{anyhow, Result};

/// Declaration order is catalogue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Freelance,
    Internship,
}

impl EmploymentType {
    pub const ALL: [EmploymentType; 4] = [
        EmploymentType::FullTime,
        EmploymentType::PartTime,
        EmploymentType::Freelance,
        EmploymentType::Internship,
    ];

    pub fn id(self) -> &'static str {
        match self {
            EmploymentType::FullTime => "FULLTIME",
            EmploymentType::PartTime => "PARTTIME",
            EmploymentType::Freelance => "FREELANCE",
            EmploymentType::Internship => "INTERNSHIP",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EmploymentType::FullTime => "Full Time",
            EmploymentType::PartTime => "Part Time",
            EmploymentType::Freelance => "Freelance",
            EmploymentType::Internship => "Internship",
        }
    }

    pub fn parse(id: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.id().eq_ignore_ascii_case(id))
            .ok_or_else(|| {
                anyhow!(
                    "Unknown employment type '{}'. Available: FULLTIME, PARTTIME, FREELANCE, INTERNSHIP",
                    id
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalaryRange {
    pub id: &'static str,
    pub label: &'static str,
}

pub const SALARY_RANGES: [SalaryRange; 4] = [
    SalaryRange { id: "1000000", label: "10 LPA and above" },
    SalaryRange { id: "2000000", label: "20 LPA and above" },
    SalaryRange { id: "3000000", label: "30 LPA and above" },
    SalaryRange { id: "4000000", label: "40 LPA and above" },
];

pub fn salary_range(id: &str) -> Result<SalaryRange> {
    SALARY_RANGES
        .into_iter()
        .find(|r| r.id == id)
        .ok_or_else(|| {
            anyhow!(
                "Unknown salary range '{}'. Available: 1000000, 2000000, 3000000, 4000000",
                id
            )
        })
}

/// Everything the jobs list request is parameterized by.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobQuery {
    pub search: String,
    /// Sorted in catalogue order; never holds duplicates.
    employment_types: Vec<EmploymentType>,
    pub minimum_package: Option<SalaryRange>,
}

impl JobQuery {
    pub fn includes(&self, kind: EmploymentType) -> bool {
        self.employment_types.contains(&kind)
    }

    pub fn set_employment_type(&mut self, kind: EmploymentType, included: bool) {
        if included {
            if !self.includes(kind) {
                self.employment_types.push(kind);
                self.employment_types.sort();
            }
        } else {
            self.employment_types.retain(|t| *t != kind);
        }
    }

    /// Request parameters, in the order the endpoint documents them.
    pub fn to_params(&self) -> [(&'static str, String); 3] {
        let employment_type = self
            .employment_types
            .iter()
            .map(|t| t.id())
            .collect::<Vec<_>>()
            .join(",");
        let minimum_package = self
            .minimum_package
            .map(|r| r.id.to_string())
            .unwrap_or_default();

        [
            ("employment_type", employment_type),
            ("minimum_package", minimum_package),
            ("search", self.search.clone()),
        ]
    }
}
