use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::utils::salary::normalize_salary;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{value}' is not a valid {kind}")]
pub struct BracketError {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum SalaryBracket {
    #[serde(rename = "0-1000")]
    UpTo1000,
    #[serde(rename = "1001-1500")]
    From1001To1500,
    #[serde(rename = "1501-2000")]
    From1501To2000,
    #[serde(rename = "2001-2500")]
    From2001To2500,
    #[serde(rename = "2501-3000")]
    From2501To3000,
    #[serde(rename = "3001-4000")]
    From3001To4000,
    #[serde(rename = "4001-5000")]
    From4001To5000,
    #[serde(rename = "5001+")]
    Above5000,
}

impl SalaryBracket {
    pub const ALL: [SalaryBracket; 8] = [
        SalaryBracket::UpTo1000,
        SalaryBracket::From1001To1500,
        SalaryBracket::From1501To2000,
        SalaryBracket::From2001To2500,
        SalaryBracket::From2501To3000,
        SalaryBracket::From3001To4000,
        SalaryBracket::From4001To5000,
        SalaryBracket::Above5000,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SalaryBracket::UpTo1000 => "0-1000",
            SalaryBracket::From1001To1500 => "1001-1500",
            SalaryBracket::From1501To2000 => "1501-2000",
            SalaryBracket::From2001To2500 => "2001-2500",
            SalaryBracket::From2501To3000 => "2501-3000",
            SalaryBracket::From3001To4000 => "3001-4000",
            SalaryBracket::From4001To5000 => "4001-5000",
            SalaryBracket::Above5000 => "5001+",
        }
    }

    /// Normalizes legacy spellings first, then parses strictly.
    pub fn from_raw(raw: &str) -> Result<Self, BracketError> {
        normalize_salary(raw).parse()
    }
}

impl FromStr for SalaryBracket {
    type Err = BracketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        SalaryBracket::ALL
            .iter()
            .copied()
            .find(|b| b.as_str() == trimmed)
            .ok_or_else(|| BracketError {
                kind: "salary bracket",
                value: s.to_string(),
            })
    }
}

impl TryFrom<String> for SalaryBracket {
    type Error = BracketError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        SalaryBracket::from_raw(&value)
    }
}

impl fmt::Display for SalaryBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum ExperienceBracket {
    #[serde(rename = "0-3")]
    Junior,
    #[serde(rename = "3-7")]
    Mid,
    #[serde(rename = "7-10")]
    Senior,
    #[serde(rename = "10+")]
    Expert,
}

impl ExperienceBracket {
    pub const ALL: [ExperienceBracket; 4] = [
        ExperienceBracket::Junior,
        ExperienceBracket::Mid,
        ExperienceBracket::Senior,
        ExperienceBracket::Expert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceBracket::Junior => "0-3",
            ExperienceBracket::Mid => "3-7",
            ExperienceBracket::Senior => "7-10",
            ExperienceBracket::Expert => "10+",
        }
    }
}

impl FromStr for ExperienceBracket {
    type Err = BracketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ExperienceBracket::ALL
            .iter()
            .copied()
            .find(|b| b.as_str() == trimmed)
            .ok_or_else(|| BracketError {
                kind: "experience bracket",
                value: s.to_string(),
            })
    }
}

impl TryFrom<String> for ExperienceBracket {
    type Error = BracketError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ExperienceBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum WorkType {
    #[serde(rename = "remote")]
    Remote,
    #[serde(rename = "hybrid")]
    Hybrid,
    #[serde(rename = "on-site")]
    OnSite,
    #[serde(rename = "flexible")]
    Flexible,
}

impl WorkType {
    pub const ALL: [WorkType; 4] = [
        WorkType::Remote,
        WorkType::Hybrid,
        WorkType::OnSite,
        WorkType::Flexible,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkType::Remote => "remote",
            WorkType::Hybrid => "hybrid",
            WorkType::OnSite => "on-site",
            WorkType::Flexible => "flexible",
        }
    }
}

impl FromStr for WorkType {
    type Err = BracketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(WorkType::Remote),
            "hybrid" => Ok(WorkType::Hybrid),
            "on-site" | "onsite" | "on_site" => Ok(WorkType::OnSite),
            "flexible" => Ok(WorkType::Flexible),
            _ => Err(BracketError {
                kind: "work type",
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for WorkType {
    type Error = BracketError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for WorkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salary_deserializes_legacy_spelling() {
        let bracket: SalaryBracket = serde_json::from_str("\"2001-3000\"").unwrap();
        assert_eq!(bracket, SalaryBracket::From2501To3000);
        assert_eq!(serde_json::to_string(&bracket).unwrap(), "\"2501-3000\"");
    }

    #[test]
    fn salary_rejects_unknown_value_after_normalization() {
        let err = serde_json::from_str::<SalaryBracket>("\"lots\"").unwrap_err();
        assert!(err.to_string().contains("salary bracket"));
    }

    #[test]
    fn experience_is_closed() {
        assert_eq!("10+".parse::<ExperienceBracket>().unwrap(), ExperienceBracket::Expert);
        assert!("11+".parse::<ExperienceBracket>().is_err());
    }

    #[test]
    fn work_type_accepts_onsite_spellings() {
        assert_eq!("Onsite".parse::<WorkType>().unwrap(), WorkType::OnSite);
        assert_eq!(
            serde_json::to_string(&WorkType::OnSite).unwrap(),
            "\"on-site\""
        );
    }
}
