use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// --- Enums ---

/// Who a case record is about. Stored as an integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubjectType {
    Individual,
    Company,
    Organization,
}

impl SubjectType {
    /// Unknown codes map to `None` rather than an error.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(SubjectType::Individual),
            2 => Some(SubjectType::Company),
            3 => Some(SubjectType::Organization),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            SubjectType::Individual => 1,
            SubjectType::Company => 2,
            SubjectType::Organization => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SubjectType::Individual => "Individual",
            SubjectType::Company => "Company",
            SubjectType::Organization => "Organization",
        }
    }
}

impl std::fmt::Display for SubjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Kind of compliance decision a record documents. Stored as an integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseType {
    Verdict,
    Blacklist,
    Sanction,
}

impl CaseType {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(CaseType::Verdict),
            2 => Some(CaseType::Blacklist),
            3 => Some(CaseType::Sanction),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            CaseType::Verdict => 1,
            CaseType::Blacklist => 2,
            CaseType::Sanction => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CaseType::Verdict => "Verdict",
            CaseType::Blacklist => "Blacklist",
            CaseType::Sanction => "Sanction",
        }
    }
}

impl std::fmt::Display for CaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// --- Extension payload ---

/// One `{type, data}` element of a record's extension payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionEntry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl ExtensionEntry {
    /// Build an entry from a JSON object. Non-object `data` yields an empty map.
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        let data = match data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            kind: kind.into(),
            data,
        }
    }

    /// Text form of a scalar field, matching Postgres `->>` semantics.
    /// Missing fields, JSON nulls, objects and arrays are `None`.
    pub fn field(&self, name: &str) -> Option<String> {
        scalar_text(self.data.get(name)?)
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Ordered list of extension entries carried by a record.
///
/// Dataset-specific entries are located by their `type` marker, never by
/// position in the list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtensionPayload(pub Vec<ExtensionEntry>);

impl ExtensionPayload {
    pub fn new(entries: Vec<ExtensionEntry>) -> Self {
        Self(entries)
    }

    /// Lenient decode of a stored payload, mirroring how the Postgres
    /// queries read it. Anything that is not an array becomes empty.
    /// Elements without a scalar `type` are skipped; an element whose
    /// `data` is not an object keeps its place with no fields, so it still
    /// shadows later entries of the same type.
    pub fn from_json(value: &Value) -> Self {
        let Value::Array(items) = value else {
            return Self::default();
        };
        Self(
            items
                .iter()
                .filter_map(|item| {
                    let kind = scalar_text(item.get("type")?)?;
                    let data = item.get("data").cloned().unwrap_or(Value::Null);
                    Some(ExtensionEntry::new(kind, data))
                })
                .collect(),
        )
    }

    /// First entry whose type marker equals `marker`.
    pub fn entry_for(&self, marker: &str) -> Option<&ExtensionEntry> {
        self.0.iter().find(|entry| entry.kind == marker)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> &[ExtensionEntry] {
        &self.0
    }
}

// --- Case record ---

/// A stored public-interest compliance record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub id: String,
    pub subject: String,
    /// Raw code; see [`SubjectType::from_code`].
    pub subject_type: i32,
    /// Raw code; see [`CaseType::from_code`].
    pub case_type: i32,
    pub nation: Option<String>,
    pub decision_date: Option<NaiveDate>,
    pub decision_number: Option<String>,
    pub person_in_charge: Option<String>,
    pub beneficiary_ownership: Option<String>,
    pub source: String,
    pub link: String,
    pub punishment_duration: Option<String>,
    pub summary: String,
    pub extension: ExtensionPayload,
}

impl CaseRecord {
    /// Minimal record; the remaining columns default to empty.
    pub fn new(id: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            subject_type: SubjectType::Individual.code(),
            case_type: CaseType::Verdict.code(),
            nation: None,
            decision_date: None,
            decision_number: None,
            person_in_charge: None,
            beneficiary_ownership: None,
            source: String::new(),
            link: String::new(),
            punishment_duration: None,
            summary: String::new(),
            extension: ExtensionPayload::default(),
        }
    }

    pub fn with_subject_type(mut self, code: i32) -> Self {
        self.subject_type = code;
        self
    }

    pub fn with_case_type(mut self, code: i32) -> Self {
        self.case_type = code;
        self
    }

    pub fn with_nation(mut self, nation: impl Into<String>) -> Self {
        self.nation = Some(nation.into());
        self
    }

    pub fn with_decision_number(mut self, number: impl Into<String>) -> Self {
        self.decision_number = Some(number.into());
        self
    }

    pub fn with_extension(mut self, entry: ExtensionEntry) -> Self {
        self.extension.0.push(entry);
        self
    }

    pub fn subject_type(&self) -> Option<SubjectType> {
        SubjectType::from_code(self.subject_type.into())
    }

    pub fn case_type(&self) -> Option<CaseType> {
        CaseType::from_code(self.case_type.into())
    }
}
