use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Categorical fields
// ---------------------------------------------------------------------------

/// Declared sex (`TP_SEXO`). Binary in the source data; anything else is
/// kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Sex {
    Female,
    Male,
    Other(String),
}

impl Sex {
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "F" | "Feminino" => Sex::Female,
            "M" | "Masculino" => Sex::Male,
            other => Sex::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Female => write!(f, "Feminino"),
            Sex::Male => write!(f, "Masculino"),
            Sex::Other(s) => write!(f, "{s}"),
        }
    }
}

/// Self-reported race/color (`TP_COR_RACA`), in INEP code order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RaceColor {
    NotDeclared,
    White,
    Black,
    Brown,
    Yellow,
    Indigenous,
    Other(String),
}

impl RaceColor {
    /// Accepts both the textual labels and the raw INEP codes `0`..=`5`.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "0" | "Não declarado" => RaceColor::NotDeclared,
            "1" | "Branca" => RaceColor::White,
            "2" | "Preta" => RaceColor::Black,
            "3" | "Parda" => RaceColor::Brown,
            "4" | "Amarela" => RaceColor::Yellow,
            "5" | "Indígena" => RaceColor::Indigenous,
            other => RaceColor::Other(other.to_string()),
        }
    }
}

impl fmt::Display for RaceColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RaceColor::NotDeclared => write!(f, "Não declarado"),
            RaceColor::White => write!(f, "Branca"),
            RaceColor::Black => write!(f, "Preta"),
            RaceColor::Brown => write!(f, "Parda"),
            RaceColor::Yellow => write!(f, "Amarela"),
            RaceColor::Indigenous => write!(f, "Indígena"),
            RaceColor::Other(s) => write!(f, "{s}"),
        }
    }
}

/// Secondary-school completion (`TP_ST_CONCLUSAO`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CompletionStatus {
    Completed,
    NotCompleted,
    /// e.g. "Cursando"; excluded from the completion rate partition.
    Other(String),
}

impl CompletionStatus {
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "Concluiu" => CompletionStatus::Completed,
            "Não concluiu" => CompletionStatus::NotCompleted,
            other => CompletionStatus::Other(other.to_string()),
        }
    }
}

/// Home internet access (`Q025`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InternetAccess {
    Yes,
    No,
    Other(String),
}

impl InternetAccess {
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "Sim" => InternetAccess::Yes,
            "Não" => InternetAccess::No,
            other => InternetAccess::Other(other.to_string()),
        }
    }
}

impl fmt::Display for InternetAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InternetAccess::Yes => write!(f, "Sim"),
            InternetAccess::No => write!(f, "Não"),
            InternetAccess::Other(s) => write!(f, "{s}"),
        }
    }
}

/// Exam attendance (`STATUS_PRESENCA`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttendanceStatus {
    Present,
    Absent,
    Other(String),
}

impl AttendanceStatus {
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "Presente" => AttendanceStatus::Present,
            "Ausente" => AttendanceStatus::Absent,
            other => AttendanceStatus::Other(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Income brackets (Q006)
// ---------------------------------------------------------------------------

/// The 17 monthly household income labels, lowest first. The labels are
/// kept byte-for-byte as they appear in the processed batches, including
/// their typographic slips.
pub const INCOME_BRACKET_LABELS: [&str; 17] = [
    "Nenhuma renda",
    "Até R$ 1.320,00",
    "R$ 1.320,01 até R$ 1.980,00",
    "R$ 1.980,01 até R$ 2.640,00",
    "R$ 2.640,01 até R$ 3.300,00",
    "R$ 3.300,01 até R$ 3.960,00",
    "R$ 3.960,01 até R$ 5.280,00",
    "R$ 5.280,01 até R$ 6.600,00",
    "R$ 6.600,01 até R$ 7.920,00",
    "R$ 7.920,01 até R$ 9240,00",
    "R$ 9.240,01 até R$ 10.560,00",
    "R$ 10.560,01 até R$ 11.880,00",
    "R$ 11.880,01 até R$ 13.200,00",
    "R$ 13.200,01 até R$ 15.840,00",
    "R$ 15.840,01 até R$ 19.800,00",
    "R$ 19.800,01 até R$ 26.400,00.",
    "Acima de R$ 26.400,00",
];

/// An ordered income bracket. `Known(i)` indexes [`INCOME_BRACKET_LABELS`];
/// unrecognised labels sort after every known bracket.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IncomeBracket {
    Known(u8),
    Other(String),
}

impl IncomeBracket {
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        INCOME_BRACKET_LABELS
            .iter()
            .position(|known| *known == label)
            .map(|idx| IncomeBracket::Known(idx as u8))
            .unwrap_or_else(|| IncomeBracket::Other(label.to_string()))
    }

    /// All known brackets in ascending income order.
    pub fn known() -> impl Iterator<Item = IncomeBracket> {
        (0..INCOME_BRACKET_LABELS.len()).map(|idx| IncomeBracket::Known(idx as u8))
    }

    pub fn label(&self) -> &str {
        match self {
            IncomeBracket::Known(idx) => INCOME_BRACKET_LABELS
                .get(*idx as usize)
                .copied()
                .unwrap_or_default(),
            IncomeBracket::Other(s) => s,
        }
    }
}

impl fmt::Display for IncomeBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// ExamRecord – one row of a yearly batch
// ---------------------------------------------------------------------------

/// One participant-year entry. `None` stands for a null cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ExamRecord {
    pub year: Option<i32>,
    /// State of the exam venue (`SG_UF_PROVA`).
    pub state_code: Option<String>,
    pub sex: Option<Sex>,
    pub race_color: Option<RaceColor>,
    pub completion: Option<CompletionStatus>,
    pub income: Option<IncomeBracket>,
    pub internet: Option<InternetAccess>,
    pub attendance: Option<AttendanceStatus>,
    /// Average of the subject scores; absent when the participant did not
    /// sit every test.
    pub mean_score: Option<f64>,
}

// ---------------------------------------------------------------------------
// ExamTable – the unified table
// ---------------------------------------------------------------------------

/// Where one yearly batch came from.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub year: i32,
    pub path: PathBuf,
    pub rows: usize,
}

/// All yearly batches concatenated, plus the distinct filter values.
/// Read-only once built.
#[derive(Debug, Clone)]
pub struct ExamTable {
    pub records: Vec<ExamRecord>,
    pub batches: Vec<BatchSummary>,
    /// Distinct non-null years, ascending.
    pub years: Vec<i32>,
    pub sexes: BTreeSet<Sex>,
    pub races: BTreeSet<RaceColor>,
}

impl ExamTable {
    /// Build the filter value indices from the loaded records.
    pub fn from_records(records: Vec<ExamRecord>, batches: Vec<BatchSummary>) -> Self {
        let mut years: BTreeSet<i32> = BTreeSet::new();
        let mut sexes = BTreeSet::new();
        let mut races = BTreeSet::new();

        for rec in &records {
            if let Some(year) = rec.year {
                years.insert(year);
            }
            if let Some(sex) = &rec.sex {
                sexes.insert(sex.clone());
            }
            if let Some(race) = &rec.race_color {
                races.insert(race.clone());
            }
        }

        ExamTable {
            records,
            batches,
            years: years.into_iter().collect(),
            sexes,
            races,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
