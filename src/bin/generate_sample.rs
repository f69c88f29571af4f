use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray, StringDictionaryBuilder};
use arrow::datatypes::{DataType, Field, Int32Type, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use enem_dashboard::data::loader::{
    COL_ATTENDANCE, COL_COMPLETION, COL_INCOME, COL_INTERNET, COL_MEAN_SCORE, COL_RACE, COL_SEX,
    COL_STATE, COL_YEAR,
};
use enem_dashboard::data::model::INCOME_BRACKET_LABELS;

const ROWS_PER_YEAR: usize = 20_000;

const STATES: [(&str, f64); 12] = [
    ("SP", 0.22),
    ("MG", 0.12),
    ("BA", 0.10),
    ("RJ", 0.09),
    ("PE", 0.07),
    ("CE", 0.07),
    ("PA", 0.06),
    ("RS", 0.06),
    ("PR", 0.06),
    ("GO", 0.05),
    ("AM", 0.05),
    ("AC", 0.05),
];

const RACES: [(&str, f64); 6] = [
    ("Parda", 0.42),
    ("Branca", 0.36),
    ("Preta", 0.13),
    ("Amarela", 0.03),
    ("Indígena", 0.01),
    ("Não declarado", 0.05),
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn weighted<'a>(&mut self, choices: &[(&'a str, f64)]) -> &'a str {
        let total: f64 = choices.iter().map(|(_, w)| w).sum();
        let mut roll = self.next_f64() * total;
        for (label, weight) in choices {
            if roll < *weight {
                return *label;
            }
            roll -= weight;
        }
        choices[choices.len() - 1].0
    }
}

#[derive(Default)]
struct Columns {
    state: Vec<&'static str>,
    sex: Vec<&'static str>,
    race: Vec<&'static str>,
    completion: Vec<&'static str>,
    income: Vec<&'static str>,
    internet: Vec<&'static str>,
    attendance: Vec<&'static str>,
    score: Vec<Option<f64>>,
}

fn generate_year(year: i32, rng: &mut SimpleRng) -> Columns {
    let mut cols = Columns::default();
    // Internet access and attendance drift upwards over the years.
    let progress = (year - 2018) as f64 / 5.0;

    for _ in 0..ROWS_PER_YEAR {
        let income_idx = ((rng.next_f64().powi(3)) * INCOME_BRACKET_LABELS.len() as f64) as usize;
        let income_idx = income_idx.min(INCOME_BRACKET_LABELS.len() - 1);
        let wealth = income_idx as f64 / (INCOME_BRACKET_LABELS.len() - 1) as f64;

        let present = rng.chance(0.68 + 0.08 * progress);
        let internet = rng.chance((0.55 + 0.25 * progress + 0.3 * wealth).min(0.99));

        cols.state.push(rng.weighted(&STATES));
        cols.sex.push(if rng.chance(0.59) { "F" } else { "M" });
        cols.race.push(rng.weighted(&RACES));
        cols.completion.push(if rng.chance(0.7) {
            "Concluiu"
        } else if rng.chance(0.6) {
            "Não concluiu"
        } else {
            "Cursando"
        });
        cols.income.push(INCOME_BRACKET_LABELS[income_idx]);
        cols.internet.push(if internet { "Sim" } else { "Não" });
        cols.attendance.push(if present { "Presente" } else { "Ausente" });
        cols.score.push(present.then(|| {
            rng.gauss(480.0 + 180.0 * wealth + if internet { 25.0 } else { 0.0 }, 70.0)
                .clamp(0.0, 1000.0)
        }));
    }
    cols
}

/// Categorical columns are written dictionary-encoded, like a pandas
/// `category` dtype.
fn dictionary(values: &[&str]) -> ArrayRef {
    let mut builder = StringDictionaryBuilder::<Int32Type>::new();
    for v in values {
        builder.append_value(v);
    }
    Arc::new(builder.finish())
}

fn write_year(dir: &Path, year: i32, cols: Columns) -> std::path::PathBuf {
    let dict_type = DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8));
    let schema = Arc::new(Schema::new(vec![
        Field::new(COL_YEAR, DataType::Int64, false),
        Field::new(COL_STATE, dict_type.clone(), false),
        Field::new(COL_SEX, DataType::Utf8, false),
        Field::new(COL_RACE, DataType::Utf8, false),
        Field::new(COL_COMPLETION, dict_type.clone(), false),
        Field::new(COL_INCOME, dict_type.clone(), false),
        Field::new(COL_INTERNET, dict_type.clone(), false),
        Field::new(COL_ATTENDANCE, dict_type, false),
        Field::new(COL_MEAN_SCORE, DataType::Float64, true),
    ]));

    let n = cols.state.len();
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(vec![year as i64; n])),
            dictionary(&cols.state),
            Arc::new(StringArray::from(cols.sex)),
            Arc::new(StringArray::from(cols.race)),
            dictionary(&cols.completion),
            dictionary(&cols.income),
            dictionary(&cols.internet),
            dictionary(&cols.attendance),
            Arc::new(Float64Array::from(cols.score)),
        ],
    )
    .expect("Failed to create RecordBatch");

    let output_path = dir.join(format!("enem_{year}.parquet"));
    let file = std::fs::File::create(&output_path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");
    output_path
}

fn main() {
    let dir = std::env::args().nth(1).unwrap_or_else(|| "data".to_string());
    let dir = Path::new(&dir);
    std::fs::create_dir_all(dir).expect("Failed to create output directory");

    let mut rng = SimpleRng::new(42);
    for year in 2018..=2023 {
        let cols = generate_year(year, &mut rng);
        let path = write_year(dir, year, cols);
        println!("Wrote {ROWS_PER_YEAR} rows to {}", path.display());
    }
}
