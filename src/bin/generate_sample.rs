use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use log::info;
use parquet::arrow::ArrowWriter;

const REGIONS: [&str; 4] = ["northeast", "northwest", "southeast", "southwest"];
const ROWS: usize = 1338;

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

    fn range(&mut self, lo: u64, hi: u64) -> u64 {
        lo + self.next_u64() % (hi - lo + 1)
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

struct Columns {
    age: Vec<i64>,
    sex: Vec<&'static str>,
    bmi: Vec<f64>,
    children: Vec<i64>,
    smoker: Vec<&'static str>,
    region: Vec<&'static str>,
    charges: Vec<f64>,
}

fn generate(rng: &mut SimpleRng) -> Columns {
    let mut cols = Columns {
        age: Vec::with_capacity(ROWS),
        sex: Vec::with_capacity(ROWS),
        bmi: Vec::with_capacity(ROWS),
        children: Vec::with_capacity(ROWS),
        smoker: Vec::with_capacity(ROWS),
        region: Vec::with_capacity(ROWS),
        charges: Vec::with_capacity(ROWS),
    };

    for _ in 0..ROWS {
        let age = rng.range(18, 64) as i64;
        let sex = if rng.next_f64() < 0.5 { "male" } else { "female" };
        let bmi = (rng.gauss(30.6, 6.1).clamp(16.0, 53.0) * 100.0).round() / 100.0;
        let children = rng.range(0, 5) as i64;
        let smoker = rng.next_f64() < 0.2;
        let region = REGIONS[rng.range(0, 3) as usize];

        let mut charges = 250.0 * age as f64 + 320.0 * (bmi - 18.0).max(0.0) + 475.0 * children as f64;
        if smoker {
            charges += 23_800.0;
            if bmi >= 30.0 {
                charges += 19_000.0;
            }
        }
        charges = (charges + rng.gauss(0.0, 4_000.0)).max(1_121.87);

        cols.age.push(age);
        cols.sex.push(sex);
        cols.bmi.push(bmi);
        cols.children.push(children);
        cols.smoker.push(if smoker { "yes" } else { "no" });
        cols.region.push(region);
        cols.charges.push((charges * 1000.0).round() / 1000.0);
    }

    cols
}

fn write_csv(path: &str, cols: &Columns) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    writer.write_record(["age", "sex", "bmi", "children", "smoker", "region", "charges"])?;
    for i in 0..cols.age.len() {
        writer.write_record(&[
            cols.age[i].to_string(),
            cols.sex[i].to_string(),
            cols.bmi[i].to_string(),
            cols.children[i].to_string(),
            cols.smoker[i].to_string(),
            cols.region[i].to_string(),
            cols.charges[i].to_string(),
        ])?;
    }
    writer.flush().context("flushing CSV file")?;
    Ok(())
}

fn write_parquet(path: &str, cols: &Columns) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("age", DataType::Int64, false),
        Field::new("sex", DataType::Utf8, false),
        Field::new("bmi", DataType::Float64, false),
        Field::new("children", DataType::Int64, false),
        Field::new("smoker", DataType::Utf8, false),
        Field::new("region", DataType::Utf8, false),
        Field::new("charges", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(cols.age.clone())),
            Arc::new(StringArray::from(cols.sex.clone())),
            Arc::new(Float64Array::from(cols.bmi.clone())),
            Arc::new(Int64Array::from(cols.children.clone())),
            Arc::new(StringArray::from(cols.smoker.clone())),
            Arc::new(StringArray::from(cols.region.clone())),
            Arc::new(Float64Array::from(cols.charges.clone())),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let mut rng = SimpleRng::new(42);
    let cols = generate(&mut rng);

    let csv_path = "sample_insurance.csv";
    let parquet_path = "sample_insurance.parquet";
    write_csv(csv_path, &cols)?;
    write_parquet(parquet_path, &cols)?;

    info!("generated {} rows", cols.age.len());
    println!("Wrote {} policy holders to {csv_path} and {parquet_path}", cols.age.len());
    Ok(())
}
