//! Setup-phase seeding of the job store

use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::parser::Record;
use crate::schema::{ALL_TABLES, JOBLIST};
use crate::store;
use crate::writer::{define_schema, define_table_best_effort, generate_create_table, insert_row};

/// One seeded maintenance job
#[derive(Debug, Clone, Copy)]
pub struct SeedJob {
    pub job_id: i64,
    pub due_date: &'static str,
    pub job_title: &'static str,
    pub vessel_name: &'static str,
    pub component: &'static str,
    pub maker: &'static str,
    pub model: &'static str,
}

impl SeedJob {
    pub fn to_record(&self) -> Record {
        Record::new()
            .with("job_id", self.job_id)
            .with("due_date", self.due_date)
            .with("job_title", self.job_title)
            .with("vessel_name", self.vessel_name)
            .with("component", self.component)
            .with("maker", self.maker)
            .with("model", self.model)
    }
}

const VESSEL: &str = "Hafnia Andrea";
const ALFA_LAVAL: &str = "[MKR]ALFA LAVAL";

const fn job(
    job_id: i64,
    due_date: &'static str,
    job_title: &'static str,
    component: &'static str,
    model: &'static str,
) -> SeedJob {
    SeedJob {
        job_id,
        due_date,
        job_title,
        vessel_name: VESSEL,
        component,
        maker: ALFA_LAVAL,
        model,
    }
}

pub static SEED_JOBS: &[SeedJob] = &[
    job(1, "13/2/30", "RNW0023A - Purifiers Bearing and Motor Overhaul", "HFO purifier 1", "S 937"),
    job(2, "30/8/36", "OVH0022A - Purifier Major Overhaul Alfa Laval", "ME LO purifier 1", "S 815"),
    job(3, "21/6/69", "RNW0023A - Purifiers Bearing and Motor Overhaul", "ME LO purifier 1", "S 815"),
    job(4, "19/2/24", "Purifier Service and Bowl Cleaning", "ME LO purifier 2", "S 815"),
    job(5, "22/8/24", "Purifier Service and Bowl Cleaning", "ME LO purifier 2", "S 815"),
    job(6, "23/8/24", "Purifier Major Overhaul Alfa Laval", "ME LO purifier 2", "S 815"),
    job(7, "21/9/24", "RNW0023A - Purifiers Bearing and Motor Overhaul", "HFO purifier 2", "S 937"),
    job(8, "25/11/24", "Purifier Service and Cleaning Alfa Laval", "HFO purifier 2", "S 937"),
    job(9, "9/4/25", "Purifier Service and Cleaning Alfa Laval", "HFO purifier 1", "S 937"),
    job(10, "24/9/25", "Purifier Major Overhaul Alfa Laval", "HFO purifier 2", "S 937"),
    job(11, "13/1/27", "Purifiers Bearing and Motor Overhaul", "ME LO purifier 2", "S 815"),
    job(12, "14/10/27", "Purifier Service and Bowl Cleaning", "ME LO purifier 1", "S 815"),
    job(13, "5/5/28", "Purifier Major Overhaul Alfa Laval", "HFO purifier 1", "S 937"),
];

/// Create `joblist` and insert the seed jobs. A table that already holds
/// rows is left alone and `0` is returned.
pub fn setup_joblist(config: &Config) -> Result<usize> {
    let conn = store::open(config)?;
    define_schema(&conn, &JOBLIST)?;

    let existing: i64 = conn.query_row("SELECT COUNT(*) FROM joblist", [], |row| row.get(0))?;
    if existing > 0 {
        info!(rows = existing, "joblist already seeded");
        return Ok(0);
    }

    for seed in SEED_JOBS {
        insert_row(&conn, JOBLIST.name, &seed.to_record())?;
    }

    info!(rows = SEED_JOBS.len(), "seeded joblist");
    Ok(SEED_JOBS.len())
}

/// Create every known table, logging and skipping any that fail.
/// Returns the tables that were defined.
pub fn define_all_tables(config: &Config) -> Vec<&'static str> {
    let Some(conn) = store::try_open(config) else {
        return Vec::new();
    };

    ALL_TABLES
        .iter()
        .filter(|schema| define_table_best_effort(&conn, &generate_create_table(schema)))
        .map(|schema| schema.name)
        .collect()
}
