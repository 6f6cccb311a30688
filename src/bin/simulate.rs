//! Upstream system simulator.
//!
//! Posts synthetic readings for a fixed patient roster to a running
//! VitalWatch server, then requests a risk score for every patient.
//!
//! Usage: simulate [--base-url http://127.0.0.1:5000] [--rounds 5]

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vitalwatch::domain::{VitalProfile, VitalSigns};
use vitalwatch::RiskAssessment;

/// Upstream systems a reading can come from.
const SOURCE_SYSTEMS: [&str; 3] = [
    "ICU_Monitor_System",
    "A&E_Triage_System",
    "Ward_Vitals_System",
];

/// Pause between the last ingest of a round and the scoring requests.
const SETTLE_DELAY: Duration = Duration::from_secs(1);

struct RosterEntry {
    patient_id: &'static str,
    age: u32,
    gender: &'static str,
    ward: &'static str,
}

const ROSTER: [RosterEntry; 8] = [
    RosterEntry {
        patient_id: "P001",
        age: 67,
        gender: "M",
        ward: "ICU",
    },
    RosterEntry {
        patient_id: "P002",
        age: 45,
        gender: "F",
        ward: "A&E",
    },
    RosterEntry {
        patient_id: "P003",
        age: 82,
        gender: "F",
        ward: "Ward 3",
    },
    RosterEntry {
        patient_id: "P004",
        age: 54,
        gender: "M",
        ward: "ICU",
    },
    RosterEntry {
        patient_id: "P005",
        age: 39,
        gender: "F",
        ward: "Ward 2",
    },
    RosterEntry {
        patient_id: "P006",
        age: 71,
        gender: "M",
        ward: "A&E",
    },
    RosterEntry {
        patient_id: "P007",
        age: 28,
        gender: "F",
        ward: "Ward 1",
    },
    RosterEntry {
        patient_id: "P008",
        age: 63,
        gender: "M",
        ward: "ICU",
    },
];

impl RosterEntry {
    /// ICU patients deteriorate twice as often as everyone else.
    fn abnormal_probability(&self) -> f64 {
        if self.ward == "ICU" {
            0.2
        } else {
            0.1
        }
    }
}

#[derive(Parser)]
#[command(name = "simulate")]
#[command(
    version,
    about = "Simulate upstream hospital systems feeding VitalWatch",
    long_about = None
)]
struct Cli {
    /// Base URL of the VitalWatch server
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    base_url: String,

    /// Number of collection rounds
    #[arg(long, default_value = "5")]
    rounds: u32,

    /// Delay between individual ingests, in milliseconds
    #[arg(long, default_value = "200")]
    ingest_delay_ms: u64,

    /// Pause between rounds, in seconds
    #[arg(long, default_value = "3")]
    round_pause_secs: u64,
}

#[derive(Serialize)]
struct IngestPayload<'a> {
    patient_id: &'a str,
    age: u32,
    gender: &'a str,
    ward: &'a str,
    source_system: &'a str,
    #[serde(flatten)]
    vitals: VitalSigns,
}

struct Simulator {
    client: Client,
    base_url: String,
}

impl Simulator {
    async fn send_reading(
        &self,
        patient: &RosterEntry,
        vitals: VitalSigns,
        source: &str,
    ) -> Result<()> {
        let payload = IngestPayload {
            patient_id: patient.patient_id,
            age: patient.age,
            gender: patient.gender,
            ward: patient.ward,
            source_system: source,
            vitals,
        };

        let response = self
            .client
            .post(format!("{}/api/ingest", self.base_url))
            .json(&payload)
            .send()
            .await
            .context("connecting to ingest endpoint")?;

        if response.status() == StatusCode::CREATED {
            tracing::info!(patient = patient.patient_id, source, "Reading sent");
        } else {
            let status = response.status();
            let body: Value = response.json().await.unwrap_or(Value::Null);
            tracing::warn!(patient = patient.patient_id, %status, %body, "Reading rejected");
        }
        Ok(())
    }

    async fn request_score(&self, patient: &RosterEntry) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/api/predict/{}", self.base_url, patient.patient_id))
            .send()
            .await
            .context("connecting to predict endpoint")?;

        if response.status().is_success() {
            let assessment: RiskAssessment = response
                .json()
                .await
                .context("decoding assessment")?;
            tracing::info!(
                patient = patient.patient_id,
                level = %assessment.risk_level,
                score = assessment.risk_score,
                "Risk assessed"
            );
        } else {
            tracing::warn!(
                patient = patient.patient_id,
                status = %response.status(),
                "Prediction failed"
            );
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let simulator = Simulator {
        client: Client::new(),
        base_url: cli.base_url.trim_end_matches('/').to_string(),
    };

    tracing::info!(
        systems = SOURCE_SYSTEMS.len(),
        patients = ROSTER.len(),
        base_url = %simulator.base_url,
        "Starting simulation"
    );

    let mut rng = rand::thread_rng();
    for round in 1..=cli.rounds {
        tracing::info!(round, "Data collection cycle");

        for patient in &ROSTER {
            let source = SOURCE_SYSTEMS
                .choose(&mut rng)
                .copied()
                .unwrap_or(SOURCE_SYSTEMS[0]);
            let profile = if rng.gen_bool(patient.abnormal_probability()) {
                VitalProfile::Deteriorating
            } else {
                VitalProfile::Stable
            };
            let vitals = profile.sample(&mut rng);

            if let Err(e) = simulator.send_reading(patient, vitals, source).await {
                tracing::error!(patient = patient.patient_id, error = %e, "Ingest failed");
            }
            tokio::time::sleep(Duration::from_millis(cli.ingest_delay_ms)).await;
        }

        tokio::time::sleep(SETTLE_DELAY).await;
        for patient in &ROSTER {
            if let Err(e) = simulator.request_score(patient).await {
                tracing::error!(
                    patient = patient.patient_id,
                    error = %e,
                    "Scoring request failed"
                );
            }
        }

        if round < cli.rounds {
            tokio::time::sleep(Duration::from_secs(cli.round_pause_secs)).await;
        }
    }

    tracing::info!(
        readings = ROSTER.len() as u64 * u64::from(cli.rounds),
        "Simulation complete; dashboard at {}",
        simulator.base_url
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use vitalwatch::application::IngestRequest;

    #[test]
    fn test_payload_is_accepted_by_ingest_request() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let vitals = VitalProfile::Deteriorating.sample(&mut rng);
        let patient = &ROSTER[2];
        let payload = IngestPayload {
            patient_id: patient.patient_id,
            age: patient.age,
            gender: patient.gender,
            ward: patient.ward,
            source_system: SOURCE_SYSTEMS[1],
            vitals,
        };

        let body = serde_json::to_value(&payload).expect("serialize");
        assert!(body.get("bp_systolic").is_some());
        assert!(body.get("vitals").is_none());

        let request: IngestRequest = serde_json::from_value(body).expect("Should parse");
        assert_eq!(request.patient_id, "P003");
        assert_eq!(request.age, Some(82));
        assert_eq!(request.ward.as_deref(), Some("Ward 3"));
        assert_eq!(request.source_system.as_deref(), Some("A&E_Triage_System"));
        assert_eq!(request.vitals, vitals);
        assert!(request.vitals.validate().is_ok());
    }

    #[test]
    fn test_icu_patients_deteriorate_more_often() {
        for patient in &ROSTER {
            let expected = if patient.ward == "ICU" { 0.2 } else { 0.1 };
            assert!((patient.abnormal_probability() - expected).abs() < f64::EPSILON);
        }
        let icu = ROSTER.iter().filter(|p| p.ward == "ICU").count();
        assert_eq!(icu, 3);
    }
}
