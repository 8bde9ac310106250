// crates/nexus-store/src/seed.rs
//
// Demo data seeding for a fresh store.
//
// Populates nodes, training jobs, temporal commitments, one network metrics
// row, and a handful of validators so the dashboard and the consensus
// simulator have something to work with. Seeding is skipped when the store
// already holds nodes.

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::json;

use nexus_core::error::NexusError;
use nexus_core::traits::{ConsensusStore, NetworkStore};
use nexus_core::{
    NewNetworkMetrics, NewNode, NewTemporalCommitment, NewTrainingJob, NewValidator, NodeStatus,
    NodeType, ValidatorStatus,
};

/// Node counts per type.
pub const NODE_COUNTS: [(NodeType, u32); 8] = [
    (NodeType::Compute, 847),
    (NodeType::Rpc, 124),
    (NodeType::Sentry, 89),
    (NodeType::Oracle, 156),
    (NodeType::Data, 293),
    (NodeType::Full, 567),
    (NodeType::Consumer, 234),
    (NodeType::Validator, 378),
];

/// Number of seeded temporal commitments.
pub const COMMITMENT_COUNT: usize = 1089;

const INACTIVE_NODE_PROBABILITY: f64 = 0.05;
const JOB_LINK_PROBABILITY: f64 = 0.7;

/// (stake, duration minutes, uptime, reputation) for each demo validator.
const DEMO_VALIDATORS: [(u64, u64, f64, f64); 8] = [
    (100_000, 10_080, 99.9, 98.0),
    (75_000, 4_320, 99.5, 96.5),
    (60_000, 2_880, 98.7, 92.0),
    (50_000, 1_440, 99.2, 95.0),
    (45_000, 7_200, 97.8, 88.5),
    (35_000, 1_440, 96.4, 90.0),
    (30_000, 2_160, 99.0, 85.0),
    (25_000, 720, 95.5, 80.0),
];

/// What a seeding pass created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub nodes: usize,
    pub training_jobs: usize,
    pub commitments: usize,
    pub validators: usize,
    /// True when the store was already populated and nothing was written.
    pub skipped: bool,
}

/// Seed a store with demo data. Idempotent: returns a skipped summary when
/// any node already exists.
pub async fn seed_demo_data<S, R>(store: &S, rng: &mut R) -> Result<SeedSummary, NexusError>
where
    S: ConsensusStore + NetworkStore + ?Sized,
    R: Rng + Send + ?Sized,
{
    if !store.list_nodes().await?.is_empty() {
        tracing::info!("Store already initialized, skipping demo data");
        return Ok(SeedSummary {
            skipped: true,
            ..SeedSummary::default()
        });
    }

    tracing::info!("Seeding store with demo data");
    let now = Utc::now();

    let nodes = demo_nodes(rng);
    let node_count = store.create_nodes(nodes).await?;

    let jobs = demo_training_jobs(now);
    let job_ids: Vec<String> = jobs.iter().map(|j| j.job_id.clone()).collect();
    for job in jobs {
        store.create_training_job(job).await?;
    }

    let compute_count = NODE_COUNTS[0].1;
    for _ in 0..COMMITMENT_COUNT {
        store
            .create_commitment(demo_commitment(rng, now, compute_count, &job_ids))
            .await?;
    }

    store
        .create_network_metrics(NewNetworkMetrics {
            total_nodes: 2688,
            active_jobs: 3,
            total_commitments: 1247,
            active_commitments: 1089,
            network_power: 847_300,
            metrics: json!({
                "throughput": 187.3,
                "latency": 12.45,
                "efficiency": 98.7,
                "uptime": 99.94,
            }),
        })
        .await?;

    let validators = seed_validators(store, rng, now).await?;

    let summary = SeedSummary {
        nodes: node_count,
        training_jobs: job_ids.len(),
        commitments: COMMITMENT_COUNT,
        validators,
        skipped: false,
    };
    tracing::info!(
        nodes = summary.nodes,
        jobs = summary.training_jobs,
        commitments = summary.commitments,
        validators = summary.validators,
        "Demo data seeded"
    );
    Ok(summary)
}

fn demo_nodes<R: Rng + ?Sized>(rng: &mut R) -> Vec<NewNode> {
    let mut nodes = Vec::new();
    for (node_type, count) in NODE_COUNTS {
        for i in 1..=count {
            let status = if rng.gen_bool(INACTIVE_NODE_PROBABILITY) {
                NodeStatus::Inactive
            } else {
                NodeStatus::Active
            };
            nodes.push(NewNode {
                node_id: format!("{}_{}", node_type, i),
                node_type,
                status,
                metadata: json!({
                    "location": format!("region_{}", rng.gen_range(1..=10)),
                    "version": "2.1.0",
                }),
            });
        }
    }
    nodes
}

fn demo_training_jobs(now: DateTime<Utc>) -> Vec<NewTrainingJob> {
    vec![
        NewTrainingJob {
            job_id: "job_847291".to_string(),
            name: "ImageNet Classification".to_string(),
            status: "training".to_string(),
            current_phase: "training".to_string(),
            current_step: 18,
            progress: 68,
            estimated_completion: Some(now + Duration::hours(4)),
            metadata: json!({
                "dataset": "ImageNet",
                "model": "ResNet-50",
                "epochs": 100,
                "batchSize": 256,
            }),
        },
        NewTrainingJob {
            job_id: "job_847290".to_string(),
            name: "NLP Transformer Model".to_string(),
            status: "validating".to_string(),
            current_phase: "validation".to_string(),
            current_step: 27,
            progress: 100,
            estimated_completion: Some(now + Duration::hours(2)),
            metadata: json!({
                "dataset": "Common Crawl",
                "model": "GPT-3.5",
                "parameters": "175B",
            }),
        },
        NewTrainingJob {
            job_id: "job_847289".to_string(),
            name: "Computer Vision CNN".to_string(),
            status: "queued".to_string(),
            current_phase: "initialization".to_string(),
            current_step: 1,
            progress: 5,
            estimated_completion: Some(now + Duration::hours(8)),
            metadata: json!({
                "dataset": "COCO",
                "model": "YOLOv8",
                "task": "object_detection",
            }),
        },
    ]
}

fn demo_commitment<R: Rng + ?Sized>(
    rng: &mut R,
    now: DateTime<Utc>,
    compute_count: u32,
    job_ids: &[String],
) -> NewTemporalCommitment {
    let hours: u64 = rng.gen_range(2..10);
    let offset_secs: i64 = rng.gen_range(0..24 * 60 * 60);
    let start_time = now - Duration::seconds(offset_secs);
    let end_time = start_time + Duration::hours(hours as i64);
    let job_id = if rng.gen_bool(JOB_LINK_PROBABILITY) {
        job_ids.choose(rng).cloned()
    } else {
        None
    };
    let status = if end_time > now { "active" } else { "completed" };

    NewTemporalCommitment {
        node_id: format!("compute_{}", rng.gen_range(1..=compute_count)),
        job_id,
        commitment_duration: hours,
        start_time: Some(start_time),
        end_time,
        status: status.to_string(),
        computational_power: rng.gen_range(500..1000),
    }
}

/// Create the demo validators, then backdate each commitment window so the
/// persistence bonus starts partway through.
async fn seed_validators<S, R>(
    store: &S,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Result<usize, NexusError>
where
    S: ConsensusStore + ?Sized,
    R: Rng + Send + ?Sized,
{
    let mut created = 0;
    for (i, (stake, duration, uptime, reputation)) in DEMO_VALIDATORS.iter().enumerate() {
        let index = i + 1;
        if store.get_validator(&format!("validator_{}", index)).await?.is_some() {
            continue;
        }
        let mut validator = store
            .create_validator(NewValidator {
                validator_id: format!("validator_{}", index),
                node_id: format!("validator_{}", index),
                stake_amount: *stake,
                commitment_duration: *duration,
                end_time: None,
                uptime: *uptime,
                reputation: *reputation,
                status: ValidatorStatus::Active,
            })
            .await?;

        let elapsed_fraction: f64 = rng.gen_range(0.1..0.9);
        let elapsed_minutes = (*duration as f64 * elapsed_fraction) as i64;
        validator.start_time = now - Duration::minutes(elapsed_minutes);
        validator.end_time = validator.start_time + Duration::minutes(*duration as i64);
        store.save_validator(&validator).await?;
        created += 1;
    }
    Ok(created)
}
