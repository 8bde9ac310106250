// crates/nexus-rpc/src/render.rs
//
// Plain-text renderings for the terminal commands served by
// `POST /api/cli/execute`.

use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::{DateTime, Utc};

use nexus_consensus::ConsensusStats;
use nexus_core::{NodeType, TemporalCommitment, TrainingJob, MAX_TRAINING_STEP};

use crate::live::TypeStats;

const RULE: &str = "═══════════════";

fn header(out: &mut String, title: &str) {
    let _ = writeln!(out, "{} {} {}", RULE, title, RULE);
}

pub fn node_status(stats: &BTreeMap<NodeType, TypeStats>) -> String {
    let mut out = String::new();
    header(&mut out, "NEXUSLINKAI NODE STATUS");
    for (node_type, s) in stats {
        let label = format!("{} NODES", node_type.as_str().to_uppercase());
        let state = if s.active > 0 { "OPERATIONAL" } else { "OFFLINE" };
        let _ = writeln!(
            out,
            "● {:<16} {:>5}/{:<5} active  [{}]",
            label, s.active, s.total, state
        );
    }
    out
}

/// Commitment totals derived from the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommitmentSummary {
    pub total: u64,
    pub active: u64,
    pub average_duration_hours: f64,
    /// Sum of active computational power, in thousands of units.
    pub network_power: f64,
}

impl CommitmentSummary {
    pub fn from_commitments(all: &[TemporalCommitment], active: &[TemporalCommitment]) -> Self {
        let average_duration_hours = if all.is_empty() {
            0.0
        } else {
            all.iter().map(|c| c.commitment_duration as f64).sum::<f64>() / all.len() as f64
        };
        let power = active
            .iter()
            .fold(0u64, |acc, c| acc.saturating_add(c.computational_power));
        Self {
            total: all.len() as u64,
            active: active.len() as u64,
            average_duration_hours,
            network_power: power as f64 / 1000.0,
        }
    }

    pub fn expired(&self) -> u64 {
        self.total.saturating_sub(self.active)
    }
}

pub fn potc_status(summary: &CommitmentSummary) -> String {
    let mut out = String::new();
    header(&mut out, "PROOF OF TEMPORAL COMMITMENT STATUS");
    let _ = writeln!(out, "Total Commitments:           {}", summary.total);
    let _ = writeln!(out, "Active Commitments:          {}", summary.active);
    let _ = writeln!(out, "Expired Commitments:         {}", summary.expired());
    let _ = writeln!(
        out,
        "Avg Commitment Duration:     {:.1} hours",
        summary.average_duration_hours
    );
    let _ = writeln!(
        out,
        "Network Computational Power: {:.1} TH/s",
        summary.network_power
    );
    out
}

pub fn commitment_result(commitment: &TemporalCommitment) -> String {
    let mut out = String::new();
    header(&mut out, "TEMPORAL COMMITMENT SIMULATION");
    let _ = writeln!(
        out,
        "✓ Compute node {} locked for {} hours",
        commitment.node_id, commitment.commitment_duration
    );
    let _ = writeln!(out, "✓ Commitment proof generated");
    let _ = writeln!(
        out,
        "✓ Computational power: {} units",
        commitment.computational_power
    );
    let _ = writeln!(
        out,
        "⚡ Commitment active until {}",
        format_time(commitment.end_time)
    );
    out
}

pub fn training_submission(job_count: usize) -> String {
    let mut out = String::new();
    header(&mut out, "TRAINING JOB SUBMISSION");
    for line in [
        "Consumer nodes validated request",
        "RPC nodes processed routing",
        "Data nodes prepared dataset",
        "Oracle nodes established validation benchmarks",
        "Validator nodes approved job specifications",
        "Full nodes recorded blockchain entry",
        "Sentry nodes initiated security monitoring",
    ] {
        let _ = writeln!(out, "✓ {}", line);
    }
    let _ = writeln!(out, "⚡ Job queued as #{}", job_count + 1);
    out
}

pub fn training_status(jobs: &[TrainingJob]) -> String {
    let mut out = String::new();
    header(&mut out, "ACTIVE TRAINING JOBS");
    if jobs.is_empty() {
        let _ = writeln!(out, "No active training jobs");
    }
    for job in jobs {
        let _ = writeln!(out, "Job: {} ({})", job.name, job.job_id);
        let _ = writeln!(
            out,
            "  Status: {} | Progress: {}%",
            job.status.to_uppercase(),
            job.progress
        );
        let _ = writeln!(
            out,
            "  Phase: {} | Step: {}/{}",
            job.current_phase, job.current_step, MAX_TRAINING_STEP
        );
    }
    out
}

pub fn consensus_status(stats: &ConsensusStats) -> String {
    let mut out = String::new();
    header(&mut out, "POTC CONSENSUS STATUS");
    let _ = writeln!(out, "Current Round:      {}", stats.current_round);
    let _ = writeln!(out, "Total Rounds:       {}", stats.total_rounds);
    let _ = writeln!(out, "Successful Rounds:  {}", stats.successful_rounds);
    let _ = writeln!(out, "Success Rate:       {:.1}%", stats.success_rate);
    let _ = writeln!(
        out,
        "Simulation:         {}",
        if stats.is_simulation_running { "RUNNING" } else { "IDLE" }
    );
    if !stats.top_validators.is_empty() {
        let _ = writeln!(out, "Top Validators:");
        for (rank, v) in stats.top_validators.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {}. {} score={} stake={} reputation={:.1}",
                rank + 1,
                v.validator_id,
                v.potc_score,
                v.stake_amount,
                v.reputation
            );
        }
    }
    out
}

pub fn command_not_found(command: &str) -> String {
    format!("Command not found: {}", command)
}

fn format_time(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
