// SPDX-License-Identifier: Apache-2.0
//! Job state machine and result computation for the reference device.
//!
//! A job is created from a program buffer, accepts `shots_num` as its only
//! settable parameter, and on submission runs synchronously to completion —
//! there is no real scheduler behind this reference device. Status matures
//! deterministically on each poll (`Submitted -> Running` on the first
//! check, `Running -> Done` on the next) rather than probabilistically, so
//! tests are not flaky.

use num_complex::Complex64;
use qdmi_abi::error::{QdmiError, Result};
use qdmi_abi::properties::{JobStatus, ProgramFormat};
use rand::Rng;

use crate::circuit::Circuit;
use crate::topology::NUM_QUBITS;

const DEFAULT_SHOTS: u64 = 1024;

pub struct SimJob {
    pub status: JobStatus,
    format: ProgramFormat,
    program: Vec<u8>,
    shots_num: u64,
    outcome: Option<Outcome>,
}

struct Outcome {
    shots: Vec<String>,
    state: Vec<Complex64>,
}

impl SimJob {
    pub fn new(format: ProgramFormat, program: Vec<u8>) -> Result<Self> {
        if !matches!(format, ProgramFormat::Qasm2 | ProgramFormat::QirString) {
            return Err(QdmiError::NotSupported);
        }
        Ok(Self {
            status: JobStatus::Created,
            format,
            program,
            shots_num: DEFAULT_SHOTS,
            outcome: None,
        })
    }

    pub fn set_shots_num(&mut self, shots_num: u64) -> Result<()> {
        if self.status != JobStatus::Created {
            return Err(QdmiError::InvalidArgument(
                "shots_num can only be set before submission".into(),
            ));
        }
        self.shots_num = shots_num;
        Ok(())
    }

    pub fn submit(&mut self) -> Result<()> {
        if self.status != JobStatus::Created {
            return Err(QdmiError::InvalidArgument("job already submitted".into()));
        }
        let circuit = Circuit::run(&self.program)?;
        let probabilities = circuit.probabilities();
        let mut rng = rand::thread_rng();
        let shots = (0..self.shots_num)
            .map(|_| sample_bitstring(&probabilities, &mut rng))
            .collect();
        self.outcome = Some(Outcome {
            shots,
            state: circuit.state,
        });
        self.status = JobStatus::Submitted;
        Ok(())
    }

    /// One deterministic maturation step: `Submitted -> Running -> Done`.
    pub fn advance(&mut self) -> JobStatus {
        self.status = match self.status {
            JobStatus::Submitted => JobStatus::Running,
            JobStatus::Running => JobStatus::Done,
            other => other,
        };
        self.status
    }

    pub fn finish(&mut self) -> JobStatus {
        if !self.status.is_terminal() {
            self.status = JobStatus::Done;
        }
        self.status
    }

    pub fn cancel(&mut self) -> Result<()> {
        if self.status.is_terminal() {
            return Err(QdmiError::InvalidArgument(
                "job has already reached a terminal state".into(),
            ));
        }
        self.status = JobStatus::Cancelled;
        Ok(())
    }

    pub fn shots(&self) -> Result<&[String]> {
        self.outcome
            .as_ref()
            .map(|o| o.shots.as_slice())
            .ok_or(QdmiError::InvalidArgument(
                "result not available before the job is Done".into(),
            ))
    }

    pub fn state(&self) -> Result<&[Complex64]> {
        self.outcome
            .as_ref()
            .map(|o| o.state.as_slice())
            .ok_or(QdmiError::InvalidArgument(
                "result not available before the job is Done".into(),
            ))
    }
}

fn sample_bitstring(probabilities: &[f64], rng: &mut impl Rng) -> String {
    let draw: f64 = rng.gen_range(0.0..1.0);
    let mut acc = 0.0;
    let mut chosen = probabilities.len() - 1;
    for (index, p) in probabilities.iter().enumerate() {
        acc += p;
        if draw < acc {
            chosen = index;
            break;
        }
    }
    (0..NUM_QUBITS)
        .map(|bit| if chosen & (1 << bit) != 0 { '1' } else { '0' })
        .collect()
}

/// Groups `shots` into a sorted `(bitstring, count)` histogram.
pub fn histogram(shots: &[String]) -> Vec<(String, u64)> {
    let mut sorted: Vec<&String> = shots.iter().collect();
    sorted.sort();
    let mut hist = Vec::new();
    for key in sorted {
        match hist.last_mut() {
            Some((last_key, count)) if last_key == key => *count += 1,
            _ => hist.push((key.clone(), 1u64)),
        }
    }
    hist
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unsupported_program_format() {
        assert!(SimJob::new(ProgramFormat::QirModule, vec![]).is_err());
    }

    #[test]
    fn maturation_is_deterministic() {
        let mut job = SimJob::new(ProgramFormat::Qasm2, b"h q[0];".to_vec()).unwrap();
        job.submit().unwrap();
        assert_eq!(job.status, JobStatus::Submitted);
        assert_eq!(job.advance(), JobStatus::Running);
        assert_eq!(job.advance(), JobStatus::Done);
    }

    #[test]
    fn histogram_counts_match_shot_total() {
        let shots = vec!["00000".to_string(), "00000".to_string(), "11111".to_string()];
        let hist = histogram(&shots);
        let total: u64 = hist.iter().map(|(_, c)| c).sum();
        assert_eq!(total, shots.len() as u64);
        assert_eq!(hist.len(), 2);
    }

    #[test]
    fn cancelling_a_done_job_is_an_error() {
        let mut job = SimJob::new(ProgramFormat::Qasm2, b"h q[0];".to_vec()).unwrap();
        job.submit().unwrap();
        job.finish();
        assert!(job.cancel().is_err());
    }
}
