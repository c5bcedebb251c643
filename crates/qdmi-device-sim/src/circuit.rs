// SPDX-License-Identifier: Apache-2.0
//! A minimal statevector simulator over the device's fixed `num_qubits`
//! register, driving a tiny OpenQASM-2-like textual parser.
//!
//! Only the gates this device natively supports are recognized: `h`
//! (for Bell-pair-style seed programs), `x`, `rx`, `ry`, `rz`, `cx`. Any
//! other line is ignored rather than rejected — a real device would reject
//! unsupported gates at compile time; this reference device trades that
//! rigor for being able to run simple seed programs directly from raw QASM
//! text without a real compiler in front of it.

use num_complex::Complex64;
use qdmi_abi::error::{QdmiError, Result};

use crate::topology::{is_adjacent, NUM_QUBITS};

pub struct Circuit {
    pub state: Vec<Complex64>,
}

impl Circuit {
    /// Builds the all-zero basis state `|00000>` and applies every
    /// recognized gate line in `program` in order.
    pub fn run(program: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(program)
            .map_err(|_| QdmiError::InvalidArgument("program is not valid UTF-8 text".into()))?;
        let dim = 1usize << NUM_QUBITS;
        let mut state = vec![Complex64::new(0.0, 0.0); dim];
        state[0] = Complex64::new(1.0, 0.0);

        for raw_line in text.lines() {
            let line = strip_comment(raw_line).trim();
            if line.is_empty() {
                continue;
            }
            if let Some(gate) = parse_gate(line)? {
                apply_gate(&mut state, &gate)?;
            }
        }
        Ok(Self { state })
    }

    pub fn probabilities(&self) -> Vec<f64> {
        self.state.iter().map(|a| a.norm_sqr()).collect()
    }
}

enum Gate {
    Rx(usize, f64),
    Ry(usize, f64),
    Rz(usize, f64),
    X(usize),
    H(usize),
    Cx(usize, usize),
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn parse_gate(line: &str) -> Result<Option<Gate>> {
    let line = line.trim_end_matches(';').trim();
    if line.is_empty()
        || line.starts_with("OPENQASM")
        || line.starts_with("include")
        || line.starts_with("qreg")
        || line.starts_with("creg")
        || line.starts_with("measure")
        || line.starts_with("barrier")
    {
        return Ok(None);
    }

    let (head, rest) = line
        .split_once(' ')
        .ok_or_else(|| QdmiError::InvalidArgument(format!("cannot parse gate line: {line}")))?;
    let qubits = parse_qubit_list(rest)?;

    if let Some(stripped) = head.strip_prefix("rx(") {
        let angle = parse_angle(stripped)?;
        return Ok(Some(Gate::Rx(single(&qubits)?, angle)));
    }
    if let Some(stripped) = head.strip_prefix("ry(") {
        let angle = parse_angle(stripped)?;
        return Ok(Some(Gate::Ry(single(&qubits)?, angle)));
    }
    if let Some(stripped) = head.strip_prefix("rz(") {
        let angle = parse_angle(stripped)?;
        return Ok(Some(Gate::Rz(single(&qubits)?, angle)));
    }
    match head {
        "h" => Ok(Some(Gate::H(single(&qubits)?))),
        "x" => Ok(Some(Gate::X(single(&qubits)?))),
        "cx" => {
            if qubits.len() != 2 {
                return Err(QdmiError::InvalidArgument("cx needs two qubits".into()));
            }
            Ok(Some(Gate::Cx(qubits[0], qubits[1])))
        }
        _ => Ok(None),
    }
}

fn parse_angle(rest: &str) -> Result<f64> {
    let closing = rest
        .find(')')
        .ok_or_else(|| QdmiError::InvalidArgument("unterminated angle".into()))?;
    rest[..closing]
        .trim()
        .parse::<f64>()
        .map_err(|_| QdmiError::InvalidArgument("invalid angle literal".into()))
}

fn parse_qubit_list(rest: &str) -> Result<Vec<usize>> {
    rest.split(',')
        .map(|token| {
            let token = token.trim();
            let open = token
                .find('[')
                .ok_or_else(|| QdmiError::InvalidArgument(format!("expected q[n]: {token}")))?;
            let close = token
                .find(']')
                .ok_or_else(|| QdmiError::InvalidArgument(format!("expected q[n]: {token}")))?;
            token[open + 1..close]
                .parse::<usize>()
                .map_err(|_| QdmiError::InvalidArgument(format!("invalid qubit index: {token}")))
        })
        .collect()
}

fn single(qubits: &[usize]) -> Result<usize> {
    match qubits {
        [q] => Ok(*q),
        _ => Err(QdmiError::InvalidArgument(
            "expected a single-qubit gate argument".into(),
        )),
    }
}

fn apply_gate(state: &mut [Complex64], gate: &Gate) -> Result<()> {
    match *gate {
        Gate::H(q) => apply_single(state, q, hadamard()),
        Gate::X(q) => apply_single(state, q, pauli_x()),
        Gate::Rx(q, theta) => apply_single(state, q, rx_matrix(theta)),
        Gate::Ry(q, theta) => apply_single(state, q, ry_matrix(theta)),
        Gate::Rz(q, theta) => apply_single(state, q, rz_matrix(theta)),
        Gate::Cx(control, target) => {
            if !is_adjacent(control, target) {
                return Err(QdmiError::InvalidArgument(format!(
                    "cx({control}, {target}) is not a physical coupling edge"
                )));
            }
            apply_cx(state, control, target);
            Ok(())
        }
    }
}

type Matrix2 = [[Complex64; 2]; 2];

fn hadamard() -> Matrix2 {
    let s = std::f64::consts::FRAC_1_SQRT_2;
    [
        [Complex64::new(s, 0.0), Complex64::new(s, 0.0)],
        [Complex64::new(s, 0.0), Complex64::new(-s, 0.0)],
    ]
}

fn pauli_x() -> Matrix2 {
    [
        [Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)],
        [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)],
    ]
}

fn rx_matrix(theta: f64) -> Matrix2 {
    let (c, s) = ((theta / 2.0).cos(), (theta / 2.0).sin());
    [
        [Complex64::new(c, 0.0), Complex64::new(0.0, -s)],
        [Complex64::new(0.0, -s), Complex64::new(c, 0.0)],
    ]
}

fn ry_matrix(theta: f64) -> Matrix2 {
    let (c, s) = ((theta / 2.0).cos(), (theta / 2.0).sin());
    [
        [Complex64::new(c, 0.0), Complex64::new(-s, 0.0)],
        [Complex64::new(s, 0.0), Complex64::new(c, 0.0)],
    ]
}

fn rz_matrix(theta: f64) -> Matrix2 {
    let (c, s) = ((theta / 2.0).cos(), (theta / 2.0).sin());
    [
        [Complex64::new(c, -s), Complex64::new(0.0, 0.0)],
        [Complex64::new(0.0, 0.0), Complex64::new(c, s)],
    ]
}

fn apply_single(state: &mut [Complex64], qubit: usize, m: Matrix2) -> Result<()> {
    if qubit >= NUM_QUBITS {
        return Err(QdmiError::OutOfRange(format!("qubit {qubit} out of range")));
    }
    let bit = 1usize << qubit;
    for i in 0..state.len() {
        if i & bit == 0 {
            let j = i | bit;
            let a0 = state[i];
            let a1 = state[j];
            state[i] = m[0][0] * a0 + m[0][1] * a1;
            state[j] = m[1][0] * a0 + m[1][1] * a1;
        }
    }
    Ok(())
}

fn apply_cx(state: &mut [Complex64], control: usize, target: usize) {
    let cbit = 1usize << control;
    let tbit = 1usize << target;
    for i in 0..state.len() {
        if i & cbit != 0 && i & tbit == 0 {
            let j = i | tbit;
            state.swap(i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bell_pair_has_two_nonzero_amplitudes_with_equal_weight() {
        let program = "OPENQASM 2.0;\nqreg q[2];\nh q[0];\ncx q[0],q[1];\n";
        let circuit = Circuit::run(program.as_bytes()).unwrap();
        let probs = circuit.probabilities();
        let nonzero: Vec<f64> = probs.iter().copied().filter(|p| *p > 1e-9).collect();
        assert_eq!(nonzero.len(), 2);
        for p in nonzero {
            assert!((p - 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn statevector_norm_is_one() {
        let program = "h q[0];\nrx(1.2) q[1];\ncx q[1],q[2];\n";
        let circuit = Circuit::run(program.as_bytes()).unwrap();
        let norm: f64 = circuit.probabilities().iter().sum();
        assert!((norm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cx_across_non_adjacent_qubits_is_rejected() {
        let program = "cx q[0],q[2];\n";
        assert!(Circuit::run(program.as_bytes()).is_err());
    }

    #[test]
    fn empty_program_stays_in_ground_state() {
        let circuit = Circuit::run(b"OPENQASM 2.0;\nqreg q[5];\n").unwrap();
        let probs = circuit.probabilities();
        assert!((probs[0] - 1.0).abs() < 1e-9);
    }
}
