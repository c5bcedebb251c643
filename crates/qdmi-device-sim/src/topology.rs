// SPDX-License-Identifier: Apache-2.0
//! The reference device's fixed 5-qubit ring coupling map.

pub const NUM_QUBITS: usize = 5;

/// The directed coupling pairs, flattened the way
/// [`qdmi_abi::properties::DeviceProperty::CouplingMap`] is returned: qubit
/// `2n` is coupled to qubit `2n+1`, for `n` in `0..num_edges`.
pub fn coupling_pairs() -> Vec<(usize, usize)> {
    let mut pairs = Vec::with_capacity(NUM_QUBITS * 2);
    for i in 0..NUM_QUBITS {
        let next = (i + 1) % NUM_QUBITS;
        pairs.push((i, next));
        pairs.push((next, i));
    }
    pairs
}

pub fn flattened_coupling_map() -> Vec<i32> {
    coupling_pairs()
        .into_iter()
        .flat_map(|(a, b)| [a as i32, b as i32])
        .collect()
}

/// Whether `(control, target)` is a physically valid `cx` edge.
pub fn is_adjacent(control: usize, target: usize) -> bool {
    coupling_pairs().contains(&(control, target))
}

/// The per-edge `cx` fidelity, indexed by the ring edge `(control, target)`
/// where `target == (control + 1) % NUM_QUBITS`. Reverse-direction edges
/// share their forward edge's fidelity.
pub fn cx_fidelity(control: usize, target: usize) -> Option<f64> {
    const FIDELITIES: [f64; NUM_QUBITS] = [0.99, 0.98, 0.97, 0.96, 0.95];
    let forward = target == (control + 1) % NUM_QUBITS;
    let backward = control == (target + 1) % NUM_QUBITS;
    if forward {
        Some(FIDELITIES[control])
    } else if backward {
        Some(FIDELITIES[target])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_has_ten_directed_edges() {
        assert_eq!(coupling_pairs().len(), 10);
    }

    #[test]
    fn ring_is_symmetric() {
        for &(a, b) in &coupling_pairs() {
            assert!(is_adjacent(b, a), "missing reverse edge for ({a}, {b})");
        }
    }

    #[test]
    fn non_adjacent_pair_has_no_fidelity() {
        assert_eq!(cx_fidelity(0, 2), None);
        assert!(!is_adjacent(0, 2));
    }

    #[test]
    fn adjacent_pair_has_fidelity_in_unit_interval() {
        let f = cx_fidelity(0, 1).unwrap();
        assert!((0.0..=1.0).contains(&f));
        assert_eq!(f, 0.99);
    }
}
