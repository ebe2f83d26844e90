//! The execution controller: turns a [`QuantumCircuit`] plus an
//! [`EngineConfig`] into a sequence of [`StateVector`] snapshots that can be
//! run to completion, stepped through one column at a time in either
//! direction, or jumped to directly.

use crate::core::circuit::{PlacedGate, QuantumCircuit};
use crate::core::gates::{self, GateCache};
use crate::core::kernel;
use crate::core::state::StateVector;
use crate::error::{QubiError, QubiResult};
use crate::maths::complex::Complex;

/// Tunables that shape how an [`Engine`] executes a circuit, analogous to
/// the runtime's builder-style configuration flags.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Use the closed-form fast paths in `core::kernel` where available.
    pub use_optimized_gates: bool,
    /// Refuses to build an engine for a circuit wider than this.
    pub max_qubits: usize,
    /// Tolerance used when comparing states or checking unitarity.
    pub equality_tolerance: f64,
}

impl Default for EngineConfig {
    fn default() -> EngineConfig {
        EngineConfig {
            use_optimized_gates: true,
            max_qubits: 10,
            equality_tolerance: 1e-10,
        }
    }
}

/// A saved point in a run: the state after `column` (the originating
/// circuit column, not the step index) and the gates that produced it from
/// the previous snapshot. `column` is `None` and `applied_gates` is empty
/// only for the fresh snapshot at step 0.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub column: Option<usize>,
    pub applied_gates: Vec<PlacedGate>,
    pub state: StateVector,
}

pub struct Engine {
    circuit: QuantumCircuit,
    config: EngineConfig,
    cache: GateCache,
    execution_columns: Vec<usize>,
    snapshots: Vec<Snapshot>,
    cursor: usize,
}

impl Engine {
    pub fn new(circuit: QuantumCircuit, config: EngineConfig) -> QubiResult<Engine> {
        if circuit.num_qubits > config.max_qubits {
            return Err(QubiError::ShapeError(format!(
                "circuit has {} qubits, exceeds the configured max of {}",
                circuit.num_qubits, config.max_qubits
            )));
        }
        let execution_columns = circuit.expand_execution_columns()?;
        tracing::debug!(
            num_qubits = circuit.num_qubits,
            steps = execution_columns.len(),
            use_optimized_gates = config.use_optimized_gates,
            "engine built"
        );
        let fresh = StateVector::fresh(circuit.num_qubits);
        Ok(Engine {
            circuit,
            config,
            cache: GateCache::new(),
            execution_columns,
            snapshots: vec![Snapshot {
                column: None,
                applied_gates: Vec::new(),
                state: fresh,
            }],
            cursor: 0,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn circuit(&self) -> &QuantumCircuit {
        &self.circuit
    }

    pub fn clear_gate_cache(&self) {
        self.cache.clear();
    }

    /// The state at the current cursor position. `snapshots()[0]` is always
    /// the fresh `|0...0>` state, regardless of how far execution has run.
    pub fn current_state(&self) -> &StateVector {
        &self.snapshots[self.cursor].state
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn step_count(&self) -> usize {
        self.execution_columns.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn apply_column(&self, state: &mut StateVector, column: usize) -> QubiResult<()> {
        for gate in self.circuit.gates_at_column(column) {
            self.apply_gate(state, gate)?;
        }
        Ok(())
    }

    fn apply_gate(&self, state: &mut StateVector, gate: &PlacedGate) -> QubiResult<()> {
        if gate.gate_name == "MEASURE" {
            self.collapse(state, gate.target_qubit)?;
            return Ok(());
        }

        let base_name = gates::base_unitary_name(&gate.gate_name);
        let def = gates::lookup(base_name)
            .ok_or_else(|| QubiError::UnknownGate(gate.gate_name.clone()))?;
        let (targets, controls) = gate.kernel_targets_and_controls();
        let width = targets.len() + controls.len();
        let matrix = self.cache.resolve(&def, gate.angle, width)?;

        if self.config.use_optimized_gates {
            if let Some(shape) = kernel::specialized_shape_for(base_name) {
                kernel::apply_specialized(&mut state.amplitudes, shape, &targets, &controls)?;
                return Ok(());
            }
        }
        kernel::apply_generic(&mut state.amplitudes, &matrix, &targets, &controls)?;
        Ok(())
    }

    /// Projective collapse of `qubit`: samples an outcome weighted by its
    /// marginal probability, zeroes every amplitude inconsistent with that
    /// outcome, and renormalizes the rest.
    fn collapse(&self, state: &mut StateVector, qubit: usize) -> QubiResult<bool> {
        let p1 = state.marginal_probability_one(qubit)?;
        let outcome = rand::random::<f64>() < p1;
        let keep_probability = if outcome { p1 } else { 1.0 - p1 };
        if keep_probability <= 0.0 {
            return Err(QubiError::ShapeError(
                "measurement collapsed onto a zero-probability outcome".to_string(),
            ));
        }
        tracing::trace!(qubit, outcome, p1, "measurement collapsed");

        let bit = 1usize << qubit;
        let scale = 1.0 / keep_probability.sqrt();
        for (i, amplitude) in state.amplitudes.iter_mut().enumerate() {
            let bit_is_set = i & bit != 0;
            if bit_is_set != outcome {
                *amplitude = Complex::ZERO;
            } else {
                *amplitude = *amplitude * scale;
            }
        }
        Ok(outcome)
    }

    pub fn run_full(&mut self) -> QubiResult<()> {
        tracing::debug!(steps = self.execution_columns.len(), "running circuit to completion");
        while self.step_forward()? {}
        Ok(())
    }

    /// Advances the cursor by one column, computing and caching a new
    /// snapshot only the first time that column is reached. Returns `false`
    /// once execution has reached the end.
    pub fn step_forward(&mut self) -> QubiResult<bool> {
        if self.cursor >= self.execution_columns.len() {
            return Ok(false);
        }
        if self.cursor + 1 < self.snapshots.len() {
            self.cursor += 1;
            return Ok(true);
        }
        let column = self.execution_columns[self.cursor];
        let mut state = self.snapshots[self.cursor].state.clone();
        self.apply_column(&mut state, column)?;
        let applied_gates = self
            .circuit
            .gates_at_column(column)
            .into_iter()
            .cloned()
            .collect();
        self.snapshots.push(Snapshot {
            column: Some(column),
            applied_gates,
            state,
        });
        self.cursor += 1;
        Ok(true)
    }

    /// Moves the cursor back one step without discarding any snapshot.
    pub fn step_back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    /// Moves the cursor back to step 0 (the fresh `|0...0>` state) without
    /// discarding any already-computed snapshot.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    pub fn jump_to(&mut self, step: usize) -> QubiResult<()> {
        if step > self.execution_columns.len() {
            return Err(QubiError::ShapeError(format!(
                "step {} exceeds circuit length {}",
                step,
                self.execution_columns.len()
            )));
        }
        while self.snapshots.len() <= step {
            self.step_forward()?;
        }
        self.cursor = step;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::circuit::ControlFlowBlock;
    use crate::core::circuit::ControlFlowKind;

    fn gate(name: &str, column: usize, target: usize) -> PlacedGate {
        PlacedGate {
            gate_name: name.to_string(),
            column,
            target_qubit: target,
            other_qubit: None,
            control_qubits: Vec::new(),
            angle: None,
        }
    }

    fn cx(column: usize, target: usize, control: usize) -> PlacedGate {
        PlacedGate {
            gate_name: "CX".to_string(),
            column,
            target_qubit: target,
            other_qubit: None,
            control_qubits: vec![control],
            angle: None,
        }
    }

    #[test]
    fn snapshot_zero_is_always_the_fresh_state() {
        let mut circuit = QuantumCircuit::new(1);
        circuit.add_gate(gate("H", 0, 0)).unwrap();
        let mut engine = Engine::new(circuit, EngineConfig::default()).unwrap();
        engine.run_full().unwrap();
        assert_eq!(engine.snapshots()[0].state, StateVector::fresh(1));
        assert_eq!(engine.snapshots()[0].column, None);
        assert!(engine.snapshots()[0].applied_gates.is_empty());
    }

    #[test]
    fn bell_pair_run_full_produces_equal_weight_on_00_and_11() {
        let mut circuit = QuantumCircuit::new(2);
        circuit.add_gate(gate("H", 0, 0)).unwrap();
        circuit.add_gate(cx(1, 1, 0)).unwrap();
        let mut engine = Engine::new(circuit, EngineConfig::default()).unwrap();
        engine.run_full().unwrap();
        let probabilities = engine.current_state().all_probabilities();
        assert!((probabilities[0b00] - 0.5).abs() < 1e-9);
        assert!((probabilities[0b11] - 0.5).abs() < 1e-9);
        assert!(probabilities[0b01] < 1e-12);
        assert!(probabilities[0b10] < 1e-12);
    }

    #[test]
    fn step_back_then_forward_reaches_the_same_state() {
        let mut circuit = QuantumCircuit::new(2);
        circuit.add_gate(gate("H", 0, 0)).unwrap();
        circuit.add_gate(cx(1, 1, 0)).unwrap();
        let mut engine = Engine::new(circuit, EngineConfig::default()).unwrap();
        engine.run_full().unwrap();
        let final_state = engine.current_state().clone();
        engine.step_back();
        engine.step_back();
        assert_eq!(*engine.current_state(), StateVector::fresh(2));
        engine.step_forward().unwrap();
        engine.step_forward().unwrap();
        assert_eq!(*engine.current_state(), final_state);
    }

    #[test]
    fn generic_and_specialized_engines_agree_on_a_bell_pair() {
        let build = || {
            let mut circuit = QuantumCircuit::new(2);
            circuit.add_gate(gate("H", 0, 0)).unwrap();
            circuit.add_gate(cx(1, 1, 0)).unwrap();
            circuit
        };
        let mut optimized = Engine::new(
            build(),
            EngineConfig {
                use_optimized_gates: true,
                ..EngineConfig::default()
            },
        )
        .unwrap();
        let mut generic = Engine::new(
            build(),
            EngineConfig {
                use_optimized_gates: false,
                ..EngineConfig::default()
            },
        )
        .unwrap();
        optimized.run_full().unwrap();
        generic.run_full().unwrap();
        for (a, b) in optimized
            .current_state()
            .amplitudes
            .iter()
            .zip(generic.current_state().amplitudes.iter())
        {
            assert!(a.approx_eq(b, 1e-8));
        }
    }

    #[test]
    fn repeated_x_toggles_back_to_zero_after_an_even_repeat_count() {
        let mut circuit = QuantumCircuit::new(1);
        circuit
            .add_control_flow(ControlFlowBlock {
                column: 0,
                kind: ControlFlowKind::Repeat(4),
            })
            .unwrap();
        circuit.add_gate(gate("X", 1, 0)).unwrap();
        circuit
            .add_control_flow(ControlFlowBlock {
                column: 2,
                kind: ControlFlowKind::End,
            })
            .unwrap();
        let mut engine = Engine::new(circuit, EngineConfig::default()).unwrap();
        engine.run_full().unwrap();
        assert!((engine.current_state().probability(0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn circuit_wider_than_max_qubits_is_rejected() {
        let circuit = QuantumCircuit::new(4);
        let config = EngineConfig {
            max_qubits: 2,
            ..EngineConfig::default()
        };
        assert!(matches!(
            Engine::new(circuit, config),
            Err(QubiError::ShapeError(_))
        ));
    }

    #[test]
    fn snapshot_k_matches_a_fresh_run_stopped_after_k_columns() {
        let mut circuit = QuantumCircuit::new(2);
        circuit.add_gate(gate("H", 0, 0)).unwrap();
        circuit.add_gate(cx(1, 1, 0)).unwrap();
        circuit.add_gate(gate("H", 2, 1)).unwrap();
        let mut full = Engine::new(circuit.clone(), EngineConfig::default()).unwrap();
        full.run_full().unwrap();

        for k in 0..=full.step_count() {
            let mut partial = Engine::new(circuit.clone(), EngineConfig::default()).unwrap();
            for _ in 0..k {
                partial.step_forward().unwrap();
            }
            assert_eq!(full.snapshots()[k].state, *partial.current_state());
        }
    }

    #[test]
    fn reset_returns_to_the_fresh_state_without_dropping_snapshots() {
        let mut circuit = QuantumCircuit::new(1);
        circuit.add_gate(gate("H", 0, 0)).unwrap();
        let mut engine = Engine::new(circuit, EngineConfig::default()).unwrap();
        engine.run_full().unwrap();
        let ran_state = engine.current_state().clone();
        engine.reset();
        assert_eq!(*engine.current_state(), StateVector::fresh(1));
        assert_eq!(engine.snapshots().len(), 2);
        engine.step_forward().unwrap();
        assert_eq!(*engine.current_state(), ran_state);
    }

    #[test]
    fn jump_to_matches_manual_stepping() {
        let mut circuit = QuantumCircuit::new(1);
        circuit.add_gate(gate("H", 0, 0)).unwrap();
        circuit.add_gate(gate("X", 1, 0)).unwrap();
        circuit.add_gate(gate("H", 2, 0)).unwrap();
        let mut stepped = Engine::new(circuit.clone(), EngineConfig::default()).unwrap();
        stepped.step_forward().unwrap();
        stepped.step_forward().unwrap();
        let mut jumped = Engine::new(circuit, EngineConfig::default()).unwrap();
        jumped.jump_to(2).unwrap();
        assert_eq!(stepped.current_state(), jumped.current_state());
    }
}
