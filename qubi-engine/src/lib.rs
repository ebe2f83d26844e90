//! The facade a renderer is expected to drive: one [`Engine`] owns a
//! circuit, its Qubi source text (when it has one), and the run/step
//! history produced by executing it. Everything a Bloch-sphere view, a
//! probability chart, or a circuit-grid editor needs crosses this single
//! boundary -- none of them ever touch [`qubi_core`] or [`qubi_lang`]
//! directly.

use qubi_core::core::circuit::{ControlFlowBlock, ControlFlowKind, PlacedGate, QuantumCircuit};
use qubi_core::core::engine::{Engine as ExecutionEngine, EngineConfig, Snapshot};
use qubi_core::core::state::StateVector;
use qubi_core::error::{QubiError, QubiResult};
use qubi_lang::{generate, parse, SourceLine};

/// Where a placed gate's operand qubits come from when building it through
/// [`Engine::add_gate`], mirroring the three ways a Qubi line can spell an
/// operand (`§4.G`): a bare qubit, a lone partner/control, or an ordered
/// list of controls ending in the target.
#[derive(Debug, Clone, Default)]
pub struct GatePlacement {
    pub other_qubit: Option<usize>,
    pub control_qubits: Vec<usize>,
    pub angle: Option<f64>,
}

/// Owns a circuit plus, once it has been run or stepped at least once, the
/// execution history that produced the current state. Mutating the
/// circuit (adding/removing a gate, control-flow block, or qubit)
/// invalidates that history, per the lifecycle rule that resizing or
/// editing discards the current state.
pub struct Engine {
    circuit: QuantumCircuit,
    config: EngineConfig,
    source: Option<Vec<SourceLine>>,
    execution: Option<ExecutionEngine>,
}

impl Engine {
    pub fn new(num_qubits: usize) -> Engine {
        Engine::with_config(num_qubits, EngineConfig::default())
    }

    pub fn with_config(num_qubits: usize, config: EngineConfig) -> Engine {
        Engine {
            circuit: QuantumCircuit::new(num_qubits),
            config,
            source: None,
            execution: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn circuit(&self) -> &QuantumCircuit {
        &self.circuit
    }

    pub fn num_qubits(&self) -> usize {
        self.circuit.num_qubits
    }

    /// Drops any run/step history. Called after every structural edit so a
    /// stale execution can never be observed past the edit that made it
    /// invalid.
    fn invalidate(&mut self) {
        self.execution = None;
    }

    pub fn add_qubit(&mut self) -> QubiResult<usize> {
        if self.circuit.num_qubits >= self.config.max_qubits {
            tracing::warn!(max_qubits = self.config.max_qubits, "rejected add_qubit: at configured max");
            return Err(QubiError::ShapeError(format!(
                "adding a qubit would exceed the configured max of {}",
                self.config.max_qubits
            )));
        }
        let index = self.circuit.add_qubit();
        self.invalidate();
        Ok(index)
    }

    pub fn remove_qubit(&mut self) -> QubiResult<()> {
        self.circuit.remove_qubit()?;
        self.invalidate();
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_gate(
        &mut self,
        gate_name: &str,
        target_qubit: usize,
        column: usize,
        placement: GatePlacement,
    ) -> QubiResult<()> {
        self.circuit.add_gate(PlacedGate {
            gate_name: gate_name.to_string(),
            column,
            target_qubit,
            other_qubit: placement.other_qubit,
            control_qubits: placement.control_qubits,
            angle: placement.angle,
        })?;
        self.invalidate();
        Ok(())
    }

    pub fn remove_gate(&mut self, target_qubit: usize, column: usize) -> Option<PlacedGate> {
        let removed = self.circuit.remove_gate(column, target_qubit);
        if removed.is_some() {
            self.invalidate();
        }
        removed
    }

    /// Replaces the placement at `(target_qubit, column)` with a fresh one
    /// built from `gate_name`/`placement`. Equivalent to a
    /// [`Engine::remove_gate`] followed by [`Engine::add_gate`], except
    /// that the old placement is restored if the new one fails to fit so
    /// no edit is ever partially applied.
    pub fn edit_gate(
        &mut self,
        gate_name: &str,
        target_qubit: usize,
        column: usize,
        placement: GatePlacement,
    ) -> QubiResult<()> {
        let previous = self.circuit.remove_gate(column, target_qubit);
        match self.add_gate(gate_name, target_qubit, column, placement) {
            Ok(()) => Ok(()),
            Err(err) => {
                if let Some(previous) = previous {
                    self.circuit
                        .add_gate(previous)
                        .expect("restoring the previous placement must not fail");
                }
                Err(err)
            }
        }
    }

    pub fn add_control_flow(&mut self, kind: ControlFlowKind, column: usize) -> QubiResult<()> {
        self.circuit
            .add_control_flow(ControlFlowBlock { column, kind })?;
        self.invalidate();
        Ok(())
    }

    pub fn remove_control_flow(&mut self, column: usize) -> Option<ControlFlowBlock> {
        let removed = self.circuit.remove_control_flow(column);
        if removed.is_some() {
            self.invalidate();
        }
        removed
    }

    /// Replaces the circuit with the one described by `text`, discarding
    /// any run/step history. Keeps the parsed source lines around so a
    /// later [`Engine::emit`] can preserve comments and blank lines.
    pub fn parse(&mut self, text: &str) -> QubiResult<()> {
        let output = parse(text)?;
        tracing::debug!(
            num_qubits = output.circuit.num_qubits,
            depth = output.circuit.depth(),
            "parsed circuit text"
        );
        self.circuit = output.circuit;
        self.source = Some(output.lines);
        self.invalidate();
        Ok(())
    }

    /// Regenerates Qubi source text for the current circuit, replaying the
    /// comments and layout of the last successfully parsed text if one is
    /// on hand.
    pub fn emit(&self) -> String {
        match &self.source {
            Some(lines) => generate(&self.circuit, lines),
            None => generate(&self.circuit, &[]),
        }
    }

    fn execution_mut(&mut self) -> QubiResult<&mut ExecutionEngine> {
        if self.execution.is_none() {
            self.execution = Some(ExecutionEngine::new(self.circuit.clone(), self.config)?);
        }
        Ok(self.execution.as_mut().unwrap())
    }

    pub fn run(&mut self) -> QubiResult<()> {
        self.execution_mut()?.run_full()
    }

    pub fn step_forward(&mut self) -> QubiResult<bool> {
        self.execution_mut()?.step_forward()
    }

    pub fn step_back(&mut self) -> QubiResult<bool> {
        Ok(self.execution_mut()?.step_back())
    }

    pub fn jump_to(&mut self, step: usize) -> QubiResult<()> {
        self.execution_mut()?.jump_to(step)
    }

    /// Rewinds to the fresh `|0...0>` state without discarding the
    /// snapshots already computed, so stepping forward again is cheap.
    pub fn reset(&mut self) -> QubiResult<()> {
        self.execution_mut()?.reset();
        Ok(())
    }

    pub fn clear_gate_cache(&self) {
        if let Some(execution) = &self.execution {
            execution.clear_gate_cache();
        }
    }

    fn state(&self) -> StateVector {
        match &self.execution {
            Some(execution) => execution.current_state().clone(),
            None => StateVector::fresh(self.circuit.num_qubits),
        }
    }

    pub fn state_vector(&self) -> StateVector {
        self.state()
    }

    pub fn probabilities(&self) -> Vec<(usize, f64)> {
        self.state()
            .all_probabilities()
            .into_iter()
            .enumerate()
            .collect()
    }

    pub fn qubit_probability(&self, qubit: usize) -> QubiResult<f64> {
        self.state().marginal_probability_one(qubit)
    }

    pub fn bloch_coordinates(&self, qubit: usize) -> QubiResult<(f64, f64, f64)> {
        self.state().bloch_coordinates(qubit)
    }

    pub fn is_qubit_pure(&self, qubit: usize) -> QubiResult<bool> {
        self.state().is_single_qubit_pure(qubit)
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        match &self.execution {
            Some(execution) => execution.snapshots(),
            None => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bell_pair_from_qubi_text_has_equal_weight_on_00_and_11() {
        let mut engine = Engine::new(1);
        engine.parse("H 0\nCX [0,1]\n").unwrap();
        assert_eq!(engine.num_qubits(), 2);
        engine.run().unwrap();
        let probabilities = engine.probabilities();
        assert!((probabilities[0b00].1 - 0.5).abs() < 1e-9);
        assert!((probabilities[0b11].1 - 0.5).abs() < 1e-9);
        assert!(probabilities[0b01].1 < 1e-12);
        assert!(probabilities[0b10].1 < 1e-12);
        let (x, y, z) = engine.bloch_coordinates(0).unwrap();
        assert!(x.abs() < 1e-9 && y.abs() < 1e-9 && z.abs() < 1e-9);
        assert!(!engine.is_qubit_pure(0).unwrap());
    }

    #[test]
    fn ghz3_leaves_weight_only_on_000_and_111() {
        let mut engine = Engine::new(1);
        engine.parse("H 0\nCX [0,1]\nCX [1,2]\n").unwrap();
        engine.run().unwrap();
        let probabilities = engine.probabilities();
        assert!((probabilities[0b000].1 - 0.5).abs() < 1e-9);
        assert!((probabilities[0b111].1 - 0.5).abs() < 1e-9);
        for &(index, p) in &probabilities {
            if index != 0b000 && index != 0b111 {
                assert!(p < 1e-12);
            }
        }
    }

    #[test]
    fn editing_the_circuit_after_a_run_discards_history() {
        let mut engine = Engine::new(1);
        engine.parse("H 0\n").unwrap();
        engine.run().unwrap();
        assert!(!engine.snapshots().is_empty());
        engine.remove_gate(0, 0);
        assert!(engine.snapshots().is_empty());
        assert_eq!(engine.state_vector(), StateVector::fresh(1));
    }

    #[test]
    fn edit_gate_restores_the_previous_placement_on_failure() {
        let mut engine = Engine::new(2);
        engine
            .add_gate("H", 0, 0, GatePlacement::default())
            .unwrap();
        // qubit 5 doesn't exist: the edit must fail and leave the original H in place.
        let result = engine.edit_gate("H", 5, 0, GatePlacement::default());
        assert!(result.is_err());
        assert_eq!(engine.circuit().gates_at_column(0).len(), 1);
        assert_eq!(engine.circuit().gates_at_column(0)[0].gate_name, "H");
    }

    #[test]
    fn emit_round_trips_through_parse_with_comments_preserved() {
        let mut engine = Engine::new(1);
        engine.parse("// a bell pair\nH 0\nCX [0,1]\n").unwrap();
        let emitted = engine.emit();
        assert_eq!(emitted, "// a bell pair\nH 0\nCX [0,1]");

        let mut replayed = Engine::new(1);
        replayed.parse(&emitted).unwrap();
        assert_eq!(replayed.circuit().all_gates(), engine.circuit().all_gates());
    }

    #[test]
    fn step_back_then_forward_round_trips_to_the_same_state() {
        let mut engine = Engine::new(1);
        engine.parse("H 0\nX 0\nH 0\n").unwrap();
        engine.run().unwrap();
        let final_state = engine.state_vector();
        engine.step_back().unwrap();
        engine.step_back().unwrap();
        engine.step_back().unwrap();
        assert_eq!(engine.state_vector(), StateVector::fresh(1));
        engine.step_forward().unwrap();
        engine.step_forward().unwrap();
        engine.step_forward().unwrap();
        assert_eq!(engine.state_vector(), final_state);
    }

    #[test]
    fn grover_on_two_qubits_converges_on_the_marked_state() {
        let mut engine = Engine::new(1);
        engine
            .parse(
                "H (0,1)\nREPEAT 1\nCZ [0,1]\nH (0,1)\nX (0,1)\nCZ [0,1]\nX (0,1)\nH (0,1)\nEND\n",
            )
            .unwrap();
        engine.run().unwrap();
        let probabilities = engine.probabilities();
        assert!((probabilities[0b11].1 - 1.0).abs() < 1e-8);
    }

    #[test]
    fn adding_a_qubit_beyond_max_qubits_is_rejected() {
        let mut engine = Engine::with_config(
            1,
            EngineConfig {
                max_qubits: 1,
                ..EngineConfig::default()
            },
        );
        assert!(matches!(
            engine.add_qubit(),
            Err(QubiError::ShapeError(_))
        ));
    }

    #[test]
    fn removing_a_qubit_invalidates_history_and_shrinks_the_circuit() {
        let mut engine = Engine::new(2);
        engine.add_gate("H", 0, 0, GatePlacement::default()).unwrap();
        engine.run().unwrap();
        assert!(!engine.snapshots().is_empty());

        engine.remove_qubit().unwrap();
        assert_eq!(engine.num_qubits(), 1);
        assert!(engine.snapshots().is_empty());
        assert_eq!(engine.state_vector(), StateVector::fresh(1));
    }
}
