// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The inference runner with a type-state binding pipeline.
//!
//! ```text
//! Runner<Constructed>
//!     │  .setup()            kernels resolved, arena sized and sealed
//!     ▼
//! Runner<Ready>
//!     │  .run_single_iteration(&mut profiler)   (repeatable)
//!     │  .rebind(graph)      arena reset
//!     ▼
//! Runner<Constructed>
//! ```
//!
//! `setup` does all the work that may fail for lack of memory or an
//! unusable model: it resolves every operator's kernel, lets each kernel
//! check its tensors, asks the planner for tensor offsets, and sizes the
//! whole arena in a dry run before reserving a single byte. Each kernel's
//! `setup` runs exactly once, writing into its persistent block. After
//! that an iteration touches only arena bytes.

use crate::kernels::KernelIo;
use crate::profiler::{Profiler, TickSource};
use crate::{OpRegistry, RuntimeError};
use arena_planner::{ArenaPlan, MemoryPlanner, PlannerKind};
use memory_manager::{required_bytes, Arena, ArenaRegion, ArenaStats};
use model_ir::graph::Validated;
use model_ir::{ModelGraph, OperatorDescriptor, TensorDef};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::marker::PhantomData;
use tensor_core::{DType, TensorView, TensorViewMut};

// ── Type-state markers ─────────────────────────────────────────

/// Graph, registry and arena are bound; nothing is reserved yet.
#[derive(Debug)]
pub struct Constructed;

/// The arena is laid out and sealed; iterations may run.
#[derive(Debug)]
pub struct Ready;

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Constructed {}
    impl Sealed for super::Ready {}
}

/// Marker trait for runner states.
pub trait RunnerState: sealed::Sealed + std::fmt::Debug {}
impl RunnerState for Constructed {}
impl RunnerState for Ready {}

/// Half-open range of random float inputs.
const F32_INPUT_RANGE: std::ops::Range<f32> = -8.0..8.0;

/// Where one operator's data lives, fixed at setup.
#[derive(Debug, Clone, Copy, Default)]
struct OpBinding {
    /// Empty for kernels without persistent data.
    persistent: ArenaRegion,
    scratch_bytes: usize,
}

#[derive(Debug, Default)]
struct Layout {
    plan: ArenaPlan,
    /// Absolute arena region of every tensor; empty for unused tensors.
    tensors: Vec<ArenaRegion>,
    scratch: ArenaRegion,
    ops: Vec<OpBinding>,
}

/// Byte totals from the last successful setup.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SetupReport {
    pub model: String,
    pub planner: String,
    pub num_operators: usize,
    pub tensor_bytes: usize,
    pub unshared_tensor_bytes: usize,
    pub scratch_bytes: usize,
    pub persistent_bytes: usize,
    pub arena_used_bytes: usize,
    pub arena_capacity_bytes: usize,
}

impl std::fmt::Display for SetupReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "'{}' ({} ops, {} planner): tensors {} B ({} B unshared), scratch {} B, \
             persistent {} B, arena {} / {} B",
            self.model,
            self.num_operators,
            self.planner,
            self.tensor_bytes,
            self.unshared_tensor_bytes,
            self.scratch_bytes,
            self.persistent_bytes,
            self.arena_used_bytes,
            self.arena_capacity_bytes,
        )
    }
}

/// Executes a validated model inside a static arena.
///
/// # Example
/// ```
/// use memory_manager::ArenaBuffer;
/// use model_ir::ModelLoader;
/// use runtime::{OpRegistry, Profiler, Runner};
///
/// let graph = ModelLoader::from_json(r#"{
///     "name": "tiny",
///     "tensors": [
///         {"name": "x", "dtype": "f32", "shape": [1, 8]},
///         {"name": "y", "dtype": "f32", "shape": [1, 8]}
///     ],
///     "operators": [{"name": "act", "op": "TANH", "inputs": ["x"], "output": "y"}],
///     "inputs": ["x"],
///     "outputs": ["y"]
/// }"#).unwrap();
///
/// let mut registry = OpRegistry::new(1);
/// registry.add_tanh().unwrap();
/// let mut storage = ArenaBuffer::new(2048);
///
/// let mut runner = Runner::new(graph, registry, storage.arena()).setup().unwrap();
/// let mut profiler = Profiler::new();
/// runner.set_random_input(0).unwrap();
/// runner.run_single_iteration(&mut profiler).unwrap();
/// assert_eq!(profiler.events().len(), 1);
/// ```
pub struct Runner<'a, S: RunnerState = Constructed> {
    graph: ModelGraph<Validated>,
    registry: OpRegistry,
    arena: Arena<'a>,
    planner: Box<dyn MemoryPlanner>,
    layout: Layout,
    _state: PhantomData<S>,
}

fn op_tensors<'g>(
    graph: &'g ModelGraph<Validated>,
    op: &OperatorDescriptor,
) -> Result<(usize, &'g TensorDef, &'g TensorDef), RuntimeError> {
    let input_index = op.primary_input().ok_or(RuntimeError::NoSuchTensor {
        role: "operator input",
        index: 0,
    })?;
    let input = graph.tensor(input_index).ok_or(RuntimeError::NoSuchTensor {
        role: "tensor",
        index: input_index,
    })?;
    let output = graph.tensor(op.output).ok_or(RuntimeError::NoSuchTensor {
        role: "tensor",
        index: op.output,
    })?;
    Ok((input_index, input, output))
}

impl<'a, S: RunnerState> Runner<'a, S> {
    pub fn graph(&self) -> &ModelGraph<Validated> {
        &self.graph
    }

    pub fn registry(&self) -> &OpRegistry {
        &self.registry
    }

    pub fn planner_name(&self) -> &str {
        self.planner.name()
    }

    pub fn arena_stats(&self) -> &ArenaStats {
        self.arena.stats()
    }

    fn into_state<T: RunnerState>(self, layout: Layout) -> Runner<'a, T> {
        Runner {
            graph: self.graph,
            registry: self.registry,
            arena: self.arena,
            planner: self.planner,
            layout,
            _state: PhantomData,
        }
    }
}

// ── Constructed → Ready ────────────────────────────────────────

impl<'a> Runner<'a, Constructed> {
    /// Binds a model, its kernels and the arena storage. Uses the greedy
    /// planner unless told otherwise.
    pub fn new(graph: ModelGraph<Validated>, registry: OpRegistry, arena: Arena<'a>) -> Self {
        tracing::debug!(
            "runner created for '{}' with {} kernels, {} byte arena",
            graph.name,
            registry.len(),
            arena.capacity()
        );
        Self {
            graph,
            registry,
            arena,
            planner: PlannerKind::default().build(),
            layout: Layout::default(),
            _state: PhantomData,
        }
    }

    pub fn with_planner(mut self, planner: Box<dyn MemoryPlanner>) -> Self {
        self.planner = planner;
        self
    }

    pub fn with_planner_kind(self, kind: PlannerKind) -> Self {
        self.with_planner(kind.build())
    }

    /// Resolves kernels, sizes and lays out the arena, runs every kernel's
    /// setup once, and seals the arena.
    ///
    /// # Errors
    /// - [`RuntimeError::UnsupportedOperator`] if an op kind has no kernel.
    /// - [`RuntimeError::KernelSetup`] if a kernel rejects its tensors.
    /// - [`RuntimeError::ArenaTooSmall`] if the dry run does not fit; the
    ///   arena is left untouched in that case.
    pub fn setup(mut self) -> Result<Runner<'a, Ready>, RuntimeError> {
        let num_ops = self.graph.num_operators();
        let mut scratch_per_op = Vec::with_capacity(num_ops);
        let mut persistent_per_op = Vec::with_capacity(num_ops);

        // Pass 1: resolve kernels and collect sizes.
        for (op_index, op) in self.graph.iter_operators().enumerate() {
            let kernel =
                self.registry
                    .get(op.kind)
                    .ok_or_else(|| RuntimeError::UnsupportedOperator {
                        op_index,
                        name: op.name.clone(),
                        kind: op.kind,
                    })?;
            let (_, input, output) = op_tensors(&self.graph, op)?;
            let scratch = kernel
                .check_shapes(input, output)
                .map_err(|source| RuntimeError::KernelSetup {
                    op_index,
                    kind: op.kind,
                    source,
                })?;
            scratch_per_op.push(scratch);
            persistent_per_op.push(kernel.persistent_bytes(input, output));
        }

        let plan = self.planner.plan(&self.graph)?;
        plan.validate()?;
        tracing::debug!("{}", plan.summary());

        // Scratch is shared, so only the largest request counts.
        let scratch_bytes = scratch_per_op.iter().copied().max().unwrap_or(0);
        let required = required_bytes(
            plan.total_bytes,
            scratch_bytes,
            persistent_per_op.iter().copied().filter(|&b| b > 0),
        );
        if required > self.arena.available() {
            return Err(RuntimeError::ArenaTooSmall {
                required_bytes: required,
                available_bytes: self.arena.available(),
            });
        }

        // Pass 2: reserve for real. The dry run guarantees these succeed.
        let tensor_region = self.arena.reserve_tensor_region(plan.total_bytes)?;
        self.arena.bytes_mut(tensor_region)?.fill(0);
        let scratch = self.arena.reserve_scratch(scratch_bytes)?;

        let mut ops = Vec::with_capacity(num_ops);
        for (op_index, op) in self.graph.iter_operators().enumerate() {
            let kernel =
                self.registry
                    .get(op.kind)
                    .ok_or_else(|| RuntimeError::UnsupportedOperator {
                        op_index,
                        name: op.name.clone(),
                        kind: op.kind,
                    })?;
            let (_, input, output) = op_tensors(&self.graph, op)?;
            let persistent = match persistent_per_op[op_index] {
                0 => ArenaRegion::default(),
                bytes => self.arena.allocate_persistent(bytes)?,
            };
            let block = self.arena.bytes_mut(persistent)?;
            kernel
                .setup(op, input, output, block)
                .map_err(|source| RuntimeError::KernelSetup {
                    op_index,
                    kind: op.kind,
                    source,
                })?;
            ops.push(OpBinding {
                persistent,
                scratch_bytes: scratch_per_op[op_index],
            });
        }

        let tensors = (0..self.graph.num_tensors())
            .map(|idx| {
                plan.allocation(idx)
                    .map(|a| tensor_region.slice(a.offset, a.size_bytes))
                    .unwrap_or_default()
            })
            .collect();

        self.arena.seal();
        tracing::info!(
            "'{}' bound: {} ops, tensors {} B, scratch {} B, persistent {} B of {} B",
            self.graph.name,
            num_ops,
            tensor_region.len,
            scratch.len,
            self.arena.stats().persistent_bytes,
            self.arena.capacity(),
        );

        let layout = Layout {
            plan,
            tensors,
            scratch,
            ops,
        };
        Ok(self.into_state(layout))
    }
}

// ── Ready ──────────────────────────────────────────────────────

impl<'a> Runner<'a, Ready> {
    /// Runs every operator once, in graph order, with one profiler event
    /// per operator labelled by its kind.
    ///
    /// A kernel failure aborts the iteration. Tensors written by earlier
    /// operators keep their new contents.
    pub fn run_single_iteration<C: TickSource>(
        &mut self,
        profiler: &mut Profiler<C>,
    ) -> Result<(), RuntimeError> {
        for (op_index, op) in self.graph.iter_operators().enumerate() {
            let binding = self.layout.ops[op_index];
            let kernel =
                self.registry
                    .get(op.kind)
                    .ok_or_else(|| RuntimeError::UnsupportedOperator {
                        op_index,
                        name: op.name.clone(),
                        kind: op.kind,
                    })?;
            let (input_index, in_def, out_def) = op_tensors(&self.graph, op)?;

            let regions = [
                self.layout.tensors[input_index],
                self.layout.tensors[op.output],
                binding.persistent,
                self.layout.scratch.slice(0, binding.scratch_bytes),
            ];
            let [input, output, persistent, scratch] = self.arena.split_mut(regions)?;
            let io = KernelIo {
                input: TensorView::new(&in_def.shape, in_def.dtype, input)?
                    .with_quant(in_def.quantization),
                output: TensorViewMut::new(&out_def.shape, out_def.dtype, output)?
                    .with_quant(out_def.quantization),
                persistent: &*persistent,
                scratch,
            };

            let event = profiler.begin_event(op.kind.as_str());
            let result = kernel.compute(op, io);
            profiler.end_event(event);
            result.map_err(|source| RuntimeError::Kernel {
                op_index,
                kind: op.kind,
                source,
            })?;

            self.arena.note_scratch_use(binding.scratch_bytes)?;
            tracing::trace!("op {op_index} '{}' done", op.name);
        }
        Ok(())
    }

    /// Fills every graph input from a generator seeded with `seed`.
    ///
    /// Floats are uniform in `[-8, 8)`; integer tensors cover their full
    /// range. The same seed always yields the same bytes.
    pub fn set_random_input(&mut self, seed: u64) -> Result<(), RuntimeError> {
        let mut rng = StdRng::seed_from_u64(seed);
        for &idx in &self.graph.inputs {
            let dtype = self.graph.tensors[idx].dtype;
            let bytes = self.arena.bytes_mut(self.layout.tensors[idx])?;
            match dtype {
                DType::F32 => {
                    for chunk in bytes.chunks_exact_mut(4) {
                        let value: f32 = rng.gen_range(F32_INPUT_RANGE);
                        chunk.copy_from_slice(&value.to_ne_bytes());
                    }
                }
                DType::I8 | DType::U8 | DType::I16 | DType::I32 => rng.fill(bytes),
            }
        }
        Ok(())
    }

    /// Writable view of graph input `index`.
    pub fn input_mut(&mut self, index: usize) -> Result<TensorViewMut<'_>, RuntimeError> {
        let tensor = *self.graph.inputs.get(index).ok_or(RuntimeError::NoSuchTensor {
            role: "input",
            index,
        })?;
        let def = &self.graph.tensors[tensor];
        let bytes = self.arena.bytes_mut(self.layout.tensors[tensor])?;
        Ok(TensorViewMut::new(&def.shape, def.dtype, bytes)?.with_quant(def.quantization))
    }

    /// Read-only view of graph output `index`.
    pub fn output(&self, index: usize) -> Result<TensorView<'_>, RuntimeError> {
        let tensor = *self.graph.outputs.get(index).ok_or(RuntimeError::NoSuchTensor {
            role: "output",
            index,
        })?;
        let def = &self.graph.tensors[tensor];
        let bytes = self.arena.bytes(self.layout.tensors[tensor])?;
        Ok(TensorView::new(&def.shape, def.dtype, bytes)?.with_quant(def.quantization))
    }

    pub fn plan(&self) -> &ArenaPlan {
        &self.layout.plan
    }

    pub fn setup_report(&self) -> SetupReport {
        let stats = self.arena.stats();
        SetupReport {
            model: self.graph.name.clone(),
            planner: self.layout.plan.planner_name.clone(),
            num_operators: self.graph.num_operators(),
            tensor_bytes: stats.tensor_bytes,
            unshared_tensor_bytes: self.layout.plan.unshared_bytes(),
            scratch_bytes: stats.scratch_reserved_bytes,
            persistent_bytes: stats.persistent_bytes,
            arena_used_bytes: stats.used_bytes(),
            arena_capacity_bytes: stats.capacity_bytes,
        }
    }

    /// Resets the arena and binds a new model to the same registry.
    pub fn rebind(mut self, graph: ModelGraph<Validated>) -> Runner<'a, Constructed> {
        tracing::info!("rebinding arena from '{}' to '{}'", self.graph.name, graph.name);
        self.arena.reset();
        self.graph = graph;
        self.into_state(Layout::default())
    }
}

impl<S: RunnerState> std::fmt::Debug for Runner<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("model", &self.graph.name)
            .field("planner", &self.planner.name())
            .field("arena", &self.arena)
            .field("state", &std::any::type_name::<S>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualClock;
    use memory_manager::ArenaBuffer;
    use model_ir::{OpKind, TensorDef};
    use tensor_core::{QuantParams, Shape};

    fn chain(kinds: &[OpKind], dtype: DType, width: usize) -> ModelGraph<Validated> {
        let quant = match dtype {
            DType::F32 => None,
            DType::I16 => Some(QuantParams::symmetric(1.0 / 4096.0)),
            _ => Some(QuantParams::new(0.1, 0)),
        };
        let tensors = (0..=kinds.len())
            .map(|i| TensorDef {
                name: format!("t{i}"),
                dtype,
                shape: Shape::matrix(1, width),
                quantization: quant,
            })
            .collect();
        let ops = kinds
            .iter()
            .enumerate()
            .map(|(i, k)| OperatorDescriptor::new(format!("op{i}"), *k, vec![i], i + 1))
            .collect();
        ModelGraph::new("chain".into(), tensors, ops, vec![0], vec![kinds.len()])
            .validate()
            .unwrap()
    }

    #[test]
    fn test_setup_layout() {
        let graph = chain(&[OpKind::Tanh, OpKind::Logistic], DType::F32, 16);
        let mut storage = ArenaBuffer::new(4096);
        let runner = Runner::new(graph, OpRegistry::with_builtins(), storage.arena())
            .setup()
            .unwrap();
        let report = runner.setup_report();
        assert_eq!(report.num_operators, 2);
        assert_eq!(report.planner, "greedy");
        assert_eq!(report.scratch_bytes, 0);
        // Two activation blocks of 264 bytes, padded to 272.
        assert_eq!(report.persistent_bytes, 2 * 272);
        assert!(report.arena_used_bytes <= report.arena_capacity_bytes);
        assert_eq!(runner.plan().num_allocations(), 3);
    }

    #[test]
    fn test_planned_regions_are_disjoint_when_live_together() {
        let graph = chain(&[OpKind::Tanh, OpKind::Tanh, OpKind::Tanh], DType::F32, 8);
        let mut storage = ArenaBuffer::new(4096);
        let runner = Runner::new(graph, OpRegistry::with_builtins(), storage.arena())
            .setup()
            .unwrap();
        let regions = &runner.layout.tensors;
        for op in &runner.graph.operators {
            assert!(!regions[op.inputs[0]].overlaps(&regions[op.output]));
        }
    }

    #[test]
    fn test_output_reflects_computation() {
        let graph = chain(&[OpKind::Tanh], DType::F32, 4);
        let mut storage = ArenaBuffer::new(2048);
        let mut runner = Runner::new(graph, OpRegistry::with_builtins(), storage.arena())
            .setup()
            .unwrap();
        runner
            .input_mut(0)
            .unwrap()
            .as_f32_mut()
            .unwrap()
            .copy_from_slice(&[-1.0, 0.0, 0.5, 3.0]);
        let mut profiler = Profiler::with_clock(ManualClock::new(1));
        runner.run_single_iteration(&mut profiler).unwrap();
        let out = runner.output(0).unwrap().as_f32().unwrap().to_vec();
        for (o, x) in out.iter().zip([-1.0f32, 0.0, 0.5, 3.0]) {
            assert!((o - x.tanh()).abs() < 1e-5);
        }
        assert_eq!(profiler.events()[0].label, "TANH");
    }

    #[test]
    fn test_bad_io_index() {
        let graph = chain(&[OpKind::Tanh], DType::F32, 4);
        let mut storage = ArenaBuffer::new(2048);
        let mut runner = Runner::new(graph, OpRegistry::with_builtins(), storage.arena())
            .setup()
            .unwrap();
        assert!(matches!(
            runner.input_mut(1),
            Err(RuntimeError::NoSuchTensor { role: "input", index: 1 })
        ));
        assert!(matches!(
            runner.output(3),
            Err(RuntimeError::NoSuchTensor { role: "output", index: 3 })
        ));
    }

    #[test]
    fn test_random_input_f32_range() {
        let graph = chain(&[OpKind::Logistic], DType::F32, 64);
        let mut storage = ArenaBuffer::new(4096);
        let mut runner = Runner::new(graph, OpRegistry::with_builtins(), storage.arena())
            .setup()
            .unwrap();
        runner.set_random_input(11).unwrap();
        let values = runner.input_mut(0).unwrap().as_f32_mut().unwrap().to_vec();
        assert!(values.iter().all(|v| (-8.0..8.0).contains(v)));
        assert!(values.iter().any(|v| *v != values[0]));
    }

    #[test]
    fn test_linear_planner_uses_more_tensor_bytes() {
        let kinds = [OpKind::Tanh, OpKind::Tanh, OpKind::Tanh, OpKind::Tanh];
        let mut storage = ArenaBuffer::new(8192);
        let greedy = Runner::new(chain(&kinds, DType::F32, 32), OpRegistry::with_builtins(), storage.arena())
            .setup()
            .unwrap()
            .setup_report();
        let linear = Runner::new(chain(&kinds, DType::F32, 32), OpRegistry::with_builtins(), storage.arena())
            .with_planner_kind(PlannerKind::Linear)
            .setup()
            .unwrap()
            .setup_report();
        assert_eq!(linear.tensor_bytes, 5 * 128);
        assert!(greedy.tensor_bytes < linear.tensor_bytes);
    }

    #[test]
    fn test_kernel_setup_error_names_op() {
        // uint8 tanh without input quantization cannot build its table.
        let mut graph = chain(&[OpKind::Tanh, OpKind::Tanh], DType::U8, 4);
        graph.tensors[1].quantization = None;
        let mut storage = ArenaBuffer::new(4096);
        let err = Runner::new(graph, OpRegistry::with_builtins(), storage.arena())
            .setup()
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::KernelSetup { op_index: 1, kind: OpKind::Tanh, .. }
        ));
    }
}
