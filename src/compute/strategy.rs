//! strategy.rs
//! Applies a strategy's solution parts to a working copy of the baseline graph.
//!
//! Per part: evaluate the formula, resolve implementation and affected flows,
//! optionally redirect implementation flows to a picked actor, drive the change
//! through the propagation engine, and accumulate it in the ledger. Nothing is
//! persisted or committed until every part has succeeded.

use super::delta::{AmountDelta, DeltaSink};
use super::formula::Formula;
use super::ledger::{BakedChanges, ChangeLedger};
use super::propagation::{ChangePropagationEngine, Direction, FlowView, Traversal};
use crate::config::EngineConfig;
use crate::error::{FlowGraphError, Result};
use crate::graph::{ActorId, ActorNode, EdgeIndex, FlowEdge, FlowGraph};
use crate::solution::{
    select_flows, AreaFilter, SolutionInStrategy, SolutionPart, SpatialApplication, Strategy, StrategyId,
};
use crate::source::{KeyflowId, MaterialHierarchy, SpatialActorResolver};
use crate::store::{GraphStore, SnapshotKey};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Derived graph and the deltas describing it relative to the baseline.
#[derive(Debug, Clone)]
pub struct StrategyOutcome {
    pub graph: FlowGraph,
    pub deltas: Vec<AmountDelta>,
}

pub struct StrategyGraphEngine<'a> {
    store: &'a dyn GraphStore,
    materials: &'a dyn MaterialHierarchy,
    spatial: Option<&'a dyn SpatialActorResolver>,
    traversal: Box<dyn Traversal + 'a>,
    tolerance: f64,
    first_direction: Direction,
}

/// Edge driving one propagation, with the change applied to it directly.
#[derive(Debug, Clone, Copy)]
struct Driver {
    edge: EdgeIndex,
    change: f64,
}

impl<'a> StrategyGraphEngine<'a> {
    pub fn new(store: &'a dyn GraphStore, materials: &'a dyn MaterialHierarchy, config: &EngineConfig) -> Self {
        Self {
            store,
            materials,
            spatial: None,
            traversal: Box::new(ChangePropagationEngine::new()),
            tolerance: config.tolerance,
            first_direction: config.first_direction,
        }
    }

    pub fn with_spatial(mut self, spatial: &'a dyn SpatialActorResolver) -> Self {
        self.spatial = Some(spatial);
        self
    }

    pub fn with_traversal(mut self, traversal: Box<dyn Traversal + 'a>) -> Self {
        self.traversal = traversal;
        self
    }

    /// Computes and persists the strategy graph. Fails with `NotFound` when the
    /// baseline is missing; on any error the stored strategy snapshot is untouched.
    pub fn build(&self, strategy: &Strategy) -> Result<StrategyOutcome> {
        let tag = strategy.tag.as_deref();
        let mut graph = self.store.load(&SnapshotKey::base(strategy.keyflow, tag))?;
        info!(
            strategy_id = strategy.id,
            keyflow = strategy.keyflow,
            edges = graph.edge_count(),
            "building strategy graph"
        );

        let mut ledger = ChangeLedger::new(graph.edge_count());
        for solution in strategy.ordered_solutions() {
            let area = self.area_actors(strategy.keyflow, solution)?;
            for part in solution.ordered_parts() {
                self.apply_part(&mut graph, &mut ledger, solution, part, area.as_ref())
                    .map_err(|e| e.in_part(part.id))?;
            }
        }

        let baked = ledger.bake(&mut graph, self.tolerance)?;
        let deltas = collect_deltas(&graph, &baked, strategy.id);
        self.store.save(&SnapshotKey::strategy(strategy.keyflow, tag, strategy.id), &graph)?;

        info!(strategy_id = strategy.id, deltas = deltas.len(), "strategy graph stored");
        Ok(StrategyOutcome { graph, deltas })
    }

    /// `build`, then replaces the strategy's committed deltas in `sink`.
    pub fn build_and_commit(&self, strategy: &Strategy, sink: &mut dyn DeltaSink) -> Result<StrategyOutcome> {
        let outcome = self.build(strategy)?;
        sink.replace_strategy_deltas(strategy.id, &outcome.deltas)?;
        Ok(outcome)
    }

    fn area_actors(&self, keyflow: KeyflowId, solution: &SolutionInStrategy) -> Result<Option<BTreeSet<ActorId>>> {
        let Some(area) = solution.implementation_area else {
            return Ok(None);
        };
        let spatial_parts = solution
            .solution
            .parts
            .iter()
            .any(|p| p.spatial_application != SpatialApplication::None);
        if !spatial_parts {
            return Ok(None);
        }
        let resolver = self.spatial.ok_or_else(|| {
            FlowGraphError::Config(format!(
                "solution {} has implementation area {} but no spatial resolver is configured",
                solution.solution.id, area
            ))
        })?;
        resolver.actors_in_area(keyflow, area).map(Some)
    }

    fn apply_part(
        &self,
        graph: &mut FlowGraph,
        ledger: &mut ChangeLedger,
        solution: &SolutionInStrategy,
        part: &SolutionPart,
        area: Option<&BTreeSet<ActorId>>,
    ) -> Result<()> {
        let quantity = part.question.and_then(|q| solution.quantity_for(q)).unwrap_or(0.0);
        let formula = Formula { a: part.a, b: part.b, quantity, is_absolute: part.is_absolute };

        let area_filter = area
            .filter(|_| part.spatial_application != SpatialApplication::None)
            .map(|actors| AreaFilter { actors, side: part.spatial_application });
        let implementation = select_flows(graph, &part.implementation, self.materials, area_filter);
        let affected: BTreeSet<EdgeIndex> = part
            .affected_flows
            .iter()
            .flat_map(|r| select_flows(graph, r, self.materials, None))
            .collect();

        if implementation.is_empty() {
            debug!(part_id = part.id, "no implementation flows matched, part skipped");
            return Ok(());
        }

        let amounts = ledger.effective_amounts(graph);
        let reference: f64 = implementation.iter().map(|e| amounts[e.index()]).sum();
        let factor = if part.implements_new_flow {
            formula.shift_fraction(reference)?
        } else {
            formula.factor(reference)?
        };
        debug!(part_id = part.id, quantity, reference, factor, flows = implementation.len(), "applying part");

        let mut created = Vec::new();
        let drivers: Vec<Driver> = if part.implements_new_flow {
            let Some(actor) = solution.picked_actor(part.id) else {
                warn!(part_id = part.id, "no target actor picked for new-flow part, part skipped");
                return Ok(());
            };
            let target = graph.ensure_actor(ActorNode::from(actor));

            let mut drivers = Vec::with_capacity(implementation.len() * 2);
            for &edge in &implementation {
                let (source, destination) = graph.endpoints(edge);
                let (from, to) = if part.keep_origin { (source, target) } else { (target, destination) };
                let template = graph.flow(edge);
                let flow = FlowEdge::new(graph.next_flow_id(), template.material, template.process(), 0.0);
                let new_edge = graph.add_flow(from, to, flow)?;
                ledger.ensure_capacity(graph.edge_count());
                ledger.mark_changed(new_edge);
                created.push(new_edge);

                let shifted = amounts[edge.index()] * factor;
                drivers.push(Driver { edge, change: -shifted });
                drivers.push(Driver { edge: new_edge, change: shifted });
            }
            drivers
        } else {
            implementation
                .iter()
                .map(|&edge| -> Result<Driver> {
                    let change = formula.delta(amounts[edge.index()], reference)?;
                    Ok(Driver { edge, change })
                })
                .collect::<Result<_>>()?
        };

        ledger.reset_include();
        ledger.set_include(affected.iter().copied(), true);
        ledger.set_include(implementation.iter().copied(), false);
        ledger.set_include(created.iter().copied(), false);

        let propagated = {
            let amounts = ledger.effective_amounts(graph);
            let view = FlowView::new(graph, ledger.include_mask(), &amounts);
            let mut sum = vec![0.0; graph.edge_count()];
            for driver in drivers.iter().filter(|d| d.change != 0.0) {
                let changes = self.traversal.propagate(&view, driver.edge, driver.change, self.first_direction);
                for (edge, change) in changes.iter_nonzero() {
                    sum[edge.index()] += change;
                }
            }
            sum
        };

        for driver in &drivers {
            ledger.add_change(driver.edge, driver.change);
        }
        for (i, change) in propagated.into_iter().enumerate() {
            if change != 0.0 {
                ledger.add_change(EdgeIndex::new(i), change);
            }
        }

        self.check_non_negative(graph, ledger)
    }

    fn check_non_negative(&self, graph: &FlowGraph, ledger: &ChangeLedger) -> Result<()> {
        for edge in graph.edge_indices() {
            let amount = graph.amount(edge) + ledger.change(edge);
            if amount < -self.tolerance {
                return Err(FlowGraphError::invalid_flow(
                    graph.flow(edge).flow_id,
                    format!("amount would become {}", amount),
                ));
            }
        }
        Ok(())
    }
}

fn collect_deltas(graph: &FlowGraph, baked: &BakedChanges, strategy_id: StrategyId) -> Vec<AmountDelta> {
    baked
        .changed
        .iter()
        .map(|&edge| {
            let flow = graph.flow(edge);
            if baked.is_created(edge) {
                let (source, target) = graph.endpoints(edge);
                AmountDelta::NewFlow {
                    flow_id: flow.flow_id,
                    strategy_id,
                    origin: graph.actor(source).actor_id,
                    destination: graph.actor(target).actor_id,
                    material: flow.material,
                    process: flow.process(),
                    amount: flow.amount,
                }
            } else {
                AmountDelta::Override {
                    base_flow_id: flow.flow_id,
                    strategy_id,
                    amount: flow.amount,
                    material: flow.material,
                }
            }
        })
        .collect()
}
