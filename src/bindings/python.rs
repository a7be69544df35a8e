use crate::compute::{ChangePropagationEngine, Direction, FlowView, StrategyGraphEngine, Traversal};
use crate::config::EngineConfig;
use crate::error::FlowGraphError;
use crate::graph::{validate, ActorId, FlowGraph, FlowGraphBuilder, FlowId};
use crate::solution::Strategy;
use crate::source::{AreaId, InMemoryFlowSource, KeyflowId, MaterialRow, MaterialTree, StaticAreaResolver};
use crate::store::{GraphStore, SnapshotKey};
use crate::telemetry;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;

impl From<FlowGraphError> for PyErr {
    fn from(err: FlowGraphError) -> PyErr {
        match err {
            FlowGraphError::NotFound(_)
            | FlowGraphError::Config(_)
            | FlowGraphError::Serialization(_)
            | FlowGraphError::InvalidState { .. } => PyValueError::new_err(err.to_string()),
            _ => PyRuntimeError::new_err(err.to_string()),
        }
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(what: &str, json: &str) -> PyResult<T> {
    serde_json::from_str(json).map_err(|e| PyValueError::new_err(format!("invalid {}: {}", what, e)))
}

/// Config file (or defaults) plus `FLOWGRAPH_*` overrides; an explicit `root` wins.
fn engine_config(root: Option<String>, config_path: Option<String>) -> PyResult<EngineConfig> {
    let mut config = EngineConfig::from_sources(config_path.as_deref().map(Path::new))?;
    if let Some(root) = root {
        config.graph_root = root.into();
    }
    Ok(config)
}

fn snapshot_key(keyflow: KeyflowId, tag: Option<&str>, strategy: Option<i64>) -> SnapshotKey {
    match strategy {
        Some(s) => SnapshotKey::strategy(keyflow, tag, s),
        None => SnapshotKey::base(keyflow, tag),
    }
}

fn parse_direction(direction: &str) -> PyResult<Direction> {
    match direction {
        "upstream" => Ok(Direction::Upstream),
        "downstream" => Ok(Direction::Downstream),
        other => Err(PyValueError::new_err(format!("unknown direction '{}'", other))),
    }
}

#[pyclass(name = "_FlowGraph")]
#[derive(Debug, Clone, Default)]
pub struct PyFlowGraph {
    pub inner: FlowGraph,
}

#[pymethods]
impl PyFlowGraph {
    /// Loads the baseline, or the strategy snapshot when `strategy` is given.
    #[staticmethod]
    #[pyo3(signature = (keyflow, tag=None, strategy=None, root=None, config_path=None))]
    pub fn load(
        keyflow: KeyflowId,
        tag: Option<String>,
        strategy: Option<i64>,
        root: Option<String>,
        config_path: Option<String>,
    ) -> PyResult<Self> {
        let store = engine_config(root, config_path)?.file_store();
        Ok(Self { inner: store.load(&snapshot_key(keyflow, tag.as_deref(), strategy))? })
    }

    pub fn node_count(&self) -> usize { self.inner.node_count() }
    pub fn edge_count(&self) -> usize { self.inner.edge_count() }

    pub fn amount(&self, flow_id: FlowId) -> Option<f64> {
        self.inner.edge_of(flow_id).map(|e| self.inner.amount(e))
    }

    /// Flow rows as JSON, keyed by actor ids.
    pub fn flows_json(&self) -> PyResult<String> {
        Ok(serde_json::to_string(&self.inner.flow_summaries()).map_err(FlowGraphError::from)?)
    }

    pub fn validate(&self) -> String {
        validate(&self.inner).to_string()
    }

    /// Change per flow id when `magnitude` is injected on `flow_id`, every edge visible.
    #[pyo3(signature = (flow_id, magnitude, direction="upstream"))]
    pub fn propagate(&self, flow_id: FlowId, magnitude: f64, direction: &str) -> PyResult<BTreeMap<FlowId, f64>> {
        let first = parse_direction(direction)?;
        let view = FlowView::all(&self.inner);
        let changes = ChangePropagationEngine::new().propagate_flow(&view, flow_id, magnitude, first);
        Ok(changes.by_flow(&self.inner))
    }
}

/// Installs the log subscriber with `filter`, or the configured `log_filter`.
#[pyfunction]
#[pyo3(signature = (filter=None, config_path=None))]
pub fn init_logging(filter: Option<&str>, config_path: Option<String>) -> PyResult<bool> {
    match filter {
        Some(filter) => Ok(telemetry::init_tracing(filter)),
        None => Ok(telemetry::init_from_config(&engine_config(None, config_path)?)),
    }
}

/// Builds and stores the baseline of `keyflow` from JSON flow and actor records.
#[pyfunction]
#[pyo3(signature = (keyflow, source_json, tag=None, root=None, config_path=None))]
pub fn build_base_graph(
    keyflow: KeyflowId,
    source_json: &str,
    tag: Option<String>,
    root: Option<String>,
    config_path: Option<String>,
) -> PyResult<PyFlowGraph> {
    let source: InMemoryFlowSource = parse_json("flow records", source_json)?;
    let store = engine_config(root, config_path)?.file_store();
    let inner = FlowGraphBuilder::new(&source, &store).build(keyflow, tag.as_deref())?;
    Ok(PyFlowGraph { inner })
}

/// Builds a strategy graph and returns its deltas as JSON.
///
/// `areas_json` maps implementation area ids to the actor ids located inside.
#[pyfunction]
#[pyo3(signature = (strategy_json, materials_json, areas_json=None, root=None, config_path=None))]
pub fn build_strategy(
    strategy_json: &str,
    materials_json: &str,
    areas_json: Option<&str>,
    root: Option<String>,
    config_path: Option<String>,
) -> PyResult<String> {
    let strategy: Strategy = parse_json("strategy", strategy_json)?;
    let rows: Vec<MaterialRow> = parse_json("materials", materials_json)?;
    let config = engine_config(root, config_path)?;

    let store = config.file_store();
    let materials = MaterialTree::from_rows(rows);
    let areas = match areas_json {
        Some(json) => {
            let table: BTreeMap<AreaId, Vec<ActorId>> = parse_json("areas", json)?;
            Some(table.into_iter().fold(StaticAreaResolver::new(), |r, (area, actors)| r.with_area(area, actors)))
        }
        None => None,
    };

    let mut engine = StrategyGraphEngine::new(&store, &materials, &config);
    if let Some(areas) = areas.as_ref() {
        engine = engine.with_spatial(areas);
    }
    let outcome = engine.build(&strategy)?;
    Ok(serde_json::to_string(&outcome.deltas).map_err(FlowGraphError::from)?)
}

/// Snapshot modification time as an RFC 3339 string, `None` when absent.
#[pyfunction]
#[pyo3(signature = (keyflow, tag=None, strategy=None, root=None, config_path=None))]
pub fn snapshot_modified(
    keyflow: KeyflowId,
    tag: Option<String>,
    strategy: Option<i64>,
    root: Option<String>,
    config_path: Option<String>,
) -> PyResult<Option<String>> {
    let store = engine_config(root, config_path)?.file_store();
    let modified = store.last_modified(&snapshot_key(keyflow, tag.as_deref(), strategy))?;
    Ok(modified.map(|t| t.to_rfc3339()))
}

pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyFlowGraph>()?;
    m.add_function(wrap_pyfunction!(init_logging, m)?)?;
    m.add_function(wrap_pyfunction!(build_base_graph, m)?)?;
    m.add_function(wrap_pyfunction!(build_strategy, m)?)?;
    m.add_function(wrap_pyfunction!(snapshot_modified, m)?)?;
    Ok(())
}
