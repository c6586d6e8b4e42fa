//! The process-wide step graph cache.
//!
//! Loading a step graph (from file or by building it) is expensive and must happen at most
//! once per chart type per process.  The cache is a map from [`ChartType`] to a per-key slot;
//! the outer lock is only ever held long enough to fetch a slot, so concurrent requests for
//! *different* types load in parallel while requests for the *same* type wait on one loader.
//! After population, readers just clone an [`Arc`] out of the slot.

use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex, OnceLock},
};

use padframe::PadData;

use crate::{chart::ChartType, graph::StepGraph, search::Config, Error, Result};

type Slot = Arc<Mutex<Option<Arc<StepGraph>>>>;

static CACHE: OnceLock<Mutex<HashMap<ChartType, Slot>>> = OnceLock::new();

/// Fetches the step graph for `chart_type`, loading it on first use.
///
/// When `graph_file` is given the precomputed `.fsg` file is used; otherwise the graph is
/// built from `pad` directly (much slower).  A failed load leaves the slot empty, so a later
/// call can retry.
pub fn step_graph(
    chart_type: ChartType,
    pad: &Arc<PadData>,
    graph_file: Option<&Path>,
    config: &Config,
) -> Result<Arc<StepGraph>> {
    let slot = {
        let mut map = CACHE
            .get_or_init(|| Mutex::new(HashMap::new()))
            .lock()
            .expect("step graph cache poisoned");
        map.entry(chart_type).or_default().clone()
    };

    let mut guard = slot.lock().expect("step graph slot poisoned");
    if let Some(graph) = guard.as_ref() {
        return Ok(graph.clone());
    }

    if pad.chart_type_tag() != chart_type.as_str() {
        return Err(Error::Internal(format!(
            "pad {:?} paired with chart type {}",
            pad.chart_type_tag(),
            chart_type
        )));
    }
    log::info!("loading step graph for {}", chart_type);
    let graph = Arc::new(match graph_file {
        Some(path) => StepGraph::read_from(path, pad.clone())?,
        None => StepGraph::build(pad.clone(), config.graph_size_limit)?,
    });
    *guard = Some(graph.clone());
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dance_single() -> Arc<PadData> {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/dance-single.json");
        Arc::new(PadData::read_from_file(Path::new(path)).unwrap())
    }

    #[test]
    fn concurrent_requests_share_one_graph() {
        let pad = dance_single();
        let config = Config::default();
        let graphs: Vec<Arc<StepGraph>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let pad = pad.clone();
                    let config = config.clone();
                    s.spawn(move || {
                        step_graph(ChartType::DanceSingle, &pad, None, &config).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        // If the graph were loaded more than once the slot would have been overwritten and the
        // `Arc`s would differ
        for graph in &graphs[1..] {
            assert!(Arc::ptr_eq(&graphs[0], graph));
        }
    }

    #[test]
    fn mispaired_pad_is_an_internal_error() {
        let pad = dance_single();
        let config = Config::default();
        let err = step_graph(ChartType::DanceDouble, &pad, None, &config).unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }
}
