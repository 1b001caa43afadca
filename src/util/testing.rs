use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

use tracing::{debug, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::application::services::Rebuilder;
use crate::application::ApplicationResult;
use crate::domain::{Node, NodeId};

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        if env::var("RUST_LOG").is_err() {
            env::set_var("RUST_LOG", "debug");
        }
        // global logging subscriber, used by all tracing log macros
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_test_writer()
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

/// Root nodes with the given ids and consecutive bounds, in id order.
pub fn flat_nodes(ids: &[u64]) -> Vec<Node> {
    ids.iter()
        .enumerate()
        .map(|(i, &id)| {
            let lft = (i as u32) * 2 + 1;
            Node {
                id: NodeId(id),
                parent_id: None,
                lft,
                rgt: lft + 1,
                depth: 0,
            }
        })
        .collect()
}

/// Rebuilder double: counts calls and optionally delegates.
#[derive(Default)]
pub struct RecordingRebuilder {
    calls: AtomicUsize,
    inner: Option<Arc<dyn Rebuilder>>,
}

impl RecordingRebuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delegating(inner: Arc<dyn Rebuilder>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            inner: Some(inner),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Rebuilder for RecordingRebuilder {
    fn rebuild(&self) -> ApplicationResult<usize> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.inner {
            Some(inner) => inner.rebuild(),
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_test_setup() {
        init_test_setup();
    }

    #[test]
    fn given_ids_when_building_flat_nodes_then_bounds_are_consecutive() {
        let nodes = flat_nodes(&[4, 9]);
        assert_eq!((nodes[0].lft, nodes[0].rgt), (1, 2));
        assert_eq!((nodes[1].lft, nodes[1].rgt), (3, 4));
        assert!(crate::domain::validate::check(&nodes).is_empty());
    }

    #[test]
    fn given_recording_rebuilder_when_called_then_counts() {
        let rebuilder = RecordingRebuilder::new();
        rebuilder.rebuild().unwrap();
        rebuilder.rebuild().unwrap();
        assert_eq!(rebuilder.calls(), 2);
    }
}
