//! Parallel resolutions sharing one session.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use graft_common::config::ConflictResolution;
use graft_common::constants::ROOT_BUILD_NAME;
use graft_common::types::{ComponentSelector, ModuleVersionId};
use graft_engine::strategy::ResolutionStrategy;
use graft_model::artifact::ArtifactMetadata;
use graft_model::configuration::ConfigurationDefinition;
use graft_model::dependency::DependencyMetadata;
use graft_sdk::session::ResolutionSession;

const CONSUMERS: usize = 8;

fn session() -> ResolutionSession {
    let mut session =
        ResolutionSession::new(ROOT_BUILD_NAME, ResolutionStrategy::new(ConflictResolution::Latest));
    let _ = session.add_project(
        ":lib",
        ModuleVersionId::new("com.example", "lib", "1.0"),
        vec![
            ConfigurationDefinition::consumable("runtimeElements")
                .with_attribute("usage", "runtime")
                .with_artifact(ArtifactMetadata::new("lib")),
            ConfigurationDefinition::consumable("apiElements")
                .with_attribute("usage", "api")
                .with_artifact(ArtifactMetadata::new("lib-api")),
        ],
    );
    for index in 0..CONSUMERS {
        let usage = if index % 2 == 0 { "runtime" } else { "api" };
        let _ = session.add_project(
            format!(":consumer{index}"),
            ModuleVersionId::new("com.example", format!("consumer{index}"), "1.0"),
            vec![
                ConfigurationDefinition::resolvable("classpath")
                    .with_attribute("usage", usage)
                    .with_dependency(DependencyMetadata::new(ComponentSelector::project(":lib"))),
            ],
        );
    }
    session
}

fn requests() -> Vec<(String, String)> {
    (0..CONSUMERS)
        .map(|index| (format!(":consumer{index}"), "classpath".to_string()))
        .collect()
}

#[test]
fn parallel_resolutions_share_component_and_variant_states() {
    let session = session();
    let graphs: Vec<_> = session
        .resolve_all(&requests())
        .into_iter()
        .map(|result| result.expect("resolution"))
        .collect();
    assert_eq!(graphs.len(), CONSUMERS);

    let lib = session.project_id(":lib");
    let runtime: Vec<_> = graphs
        .iter()
        .step_by(2)
        .map(|g| Arc::clone(&g.nodes_of(&lib).next().expect("lib node").state))
        .collect();
    assert!(runtime.iter().all(|state| state.name() == "runtimeElements"));
    assert!(runtime.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));

    let api = graphs[1].nodes_of(&lib).next().expect("lib node");
    assert_eq!(api.variant, "apiElements");
}

#[test]
fn parallel_results_keep_request_order() {
    let session = session();
    let mut requests = requests();
    requests.push((":missing".to_string(), "classpath".to_string()));

    let results = session.resolve_all(&requests);

    assert_eq!(results.len(), CONSUMERS + 1);
    for (index, result) in results.iter().take(CONSUMERS).enumerate() {
        let graph = result.as_ref().expect("resolution");
        let root = graph.root().expect("root");
        assert_eq!(root.component, session.project_id(&format!(":consumer{index}")));
    }
    assert!(results[CONSUMERS].is_err());
}
