use std::fs;
use std::path::Path;

use clap::Parser;
use serde_json::json;

use super::*;
use crate::cli::{Cli, Commands};
use crate::metrics::REGISTRY;
use crate::model::{CorpusInventoryManifest, RunAllManifest};
use crate::util::{read_json, sha256_file};

fn write_article(root: &Path, document: &str, version: &str, content: &str) {
    let dir = root.join(document);
    fs::create_dir_all(&dir).expect("create document dir");
    fs::write(
        dir.join(format!("{version}.json")),
        serde_json::to_vec_pretty(&json!({
            "placeId": document,
            "title": document,
            "content": content,
        }))
        .expect("serialize article"),
    )
    .expect("write article");
}

fn sample_corpus(root: &Path) {
    write_article(
        root,
        "rynek",
        "adult_full",
        "Rynek jest sercem miasta. Wokół stoją kamienice.\n\nW środku stoi ratusz.",
    );
    write_article(root, "rynek", "child_short", "Rynek jest duży. Stoi tu ratusz!");
    write_article(root, "zamek", "adult_full", "Zamek stoi na wzgórzu nad rzeką.");
}

fn parse(args: &[&str]) -> Commands {
    Cli::try_parse_from(std::iter::once("article-metrics").chain(args.iter().copied()))
        .expect("arguments parse")
        .command
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("utf-8 temp path")
}

#[test]
fn inventory_lists_present_and_missing_versions() {
    let temp = tempfile::tempdir().expect("tempdir");
    let corpus_root = temp.path().join("articles");
    sample_corpus(&corpus_root);
    fs::create_dir_all(corpus_root.join(".cache")).expect("hidden dir");

    let corpus = FsCorpus::new(corpus_root.clone());
    let manifest =
        inventory::build_manifest(&corpus, &VersionSet::default()).expect("inventory builds");

    assert_eq!(manifest.document_count, 2);
    let rynek = &manifest.documents[0];
    assert_eq!(rynek.name, "rynek");
    assert_eq!(rynek.missing_versions, ["adult_short"]);
    assert_eq!(
        rynek.versions[0].sha256,
        sha256_file(&corpus_root.join("rynek/adult_full.json")).expect("hash")
    );
    assert_eq!(
        manifest.documents[1].missing_versions,
        ["adult_short", "child_short"]
    );
}

#[test]
fn inventory_rejects_an_empty_corpus() {
    let temp = tempfile::tempdir().expect("tempdir");
    let err = inventory::build_manifest(&FsCorpus::new(temp.path()), &VersionSet::default())
        .expect_err("empty corpus");
    assert!(format!("{err:#}").contains("no documents found"));
}

#[test]
fn inventory_command_writes_manifest_under_output_root() {
    let temp = tempfile::tempdir().expect("tempdir");
    let corpus_root = temp.path().join("articles");
    let output_root = temp.path().join("output");
    sample_corpus(&corpus_root);

    let Commands::Inventory(args) = parse(&[
        "inventory",
        "--corpus-root",
        path_arg(&corpus_root),
        "--output-root",
        path_arg(&output_root),
    ]) else {
        panic!("expected inventory command");
    };
    inventory::run(args).expect("inventory runs");

    let manifest: CorpusInventoryManifest =
        read_json(&output_root.join("manifests/corpus_inventory.json")).expect("manifest");
    assert_eq!(manifest.versions, ["adult_full", "adult_short", "child_short"]);
    assert_eq!(manifest.document_count, 2);
}

#[test]
fn run_all_writes_every_aggregate_and_a_manifest() {
    let temp = tempfile::tempdir().expect("tempdir");
    let corpus_root = temp.path().join("articles");
    let output_root = temp.path().join("output");
    sample_corpus(&corpus_root);

    let Commands::RunAll(args) = parse(&[
        "run-all",
        "--corpus-root",
        path_arg(&corpus_root),
        "--output-root",
        path_arg(&output_root),
        "--workers",
        "2",
    ]) else {
        panic!("expected run-all command");
    };
    run_all::run(args).expect("run-all completes");

    let store = ResultStore::new(output_root.clone());
    for spec in REGISTRY {
        let record = store
            .read_aggregate(spec.name)
            .expect("aggregate reads")
            .expect("aggregate exists");
        assert_eq!(record.summary.failed, 0, "{}", spec.name);
        assert_eq!(record.kind, spec.aggregate_kind());
    }

    let word_count = store
        .read_aggregate("word_count")
        .expect("reads")
        .expect("exists");
    assert_eq!(word_count.summary.completed, 3);
    assert_eq!(word_count.summary.skipped, 3);

    let manifests = fs::read_dir(store.manifest_dir())
        .expect("manifest dir")
        .map(|entry| entry.expect("entry").path())
        .collect::<Vec<_>>();
    assert_eq!(manifests.len(), 1);
    let manifest: RunAllManifest = read_json(&manifests[0]).expect("run-all manifest");
    assert_eq!(manifest.metrics.len(), REGISTRY.len());
    assert!(manifest.failed_metrics.is_empty());
    assert_eq!(manifest.pool_size, Some(2));

    let Commands::Status(args) = parse(&["status", "--output-root", path_arg(&output_root)])
    else {
        panic!("expected status command");
    };
    status::run(args).expect("status reads artifacts");
}

#[test]
fn run_all_aborts_before_scheduling_when_corpus_is_missing() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output_root = temp.path().join("output");

    let Commands::RunAll(args) = parse(&[
        "run-all",
        "--corpus-root",
        path_arg(&temp.path().join("missing")),
        "--output-root",
        path_arg(&output_root),
    ]) else {
        panic!("expected run-all command");
    };

    let err = run_all::run(args).expect_err("configuration error");
    assert!(format!("{err:#}").contains("corpus root does not exist"));
    assert!(!output_root.exists());
}

#[test]
fn metric_command_rejects_unknown_names_and_incomplete_annotator() {
    let temp = tempfile::tempdir().expect("tempdir");
    let corpus_root = temp.path().join("articles");
    sample_corpus(&corpus_root);

    let Commands::Metric(args) = parse(&[
        "metric",
        "flesch",
        "--corpus-root",
        path_arg(&corpus_root),
    ]) else {
        panic!("expected metric command");
    };
    let err = metric::run(args).expect_err("unknown metric");
    assert!(err.to_string().contains("unknown metric flesch"));

    let Commands::Metric(args) = parse(&["metric", "ttr", "--annotator", "command"]) else {
        panic!("expected metric command");
    };
    let err = metric::run(args).expect_err("missing annotator program");
    assert!(err.to_string().contains("--annotator-command"));
}

#[test]
fn metric_command_honours_version_selection() {
    let temp = tempfile::tempdir().expect("tempdir");
    let corpus_root = temp.path().join("articles");
    let output_root = temp.path().join("output");
    sample_corpus(&corpus_root);

    let Commands::Metric(args) = parse(&[
        "metric",
        "jaccard_similarity",
        "--corpus-root",
        path_arg(&corpus_root),
        "--output-root",
        path_arg(&output_root),
        "--versions",
        "adult_full,child_short",
    ]) else {
        panic!("expected metric command");
    };
    metric::run(args).expect("metric runs");

    let record = ResultStore::new(output_root)
        .read_aggregate("jaccard_similarity")
        .expect("reads")
        .expect("exists");
    assert!(record.data["rynek"].contains_key("adult_full__child_short"));
    assert!(record.data["zamek"].is_empty());
}

#[test]
fn invalid_version_list_is_a_configuration_error() {
    let Commands::Metric(args) = parse(&["metric", "ttr", "--versions", "a,a"]) else {
        panic!("expected metric command");
    };
    assert!(build_env(&args.run).is_err());
}

#[test]
fn run_all_finishes_remaining_metrics_then_fails_on_unwritable_aggregate() {
    let temp = tempfile::tempdir().expect("tempdir");
    let corpus_root = temp.path().join("articles");
    let output_root = temp.path().join("output");
    sample_corpus(&corpus_root);
    let store = ResultStore::new(output_root.clone());
    fs::create_dir_all(store.aggregate_path("word_count")).expect("block aggregate path");

    let Commands::RunAll(args) = parse(&[
        "run-all",
        "--corpus-root",
        path_arg(&corpus_root),
        "--output-root",
        path_arg(&output_root),
    ]) else {
        panic!("expected run-all command");
    };

    let err = run_all::run(args).expect_err("persistence failure is fatal");
    assert!(err.to_string().contains("word_count"));

    assert!(store.read_aggregate("tfidf_overlap").expect("reads").is_some());
    let manifest_path = fs::read_dir(store.manifest_dir())
        .expect("manifest dir")
        .map(|entry| entry.expect("entry").path())
        .next()
        .expect("run-all manifest");
    let manifest: RunAllManifest = read_json(&manifest_path).expect("manifest reads");
    assert_eq!(manifest.failed_metrics, ["word_count"]);
    assert_eq!(manifest.metrics.len(), REGISTRY.len());
}
