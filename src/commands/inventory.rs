use anyhow::{Result, bail};
use tracing::{info, warn};

use super::{INVENTORY_FILE_NAME, version_set};
use crate::cli::InventoryArgs;
use crate::corpus::{DocumentSource, FsCorpus, VersionSet};
use crate::model::{CorpusInventoryManifest, DocumentEntry, VersionFileEntry};
use crate::store::ResultStore;
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let versions = version_set(&args.corpus)?;
    let corpus = FsCorpus::new(args.corpus.corpus_root.clone());
    let manifest = build_manifest(&corpus, &versions)?;

    let incomplete = manifest
        .documents
        .iter()
        .filter(|document| !document.missing_versions.is_empty())
        .count();
    for document in &manifest.documents {
        if !document.missing_versions.is_empty() {
            warn!(
                document = %document.name,
                missing = %document.missing_versions.join(","),
                "document is missing versions"
            );
        }
    }

    if args.dry_run {
        info!(
            document_count = manifest.document_count,
            incomplete,
            source = %manifest.corpus_root,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args.manifest_path.unwrap_or_else(|| {
        ResultStore::new(args.corpus.output_root.clone())
            .manifest_dir()
            .join(INVENTORY_FILE_NAME)
    });

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(
        document_count = manifest.document_count,
        incomplete, "inventory completed"
    );

    Ok(())
}

pub fn build_manifest(corpus: &FsCorpus, versions: &VersionSet) -> Result<CorpusInventoryManifest> {
    let names = corpus.list_documents()?;
    if names.is_empty() {
        bail!("no documents found in {}", corpus.root().display());
    }

    let mut documents = Vec::with_capacity(names.len());
    for name in names {
        let mut present = Vec::new();
        let mut missing_versions = Vec::new();

        for version in versions.iter() {
            let path = corpus.article_path(&name, version);
            if path.is_file() {
                present.push(VersionFileEntry {
                    version: version.to_string(),
                    sha256: sha256_file(&path)?,
                });
            } else {
                missing_versions.push(version.to_string());
            }
        }

        documents.push(DocumentEntry {
            name,
            versions: present,
            missing_versions,
        });
    }

    Ok(CorpusInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        corpus_root: corpus.root().display().to_string(),
        versions: versions.labels().to_vec(),
        document_count: documents.len(),
        documents,
    })
}
