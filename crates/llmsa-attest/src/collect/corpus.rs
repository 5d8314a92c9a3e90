//! Corpus attestation collector.

use std::path::Path;

use serde::Deserialize;

use llmsa_core::digest::digest_file;
use llmsa_core::statement::{
    AttestationKind, CorpusPredicate, NamedDigest, Predicate, Statement,
};

use crate::config::{load_config, require_path, resolve_path};
use crate::error::AttestError;
use crate::statement::{digest_of_string, new_statement, subject_from_path};

/// Declarative config for the corpus collector.
#[derive(Debug, Default, Deserialize)]
pub struct CorpusConfig {
    #[serde(default)]
    pub corpus_snapshot_id: String,
    #[serde(default)]
    pub connector_configs: Vec<String>,
    #[serde(default)]
    pub document_manifest: String,
    #[serde(default)]
    pub chunking_config: String,
    #[serde(default)]
    pub embedding_model: String,
    #[serde(default)]
    pub embedding_input: String,
    #[serde(default)]
    pub index_builder_image_digest: String,
    #[serde(default)]
    pub vector_index: String,
    #[serde(default)]
    pub build_command: String,
}

/// Collect a corpus attestation statement.
pub fn collect_corpus(config_path: &Path) -> Result<Statement, AttestError> {
    let mut cfg: CorpusConfig = load_config(config_path)?;
    for connector in &mut cfg.connector_configs {
        *connector = resolve_path(config_path, connector);
    }
    cfg.document_manifest = resolve_path(config_path, &cfg.document_manifest);
    cfg.chunking_config = resolve_path(config_path, &cfg.chunking_config);
    cfg.embedding_input = resolve_path(config_path, &cfg.embedding_input);
    cfg.vector_index = resolve_path(config_path, &cfg.vector_index);

    if cfg.corpus_snapshot_id.is_empty() {
        return Err(AttestError::MissingField("corpus_snapshot_id"));
    }
    require_path(&cfg.document_manifest, "document_manifest")?;
    require_path(&cfg.chunking_config, "chunking_config")?;
    require_path(&cfg.embedding_input, "embedding_input")?;
    require_path(&cfg.vector_index, "vector_index")?;
    if cfg.embedding_model.is_empty() {
        return Err(AttestError::MissingField("embedding_model"));
    }
    if cfg.index_builder_image_digest.is_empty() {
        return Err(AttestError::MissingField("index_builder_image_digest"));
    }

    let mut connector_digests = Vec::with_capacity(cfg.connector_configs.len());
    let mut subjects = Vec::new();
    for path in &cfg.connector_configs {
        require_path(path, "connector_config")?;
        let (digest, _) = digest_file(Path::new(path))?;
        connector_digests.push(NamedDigest {
            name: Path::new(path)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.clone()),
            digest,
        });
        subjects.push(subject_from_path(path)?);
    }

    let (doc_digest, _) = digest_file(Path::new(&cfg.document_manifest))?;
    let (chunk_digest, _) = digest_file(Path::new(&cfg.chunking_config))?;
    let (embed_input_digest, _) = digest_file(Path::new(&cfg.embedding_input))?;
    let (vector_digest, _) = digest_file(Path::new(&cfg.vector_index))?;

    let mut predicate = CorpusPredicate {
        corpus_snapshot_id: cfg.corpus_snapshot_id.clone(),
        connector_config_digests: connector_digests,
        document_manifest_digest: doc_digest,
        chunking_config_digest: chunk_digest,
        embedding_model: cfg.embedding_model.clone(),
        embedding_input_digest: embed_input_digest,
        index_builder_image_digest: cfg.index_builder_image_digest.clone(),
        vector_index_digest: vector_digest,
        build_command_digest: None,
    };
    if !cfg.build_command.is_empty() {
        predicate.build_command_digest = Some(digest_of_string(&cfg.build_command));
    }

    for path in [
        &cfg.document_manifest,
        &cfg.chunking_config,
        &cfg.embedding_input,
        &cfg.vector_index,
    ] {
        subjects.push(subject_from_path(path)?);
    }

    Ok(new_statement(
        AttestationKind::Corpus,
        Predicate::Corpus(predicate),
        subjects,
        vec![],
    ))
}
