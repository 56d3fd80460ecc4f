// Natural-language resources: label normalization, word embeddings, and the
// lexical relations database.

pub mod embedding;
pub mod lexicon;
pub mod normalize;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("model file {path} contains no usable entries")]
    Empty { path: String },
}
