use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WizardError {
    /// Base de tirages absente ou mal formée. Fatal avant tout échantillonnage.
    #[error("Base de tirages invalide : {0}")]
    Data(String),

    /// Fichier de combinaisons candidates illisible.
    #[error("Source de combinaisons introuvable : {0}")]
    SourceNotFound(PathBuf),

    /// L'échantillonneur n'a trouvé aucune ligne valide.
    #[error("Aucune combinaison valide dans la source")]
    EmptyPool,
}
