//! Model and preprocessor persistence

mod serializer;

pub use serializer::{load_artifact, save_artifact, Artifact, ArtifactKind, Envelope};

use crate::training::TrainedModel;

impl Artifact for TrainedModel {
    const KIND: ArtifactKind = ArtifactKind::Model;
}
