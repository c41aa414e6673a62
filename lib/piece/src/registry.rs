//! Piece lookup.

use crate::error::RegistryError;
use crate::piece::Piece;
use async_trait::async_trait;
use pieceflow_core::Result;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Resolves pieces by name.
#[async_trait]
pub trait PieceRegistry: Send + Sync {
    /// Returns the piece registered under `piece_name`, if any.
    async fn get_piece(&self, piece_name: &str) -> Option<Arc<Piece>>;
}

/// A registry fixed at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticPieceRegistry {
    pieces: HashMap<String, Arc<Piece>>,
}

impl StaticPieceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a piece.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken or the piece declares the same
    /// trigger name twice.
    pub fn register(&mut self, piece: Piece) -> Result<(), RegistryError> {
        if self.pieces.contains_key(&piece.name) {
            return Err(RegistryError::DuplicatePiece {
                piece_name: piece.name,
            }
            .into());
        }
        let mut seen = HashSet::new();
        for trigger in &piece.triggers {
            if !seen.insert(trigger.name.as_str()) {
                return Err(RegistryError::DuplicateTrigger {
                    piece_name: piece.name.clone(),
                    trigger_name: trigger.name.clone(),
                }
                .into());
            }
        }
        debug!(piece = %piece.name, version = %piece.version, "registered piece");
        self.pieces.insert(piece.name.clone(), Arc::new(piece));
        Ok(())
    }

    /// Adds a piece, builder style.
    ///
    /// # Errors
    ///
    /// See [`StaticPieceRegistry::register`].
    pub fn with_piece(mut self, piece: Piece) -> Result<Self, RegistryError> {
        self.register(piece)?;
        Ok(self)
    }

    /// Returns the number of registered pieces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    /// Returns whether no pieces are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }
}

#[async_trait]
impl PieceRegistry for StaticPieceRegistry {
    async fn get_piece(&self, piece_name: &str) -> Option<Arc<Piece>> {
        self.pieces.get(piece_name).cloned()
    }
}
